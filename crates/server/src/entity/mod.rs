//! sea-orm entities, one module per table.

pub mod account;
pub mod api_client;
pub mod audit_log_entry;
pub mod item;
pub mod oauth2_client;
pub mod oauth2_token;
pub mod plan;
pub mod session;
pub mod user;
pub mod webhook;

/// Splits a space-separated column into its parts.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(String::from).collect()
}

pub(crate) fn join_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
