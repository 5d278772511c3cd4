//! Multi-tenant to-do list service.
//!
//! Users register with a password and a TOTP secret, log in for a cookie
//! session, and manage their items, webhooks, accounts and credentials.
//! Programs authenticate with OAuth2 client-credentials tokens whose scopes
//! name the resource collections they may touch.

pub mod api;
pub mod authentication;
pub mod config;
pub mod context;
pub mod database;
pub mod entity;
pub mod error;
pub mod oauth2;
pub mod random;
pub mod services;

pub use api::build_router;
