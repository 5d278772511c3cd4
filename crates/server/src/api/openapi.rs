//! OpenAPI/Utoipa configuration.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, ClientCredentials, Flow, OAuth2, Scopes, SecurityScheme},
};

use crate::services::{
    accounts::ACCOUNTS_TAG, admin::ADMIN_TAG, api_clients::API_CLIENTS_TAG, auth::AUTH_TAG,
    health::META_TAG, items::ITEMS_TAG, oauth2clients::OAUTH2_CLIENTS_TAG,
    oauth2clients::OAUTH2_TAG, plans::PLANS_TAG, users::USERS_TAG, webhooks::WEBHOOKS_TAG,
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // The cookie name is configurable; this is the default.
            components.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "todocookie",
                    "Session cookie set by `/users/login`.",
                ))),
            );

            let oauth2 = OAuth2::new([Flow::ClientCredentials(ClientCredentials::new(
                "/oauth2/token",
                Scopes::from_iter([
                    ("*", "Every resource"),
                    ("items", "To-do items"),
                    ("webhooks", "Webhooks"),
                    ("accounts", "Accounts"),
                    ("plans", "Plans"),
                    ("users", "The token owner's user record"),
                    ("api_clients", "API clients"),
                    ("oauth2", "OAuth2 clients"),
                ]),
            ))]);
            components.add_security_scheme("oauth2", SecurityScheme::OAuth2(oauth2));
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "To-do API",
        version = "1.0.0",
        description = "Multi-tenant to-do list service. Browsers authenticate with a session \
                       cookie; programs use OAuth2 client-credentials tokens."
    ),
    tags(
        (name = AUTH_TAG, description = "Login, logout and session status"),
        (name = USERS_TAG, description = "Registration, two factor secrets and users"),
        (name = ITEMS_TAG, description = "To-do items"),
        (name = WEBHOOKS_TAG, description = "Webhook registrations"),
        (name = ACCOUNTS_TAG, description = "Billing accounts"),
        (name = PLANS_TAG, description = "Subscription plans"),
        (name = API_CLIENTS_TAG, description = "API client credentials"),
        (name = OAUTH2_CLIENTS_TAG, description = "OAuth2 client management"),
        (name = OAUTH2_TAG, description = "OAuth2 protocol endpoints"),
        (name = ADMIN_TAG, description = "Administration"),
        (name = META_TAG, description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_schemes_are_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("cookie"));
        assert!(components.security_schemes.contains_key("oauth2"));
    }
}
