//! OAuth2 authorization server.
//!
//! Only the client-credentials grant is enabled by default; the implicit
//! grant can be switched on in configuration. Issued tokens are stored in
//! the `oauth2_tokens` table.
//!
//! ## Endpoints
//!
//! - `GET|POST /oauth2/authorize` - Authorization endpoint
//! - `POST /oauth2/token` - Token endpoint

pub mod error;
pub mod server;
pub mod store;

pub use error::{AuthorizationFailure, OAuth2Error};
pub use server::{
    AuthorizeRequest, GrantType, OAuth2Handler, OAuth2Server, ServerCallbacks, ServerConfig,
    TokenRequest,
};
pub use store::{ClientInfo, ClientStore, DbTokenStore, TokenInfo, TokenStore};
