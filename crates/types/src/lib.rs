//! Wire types shared by the to-do server and its HTTP client.
//!
//! Every request and response body that crosses the HTTP boundary lives here,
//! so the server's handlers and the client's request builders agree on one
//! definition of each payload.

pub mod accounts;
pub mod api_clients;
pub mod audit;
pub mod error;
pub mod items;
pub mod oauth2;
pub mod oauth2_clients;
pub mod pagination;
pub mod plans;
pub mod users;
pub mod validation;
pub mod webhooks;

pub use error::ErrorResponse;
pub use pagination::{Pagination, QueryFilter, SortOrder};
pub use validation::{Validate, ValidationError};
