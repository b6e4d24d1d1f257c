//! Credential manager: durable token cache plus expiry-driven refresh
//! against the identity provider's token endpoint.

mod cache;
mod manager;

pub use cache::{TokenCache, TokenRecord, REFRESH_MARGIN_MS};
pub use manager::{CredentialManager, OAuthClient};
