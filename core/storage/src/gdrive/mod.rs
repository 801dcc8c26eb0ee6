//! Google Drive remote store for updrift.
//!
//! This module provides the upload destination backend using Google Drive
//! with:
//! - OAuth2 authorization-code flow with persisted credentials
//! - Automatic access-token refresh
//! - Paginated folder listings and multipart file creation
//! - Full RemoteStore trait implementation

pub mod auth;
pub mod client;
pub mod provider;
pub mod token_store;

pub use auth::{AuthConfig, AuthManager, AuthState, Authorizer, Credential, TokenManager};
pub use client::DriveClient;
pub use provider::DriveRemote;
pub use token_store::TokenStore;
