//! OAuth2 login flows, credential storage and lifecycle operations.

pub mod authorization_code;
pub mod callback;
pub mod client;
pub mod console;
pub mod device_code;
pub mod error;
pub mod http_client;
pub mod login;
pub mod service;
pub mod store;
pub mod summary;
pub mod token;
pub mod validity;

pub use authorization_code::AuthorizationCodeFlow;
pub use callback::{CallbackServer, CALLBACK_PATH};
pub use client::{AuthClient, DeviceAuthorization, DevicePoll, Introspection};
pub use console::{Browser, Console, SystemBrowser, TerminalConsole};
pub use device_code::DeviceCodeFlow;
pub use error::AuthError;
pub use http_client::HttpAuthClient;
pub use login::{LoginOptions, LoginOutcome};
pub use service::{AuthService, LogoutReport, ProfileState, ProfileStatus, TokenKind};
pub use store::{validate_profile, FileTokenStore, TokenStore, TokenStoreConfig};
pub use summary::{format_remaining, mask_token, CredentialSummary, WhoamiSummary};
pub use token::{split_scopes, Credential, TokenResponse};
pub use validity::{is_valid, is_valid_at, remaining, VALIDITY_BUFFER};
