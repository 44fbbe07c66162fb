//! Bearer credential handling: persistence, local validation and the shared
//! authentication context.

mod context;
mod store;
mod token;

pub use context::{AuthContext, AuthState};
pub use store::{CREDENTIAL_KEY, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use token::{TokenClaims, inspect_token};

#[cfg(test)]
pub(crate) use token::test_tokens;
