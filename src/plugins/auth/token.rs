use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::services::api::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub exp: u64,
    #[serde(default)]
    pub sub: Option<String>,
}

/// Decode a bearer token and check its expiry.
///
/// Without a secret the signature is not verified: the client only has the
/// token, so this catches malformed and expired credentials before any
/// backend round-trip.
pub fn inspect_token(token: &str, secret: Option<&[u8]>) -> Result<TokenClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_aud = false;

    let key = match secret {
        Some(secret) => DecodingKey::from_secret(secret),
        None => {
            validation.insecure_disable_signature_validation();
            DecodingKey::from_secret(&[])
        }
    };

    decode::<TokenClaims>(token.trim(), &key, &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => ApiError::credential("Token expired"),
            ErrorKind::MissingRequiredClaim(claim) => {
                ApiError::credential(format!("Invalid token: missing `{claim}`"))
            }
            _ => ApiError::credential(format!("Invalid token: {err}")),
        })
}
