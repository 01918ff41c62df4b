use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// Claims carried by the session token issued at login. Only the subject id
/// matters for admission; the identity relayed to rooms arrives in the join
/// payload.
#[derive(Debug, Deserialize)]
pub struct Claims {
    pub id: String,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session token supplied")]
    NoToken,
    #[error("invalid session token")]
    InvalidToken,
}

/// Verifies the signed session token presented at the WebSocket handshake.
pub fn verify(token: Option<&str>, secret: &str) -> Result<Claims, AuthError> {
    let token = token.ok_or(AuthError::NoToken)?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        log::debug!("token rejected: {}", err);
        AuthError::InvalidToken
    })
}
