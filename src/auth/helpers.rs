use std::sync::Arc;

use super::jwt::TokenKind;
use crate::error::Error;
use crate::server::AppState;
use crate::types::User;

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    UnknownUser,
    InternalError,
}

/// Extracts the bearer token from an Authorization header.
/// Returns `Ok(None)` when no header is present.
pub fn extract_bearer_token(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim().to_string()))
            .ok_or(TokenValidationError::InvalidScheme),
        None => Ok(None),
    }
}

/// Verifies an access token and loads the user it was issued to.
pub fn validate_access_token(
    state: &Arc<AppState>,
    raw_token: &str,
) -> Result<User, TokenValidationError> {
    let claims = state
        .jwt
        .verify(raw_token, TokenKind::Access)
        .map_err(|e| match e {
            Error::TokenExpired => TokenValidationError::TokenExpired,
            _ => TokenValidationError::InvalidToken,
        })?;

    state
        .store
        .get_user(&claims.uid)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::UnknownUser)
}
