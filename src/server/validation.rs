use crate::auth::MIN_PASSWORD_LENGTH;
use crate::server::response::ApiError;

const MAX_ROLE_NAME_LEN: usize = 50;
const MAX_DISPLAY_NAME_LEN: usize = 255;
const MAX_IDENTIFIER_LEN: usize = 64;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Catalog keys such as `edit_user` or `price_app`.
pub fn validate_identifier(id: &str, entity: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::bad_request(format!("{entity} id cannot be empty")));
    }
    if id.len() > MAX_IDENTIFIER_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} id cannot exceed {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if !id.chars().all(is_identifier_char) {
        return Err(ApiError::bad_request(format!(
            "{entity} id can only contain alphanumeric characters, hyphens, and underscores"
        )));
    }
    Ok(())
}

fn validate_display_name(name: &str, entity: &str, max_len: usize) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{entity} name cannot be empty")));
    }
    if name.chars().count() > max_len {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_role_name(name: &str) -> Result<(), ApiError> {
    validate_display_name(name, "Role", MAX_ROLE_NAME_LEN)
}

pub fn validate_name(name: &str, entity: &str) -> Result<(), ApiError> {
    validate_display_name(name, entity, MAX_DISPLAY_NAME_LEN)
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !email.contains(char::is_whitespace);

    if !valid {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
