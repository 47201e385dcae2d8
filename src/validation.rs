use crate::error::{AppError, AppResult};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length for usernames.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Minimum length for passwords.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum length for passwords.
///
/// bcrypt only reads the first 72 bytes; longer inputs would silently
/// collide.
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Maximum length for todo and article titles.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length for email addresses (RFC 5321).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validate a username.
///
/// Rules:
/// - Must be between 1 and 64 characters
/// - Must start with an alphanumeric character
/// - Can contain alphanumeric characters, dots, underscores, and hyphens
pub fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::BadRequest(
            "Username cannot be empty".to_string(),
        ));
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !username.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(
            "Username must start with an alphanumeric character".to_string(),
        ));
    }

    if let Some((i, c)) = username
        .chars()
        .enumerate()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(AppError::BadRequest(format!(
            "Username contains invalid character '{c}' at position {i}. \
             Only alphanumeric characters, dots, underscores, and hyphens are allowed"
        )));
    }

    Ok(())
}

/// Validate a plain-text password before hashing.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} bytes"
        )));
    }

    Ok(())
}

/// Validate an email address.
///
/// Deliberately shallow: one `@`, a non-empty local part, and a domain
/// containing a dot that neither starts nor ends it.
pub fn validate_email(email: &str) -> AppResult<()> {
    let invalid = || AppError::BadRequest(format!("'{email}' is not a valid email address"));

    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validate a todo or article title.
///
/// Rules:
/// - Must not be blank
/// - Must not exceed 255 characters
/// - Must not contain control characters
pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Title cannot exceed {} characters (got {})",
            MAX_TITLE_LENGTH,
            title.chars().count()
        )));
    }

    if let Some(pos) = title.chars().position(|c| c.is_control()) {
        return Err(AppError::BadRequest(format!(
            "Title contains invalid control character at position {pos}"
        )));
    }

    Ok(())
}

/// Validate article content.
pub fn validate_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Content cannot be empty".to_string(),
        ));
    }
    Ok(())
}
