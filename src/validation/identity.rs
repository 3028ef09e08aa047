use crate::error::{AppError, Result};

/// Validates an email parameter.
///
/// # Arguments
///
/// * `email` - The email to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the email is acceptable.
pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    if email.len() > 255 {
        return Err(AppError::Validation(
            "Email must be at most 255 characters".to_string(),
        ));
    }

    if !email.contains('@') {
        return Err(AppError::Validation(
            "Email must contain an @ sign".to_string(),
        ));
    }

    Ok(())
}

/// Validates the action field of a sync call.
pub fn validate_action(action: &str) -> Result<()> {
    if action.trim().is_empty() {
        return Err(AppError::Validation("Action is required".to_string()));
    }

    if action.len() > 64 {
        return Err(AppError::Validation(
            "Action must be at most 64 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates an opaque browser identifier, when one was supplied.
pub fn validate_browser_id(browser_id: &str) -> Result<()> {
    if browser_id.len() > 128 {
        return Err(AppError::Validation(
            "Browser id must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}
