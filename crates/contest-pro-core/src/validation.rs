//! Validation utilities shared between server and client

use crate::{CoreError, Role};

/// Minimal email sanity check, the identity provider owns real verification
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::Validation("email cannot be empty".into()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CoreError::Validation(format!("invalid email: {}", email))),
    }
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("title cannot be empty".into()));
    }
    Ok(())
}

/// Role passed as a query parameter, required
pub fn parse_role(role: Option<&str>) -> Result<Role, CoreError> {
    match role {
        Some(role) if !role.is_empty() => role.parse(),
        _ => Err(CoreError::Validation("role is required".into())),
    }
}
