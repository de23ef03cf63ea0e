use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 64;
const MAX_SLUG_LEN: usize = 255;

fn is_valid_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

pub fn validate_user_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest("User name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::BadRequest(format!(
            "User name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(Error::BadRequest("Email cannot be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(Error::BadRequest(format!(
            "Email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    if email.contains(char::is_whitespace) {
        return Err(Error::BadRequest("Email cannot contain whitespace".to_string()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(Error::BadRequest(format!("Invalid email address: {email}"))),
    }
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::BadRequest("Segment slug cannot be empty".to_string()));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(Error::BadRequest(format!(
            "Segment slug cannot exceed {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug.chars().all(is_valid_slug_char) {
        return Err(Error::BadRequest(
            "Segment slug can only contain alphanumeric characters, hyphens, underscores, and periods"
                .to_string(),
        ));
    }
    Ok(())
}
