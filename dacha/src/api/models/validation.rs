//! Field checks shared by request models. Every failure is a [`Error::BadRequest`].

use crate::config::PasswordConfig;
use crate::errors::{Error, Result};
use crate::spatial::{self, Geometry};

/// `value` must contain something other than whitespace.
pub fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Like [`required`], for fields that may be omitted from partial updates.
pub fn required_if_present(field: &str, value: Option<&str>) -> Result<()> {
    value.map_or(Ok(()), |v| required(field, v))
}

/// A loose syntactic check: one `@`, a non-empty local part, a dotted domain and no whitespace.
pub fn email(value: &str) -> Result<()> {
    required("email", value)?;

    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::bad_request(format!("Invalid email address: {value}")))
    }
}

pub fn password(value: &str, config: &PasswordConfig) -> Result<()> {
    let length = value.chars().count();
    if length < config.min_length {
        return Err(Error::bad_request(format!(
            "Password must be at least {} characters",
            config.min_length
        )));
    }
    if length > config.max_length {
        return Err(Error::bad_request(format!(
            "Password must be no more than {} characters",
            config.max_length
        )));
    }
    Ok(())
}

pub fn location(value: &Geometry) -> Result<()> {
    spatial::validate(value).map_err(|e| Error::bad_request(format!("Invalid location: {e}")))
}
