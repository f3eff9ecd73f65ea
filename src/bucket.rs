//! Bucket name validation.
//!
//! Bucket names frequently become part of a routable hostname, so they are
//! held to DNS-label constraints regardless of backend. Every operation
//! that takes a bucket parameter validates through this one function.

use crate::error::{GatewayError, GatewayResult};

const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// Validate a bucket name against S3-style naming rules:
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - starts and ends with a letter or digit
/// - no consecutive dots or dot-hyphen combinations
/// - not shaped like an IPv4 address
///
/// The error reports the specific rule that was violated.
pub fn validate_bucket_name(name: &str) -> GatewayResult<()> {
    let len = name.len();
    if len < BUCKET_NAME_MIN_LEN || len > BUCKET_NAME_MAX_LEN {
        return Err(GatewayError::invalid_bucket(
            name,
            "must be between 3 and 63 characters",
        ));
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return Err(GatewayError::invalid_bucket(
            name,
            "allowed characters are lowercase letters, digits, dots, and hyphens",
        ));
    }

    if name.starts_with('.') || name.ends_with('.') || name.starts_with('-') || name.ends_with('-')
    {
        return Err(GatewayError::invalid_bucket(
            name,
            "must start and end with a lowercase letter or digit",
        ));
    }

    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return Err(GatewayError::invalid_bucket(
            name,
            "cannot contain consecutive dots or dot-hyphen combinations",
        ));
    }

    if is_ipv4_like(name) {
        return Err(GatewayError::invalid_bucket(
            name,
            "cannot be formatted like an IPv4 address",
        ));
    }

    Ok(())
}

fn is_ipv4_like(name: &str) -> bool {
    let octets: Vec<&str> = name.split('.').collect();
    octets.len() == 4 && octets.iter().all(|part| part.parse::<u8>().is_ok())
}
