use thiserror::Error;

const SCHEME: &str = "Bearer";

/// Error for Authorization header parsing.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BearerError {
    #[error("Authorization header not provided")]
    MissingHeader,

    #[error("Invalid Authorization header format. Expected: Bearer <token>")]
    MalformedHeader,
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts exactly `Bearer <token>`: two parts separated by a single space,
/// the literal scheme `Bearer`, and a non-empty token.
///
/// # Errors
/// * `MissingHeader` - Header absent or empty
/// * `MalformedHeader` - Any other shape
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, BearerError> {
    let value = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(BearerError::MissingHeader),
    };

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(BearerError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing() {
        assert_eq!(extract_bearer_token(None), Err(BearerError::MissingHeader));
        assert_eq!(extract_bearer_token(Some("")), Err(BearerError::MissingHeader));
    }

    #[test]
    fn test_malformed() {
        for value in [
            "Token abc",
            "Bearer",
            "Bearer ",
            "bearer abc",
            "Bearer  abc",
            "Bearer abc def",
            " Bearer abc",
            "Basic dXNlcjpwYXNz",
        ] {
            assert_eq!(
                extract_bearer_token(Some(value)),
                Err(BearerError::MalformedHeader),
                "{value:?} should be rejected"
            );
        }
    }
}
