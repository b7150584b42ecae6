use sha2::Digest;
use sha2::Sha256;

/// One-way digest of a signed token, used to index persisted tokens.
///
/// Returns the lowercase hex SHA-256 of the token string.
pub fn digest_token(signed_value: &str) -> String {
    hex::encode(Sha256::digest(signed_value.as_bytes()))
}
