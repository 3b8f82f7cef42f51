/// A privileged operation was requested by someone other than the owner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("user {user_id} is not allowed to run {operation}")]
pub struct AuthorizationError {
    pub user_id: i64,
    pub operation: &'static str,
}

/// True iff an owner is configured (non-zero) and it is `user_id`.
pub fn is_privileged(owner_id: i64, user_id: i64) -> bool {
    owner_id != 0 && owner_id == user_id
}

pub fn require_privileged(
    owner_id: i64,
    user_id: i64,
    operation: &'static str,
) -> Result<(), AuthorizationError> {
    if is_privileged(owner_id, user_id) {
        Ok(())
    } else {
        Err(AuthorizationError { user_id, operation })
    }
}

/// Compare a presented secret with the configured one in constant time.
///
/// Both sides are hashed first so the comparison does not leak length either.
pub fn secret_matches(provided: &str, expected: &str) -> bool {
    use sha2::{Digest, Sha256};
    use subtle::ConstantTimeEq;

    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.ct_eq(&expected).into()
}
