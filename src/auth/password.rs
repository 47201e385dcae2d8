use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AppError, AppResult};

/// Hash `password` with bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Check `password` against a stored bcrypt hash on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))
}

/// SHA-256 hex digest of a refresh token, the only form in which it is stored.
pub fn digest_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Constant-time check of `token` against a stored digest.
pub fn digest_matches(token: &str, stored_digest: &str) -> bool {
    digest_token(token)
        .as_bytes()
        .ct_eq(stored_digest.as_bytes())
        .into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("password123".to_string(), 4).await.unwrap();

        assert_ne!(hash, "password123");
        assert!(verify_password("password123".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_against_malformed_hash_errors() {
        let result = verify_password("password123".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = digest_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_matches() {
        let stored = digest_token("refresh-token");
        assert!(digest_matches("refresh-token", &stored));
        assert!(!digest_matches("other-token", &stored));
        assert!(!digest_matches("refresh-token", ""));
    }
}
