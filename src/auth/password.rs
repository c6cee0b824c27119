// Password digests. bcrypt is CPU bound, so both directions run on the blocking pool.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    let digest = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(digest)
}

/// Compare a candidate password against a stored digest.
pub async fn verify_password(password: String, digest: String) -> Result<bool, PasswordError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest)).await??;
    Ok(matches)
}
