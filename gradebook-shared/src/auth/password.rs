/// Password hashing module
///
/// Credentials are stored as a PBKDF2-HMAC-SHA256 derived key next to the
/// random salt that produced it. The salt is regenerated for every hashing
/// event (registration, password reset) and never shared between users.
///
/// # Parameters
///
/// - **KDF**: PBKDF2 with HMAC-SHA256
/// - **Iterations**: 100,000
/// - **Salt**: 32 random bytes from the OS CSPRNG
/// - **Output**: 32 bytes, base64-encoded for storage
///
/// Verification recomputes the derived key and compares it to the stored
/// value in constant time.
///
/// # Example
///
/// ```
/// use gradebook_shared::auth::password::{generate_salt, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let salt = generate_salt();
/// let hash = hash_password("super_secret_password_123", &salt)?;
///
/// assert!(verify_password("super_secret_password_123", &hash, &salt)?);
/// assert!(!verify_password("wrong_password", &hash, &salt)?);
/// # Ok(())
/// # }
/// ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Salt length in bytes
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes
pub const HASH_LEN: usize = 32;

/// PBKDF2 iteration count
const PBKDF2_ROUNDS: u32 = 100_000;

/// Error type for password hashing operations
///
/// Every variant is a caller error: the hasher never retries or recovers,
/// and a verification mismatch is `Ok(false)`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Password was empty
    #[error("Password must not be empty")]
    EmptyPassword,

    /// Salt had the wrong length
    #[error("Salt must be {expected} bytes, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    /// Stored hash or salt could not be decoded
    #[error("Invalid stored credential encoding: {0}")]
    InvalidEncoding(String),
}

/// Generates a fresh random salt
///
/// Uses the operating system CSPRNG. Each call returns an independent value;
/// salts must never be reused across users or resets.
pub fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derives the stored hash for a password and salt
///
/// Deterministic for identical inputs, which is what verification relies on.
///
/// # Errors
///
/// Returns `PasswordError::EmptyPassword` for an empty password and
/// `PasswordError::InvalidSaltLength` if the salt is not [`SALT_LEN`] bytes.
///
/// # Example
///
/// ```
/// use gradebook_shared::auth::password::{generate_salt, hash_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let salt = generate_salt();
/// let a = hash_password("hunter2hunter2", &salt)?;
/// let b = hash_password("hunter2hunter2", &salt)?;
/// assert_eq!(a, b);
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str, salt: &[u8]) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }
    if salt.len() != SALT_LEN {
        return Err(PasswordError::InvalidSaltLength {
            expected: SALT_LEN,
            actual: salt.len(),
        });
    }

    let mut derived = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut derived);

    Ok(STANDARD.encode(derived))
}

/// Verifies a password against a stored hash and salt
///
/// Recomputes the derived key with the same parameters and compares it to
/// the stored value in constant time, so the comparison leaks nothing about
/// how many leading bytes matched.
///
/// # Returns
///
/// `Ok(true)` on a match, `Ok(false)` on a mismatch. Callers treat a
/// mismatch as "invalid credentials", never as a system error.
///
/// # Errors
///
/// Same caller errors as [`hash_password`], plus
/// `PasswordError::InvalidEncoding` if the stored hash is not valid base64
/// of [`HASH_LEN`] bytes.
pub fn verify_password(
    password: &str,
    stored_hash: &str,
    salt: &[u8],
) -> Result<bool, PasswordError> {
    let stored = STANDARD
        .decode(stored_hash)
        .map_err(|e| PasswordError::InvalidEncoding(e.to_string()))?;

    if stored.len() != HASH_LEN {
        return Err(PasswordError::InvalidEncoding(format!(
            "expected {} hash bytes, got {}",
            HASH_LEN,
            stored.len()
        )));
    }

    let recomputed = hash_password(password, salt)?;
    let recomputed = STANDARD
        .decode(recomputed)
        .map_err(|e| PasswordError::InvalidEncoding(e.to_string()))?;

    Ok(recomputed.ct_eq(&stored).into())
}

/// Encodes a salt for text storage
pub fn encode_salt(salt: &[u8]) -> String {
    STANDARD.encode(salt)
}

/// Decodes a salt from its stored text form
///
/// # Errors
///
/// Returns `PasswordError::InvalidEncoding` for bad base64 and
/// `PasswordError::InvalidSaltLength` if the decoded salt is not
/// [`SALT_LEN`] bytes.
pub fn decode_salt(encoded: &str) -> Result<Vec<u8>, PasswordError> {
    let salt = STANDARD
        .decode(encoded)
        .map_err(|e| PasswordError::InvalidEncoding(e.to_string()))?;

    if salt.len() != SALT_LEN {
        return Err(PasswordError::InvalidSaltLength {
            expected: SALT_LEN,
            actual: salt.len(),
        });
    }

    Ok(salt)
}
