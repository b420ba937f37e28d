/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: salted PBKDF2-SHA256 password hashing and verification
/// - [`token`]: signed access token issuance and validation
/// - [`middleware`]: bearer extraction and per-request auth context
/// - [`authorization`]: role checks over the authenticated context
///
/// # Security Properties
///
/// - **Password Hashing**: PBKDF2-HMAC-SHA256, 100k iterations, 32-byte salt
/// - **Tokens**: HS256 signed, server-side expiry, issuer/audience checked
/// - **Verification**: constant-time hash comparison
/// - **Failure Collapse**: all auth failures surface as a uniform 401; the
///   distinct reasons stay available for logging and tests

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
