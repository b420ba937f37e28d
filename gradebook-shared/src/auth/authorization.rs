/// Role checks over the authenticated request context
///
/// The gate runs inline at the top of each guarded handler, after the token
/// middleware has already established an [`AuthContext`]. It is a pure
/// decision over the role claim; nothing here touches the database.
///
/// # Example
///
/// ```
/// use gradebook_shared::auth::authorization::require_role;
/// use gradebook_shared::auth::middleware::AuthContext;
/// use gradebook_shared::models::user::Role;
///
/// fn guarded(auth: &AuthContext) -> Result<(), Box<dyn std::error::Error>> {
///     require_role(auth, Role::Teacher)?;
///     // teacher-only work happens after the gate
///     Ok(())
/// }
/// ```

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Authenticated, but the role claim does not meet the requirement
    #[error("Requires role {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },
}

/// Requires the context's role to equal `required`
///
/// On failure the guarded operation must not run at all; callers convert
/// the error into a 403 before doing any work.
pub fn require_role(auth: &AuthContext, required: Role) -> Result<(), AuthzError> {
    if auth.role != required {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        });
    }

    Ok(())
}
