/// Database models for the gradebook auth core
///
/// One model per file, each carrying its own CRUD operations as associated
/// functions over a `PgPool` (or a `PgConnection` where the operation has to
/// run inside a caller-owned transaction).
///
/// # Models
///
/// - `user`: accounts, credentials, and the `Role` enum
/// - `profile`: first/last name data owned by a user
/// - `password_reset`: single-use, time-bounded reset tickets

pub mod password_reset;
pub mod profile;
pub mod user;
