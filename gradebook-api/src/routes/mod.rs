/// API route handlers
///
/// - `health`: health check endpoint
/// - `auth`: registration, login, forgot/reset password
/// - `account`: authenticated account endpoints

pub mod account;
pub mod auth;
pub mod health;
