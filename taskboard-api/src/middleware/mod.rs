/// Middleware modules for the API server
///
/// - `auth`: bearer-token authentication
/// - `security`: response hardening headers

pub mod auth;
pub mod security;
