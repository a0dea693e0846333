//! Authentication endpoint contract

/// Exchanges `{ login, password }` for `{ token, refreshToken }`.
pub const LOGIN_PATH: &str = "/auth/login";

/// Exchanges `{ refreshToken }` for a new `{ token, refreshToken }` pair.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Users listing, the stock authenticated call.
pub const USERS_PATH: &str = "/users";

/// Authorization scheme prefix
pub const BEARER_SCHEME: &str = "Bearer";
