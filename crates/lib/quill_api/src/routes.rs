//! Route paths served by [`crate::router`].

pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const GET_AUTH_CHECK_EMAIL: &str = "/auth/check-email";
pub const GET_AUTH_CHECK_USERNAME: &str = "/auth/check-username";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_AUTH_TOKEN_STATUS: &str = "/auth/token-status";
pub const USERS_ME: &str = "/users/me";
pub const PUT_USERS_ME_PASSWORD: &str = "/users/me/password";
