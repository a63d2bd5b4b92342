/// Event types for security audit log
pub mod audit_events {
    // Authentication events
    pub const LOGIN_SUCCESS: &str = "login_success";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const LOGIN_BLOCKED: &str = "login_blocked";
    pub const LOGOUT: &str = "logout";

    // Session lifecycle events
    pub const SESSION_REVOKED: &str = "session_revoked";
    pub const SESSIONS_REVOKED_ALL: &str = "sessions_revoked_all";
    pub const SESSIONS_EXPIRED_SWEPT: &str = "sessions_expired_swept";

    // Registration and fraud events
    pub const REGISTER_SUCCESS: &str = "register_success";
    pub const REGISTER_BLOCKED: &str = "register_blocked";

    // Account events
    pub const PASSWORD_CHANGED: &str = "password_changed";
    pub const ACCOUNT_UPDATED: &str = "account_updated";
    pub const DEVICE_REMOVED: &str = "device_removed";

    // Password reset events
    pub const PASSWORD_RESET_REQUESTED: &str = "password_reset_requested";
    pub const PASSWORD_RESET_TOKEN_VALIDATED: &str = "password_reset_token_validated";
    pub const PASSWORD_RESET_COMPLETED: &str = "password_reset_completed";
    pub const PASSWORD_RESET_FAILED: &str = "password_reset_failed";
    pub const PASSWORD_RESET_TOKEN_EXPIRED: &str = "password_reset_token_expired";
    pub const PASSWORD_RESET_TOKEN_INVALID: &str = "password_reset_token_invalid";
}
