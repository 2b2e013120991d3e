use schemars::JsonSchema;
use serde::Deserialize;

/// Request to create a new account.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SignUpRequest {
    /// Email address for the new account
    pub email: String,
    /// Password for the new account
    pub password: String,
}

/// Request to sign in with an existing account.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginRequest {
    /// Email address of the account
    pub email: String,
    /// Account password
    pub password: String,
}
