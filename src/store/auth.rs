//! Identity pass-through: sign-up, sign-in, sign-out, current-user.

use serde::Deserialize;

use super::StoreClient;
use crate::error::KudosError;

/// An authenticated session against the storage collaborator. The user id is
/// an opaque string owned by the identity provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Sign-up replies vary by provider config: with email confirmation enabled
/// only the user object comes back, with auto-confirm a full token does.
#[derive(Deserialize)]
struct SignUpResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
    // Confirmation-pending sign-ups return the user fields at the top level.
    id: Option<String>,
    email: Option<String>,
}

impl StoreClient {
    /// Register a new account. Returns a live session when the provider
    /// auto-confirms, `None` when email confirmation is pending.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, KudosError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(KudosError::Validation(
                "email and password must not be empty".to_string(),
            ));
        }

        let req = self.authed(
            self.http()
                .post(self.auth_url("signup"))
                .json(&serde_json::json!({"email": email, "password": password})),
            None,
        );
        let reply: SignUpResponse = self.send_json(req).await?;

        match (reply.access_token, reply.user) {
            (Some(access_token), Some(user)) => Ok(Some(Session {
                access_token,
                user_id: user.id,
                email: user.email,
            })),
            _ => {
                if reply.id.is_some() || reply.email.is_some() {
                    tracing::info!("sign-up accepted, confirmation pending");
                }
                Ok(None)
            }
        }
    }

    /// Exchange credentials for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, KudosError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(KudosError::Validation(
                "email and password must not be empty".to_string(),
            ));
        }

        let req = self.authed(
            self.http()
                .post(format!("{}?grant_type=password", self.auth_url("token")))
                .json(&serde_json::json!({"email": email, "password": password})),
            None,
        );
        let reply: TokenResponse = self.send_json(req).await?;

        Ok(Session {
            access_token: reply.access_token,
            user_id: reply.user.id,
            email: reply.user.email,
        })
    }

    /// Revoke the session's token. Best-effort: a failed revoke still ends
    /// the local session.
    pub async fn sign_out(&self, session: &Session) -> Result<(), KudosError> {
        let req = self.authed(self.http().post(self.auth_url("logout")), Some(session));
        self.send(req).await?;
        Ok(())
    }

    /// Fetch the user behind a session token.
    pub async fn current_user(&self, session: &Session) -> Result<AuthUser, KudosError> {
        let req = self.authed(self.http().get(self.auth_url("user")), Some(session));
        self.send_json(req).await
    }
}
