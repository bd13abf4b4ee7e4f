use crate::auth::hash_token;
use crate::config::SessionConfig;
use crate::database::session::SessionRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::user::{LoginRequest, RegisterRequest, SessionUserResponse, User};
use chrono::{Duration, Utc};
use tracing::info;

/// Session controller: exchanges provider identities for application
/// profiles, issues and revokes bearer tokens. The only writer of session
/// state.
pub struct AuthService<'a, R> {
    repo: &'a R,
    session_config: &'a SessionConfig,
}

/// Generate a session token (64 hex characters) together with the SHA-256
/// digest that gets stored. The plaintext token leaves the process exactly
/// once, in the login response.
pub(crate) fn generate_session_token() -> (String, String) {
    let mut rng = rand::thread_rng();
    let mut token_bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rng, &mut token_bytes);
    let token = hex::encode(token_bytes);
    let token_hash = hash_token(&token);
    (token, token_hash)
}

impl<'a, R: UserRepository + SessionRepository> AuthService<'a, R> {
    pub fn new(repo: &'a R, session_config: &'a SessionConfig) -> Self {
        Self { repo, session_config }
    }

    /// Register the application profile for an identity the external
    /// provider has already created.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        if self.repo.get_user_by_uid(&request.uid).await?.is_some() {
            return Err(AppError::UserAlreadyExists(request.email.clone()));
        }
        if self.repo.get_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::UserAlreadyExists(request.email.clone()));
        }

        let user = self.repo.create_user(request).await?;
        info!(user_id = %user.id, "registered new user");
        Ok(user)
    }

    /// Identity exchange: resolve the provider identity to the registered
    /// profile and issue a session token. Fails closed — an unknown uid or a
    /// uid/email mismatch never yields a session.
    pub async fn login(&self, request: &LoginRequest, user_agent: Option<&str>) -> Result<SessionUserResponse, AppError> {
        let user = self.repo.get_user_by_uid(&request.uid).await?.ok_or(AppError::InvalidCredentials)?;

        if !user.email.eq_ignore_ascii_case(&request.email) {
            return Err(AppError::InvalidCredentials);
        }

        let (token, token_hash) = generate_session_token();
        let expires_at = Utc::now() + Duration::hours(self.session_config.ttl_hours);
        self.repo.create_session(&user.id, &token_hash, expires_at, user_agent).await?;

        info!(user_id = %user.id, role = %user.role, "session issued");
        Ok(SessionUserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        })
    }

    /// Revoke the session behind `token`. Idempotent: a missing or unknown
    /// token is still a successful logout.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AppError> {
        if let Some(token) = token {
            self.repo.delete_session_by_token_hash(&hash_token(token)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::test_utils::MockRepository;

    fn session_config() -> SessionConfig {
        SessionConfig { ttl_hours: 24 }
    }

    #[test]
    fn generated_tokens_are_hex_and_unique() {
        let (token, token_hash) = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token_hash.len(), 64);

        let (other, _) = generate_session_token();
        assert_ne!(token, other);
    }

    #[rocket::async_test]
    async fn login_fails_closed_for_unknown_uid() {
        let repo = MockRepository::default();
        let config = session_config();
        let service = AuthService::new(&repo, &config);

        let result = service
            .login(
                &LoginRequest {
                    uid: "missing".to_string(),
                    email: "ghost@example.com".to_string(),
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
        assert_eq!(repo.session_count(), 0);
    }

    #[rocket::async_test]
    async fn login_fails_closed_on_email_mismatch() {
        let repo = MockRepository::default();
        repo.seed_user("ext-1", "Ada Lovelace", "ada@example.com", Role::Customer);
        let config = session_config();
        let service = AuthService::new(&repo, &config);

        let result = service
            .login(
                &LoginRequest {
                    uid: "ext-1".to_string(),
                    email: "mallory@example.com".to_string(),
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
        assert_eq!(repo.session_count(), 0);
    }

    #[rocket::async_test]
    async fn login_issues_token_for_matching_identity() {
        let repo = MockRepository::default();
        repo.seed_user("ext-1", "Ada Lovelace", "ada@example.com", Role::Admin);
        let config = session_config();
        let service = AuthService::new(&repo, &config);

        let response = service
            .login(
                &LoginRequest {
                    uid: "ext-1".to_string(),
                    email: "ada@example.com".to_string(),
                },
                Some("test-agent"),
            )
            .await
            .expect("login succeeds");

        assert_eq!(response.role, Role::Admin);
        assert_eq!(response.token.len(), 64);
        assert_eq!(repo.session_count(), 1);
    }

    #[rocket::async_test]
    async fn logout_is_idempotent() {
        let repo = MockRepository::default();
        let config = session_config();
        let service = AuthService::new(&repo, &config);

        assert!(service.logout(None).await.is_ok());
        assert!(service.logout(Some("never-issued")).await.is_ok());
    }

    #[rocket::async_test]
    async fn register_rejects_duplicate_uid() {
        let repo = MockRepository::default();
        repo.seed_user("ext-1", "Ada Lovelace", "ada@example.com", Role::Customer);
        let config = session_config();
        let service = AuthService::new(&repo, &config);

        let result = service
            .register(&RegisterRequest {
                uid: "ext-1".to_string(),
                name: "Someone Else".to_string(),
                email: "other@example.com".to_string(),
                phone_number: "0123456789".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::UserAlreadyExists(_))));
    }
}
