use std::path::{Path, PathBuf};

use garde::Validate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::session::{LoginRequest, RegisterRequest, User};

/// Explicit session object for the signed-in user.
///
/// Loaded once at startup (empty when nothing is persisted), mutated by the
/// mock sign-in flows and cleared on logout. Authentication is simulated:
/// credentials are only checked for shape.
pub struct SessionStore {
    path: PathBuf,
    user: RwLock<Option<User>>,
}

impl SessionStore {
    /// Read the persisted user from `path`, or start empty.
    pub async fn load_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let user = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<User>(&bytes) {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "Restored persisted session");
                    Some(user)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read session file");
                None
            }
        };

        Self {
            path,
            user: RwLock::new(user),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Sign in with email and password. The user name is the email's local part.
    pub async fn login_with_email(&self, request: &LoginRequest) -> Result<User, SessionError> {
        request.validate()?;
        let name = request
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        let user = User {
            id: mock_id("email"),
            name,
            email: request.email.clone(),
            photo_url: None,
        };
        self.establish(user).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
        request.validate()?;
        let user = User {
            id: mock_id("email"),
            name: request.name.trim().to_string(),
            email: request.email.clone(),
            photo_url: None,
        };
        self.establish(user).await
    }

    /// Sign in through the mocked third-party identity provider.
    pub async fn login_with_provider(&self) -> Result<User, SessionError> {
        let user = User {
            id: mock_id("google"),
            name: "Google User".to_string(),
            email: "google.user@example.com".to_string(),
            photo_url: Some("https://via.placeholder.com/150".to_string()),
        };
        self.establish(user).await
    }

    /// Clear the session in memory and on disk.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut user = self.user.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SessionError::Io(e)),
        }
        if let Some(previous) = user.take() {
            tracing::info!(user_id = %previous.id, "Session cleared");
        }
        Ok(())
    }

    async fn establish(&self, user: User) -> Result<User, SessionError> {
        let mut current = self.user.write().await;
        let payload = serde_json::to_vec_pretty(&user)?;
        tokio::fs::write(&self.path, payload).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Session established");
        *current = Some(user.clone());
        Ok(user)
    }
}

fn mock_id(provider: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}", provider, &random[..11])
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid credentials: {0}")]
    Invalid(#[from] garde::Report),

    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load_or_empty(dir.path().join("session.json")).await;
        assert!(!store.is_authenticated().await);
        assert!(store.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_login_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::load_or_empty(&path).await;
        let user = store
            .login_with_email(&login("ada@example.com", "secret"))
            .await
            .unwrap();
        assert_eq!(user.name, "ada");
        assert!(user.id.starts_with("email-"));
        assert!(store.is_authenticated().await);

        let reloaded = SessionStore::load_or_empty(&path).await;
        assert_eq!(reloaded.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn test_invalid_credentials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load_or_empty(dir.path().join("session.json")).await;

        let err = store
            .login_with_email(&login("not-an-email", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));

        let err = store
            .login_with_email(&login("ada@example.com", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_register_uses_given_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load_or_empty(dir.path().join("session.json")).await;
        let user = store
            .register(&RegisterRequest {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load_or_empty(dir.path().join("session.json")).await;
        let err = store
            .register(&RegisterRequest {
                name: "   ".to_string(),
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_provider_login_and_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::load_or_empty(&path).await;

        let user = store.login_with_provider().await.unwrap();
        assert!(user.id.starts_with("google-"));
        assert!(path.exists());

        store.logout().await.unwrap();
        assert!(!store.is_authenticated().await);
        assert!(!path.exists());

        // Logging out twice is harmless.
        store.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = SessionStore::load_or_empty(&path).await;
        assert!(!store.is_authenticated().await);
    }
}
