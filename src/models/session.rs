use garde::Validate;
use serde::{Deserialize, Serialize};

/// Signed-in user held by the session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Email/password sign-in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,

    #[garde(length(min = 1, max = 200))]
    pub password: String,
}

/// Account registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 100), custom(not_blank))]
    pub name: String,

    #[garde(email)]
    pub email: String,

    #[garde(length(min = 1, max = 200))]
    pub password: String,
}

fn not_blank(value: &str, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

/// Session view returned to clients.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub is_authenticated: bool,
    pub user: Option<User>,
}
