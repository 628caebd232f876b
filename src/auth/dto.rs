use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Stored as text; no admin-only behavior is wired up yet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned after registration.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// User projection returned on login, role included.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_user() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"bob","email":"bob@x.com","password":"Passw0rd"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::User);
    }

    #[test]
    fn public_user_never_carries_a_password_field() {
        let json = serde_json::to_string(&PublicUser {
            id: Uuid::new_v4(),
            username: "bob".into(),
            email: "bob@x.com".into(),
        })
        .unwrap();
        assert!(!json.contains("password"));
    }
}
