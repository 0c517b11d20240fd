//! Types for authentication and user management

use serde::{Deserialize, Serialize};

/// User data returned by the identity endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: i64,

    /// The user's email address, used to log in
    pub email: String,

    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,

    /// The creation time, as sent by the server
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Response of the login and register endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token
    pub access_token: String,

    /// The authenticated user
    pub user: User,
}

/// Login request body
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Register request body
#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

/// User attributes that can be updated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserUpdate {
    /// Set the display name
    pub fn with_full_name(mut self, value: &str) -> Self {
        self.full_name = Some(value.to_string());
        self
    }

    /// Set the email address
    pub fn with_email(mut self, value: &str) -> Self {
        self.email = Some(value.to_string());
        self
    }

    /// True if no attribute is set
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_update_serializes_only_set_fields() {
        let update = UserUpdate::default().with_full_name("New Name");
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"full_name": "New Name"}));
        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let user: User = serde_json::from_value(json!({"id": 7, "email": "a@b.co"})).unwrap();
        assert_eq!(user.full_name, None);
        assert_eq!(user.display_name(), "a@b.co");
    }
}
