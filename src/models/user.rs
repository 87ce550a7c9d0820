use serde::{Deserialize, Serialize};
use validator::Validate;

pub type UserId = i64;

/// Role tier gating pages and actions.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    #[default]
    Agent,
    SuperAgent,
    Manager,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Agent => "Agent",
            Role::SuperAgent => "Super agent",
            Role::Manager => "Manager",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// "First Last" when both names are known, the username otherwise.
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if !first.is_empty() && !last.is_empty() {
            format!("{first} {last}")
        } else {
            self.username.clone()
        }
    }
}

/// Payload for `POST /auth/users/`.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 150, message = "Le nom d'utilisateur est obligatoire"))]
    pub username: String,
    #[validate(email(message = "Adresse e-mail invalide"))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "Le mot de passe est obligatoire"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
}

/// Partial payload for `PUT /auth/users/{id}/`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 150, message = "Le nom d'utilisateur est obligatoire"))]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Adresse e-mail invalide"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Serialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Un nom d'utilisateur est requis pour se connecter."))]
    pub username: String,
    #[validate(length(min = 1, message = "Un mot de passe est requis pour se connecter."))]
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Validate)]
pub struct PasswordReset {
    #[validate(length(min = 1, max = 128, message = "Le mot de passe est obligatoire"))]
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoleChange {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn user(first: &str, last: &str) -> User {
        User {
            id: 1,
            username: "jdoe".into(),
            first_name: first.into(),
            last_name: last.into(),
            email: "jdoe@example.com".into(),
            role: Role::Agent,
        }
    }

    #[test]
    fn display_name_needs_both_names() {
        assert_eq!(user("Jane", "Doe").display_name(), "Jane Doe");
        assert_eq!(user("Jane", "").display_name(), "jdoe");
        assert_eq!(user("", "").display_name(), "jdoe");
    }

    #[test]
    fn roles_use_backend_spelling() {
        assert_eq!(Role::SuperAgent.to_string(), "SUPER_AGENT");
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        let decoded: Role = serde_json::from_str("\"SUPER_AGENT\"").unwrap();
        assert_eq!(decoded, Role::SuperAgent);
    }

    #[test]
    fn new_user_validates_email() {
        let candidate = NewUser {
            username: "pdurand".into(),
            email: "not-an-email".into(),
            password: "secret".into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Agent,
        };
        assert!(candidate.validate().is_err());
    }
}
