use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkpost_core::{CursorKey, DomainResult, SoftDelete, UserId};

use crate::validate;

pub const USERNAME_MAX: usize = 30;
pub const BIO_MAX: usize = 200;
pub const PASSWORD_MIN: usize = 9;
pub const PASSWORD_MAX: usize = 32;

/// A stored user account.
///
/// The password hash never leaves the process: it is skipped when the record
/// is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for User {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl CursorKey for User {
    fn cursor_key(&self) -> i64 {
        self.id.get()
    }
}

/// Command: register a new account (signup, or admin-created user).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl RegisterUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate::email(&self.email)?;
        validate::between("password", &self.password, PASSWORD_MIN, PASSWORD_MAX)?;
        validate::required("username", &self.username, USERNAME_MAX)?;
        Ok(())
    }
}

/// Command: change profile fields of an existing account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

impl UpdateUser {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(username) = &self.username {
            validate::required("username", username, USERNAME_MAX)?;
        }
        if let Some(password) = &self.password {
            validate::between("password", password, PASSWORD_MIN, PASSWORD_MAX)?;
        }
        if let Some(bio) = &self.bio {
            validate::at_most("bio", bio, BIO_MAX)?;
        }
        Ok(())
    }
}

/// A validated account ready to be inserted (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// A validated set of profile changes (password already hashed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

impl User {
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) {
        if let Some(username) = changes.username {
            self.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(bio) = changes.bio {
            self.bio = Some(bio);
        }
        if let Some(profile_pic) = changes.profile_pic {
            self.profile_pic = Some(profile_pic);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpost_core::DomainError;

    fn register(email: &str, password: &str, username: &str) -> RegisterUser {
        RegisterUser {
            email: email.to_string(),
            password: password.to_string(),
            username: username.to_string(),
        }
    }

    #[test]
    fn registration_enforces_field_limits() {
        assert!(register("ada@example.com", "password123", "ada").validate().is_ok());

        let err = register("ada@example.com", "short", "ada").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "password", .. }));

        let long_name = "x".repeat(USERNAME_MAX + 1);
        let err = register("ada@example.com", "password123", &long_name)
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "username", .. }));

        let err = register("not-an-email", "password123", "ada").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "email", .. }));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(1),
            email: "ada@example.com".into(),
            username: "ada".into(),
            password_hash: "secret".into(),
            bio: None,
            profile_pic: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ada");
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("profilePic").is_some());
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let update = UpdateUser {
            bio: Some("x".repeat(BIO_MAX + 1)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateUser::default().validate().is_ok());
    }
}
