//! User directory use-cases (registration and lookup).
//!
//! # Invariants
//! - Usernames follow the `^[\w.@+-]+$` shape, at most 150 characters.
//! - Usernames are unique; a duplicate registration is a `Conflict`.

use crate::identity::{Actor, Identity, UserId};
use crate::model::validation::{require_max_chars, ValidationError};
use crate::repo::user_repo::UserRepository;
use crate::repo::RecordKind;
use crate::service::error::ContentError;
use crate::service::log_outcome;
use once_cell::sync::Lazy;
use regex::Regex;

const USERNAME_MAX_CHARS: usize = 150;
const EMAIL_MAX_CHARS: usize = 254;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Registration payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    /// Optional; empty string means "not provided".
    pub email: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::blank("username"));
        }
        require_max_chars("username", username, USERNAME_MAX_CHARS)?;
        if !USERNAME_RE.is_match(username) {
            return Err(ValidationError::new(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            ));
        }

        let email = self.email.trim();
        if !email.is_empty() {
            require_max_chars("email", email, EMAIL_MAX_CHARS)?;
            if !EMAIL_RE.is_match(email) {
                return Err(ValidationError::new("email", "Enter a valid email address."));
            }
        }
        Ok(())
    }
}

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn register_user(&self, user: &NewUser) -> Result<Actor, ContentError> {
        let result = user
            .validate()
            .map_err(ContentError::from)
            .and_then(|()| {
                Ok(self
                    .repo
                    .register_user(user.username.trim(), user.email.trim())?)
            });
        log_outcome(
            "user_register",
            &Identity::Anonymous,
            result.as_ref().ok().map(|actor| actor.id),
            &result,
        );
        result
    }

    pub fn get_user(&self, id: UserId) -> Result<Actor, ContentError> {
        self.repo.get_user(id)?.ok_or(ContentError::NotFound {
            kind: RecordKind::User,
            id,
        })
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<Actor>, ContentError> {
        Ok(self.repo.find_user_by_username(username.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::NewUser;

    #[test]
    fn username_shape_is_enforced() {
        NewUser::new("alice.b+1@x", "").validate().unwrap();
        assert_eq!(
            NewUser::new("has space", "").validate().unwrap_err().field,
            "username"
        );
        assert_eq!(
            NewUser::new("x".repeat(151), "").validate().unwrap_err().field,
            "username"
        );
        assert_eq!(NewUser::new("  ", "").validate().unwrap_err().field, "username");
    }

    #[test]
    fn email_is_optional_but_checked_when_present() {
        NewUser::new("bob", "bob@example.com").validate().unwrap();
        assert_eq!(
            NewUser::new("bob", "not-an-email").validate().unwrap_err().field,
            "email"
        );
    }
}
