//! Read-only credential fixture shared by every scenario
//!
//! The fixture is loaded once per run and handed to each scenario behind an
//! `Arc`. Step values reference its fields with `${validUser.email}` style
//! placeholders, which are rendered just before a step is executed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{E2eError, E2eResult};

/// Named user records used across scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    /// Account that authenticates successfully
    pub valid_user: UserRecord,

    /// Account the site is guaranteed to reject
    pub invalid_user: UserRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub password: String,
    /// Display name shown in the account greeting
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey {
    ValidUser,
    InvalidUser,
}

impl UserKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKey::ValidUser => "validUser",
            UserKey::InvalidUser => "invalidUser",
        }
    }
}

impl std::str::FromStr for UserKey {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s {
            "validUser" => Ok(UserKey::ValidUser),
            "invalidUser" => Ok(UserKey::InvalidUser),
            other => Err(E2eError::Fixture(format!("Unknown fixture user: {}", other))),
        }
    }
}

fn email_shape() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"))
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{\s*([A-Za-z]+)\.([A-Za-z]+)\s*\}").expect("valid placeholder regex")
    })
}

/// Whether a string has the shape of an email address
pub fn is_email_shaped(value: &str) -> bool {
    email_shape().is_match(value)
}

impl Fixture {
    /// Parse a fixture from a JSON string and validate it
    pub fn from_json(json: &str) -> E2eResult<Self> {
        let fixture: Self = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Load a fixture from a JSON file
    pub fn load(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::Fixture(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn user(&self, key: UserKey) -> &UserRecord {
        match key {
            UserKey::ValidUser => &self.valid_user,
            UserKey::InvalidUser => &self.invalid_user,
        }
    }

    /// Check the invariants the scenarios rely on
    pub fn validate(&self) -> E2eResult<()> {
        for key in [UserKey::ValidUser, UserKey::InvalidUser] {
            let user = self.user(key);
            if !is_email_shaped(&user.email) {
                return Err(E2eError::Fixture(format!(
                    "{}.email is not a valid email address: {:?}",
                    key.as_str(),
                    user.email
                )));
            }
            if user.password.is_empty() {
                return Err(E2eError::Fixture(format!("{}.password is empty", key.as_str())));
            }
        }

        match self.valid_user.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(E2eError::Fixture("validUser.name is required".into())),
        }

        if self.valid_user.email.eq_ignore_ascii_case(&self.invalid_user.email) {
            return Err(E2eError::Fixture(
                "validUser and invalidUser must use different email addresses".into(),
            ));
        }

        Ok(())
    }

    /// Look up a single field, e.g. `("validUser", "email")`
    pub fn field(&self, user: &str, field: &str) -> E2eResult<&str> {
        let record = self.user(user.parse()?);
        match field {
            "email" => Ok(&record.email),
            "password" => Ok(&record.password),
            "name" => record
                .name
                .as_deref()
                .ok_or_else(|| E2eError::Fixture(format!("{}.name is not set", user))),
            other => Err(E2eError::Fixture(format!("Unknown fixture field: {}.{}", user, other))),
        }
    }

    /// Replace every `${user.field}` placeholder in `template`
    pub fn render(&self, template: &str) -> E2eResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in placeholder().captures_iter(template) {
            let whole = caps.get(0).expect("capture group 0 always exists");
            out.push_str(&template[last..whole.start()]);
            out.push_str(self.field(&caps[1], &caps[2])?);
            last = whole.end();
        }

        out.push_str(&template[last..]);
        Ok(out)
    }
}
