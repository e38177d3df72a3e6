//! User accounts: value objects, entity, and the rules for registering and
//! updating them.
//!
//! Every rule reports through [`Outcome`], so a registration with a bad name,
//! a bad email and a weak password yields all three errors at once.

use chrono::{DateTime, Utc};

use cowork_core::{Combine, Entity, Error, Outcome, UserId, Validator, ValueObject};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Value objects
// ─────────────────────────────────────────────────────────────────────────────

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;
const EMAIL_LOCAL_MAX: usize = 64;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

/// Display name of a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonName(String);

impl PersonName {
    pub fn parse(raw: &str) -> Outcome<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(Error::validation("User.NameEmpty", "name is required").into());
        }

        let len = name.chars().count();
        let mut v = Validator::new();
        v.ensure((NAME_MIN..=NAME_MAX).contains(&len), || {
            Error::validation(
                "User.NameLength",
                format!("name must be between {NAME_MIN} and {NAME_MAX} characters"),
            )
        });
        v.ensure(
            name.chars()
                .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.')),
            || {
                Error::validation(
                    "User.NameCharacters",
                    "name may only contain letters, spaces, hyphens, apostrophes and dots",
                )
            },
        );
        v.finish_with(Self(name.to_string()))
    }
}

impl ValueObject for PersonName {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalized (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Outcome<Self> {
        let email = raw.trim().to_lowercase();
        if is_well_formed_email(&email) {
            Ok(Self(email))
        } else {
            Err(Error::validation(
                "Email.InvalidFormat",
                format!("'{}' is not a valid email address", raw.trim()),
            )
            .into())
        }
    }
}

impl ValueObject for Email {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_well_formed_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.len() <= EMAIL_LOCAL_MAX
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));

    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}

/// A plain-text password that satisfies the credential rules.
///
/// Only lives long enough to be hashed; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn parse(raw: &str) -> Outcome<Self> {
        let len = raw.chars().count();
        let mut v = Validator::new();
        v.ensure(len >= PASSWORD_MIN, || {
            Error::validation(
                "Password.TooShort",
                format!("password must be at least {PASSWORD_MIN} characters"),
            )
        })
        .ensure(len <= PASSWORD_MAX, || {
            Error::validation(
                "Password.TooLong",
                format!("password must be at most {PASSWORD_MAX} characters"),
            )
        })
        .ensure(raw.chars().any(char::is_uppercase), || {
            Error::validation("Password.MissingUppercase", "password needs an uppercase letter")
        })
        .ensure(raw.chars().any(char::is_lowercase), || {
            Error::validation("Password.MissingLowercase", "password needs a lowercase letter")
        })
        .ensure(raw.chars().any(|c| c.is_ascii_digit()), || {
            Error::validation("Password.MissingDigit", "password needs a digit")
        });
        v.finish_with(Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Password(***)")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error catalogue for user operations.
pub struct UserErrors;

impl UserErrors {
    pub fn not_found(id: UserId) -> Error {
        Error::not_found("User.NotFound", format!("user {id} does not exist"))
    }

    pub fn email_taken(email: &Email) -> Error {
        Error::conflict("User.EmailTaken", format!("email '{email}' is already registered"))
    }

    pub fn invalid_credentials() -> Error {
        Error::unauthorized("Auth.InvalidCredentials", "email or password is incorrect")
    }

    pub fn cannot_change_role() -> Error {
        Error::forbidden("User.RoleChangeForbidden", "only administrators can change roles")
    }

    pub fn empty_update() -> Error {
        Error::validation("User.EmptyUpdate", "at least one field must be provided")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// A registered user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: PersonName,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    const KIND: &'static str = "User";
}

/// Raw registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration input that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub name: PersonName,
    pub email: Email,
    pub password: Password,
}

impl NewUser {
    pub fn validate(&self) -> Outcome<ValidatedRegistration> {
        let (name, email, password) = (
            PersonName::parse(&self.name),
            Email::parse(&self.email),
            Password::parse(&self.password),
        )
            .combine()?;
        Ok(ValidatedRegistration {
            name,
            email,
            password,
        })
    }
}

/// Raw partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Partial update that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUserChanges {
    pub name: Option<PersonName>,
    pub email: Option<Email>,
    pub password: Option<Password>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }

    pub fn validate(&self) -> Outcome<ValidatedUserChanges> {
        if self.is_empty() {
            return Err(UserErrors::empty_update().into());
        }
        let (name, email, password) = (
            self.name.as_deref().map(PersonName::parse).transpose(),
            self.email.as_deref().map(Email::parse).transpose(),
            self.password.as_deref().map(Password::parse).transpose(),
        )
            .combine()?;
        Ok(ValidatedUserChanges {
            name,
            email,
            password,
            role: self.role,
        })
    }
}

impl User {
    pub fn register(
        id: UserId,
        registration: ValidatedRegistration,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: registration.name,
            email: registration.email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Return the updated copy. `password_hash` replaces the stored hash when given.
    pub fn apply_changes(
        &self,
        changes: ValidatedUserChanges,
        password_hash: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: self.id,
            name: changes.name.unwrap_or_else(|| self.name.clone()),
            email: changes.email.unwrap_or_else(|| self.email.clone()),
            password_hash: password_hash.unwrap_or_else(|| self.password_hash.clone()),
            role: changes.role.unwrap_or(self.role),
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cowork_core::{ErrorCategory, OutcomeExt};
    use proptest::prelude::*;

    fn codes<T: core::fmt::Debug>(outcome: &Outcome<T>) -> Vec<String> {
        outcome.errors().iter().map(|e| e.code().to_string()).collect()
    }

    fn registration() -> ValidatedRegistration {
        NewUser {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "Analytical1".to_string(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn email_is_normalized() {
        let email = Email::parse("  Ada@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in [
            "",
            "plain",
            "@example.com",
            "ada@",
            "ada@example",
            "ada@@example.com",
            "ada@exa mple.com",
            ".ada@example.com",
            "ada..l@example.com",
            "ada@-example.com",
            "ada@example..com",
        ] {
            let outcome = Email::parse(raw);
            assert_eq!(codes(&outcome), vec!["Email.InvalidFormat"], "input: {raw:?}");
        }
    }

    #[test]
    fn names_are_trimmed_and_checked() {
        assert_eq!(PersonName::parse("  Grace Hopper ").unwrap().as_str(), "Grace Hopper");
        assert_eq!(codes(&PersonName::parse("   ")), vec!["User.NameEmpty"]);
        assert_eq!(codes(&PersonName::parse("X")), vec!["User.NameLength"]);
        assert_eq!(codes(&PersonName::parse("R2")), vec!["User.NameCharacters"]);
        assert_eq!(
            codes(&PersonName::parse("7")),
            vec!["User.NameLength", "User.NameCharacters"]
        );
        assert!(PersonName::parse("Jean-Luc O'Neil Jr.").is_ok());
    }

    #[test]
    fn password_reports_every_broken_rule() {
        let outcome = Password::parse("abc");
        assert_eq!(
            codes(&outcome),
            vec!["Password.TooShort", "Password.MissingUppercase", "Password.MissingDigit"]
        );
        assert!(Password::parse("Abcdefg1").is_ok());
        assert_eq!(
            codes(&Password::parse(&format!("A1{}", "a".repeat(127)))),
            vec!["Password.TooLong"]
        );
    }

    #[test]
    fn password_debug_is_redacted() {
        let password = Password::parse("Secret123").unwrap();
        assert_eq!(format!("{password:?}"), "Password(***)");
    }

    #[test]
    fn registration_accumulates_all_field_errors() {
        let outcome = NewUser {
            name: "".to_string(),
            email: "nope".to_string(),
            password: "short".to_string(),
        }
        .validate();

        let errors = outcome.unwrap_err();
        assert!(errors.errors().iter().all(|e| e.category() == ErrorCategory::Validation));
        let codes: Vec<&str> = errors.errors().iter().map(|e| e.code()).collect();
        assert_eq!(codes[0], "User.NameEmpty");
        assert_eq!(codes[1], "Email.InvalidFormat");
        assert!(codes.contains(&"Password.TooShort"));
    }

    #[test]
    fn empty_changes_are_rejected() {
        let outcome = UserChanges::default().validate();
        assert_eq!(outcome.first_error(), UserErrors::empty_update());
    }

    #[test]
    fn changes_validate_only_present_fields() {
        let changes = UserChanges {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.email.unwrap().as_str(), "new@example.com");
        assert!(changes.name.is_none());

        let bad = UserChanges {
            name: Some("X".to_string()),
            password: Some("weak".to_string()),
            ..Default::default()
        }
        .validate();
        assert!(codes(&bad).contains(&"User.NameLength".to_string()));
        assert!(codes(&bad).contains(&"Password.TooShort".to_string()));
    }

    #[test]
    fn apply_changes_keeps_untouched_fields() {
        let created = Utc::now();
        let user = User::register(UserId::new(), registration(), "hash".to_string(), Role::Member, created);

        let changes = UserChanges {
            name: Some("Augusta King".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let later = created + chrono::Duration::seconds(5);
        let updated = user.apply_changes(changes, None, later);

        assert_eq!(updated.name.as_str(), "Augusta King");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.password_hash, "hash");
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, later);
    }

    proptest! {
        /// Property: generated well-formed addresses are accepted and lowercased.
        #[test]
        fn well_formed_emails_parse(
            local in "[a-zA-Z0-9]{1,20}",
            domain in "[a-z0-9]{1,15}",
            tld in "[a-z]{2,6}",
        ) {
            let raw = format!("{local}@{domain}.{tld}");
            let email = Email::parse(&raw).unwrap();
            prop_assert_eq!(email.as_str(), raw.to_lowercase());
        }

        /// Property: any embedded whitespace makes an address invalid.
        #[test]
        fn whitespace_is_never_accepted(
            local in "[a-z]{1,10}",
            ws in prop_oneof![Just(' '), Just('\t')],
        ) {
            let raw = format!("{local}{ws}x@example.com");
            prop_assert!(Email::parse(&raw).is_err());
        }
    }
}
