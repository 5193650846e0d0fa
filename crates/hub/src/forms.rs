//! Signup form checks. Nothing is stored; a form that passes is only logged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupError {
    EmailMissing,
    EmailMalformed,
    PasswordMissing,
    PasswordMismatch,
}

impl SignupError {
    pub fn message(self) -> &'static str {
        match self {
            Self::EmailMissing => "email is required",
            Self::EmailMalformed => "email must contain '@'",
            Self::PasswordMissing => "password is required",
            Self::PasswordMismatch => "passwords do not match",
        }
    }
}

/// Check a signup form, returning every problem found.
pub fn validate_signup(form: &SignupForm) -> Result<(), Vec<SignupError>> {
    let mut errors = Vec::new();

    let email = form.email.trim();
    if email.is_empty() {
        errors.push(SignupError::EmailMissing);
    } else if !email.contains('@') {
        errors.push(SignupError::EmailMalformed);
    }

    if form.password.is_empty() {
        errors.push(SignupError::PasswordMissing);
    } else if form.password != form.confirm_password {
        errors.push(SignupError::PasswordMismatch);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
