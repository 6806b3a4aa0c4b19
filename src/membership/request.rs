use crate::error::AppError;
use crate::validation::{validate, Format, Rule};
use serde::Deserialize;
use std::fmt;

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

/// Sign-up form. The clear password never appears in Debug or Display output.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    #[serde(alias = "clearPassword")]
    pub password: String,
}

impl SignUpRequest {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        SignUpRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate(
            "username",
            Some(&self.username),
            &Rule::required().min_length(3).max_length(39).pattern(USERNAME_PATTERN),
        )?;
        validate(
            "email",
            Some(&self.email),
            &Rule::required().max_length(254).format(Format::Email),
        )?;
        validate(
            "password",
            Some(&self.password),
            &Rule::required().min_length(6).max_length(128),
        )?;
        Ok(())
    }
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignUpRequest[{}, {}]", self.username, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_request() {
        assert!(SignUpRequest::new("john.doe", "john@doe.com", "secret1").validate().is_ok());
    }

    #[test]
    fn rejects_bad_fields() {
        let bad = [
            SignUpRequest::new("jo", "john@doe.com", "secret1"),
            SignUpRequest::new("john doe", "john@doe.com", "secret1"),
            SignUpRequest::new("john", "not-an-email", "secret1"),
            SignUpRequest::new("john", "john@doe.com", "short"),
            SignUpRequest::new("john", "", "secret1"),
        ];
        for request in bad {
            assert!(matches!(request.validate(), Err(AppError::Validation(_))), "{}", request);
        }
    }

    #[test]
    fn hides_password() {
        let request = SignUpRequest::new("john", "john@doe.com", "hunter22");
        assert!(!format!("{:?} {}", request, request).contains("hunter22"));
    }

    #[test]
    fn deserializes_either_password_key() {
        let a: SignUpRequest =
            serde_json::from_str(r#"{"username":"john","email":"john@doe.com","password":"secret1"}"#).unwrap();
        let b: SignUpRequest =
            serde_json::from_str(r#"{"username":"john","email":"john@doe.com","clearPassword":"secret1"}"#).unwrap();
        assert_eq!(a.password, b.password);
    }
}
