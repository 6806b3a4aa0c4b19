//! Field validation rules for required text, lengths, patterns and formats.

use crate::error::AppError;
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
}

#[derive(Clone, Debug, Default)]
pub struct Rule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
    pub format: Option<Format>,
}

impl Rule {
    pub fn required() -> Self {
        Rule {
            required: true,
            ..Rule::default()
        }
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Validate one field. Blank counts as missing.
pub fn validate(field: &str, value: Option<&str>, rule: &Rule) -> Result<(), AppError> {
    let value = value.filter(|v| !v.trim().is_empty());
    let Some(v) = value else {
        if rule.required {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
        return Ok(());
    };
    if let Some(format) = rule.format {
        validate_format(field, v, format)?;
    }
    let len = v.chars().count();
    if let Some(max) = rule.max_length {
        if len > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    if let Some(min) = rule.min_length {
        if len < min {
            return Err(AppError::Validation(format!(
                "{} must be at least {} characters",
                field, min
            )));
        }
    }
    if let Some(pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Internal(format!("invalid pattern for {}", field)))?;
        if !re.is_match(v) {
            return Err(AppError::Validation(format!("{} does not match required pattern", field)));
        }
    }
    Ok(())
}

/// Required non-blank text; returns the value for use in constructors.
pub fn require_text(field: &str, value: String) -> Result<String, AppError> {
    validate(field, Some(&value), &Rule::required())?;
    Ok(value)
}

fn validate_format(field: &str, v: &str, format: Format) -> Result<(), AppError> {
    match format {
        Format::Email => {
            let valid = v
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
                .unwrap_or(false);
            if !valid {
                return Err(AppError::Validation(format!("{} must be a valid email", field)));
            }
        }
    }
    Ok(())
}
