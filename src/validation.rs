use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::constants::*;
use crate::error::ValidationError;
use crate::utils::parse_date;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s+-]+$").expect("valid phone regex"));

/// Submitted form fields, as posted by a panel form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FormData(HashMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Trimmed value, empty when absent.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(|v| v.trim()).unwrap_or("")
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        let value = self.get(name);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn required(&self, name: &str, label: &str) -> Result<String, ValidationError> {
        self.optional(name)
            .ok_or_else(|| ValidationError::new(name, format!("{} is required", label)))
    }

    pub fn number(&self, name: &str, label: &str) -> Result<f64, ValidationError> {
        let raw = self.required(name, label)?;
        parse_number(&raw)
            .ok_or_else(|| ValidationError::new(name, format!("{} must be a valid number", label)))
    }

    pub fn optional_number(&self, name: &str, label: &str) -> Result<Option<f64>, ValidationError> {
        match self.optional(name) {
            None => Ok(None),
            Some(raw) => parse_number(&raw).map(Some).ok_or_else(|| {
                ValidationError::new(name, format!("{} must be a valid number", label))
            }),
        }
    }

    pub fn positive_number(&self, name: &str, label: &str) -> Result<f64, ValidationError> {
        let value = self.number(name, label)?;
        if value <= 0.0 {
            return Err(ValidationError::new(
                name,
                format!("{} must be greater than 0", label),
            ));
        }
        Ok(value)
    }

    pub fn non_negative_number(&self, name: &str, label: &str) -> Result<f64, ValidationError> {
        let value = self.number(name, label)?;
        if value < 0.0 {
            return Err(ValidationError::new(
                name,
                format!("{} cannot be negative", label),
            ));
        }
        Ok(value)
    }

    pub fn date(&self, name: &str, label: &str) -> Result<String, ValidationError> {
        let raw = self.required(name, label)?;
        if parse_date(&raw).is_none() {
            return Err(ValidationError::new(
                name,
                format!("{} must be a date (YYYY-MM-DD)", label),
            ));
        }
        Ok(raw)
    }

    pub fn email(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.optional(name) {
            Some(email) if !EMAIL_RE.is_match(&email) => {
                Err(ValidationError::new(name, ERR_INVALID_EMAIL))
            }
            other => Ok(other),
        }
    }

    pub fn phone(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.optional(name) {
            Some(phone) if !PHONE_RE.is_match(&phone) => {
                Err(ValidationError::new(name, ERR_INVALID_PHONE))
            }
            other => Ok(other),
        }
    }

    /// Value restricted to one of the known choices.
    pub fn choice(
        &self,
        name: &str,
        label: &str,
        choices: &[(&str, &str)],
    ) -> Result<String, ValidationError> {
        let value = self.required(name, label)?;
        if choices.iter().any(|(key, _)| *key == value) {
            Ok(value)
        } else {
            Err(ValidationError::new(
                name,
                format!("{} has an unknown value '{}'", label, value),
            ))
        }
    }

    /// Whether the user confirmed the action (`confirm=yes`).
    pub fn confirmed(&self) -> bool {
        self.get("confirm") == "yes"
    }
}

impl From<HashMap<String, String>> for FormData {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
