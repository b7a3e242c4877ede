//! Request body validation: per-field rules, immutable identifiers, typed parsing.

use crate::error::AppError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: Option<bool>,
    pub format: Option<String>,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
}

/// Field rules for one request shape, checked in declaration order.
pub type RuleSet = Vec<(&'static str, ValidationRule)>;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against per-field rules. All required fields must be present.
    pub fn validate(body: &Map<String, Value>, rules: &RuleSet) -> Result<(), AppError> {
        for (field, rule) in rules {
            let val = body.get(*field);
            if rule.required == Some(true) && (val.is_none() || val == Some(&Value::Null)) {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
            if let Some(v) = val {
                validate_field(field, v, rule)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for PATCH). Required is not enforced.
    pub fn validate_partial(body: &Map<String, Value>, rules: &RuleSet) -> Result<(), AppError> {
        for (field, rule) in rules {
            if let Some(v) = body.get(*field) {
                validate_field(field, v, rule)?;
            }
        }
        Ok(())
    }

    /// Reject any attempt to change an identifier through an update body.
    pub fn reject_immutable(body: &Map<String, Value>, immutable: &[&str]) -> Result<(), AppError> {
        match immutable.iter().find(|f| body.contains_key(**f)) {
            Some(f) => Err(AppError::Validation(format!("{} cannot be changed", f))),
            None => Ok(()),
        }
    }

    /// Deserialize a validated body into its typed shape. Type mismatches and unknown
    /// fields surface as validation errors.
    pub fn parse<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T, AppError> {
        serde_json::from_value(Value::Object(body)).map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// Body must be a JSON object.
pub fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn validate_field(field: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        if rule.required == Some(true) {
            return Err(AppError::Validation(format!("{} cannot be null", field)));
        }
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(field, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    field, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    field, min
                )));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", field)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", field)));
            }
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", field, min)));
            }
        }
    }
    if let Some(max) = rule.exclusive_maximum {
        if let Some(n) = v.as_f64() {
            if n >= max {
                return Err(AppError::Validation(format!("{} must be less than {}", field, max)));
            }
        }
    }
    Ok(())
}

fn validate_format(field: &str, v: &Value, format: &str) -> Result<(), AppError> {
    match format.to_lowercase().as_str() {
        "uri" => {
            if let Some(s) = v.as_str() {
                if url::Url::parse(s).is_err() {
                    return Err(AppError::Validation(format!("{} must be a valid URL", field)));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn required() -> ValidationRule {
    ValidationRule {
        required: Some(true),
        min_length: Some(1),
        ..Default::default()
    }
}

fn not_null() -> ValidationRule {
    ValidationRule {
        required: Some(true),
        ..Default::default()
    }
}

fn handle_rule() -> ValidationRule {
    ValidationRule {
        required: Some(true),
        min_length: Some(1),
        max_length: Some(25),
        pattern: Some("^[a-z0-9][a-z0-9_-]*$".into()),
        ..Default::default()
    }
}

fn non_negative() -> ValidationRule {
    ValidationRule {
        minimum: Some(0.0),
        ..Default::default()
    }
}

fn logo_url() -> ValidationRule {
    ValidationRule {
        format: Some("uri".into()),
        ..Default::default()
    }
}

fn equity() -> ValidationRule {
    ValidationRule {
        minimum: Some(0.0),
        exclusive_maximum: Some(1.0),
        ..Default::default()
    }
}

pub fn company_new_rules() -> RuleSet {
    vec![
        ("handle", handle_rule()),
        ("name", required()),
        ("description", not_null()),
        ("numEmployees", non_negative()),
        ("logoUrl", logo_url()),
    ]
}

/// Required fields in an update must not be nulled when present.
pub fn company_update_rules() -> RuleSet {
    vec![
        ("name", required()),
        ("description", not_null()),
        ("numEmployees", non_negative()),
        ("logoUrl", logo_url()),
    ]
}

pub fn job_new_rules() -> RuleSet {
    vec![
        ("title", required()),
        ("salary", non_negative()),
        ("equity", equity()),
        ("companyHandle", handle_rule()),
    ]
}

pub fn job_update_rules() -> RuleSet {
    vec![
        ("title", required()),
        ("salary", non_negative()),
        ("equity", equity()),
    ]
}
