use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::models::Profile;
use crate::validation::rules::{validate_field, ValidationRule};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Result of validating every configured field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormValidation {
    pub errors: BTreeMap<String, String>,
    /// Same failures as `errors`, in field configuration order.
    pub list: Vec<FieldError>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.list.is_empty()
    }
}

#[derive(Debug, Clone)]
struct FieldConfig {
    field: String,
    label: String,
    rule: ValidationRule,
}

/// Whole-form validator with per-field "touched" tracking.
///
/// Errors for a field are only surfaced through [`FormValidator::visible_error`]
/// once that field has been touched; `validate_all` touches every field.
#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    fields: Vec<FieldConfig>,
    touched: HashSet<String>,
    errors: HashMap<String, String>,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: &str, label: &str, rule: ValidationRule) -> Self {
        self.fields.push(FieldConfig {
            field: field.to_string(),
            label: label.to_string(),
            rule,
        });
        self
    }

    /// Validates a single field and marks it touched.
    pub fn validate_one(&mut self, field: &str, value: &str) -> Option<String> {
        let config = self.fields.iter().find(|f| f.field == field)?;
        let result = validate_field(value, &config.rule, &config.label);
        self.touched.insert(field.to_string());
        match &result {
            Some(message) => self.errors.insert(field.to_string(), message.clone()),
            None => self.errors.remove(field),
        };
        result
    }

    /// Validates all configured fields against `values` (missing keys are blank)
    /// and marks every field touched.
    pub fn validate_all(&mut self, values: &HashMap<String, String>) -> FormValidation {
        let mut outcome = FormValidation::default();
        self.errors.clear();

        for config in &self.fields {
            let value = values.get(&config.field).map(String::as_str).unwrap_or("");
            self.touched.insert(config.field.clone());
            if let Some(message) = validate_field(value, &config.rule, &config.label) {
                self.errors.insert(config.field.clone(), message.clone());
                outcome.errors.insert(config.field.clone(), message.clone());
                outcome.list.push(FieldError {
                    field: config.field.clone(),
                    message,
                });
            }
        }
        outcome
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    /// The last error for `field`, only once it has been touched.
    pub fn visible_error(&self, field: &str) -> Option<&str> {
        if !self.is_touched(field) {
            return None;
        }
        self.errors.get(field).map(String::as_str)
    }

    /// Errors of every touched field, keyed by field.
    pub fn visible_errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|f| {
                self.visible_error(&f.field)
                    .map(|message| (f.field.clone(), message.to_string()))
            })
            .collect()
    }
}

/// Validator for the profile editor's fixed fields.
pub fn profile_validator() -> FormValidator {
    FormValidator::new()
        .field("name", "姓名", ValidationRule::new().required().max_length(50))
        .field("title", "职位", ValidationRule::new().max_length(50))
        .field("email", "邮箱", ValidationRule::new().email())
        .field("phone", "电话", ValidationRule::new().phone())
        .field("website", "个人网站", ValidationRule::new().url())
        .field("summary", "个人简介", ValidationRule::new().max_length(500))
}

/// Flattens the profile into the field map consumed by [`profile_validator`].
pub fn profile_values(profile: &Profile) -> HashMap<String, String> {
    let optional = [
        ("title", &profile.title),
        ("email", &profile.email),
        ("phone", &profile.phone),
        ("location", &profile.location),
        ("website", &profile.website),
        ("github", &profile.github),
        ("summary", &profile.summary),
    ];
    let mut values: HashMap<String, String> = optional
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect();
    values.insert("name".to_string(), profile.name.clone());
    values
}
