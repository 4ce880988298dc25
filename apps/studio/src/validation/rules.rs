//! Field-level validation.
//!
//! Rules are evaluated in a fixed order and the first failure wins:
//! required → minLength → maxLength → email → phone → url → pattern → custom.
//! Messages are user-facing and stay stable for a given input.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Mainland mobile numbers: 11 digits starting with 1[3-9].
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid phone regex"));

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?([\w-]+\.)+[\w-]+(:\d+)?(/[^\s]*)?$").expect("valid url regex")
});

pub type CustomCheck = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration for one field. Every option is off by default.
#[derive(Clone, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub email: bool,
    pub phone: bool,
    pub url: bool,
    pub pattern: Option<(Regex, String)>,
    pub custom: Option<CustomCheck>,
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("url", &self.url)
            .field("pattern", &self.pattern.as_ref().map(|(re, _)| re.as_str()))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl ValidationRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn phone(mut self) -> Self {
        self.phone = true;
        self
    }

    pub fn url(mut self) -> Self {
        self.url = true;
        self
    }

    /// Custom matcher; `message` is returned when the value does not match.
    pub fn pattern(mut self, re: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some((re, message.into()));
        self
    }

    /// Arbitrary check run last. It only runs on non-blank input.
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(check));
        self
    }
}

/// Validates `value` against `rule`, returning the first failing message.
///
/// A blank value that is not `required` passes: the format rules only apply
/// once something has been entered.
pub fn validate_field(value: &str, rule: &ValidationRule, label: &str) -> Option<String> {
    let trimmed = value.trim();

    if rule.required && trimmed.is_empty() {
        return Some(format!("{label}不能为空"));
    }
    if trimmed.is_empty() {
        return None;
    }

    let len = trimmed.chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return Some(format!("{label}至少需要{min}个字符"));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Some(format!("{label}不能超过{max}个字符"));
        }
    }
    if rule.email && !EMAIL_RE.is_match(trimmed) {
        return Some("请输入有效的邮箱地址".to_string());
    }
    if rule.phone && !PHONE_RE.is_match(trimmed) {
        return Some("请输入有效的手机号码".to_string());
    }
    if rule.url && !URL_RE.is_match(trimmed) {
        return Some("请输入有效的网址".to_string());
    }
    if let Some((re, message)) = &rule.pattern {
        if !re.is_match(trimmed) {
            return Some(if message.is_empty() {
                format!("{label}格式不正确")
            } else {
                message.clone()
            });
        }
    }
    if let Some(check) = &rule.custom {
        return check(value);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_empty() {
        let rule = ValidationRule::new().required();
        assert_eq!(
            validate_field("", &rule, "姓名"),
            Some("姓名不能为空".to_string())
        );
        assert_eq!(
            validate_field("   ", &rule, "姓名"),
            Some("姓名不能为空".to_string())
        );
    }

    #[test]
    fn test_email_format() {
        let rule = ValidationRule::new().email();
        assert_eq!(
            validate_field("abc@", &rule, "邮箱"),
            Some("请输入有效的邮箱地址".to_string())
        );
        assert_eq!(validate_field("abc@example.com", &rule, "邮箱"), None);
    }

    #[test]
    fn test_phone_format() {
        let rule = ValidationRule::new().phone();
        assert!(validate_field("12345", &rule, "电话").is_some());
        assert!(validate_field("12800138000", &rule, "电话").is_some());
        assert_eq!(validate_field("13800138000", &rule, "电话"), None);
    }

    #[test]
    fn test_url_format() {
        let rule = ValidationRule::new().url();
        assert!(validate_field("not a url", &rule, "网站").is_some());
        assert_eq!(validate_field("https://example.com/me", &rule, "网站"), None);
        assert_eq!(validate_field("github.com/liming", &rule, "网站"), None);
    }

    #[test]
    fn test_blank_optional_value_passes_format_rules() {
        let rule = ValidationRule::new().email().min_length(5);
        assert_eq!(validate_field("", &rule, "邮箱"), None);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let rule = ValidationRule::new().min_length(2).max_length(3);
        assert_eq!(validate_field("李明", &rule, "姓名"), None);
        assert_eq!(
            validate_field("李", &rule, "姓名"),
            Some("姓名至少需要2个字符".to_string())
        );
        assert_eq!(
            validate_field("欧阳明日", &rule, "姓名"),
            Some("姓名不能超过3个字符".to_string())
        );
    }

    #[test]
    fn test_first_failure_wins() {
        // Too short AND not an email: min_length is checked first.
        let rule = ValidationRule::new().min_length(10).email();
        assert_eq!(
            validate_field("a@", &rule, "邮箱"),
            Some("邮箱至少需要10个字符".to_string())
        );

        // Valid length, bad email, and a custom check that would also fail.
        let rule = ValidationRule::new()
            .email()
            .custom(|_| Some("custom".to_string()));
        assert_eq!(
            validate_field("abc@", &rule, "邮箱"),
            Some("请输入有效的邮箱地址".to_string())
        );
    }

    #[test]
    fn test_pattern_before_custom() {
        let rule = ValidationRule::new()
            .pattern(Regex::new(r"^\d+$").unwrap(), "")
            .custom(|_| Some("custom".to_string()));
        assert_eq!(
            validate_field("abc", &rule, "编号"),
            Some("编号格式不正确".to_string())
        );
        assert_eq!(validate_field("123", &rule, "编号"), Some("custom".to_string()));
    }

    #[test]
    fn test_custom_receives_raw_value() {
        let rule = ValidationRule::new().custom(|v| {
            if v.contains("禁") {
                Some("包含敏感词".to_string())
            } else {
                None
            }
        });
        assert_eq!(
            validate_field("禁止", &rule, "内容"),
            Some("包含敏感词".to_string())
        );
        assert_eq!(validate_field("允许", &rule, "内容"), None);
    }

    #[test]
    fn test_custom_never_sees_blank_input() {
        let rule = ValidationRule::new().custom(|_| Some("总是失败".to_string()));
        assert_eq!(validate_field("", &rule, "内容"), None);
        assert_eq!(validate_field("   ", &rule, "内容"), None);
        assert_eq!(validate_field("x", &rule, "内容"), Some("总是失败".to_string()));

        let required = ValidationRule::new()
            .required()
            .custom(|_| Some("总是失败".to_string()));
        assert_eq!(
            validate_field(" ", &required, "内容"),
            Some("内容不能为空".to_string())
        );
    }

    #[test]
    fn test_all_rules_pass() {
        let rule = ValidationRule::new()
            .required()
            .min_length(3)
            .max_length(40)
            .email();
        assert_eq!(validate_field("liming@example.com", &rule, "邮箱"), None);
    }
}
