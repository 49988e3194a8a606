//! 声明式约束
//!
//! 类型实现 [`Validate`]，在 `collect_violations` 中对每个字段调用
//! [`ValidationRules`] 并交给 [`ValidatorBuilder`] 累积，嵌套对象通过
//! [`ValidatorBuilder::nested`] 以带前缀的属性路径递归验证。

use std::fmt;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use regex::Regex;

use crate::error::{ValidationError, ValidationResult};

/// 约束违规
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub property_path: String,
    pub message: String,
    /// 约束名，如 `NotNull`、`Size`
    pub constraint: String,
    pub invalid_value: Option<String>,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property_path, self.message)
    }
}

/// 单条规则的失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub constraint: &'static str,
    pub message: String,
}

impl RuleFailure {
    fn new(constraint: &'static str, message: impl Into<String>) -> Self {
        Self {
            constraint,
            message: message.into(),
        }
    }
}

pub type RuleResult = Result<(), RuleFailure>;

const INSEE_WITH_KEY: &str = r"[12][0-9]{2}(0[1-9]|1[0-2])(0[1-9]|[1-9][0-9])[0-9]{8}";
const INSEE_WITHOUT_KEY: &str = r"[12][0-9]{2}(0[1-9]|1[0-2])(0[1-9]|[1-9][0-9])[0-9]{6}[0-9]{0,2}";

fn anchored(pattern: &str) -> ValidationResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| ValidationError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// 编译后的正则缓存
fn cached_regex(pattern: &str) -> ValidationResult<Regex> {
    static CACHE: OnceLock<RwLock<Vec<(String, Regex)>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| RwLock::new(Vec::new()));

    if let Some((_, regex)) = cache.read().iter().find(|(p, _)| p == pattern) {
        return Ok(regex.clone());
    }
    let regex = anchored(pattern)?;
    cache.write().push((pattern.to_string(), regex.clone()));
    Ok(regex)
}

/// 验证规则
///
/// 除 `not_null` 外，值为 `None` 时规则一律通过。
pub struct ValidationRules;

impl ValidationRules {
    pub fn not_null<T>(value: Option<&T>) -> RuleResult {
        match value {
            Some(_) => Ok(()),
            None => Err(RuleFailure::new("NotNull", "must not be null")),
        }
    }

    /// 非 null 且至少包含一个非空白字符
    pub fn not_blank(value: Option<&str>) -> RuleResult {
        match value {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => Err(RuleFailure::new("NotBlank", "must not be blank")),
        }
    }

    /// 字符数在 `[min, max]` 之间
    pub fn size(value: Option<&str>, min: usize, max: usize) -> RuleResult {
        match value {
            Some(text) if !(min..=max).contains(&text.chars().count()) => Err(RuleFailure::new(
                "Size",
                format!("size must be between {} and {}", min, max),
            )),
            _ => Ok(()),
        }
    }

    pub fn min(value: Option<i64>, min: i64) -> RuleResult {
        match value {
            Some(n) if n < min => Err(RuleFailure::new(
                "Min",
                format!("must be greater than or equal to {}", min),
            )),
            _ => Ok(()),
        }
    }

    pub fn max(value: Option<i64>, max: i64) -> RuleResult {
        match value {
            Some(n) if n > max => Err(RuleFailure::new(
                "Max",
                format!("must be less than or equal to {}", max),
            )),
            _ => Ok(()),
        }
    }

    /// 整个值必须匹配正则
    pub fn pattern(value: Option<&str>, pattern: &str) -> ValidationResult<RuleResult> {
        let Some(text) = value else {
            return Ok(Ok(()));
        };
        let regex = cached_regex(pattern)?;
        if regex.is_match(text) {
            Ok(Ok(()))
        } else {
            Ok(Err(RuleFailure::new(
                "Pattern",
                format!("must match \"{}\"", pattern),
            )))
        }
    }

    /// 日期必须严格早于 `today`
    pub fn past(value: Option<NaiveDate>, today: NaiveDate) -> RuleResult {
        match value {
            Some(date) if date >= today => Err(RuleFailure::new("Past", "must be a past date")),
            _ => Ok(()),
        }
    }

    /// INSEE 编号：性别位、年、月、省、六位序号，加可选两位校验码
    ///
    /// `with_key` 时必须带校验码（15 位）。
    pub fn insee(value: Option<&str>, with_key: bool) -> RuleResult {
        let Some(text) = value else {
            return Ok(());
        };
        let pattern = if with_key { INSEE_WITH_KEY } else { INSEE_WITHOUT_KEY };
        match cached_regex(pattern) {
            Ok(regex) if regex.is_match(text) => Ok(()),
            Ok(_) => Err(RuleFailure::new("Insee", "invalid INSEE number")),
            Err(e) => Err(RuleFailure::new("Insee", e.to_string())),
        }
    }
}

/// 约束违规累积器
pub struct ValidatorBuilder {
    prefix: String,
    violations: Vec<ConstraintViolation>,
    today: NaiveDate,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            violations: Vec::new(),
            today: Local::now().date_naive(),
        }
    }

    /// 固定 `past` 规则使用的当前日期
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn path(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }

    /// 登记规则结果，失败时使用规则的默认消息
    pub fn check(&mut self, field: &str, invalid_value: Option<String>, result: RuleResult) -> &mut Self {
        if let Err(failure) = result {
            self.push(field, invalid_value, failure.constraint, failure.message);
        }
        self
    }

    /// 登记规则结果，失败时使用自定义消息
    pub fn check_with_message(
        &mut self,
        field: &str,
        invalid_value: Option<String>,
        result: RuleResult,
        message: &str,
    ) -> &mut Self {
        if let Err(failure) = result {
            self.push(field, invalid_value, failure.constraint, message.to_string());
        }
        self
    }

    /// 登记一个无法用规则表达的违规
    pub fn add_violation(&mut self, field: &str, constraint: &str, message: impl Into<String>) -> &mut Self {
        self.push(field, None, constraint, message.into());
        self
    }

    fn push(&mut self, field: &str, invalid_value: Option<String>, constraint: &str, message: String) {
        let property_path = self.path(field);
        tracing::trace!("Constraint {} violated on '{}'", constraint, property_path);
        self.violations.push(ConstraintViolation {
            property_path,
            message,
            constraint: constraint.to_string(),
            invalid_value,
        });
    }

    /// 递归验证嵌套对象，违规路径带 `field.` 前缀；`None` 直接跳过
    pub fn nested<T: Validate>(&mut self, field: &str, value: Option<&T>) -> &mut Self {
        if let Some(value) = value {
            let prefix = format!("{}{}.", self.prefix, field);
            let saved = std::mem::replace(&mut self.prefix, prefix);
            value.collect_violations(self);
            self.prefix = saved;
        }
        self
    }

    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<ConstraintViolation> {
        self.violations
    }

    pub fn build(self) -> ValidationResult<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ConstraintViolations(self.violations))
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 声明了字段约束的类型
pub trait Validate {
    fn collect_violations(&self, builder: &mut ValidatorBuilder);

    fn validate(&self) -> ValidationResult<()> {
        let mut builder = ValidatorBuilder::new();
        self.collect_violations(&mut builder);
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Zip {
        code: Option<String>,
        city: Option<String>,
    }

    impl Validate for Zip {
        fn collect_violations(&self, builder: &mut ValidatorBuilder) {
            let pattern = ValidationRules::pattern(self.code.as_deref(), "[0-9]{5}")
                .unwrap_or_else(|e| Err(RuleFailure::new("Pattern", e.to_string())));
            builder
                .check("code", self.code.clone(), pattern)
                .check("city", self.city.clone(), ValidationRules::not_blank(self.city.as_deref()));
        }
    }

    struct Holder {
        label: Option<String>,
        zip: Option<Zip>,
    }

    impl Validate for Holder {
        fn collect_violations(&self, builder: &mut ValidatorBuilder) {
            builder
                .check_with_message(
                    "label",
                    self.label.clone(),
                    ValidationRules::size(self.label.as_deref(), 2, 30),
                    "label length",
                )
                .check("zip", None, ValidationRules::not_null(self.zip.as_ref()))
                .nested("zip", self.zip.as_ref());
        }
    }

    #[test]
    fn test_rules_accept_null_except_not_null() {
        assert!(ValidationRules::size(None, 2, 30).is_ok());
        assert!(ValidationRules::min(None, 16).is_ok());
        assert!(ValidationRules::max(None, 130).is_ok());
        assert!(ValidationRules::insee(None, true).is_ok());
        assert!(ValidationRules::past(None, NaiveDate::MAX).is_ok());
        assert!(ValidationRules::pattern(None, "[0-9]{5}").unwrap().is_ok());
        assert!(ValidationRules::not_null::<i64>(None).is_err());
        assert!(ValidationRules::not_blank(None).is_err());
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(ValidationRules::size(Some("a"), 2, 30).unwrap_err().message, "size must be between 2 and 30");
        assert_eq!(ValidationRules::min(Some(15), 16).unwrap_err().message, "must be greater than or equal to 16");
        assert_eq!(ValidationRules::max(Some(131), 130).unwrap_err().message, "must be less than or equal to 130");
        assert_eq!(
            ValidationRules::pattern(Some("1300B"), "[0-9]{5}").unwrap().unwrap_err().message,
            "must match \"[0-9]{5}\""
        );
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(ValidationRules::past(Some(today), today).unwrap_err().constraint, "Past");
        assert!(ValidationRules::past(today.pred_opt(), today).is_ok());
    }

    #[test]
    fn test_pattern_is_full_match() {
        assert!(ValidationRules::pattern(Some("130090"), "[0-9]{5}").unwrap().is_err());
        assert!(ValidationRules::pattern(Some("13009"), "[0-9]{5}").unwrap().is_ok());
        assert!(matches!(
            ValidationRules::pattern(Some("x"), "[0-9"),
            Err(ValidationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_nested_violations_are_prefixed_and_accumulated() {
        let holder = Holder {
            label: Some("x".into()),
            zip: Some(Zip { code: Some("1300B".into()), city: None }),
        };
        let err = holder.validate().unwrap_err();
        let paths: Vec<&str> = err.violations().iter().map(|v| v.property_path.as_str()).collect();
        assert_eq!(paths, vec!["label", "zip.code", "zip.city"]);
        assert_eq!(err.violations()[0].message, "label length");
        assert_eq!(err.violations()[1].invalid_value.as_deref(), Some("1300B"));

        let missing = Holder { label: Some("ok".into()), zip: None };
        let err = missing.validate().unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].constraint, "NotNull");
    }

    #[test]
    fn test_insee_examples() {
        assert!(ValidationRules::insee(Some("1981184012191"), false).is_ok());
        assert!(ValidationRules::insee(Some("1981184012191"), true).is_err());
        assert!(ValidationRules::insee(Some("198118401219145"), true).is_ok());
        assert!(ValidationRules::insee(Some("3981184012191"), false).is_err());
        assert!(ValidationRules::insee(Some("1981384012191"), false).is_err());
        assert!(ValidationRules::insee(Some("1981100012191"), false).is_err());
    }

    fn insee_prefix() -> impl Strategy<Value = String> {
        ("[12]", "[0-9]{2}", 1u32..=12, 1u32..=99).prop_map(|(sex, year, month, dept)| {
            format!("{}{}{:02}{:02}", sex, year, month, dept)
        })
    }

    proptest! {
        #[test]
        fn prop_keyless_accepts_13_digits(prefix in insee_prefix(), serial in "[0-9]{6}") {
            let value = format!("{}{}", prefix, serial);
            prop_assert!(ValidationRules::insee(Some(&value), false).is_ok());
            prop_assert!(ValidationRules::insee(Some(&value), true).is_err());
        }

        #[test]
        fn prop_with_key_accepts_15_digits(prefix in insee_prefix(), serial in "[0-9]{8}") {
            let value = format!("{}{}", prefix, serial);
            prop_assert!(ValidationRules::insee(Some(&value), true).is_ok());
            prop_assert!(ValidationRules::insee(Some(&value), false).is_ok());
        }

        #[test]
        fn prop_wrong_century_digit_rejected(
            sex in "[03-9]",
            rest in "[0-9]{2}(0[1-9]|1[0-2])[0-9]{10}",
        ) {
            let value = format!("{}{}", sex, rest);
            prop_assert!(ValidationRules::insee(Some(&value), true).is_err());
            prop_assert!(ValidationRules::insee(Some(&value), false).is_err());
        }

        #[test]
        fn prop_too_long_rejected(prefix in insee_prefix(), serial in "[0-9]{9,12}") {
            let value = format!("{}{}", prefix, serial);
            prop_assert!(ValidationRules::insee(Some(&value), false).is_err());
            prop_assert!(ValidationRules::insee(Some(&value), true).is_err());
        }
    }
}
