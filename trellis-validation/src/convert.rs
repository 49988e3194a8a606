//! 类型转换 - 字符串与目标类型之间的格式化器
//!
//! [`FormattingConversionService`] 按目标类型保存 [`Formatter`]，
//! 没有注册格式化器的类型回退到 `FromStr`。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::ConversionError;
use crate::message::Locale;

/// 格式化器：字符串和 `T` 之间的双向转换
pub trait Formatter<T>: Send + Sync {
    fn parse(&self, text: &str, locale: &Locale) -> Result<T, ConversionError>;

    fn print(&self, value: &T, locale: &Locale) -> String;
}

/// 格式化转换服务
#[derive(Default, Clone)]
pub struct FormattingConversionService {
    formatters: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    locale: Locale,
}

impl FormattingConversionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// 注册格式化器，同一类型后注册的覆盖先注册的
    pub fn add_formatter<T, F>(&mut self, formatter: F)
    where
        T: 'static,
        F: Formatter<T> + 'static,
    {
        let formatter: Arc<dyn Formatter<T>> = Arc::new(formatter);
        self.formatters.insert(TypeId::of::<T>(), Arc::new(formatter));
    }

    fn formatter<T: 'static>(&self) -> Option<Arc<dyn Formatter<T>>> {
        self.formatters
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn Formatter<T>>>())
            .cloned()
    }

    /// 是否为 `T` 注册了格式化器
    pub fn has_formatter<T: 'static>(&self) -> bool {
        self.formatters.contains_key(&TypeId::of::<T>())
    }

    /// 把字符串转换为 `T`
    pub fn convert<T>(&self, text: &str) -> Result<T, ConversionError>
    where
        T: FromStr + 'static,
        T::Err: Display,
    {
        if let Some(formatter) = self.formatter::<T>() {
            return formatter.parse(text, &self.locale);
        }

        text.trim().parse::<T>().map_err(|e| ConversionError::Parse {
            value: text.to_string(),
            target_type: short_type_name::<T>(),
            message: e.to_string(),
        })
    }

    /// 把 `T` 转换为字符串
    pub fn print<T>(&self, value: &T) -> String
    where
        T: Display + 'static,
    {
        match self.formatter::<T>() {
            Some(formatter) => formatter.print(value, &self.locale),
            None => value.to_string(),
        }
    }
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// 日期格式化器
///
/// 解析时依次尝试首选模式和备选模式，第一个成功的结果生效；
/// 输出时只使用首选模式。模式使用 `dd/MM/yyyy` 这类写法。
#[derive(Debug, Clone)]
pub struct DateFormatter {
    patterns: Vec<(String, String)>,
}

impl DateFormatter {
    pub fn new(preferred: &str, others: &[&str]) -> Result<Self, ConversionError> {
        let patterns = std::iter::once(preferred)
            .chain(others.iter().copied())
            .map(|pattern| Ok((pattern.to_string(), to_chrono_format(pattern)?)))
            .collect::<Result<Vec<_>, ConversionError>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(pattern, _)| pattern.as_str())
    }

    /// 按模式顺序解析，返回第一个成功的结果
    pub fn parse_date(&self, text: &str) -> Result<NaiveDate, ConversionError> {
        let text = text.trim();
        self.patterns
            .iter()
            .find_map(|(pattern, format)| {
                let parsed = NaiveDate::parse_from_str(text, format).ok();
                if parsed.is_some() {
                    tracing::trace!("Parsed date '{}' with pattern {}", text, pattern);
                }
                parsed
            })
            .ok_or_else(|| ConversionError::NoMatchingPattern {
                value: text.to_string(),
                patterns: self.patterns().map(str::to_string).collect(),
            })
    }

    pub fn print_date(&self, date: &NaiveDate) -> String {
        match self.patterns.first() {
            Some((_, format)) => date.format(format).to_string(),
            None => date.to_string(),
        }
    }
}

impl Formatter<NaiveDate> for DateFormatter {
    fn parse(&self, text: &str, _locale: &Locale) -> Result<NaiveDate, ConversionError> {
        self.parse_date(text)
    }

    fn print(&self, value: &NaiveDate, _locale: &Locale) -> String {
        self.print_date(value)
    }
}

/// 把 `yyyy-MM-dd` 风格的模式转换为 chrono 格式串
fn to_chrono_format(pattern: &str) -> Result<String, ConversionError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut format = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        match c {
            'y' if run == 2 => format.push_str("%y"),
            'y' => format.push_str("%Y"),
            'M' if run <= 2 => format.push_str("%m"),
            'M' if run == 3 => format.push_str("%b"),
            'M' => format.push_str("%B"),
            'd' => format.push_str("%d"),
            'H' => format.push_str("%H"),
            'm' => format.push_str("%M"),
            's' => format.push_str("%S"),
            c if c.is_ascii_alphabetic() => {
                return Err(ConversionError::InvalidPattern(pattern.to_string()))
            }
            '%' => format.push_str(&"%%".repeat(run)),
            other => format.extend(std::iter::repeat(other).take(run)),
        }
        i += run;
    }

    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn demo_formatter() -> DateFormatter {
        DateFormatter::new("dd/MM/yyyy", &["yyyy-MM-dd", "dd-MM-yyyy", "yyyyMMdd"]).unwrap()
    }

    #[test]
    fn test_pattern_translation() {
        assert_eq!(to_chrono_format("dd/MM/yyyy").unwrap(), "%d/%m/%Y");
        assert_eq!(to_chrono_format("yyyyMMdd").unwrap(), "%Y%m%d");
        assert_eq!(to_chrono_format("yy-MM-dd HH:mm:ss").unwrap(), "%y-%m-%d %H:%M:%S");
        assert!(to_chrono_format("EEE dd").is_err());
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let formatter = demo_formatter();
        let expected = NaiveDate::from_ymd_opt(1998, 6, 21).unwrap();
        assert_eq!(formatter.parse_date("21/06/1998").unwrap(), expected);
        assert_eq!(formatter.parse_date("1998-06-21").unwrap(), expected);
        assert_eq!(formatter.parse_date("21-06-1998").unwrap(), expected);
        assert_eq!(formatter.parse_date("19980621").unwrap(), expected);
        assert_eq!(formatter.print_date(&expected), "21/06/1998");
    }

    #[test]
    fn test_unparseable_date() {
        let err = demo_formatter().parse_date("June 21st").unwrap_err();
        assert!(matches!(err, ConversionError::NoMatchingPattern { ref patterns, .. } if patterns.len() == 4));
        assert!(demo_formatter().parse_date("31/02/1998").is_err());
    }

    #[test]
    fn test_conversion_service_prefers_formatter() {
        let mut service = FormattingConversionService::new();
        assert!(service.convert::<NaiveDate>("21/06/1998").is_err());

        service.add_formatter(demo_formatter());
        assert!(service.has_formatter::<NaiveDate>());
        let date = service.convert::<NaiveDate>("21/06/1998").unwrap();
        assert_eq!(service.print(&date), "21/06/1998");

        assert_eq!(service.convert::<i64>(" 42 ").unwrap(), 42);
        let err = service.convert::<i64>("abc").unwrap_err();
        assert!(matches!(err, ConversionError::Parse { ref target_type, .. } if target_type == "i64"));
    }

    proptest! {
        #[test]
        fn prop_any_date_parses_with_every_pattern(days in 0i64..60_000) {
            let base = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
            let date = base + chrono::Duration::days(days);
            let formatter = demo_formatter();

            for format in ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y%m%d"] {
                let text = date.format(format).to_string();
                prop_assert_eq!(formatter.parse_date(&text).unwrap(), date);
            }
        }

        #[test]
        fn prop_text_without_digits_is_rejected(text in "[a-zA-Z ]{0,20}") {
            prop_assert!(demo_formatter().parse_date(&text).is_err());
        }
    }
}
