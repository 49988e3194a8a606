use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;

use crate::error::{ContainerError, ContainerResult};

/// 配置值
///
/// 文本源（`.properties`、环境变量）只产生 `String`，数值和布尔的读取会尝试解析文本。
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<ConfigValue>),
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        if let ConfigValue::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            other => other.as_str()?.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            other => other.as_str()?.trim().parse().ok(),
        }
    }

    /// `true`/`yes`/`1` 与 `false`/`no`/`0`，忽略大小写
    pub fn as_bool(&self) -> Option<bool> {
        if let ConfigValue::Bool(b) = self {
            return Some(*b);
        }
        let text = self.as_str()?.trim();
        if ["true", "yes", "1"].iter().any(|t| t.eq_ignore_ascii_case(text)) {
            Some(true)
        } else if ["false", "no", "0"].iter().any(|t| t.eq_ignore_ascii_case(text)) {
            Some(false)
        } else {
            None
        }
    }

    /// 标量的文本形式，数组和表没有
    pub fn to_text(&self) -> Option<String> {
        Some(match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::Float(f) => f.to_string(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Array(_) | ConfigValue::Object(_) => return None,
        })
    }
}

/// 键值配置源
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<ConfigValue>;

    fn keys(&self) -> Vec<String>;

    /// 数字越大越先被查询
    fn priority(&self) -> i32 {
        0
    }
}

/// 配置源链和激活的 profile
///
/// 查询时按优先级从高到低依次询问各个源，第一个给出值的源胜出；
/// 优先级相同的源按加入顺序排列。
#[derive(Default)]
pub struct Environment {
    sources: RwLock<Vec<Box<dyn PropertySource>>>,
    active_profiles: RwLock<Vec<String>>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("sources", &self.property_source_names())
            .field("active_profiles", &*self.active_profiles.read())
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property_source(&self, source: Box<dyn PropertySource>) {
        tracing::debug!("Property source '{}' added with priority {}", source.name(), source.priority());
        let mut sources = self.sources.write();
        let at = sources
            .iter()
            .position(|existing| existing.priority() < source.priority())
            .unwrap_or(sources.len());
        sources.insert(at, source);
    }

    /// 查询顺序
    pub fn property_source_names(&self) -> Vec<String> {
        self.sources.read().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        let found = self
            .sources
            .read()
            .iter()
            .find_map(|source| source.get(key).map(|value| (source.name().to_string(), value)));
        match found {
            Some((source, value)) => {
                tracing::trace!("'{}' resolved from '{}'", key, source);
                Some(value)
            }
            None => None,
        }
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)?.to_text()
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_owned())
    }

    pub fn get_required_string(&self, key: &str) -> ContainerResult<String> {
        self.get_string(key)
            .ok_or_else(|| ContainerError::Config(format!("Required property '{}' is not set", key)))
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    /// 数组值，或逗号分隔的文本（`env1, env2`），空项被丢弃
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            ConfigValue::Array(items) => Some(items.iter().filter_map(ConfigValue::to_text).collect()),
            ConfigValue::String(list) => Some(
                list.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn set_active_profiles(&self, profiles: Vec<String>) {
        tracing::info!("Active profiles: {:?}", profiles);
        *self.active_profiles.write() = profiles;
    }

    pub fn get_active_profiles(&self) -> Vec<String> {
        self.active_profiles.read().clone()
    }

    /// `"env2"` 要求 env2 激活，`"!env2"` 要求 env2 未激活
    pub fn accepts_profiles(&self, expression: &str) -> bool {
        let expression = expression.trim();
        let (negated, profile) = match expression.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, expression),
        };
        self.active_profiles.read().iter().any(|p| p == profile) != negated
    }

    /// 每个表达式都满足；没有表达式时总是满足
    pub fn accepts_all(&self, expressions: &[String]) -> bool {
        expressions.iter().all(|e| self.accepts_profiles(e))
    }

    /// 展开 `${key}` 与 `${key:default}`
    ///
    /// 默认值原样使用，不再展开；没有值也没有默认值的占位符是错误。
    pub fn resolve_placeholders(&self, text: &str) -> ContainerResult<String> {
        let mut resolved = String::with_capacity(text.len());
        let mut remaining = text;

        while let Some(open) = remaining.find("${") {
            let (literal, tail) = remaining.split_at(open);
            resolved.push_str(literal);

            let body = &tail[2..];
            let close = body
                .find('}')
                .ok_or_else(|| ContainerError::Config(format!("Unclosed placeholder in '{}'", text)))?;
            let (key, default) = match body[..close].split_once(':') {
                Some((key, default)) => (key.trim(), Some(default)),
                None => (body[..close].trim(), None),
            };

            let value = self.get_string(key).or_else(|| default.map(String::from)).ok_or_else(|| {
                ContainerError::Config(format!("Could not resolve placeholder '{}' in value '{}'", key, text))
            })?;
            resolved.push_str(&value);
            remaining = &body[close + 1..];
        }

        resolved.push_str(remaining);
        Ok(resolved)
    }
}

/// 读取前缀为 `prefix` 的进程环境变量，`TRELLIS_LOGGING_LEVEL` 对应 `logging.level`
///
/// 优先级 100，高于文件中的配置。
pub struct EnvironmentPropertySource {
    prefix: String,
}

impl EnvironmentPropertySource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn env_to_key(&self, variable: &str) -> String {
        let bare = variable.strip_prefix(self.prefix.as_str()).unwrap_or(variable);
        bare.to_lowercase().replace('_', ".")
    }

    fn key_to_env(&self, key: &str) -> String {
        let mut variable = self.prefix.clone();
        variable.extend(key.chars().map(|c| if c == '.' { '_' } else { c.to_ascii_uppercase() }));
        variable
    }
}

impl PropertySource for EnvironmentPropertySource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        std::env::var(self.key_to_env(key)).ok().map(ConfigValue::String)
    }

    fn keys(&self) -> Vec<String> {
        std::env::vars()
            .map(|(variable, _)| variable)
            .filter(|variable| variable.starts_with(self.prefix.as_str()))
            .map(|variable| self.env_to_key(&variable))
            .collect()
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// 内存中的键值表，默认优先级 50
///
/// TOML 和 `.properties` 源解析完成后也保存为这种表。
pub struct MapPropertySource {
    name: String,
    properties: HashMap<String, ConfigValue>,
    priority: i32,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_map(name, HashMap::new(), 50)
    }

    fn from_map(name: impl Into<String>, properties: HashMap<String, ConfigValue>, priority: i32) -> Self {
        Self {
            name: name.into(),
            properties,
            priority,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.properties.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 包装一张 [`MapPropertySource`] 的文件配置源
macro_rules! file_property_source {
    ($name:ident) => {
        impl $name {
            pub fn with_priority(self, priority: i32) -> Self {
                Self(self.0.with_priority(priority))
            }
        }

        impl PropertySource for $name {
            fn name(&self) -> &str {
                self.0.name()
            }

            fn get(&self, key: &str) -> Option<ConfigValue> {
                self.0.get(key)
            }

            fn keys(&self) -> Vec<String> {
                self.0.keys()
            }

            fn priority(&self) -> i32 {
                self.0.priority()
            }
        }
    };
}

fn read_config_file(path: &Path, kind: &str) -> ContainerResult<String> {
    fs::read_to_string(path)
        .map_err(|e| ContainerError::Config(format!("Failed to read {} file {}: {}", kind, path.display(), e)))
}

/// TOML 文件，表被展平为点分隔的键：`[logging] level = "debug"` 对应 `logging.level`
///
/// 优先级 0。
pub struct TomlPropertySource(MapPropertySource);

file_property_source!(TomlPropertySource);

impl TomlPropertySource {
    pub fn from_file(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        Self::parse(&read_config_file(path, "TOML")?, path.display().to_string())
    }

    pub fn parse(content: &str, name: impl Into<String>) -> ContainerResult<Self> {
        let root: toml::Table = content
            .parse()
            .map_err(|e| ContainerError::Config(format!("Invalid TOML: {}", e)))?;

        let mut properties = HashMap::new();
        let mut pending: Vec<(String, &toml::Value)> = root.iter().map(|(k, v)| (k.clone(), v)).collect();
        while let Some((key, value)) = pending.pop() {
            match value {
                toml::Value::Table(table) => {
                    pending.extend(table.iter().map(|(k, v)| (format!("{}.{}", key, k), v)));
                }
                scalar => {
                    properties.insert(key, toml_to_config(scalar));
                }
            }
        }
        Ok(Self(MapPropertySource::from_map(name, properties, 0)))
    }
}

fn toml_to_config(value: &toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(s) => ConfigValue::String(s.clone()),
        toml::Value::Integer(i) => ConfigValue::Int(*i),
        toml::Value::Float(f) => ConfigValue::Float(*f),
        toml::Value::Boolean(b) => ConfigValue::Bool(*b),
        toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
        toml::Value::Array(items) => ConfigValue::Array(items.iter().map(toml_to_config).collect()),
        toml::Value::Table(table) => {
            ConfigValue::Object(table.iter().map(|(k, v)| (k.clone(), toml_to_config(v))).collect())
        }
    }
}

/// `.properties` 文件，优先级 10
///
/// 支持 `key=value`、`key: value`、`key value` 三种分隔，`#` 和 `!` 注释，
/// 行尾 `\` 续行，以及 `\t` `\n` `\uXXXX` 等转义。
pub struct PropertiesPropertySource(MapPropertySource);

file_property_source!(PropertiesPropertySource);

impl PropertiesPropertySource {
    pub fn from_file(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        Ok(Self::parse(&read_config_file(path, "properties")?, path.display().to_string()))
    }

    pub fn parse(content: &str, name: impl Into<String>) -> Self {
        let mut properties = HashMap::new();
        let mut entry = String::new();
        let mut lines = content.lines().map(str::trim_start).peekable();

        while let Some(line) = lines.next() {
            if entry.is_empty() && (line.is_empty() || line.starts_with(['#', '!'])) {
                continue;
            }
            let continued = ends_with_continuation(line);
            entry.push_str(if continued { &line[..line.len() - 1] } else { line });
            if continued && lines.peek().is_some() {
                continue;
            }

            let (key, value) = split_key_value(&entry);
            properties.insert(unescape(key), ConfigValue::String(unescape(value)));
            entry.clear();
        }

        Self(MapPropertySource::from_map(name, properties, 10))
    }
}

/// 行尾是奇数个反斜杠时表示续行
fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

/// 第一个未转义的 `=`、`:` 或空白分开键和值；空白之后还可以再跟一个 `=` 或 `:`
fn split_key_value(entry: &str) -> (&str, &str) {
    let mut chars = entry.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '=' | ':' => return (entry[..idx].trim_end(), entry[idx + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = entry[idx..].trim_start();
                let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
                return (&entry[..idx], rest.trim_start());
            }
            _ => {}
        }
    }
    (entry, "")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ConfigValue {
        ConfigValue::String(s.to_string())
    }

    #[test]
    fn test_priority_order() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("low").with_property("test", text("low")).with_priority(1),
        ));
        env.add_property_source(Box::new(
            MapPropertySource::new("high").with_property("test", text("high")).with_priority(9),
        ));

        assert_eq!(env.get_string("test").as_deref(), Some("high"));
        assert_eq!(env.property_source_names(), vec!["high", "low"]);
    }

    #[test]
    fn test_properties_parsing() {
        let source = PropertiesPropertySource::parse(
            "# comment\n! other comment\ntest=Hello World\nkey: value\nspaced  value here\nlong = first \\\n    second\nunicode=caf\\u00e9\n",
            "test",
        );

        assert_eq!(source.get("test"), Some(text("Hello World")));
        assert_eq!(source.get("key"), Some(text("value")));
        assert_eq!(source.get("spaced"), Some(text("value here")));
        assert_eq!(source.get("long"), Some(text("first second")));
        assert_eq!(source.get("unicode"), Some(text("café")));
        assert_eq!(source.keys().len(), 5);
    }

    #[test]
    fn test_toml_flattening() {
        let source = TomlPropertySource::parse(
            "[logging]\nlevel = \"debug\"\n[demo]\ncount = 3\nnames = [\"a\", \"b\"]\n",
            "inline",
        )
        .unwrap();
        let env = Environment::new();
        env.add_property_source(Box::new(source));

        assert_eq!(env.get_string("logging.level").as_deref(), Some("debug"));
        assert_eq!(env.get_i64("demo.count"), Some(3));
        assert_eq!(
            env.get_string_array("demo.names"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_profile_expressions() {
        let env = Environment::new();
        assert!(env.accepts_profiles("!env2"));
        assert!(!env.accepts_profiles("env2"));

        env.set_active_profiles(vec!["env2".to_string()]);
        assert!(env.accepts_profiles("env2"));
        assert!(!env.accepts_profiles("!env2"));
        assert!(env.accepts_all(&[]));
    }

    #[test]
    fn test_resolve_placeholders() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("map").with_property("test", text("Bonjour")),
        ));

        assert_eq!(env.resolve_placeholders("${test} !").unwrap(), "Bonjour !");
        assert_eq!(env.resolve_placeholders("${missing:défaut}").unwrap(), "défaut");
        assert_eq!(env.resolve_placeholders("plain").unwrap(), "plain");
        assert!(matches!(
            env.resolve_placeholders("${missing}"),
            Err(ContainerError::Config(_))
        ));
        assert!(env.resolve_placeholders("${test").is_err());
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig {
            cases: 128,
            ..proptest::prelude::ProptestConfig::default()
        })]

        /// 不含占位符的文本原样返回
        #[test]
        fn text_without_placeholders_is_unchanged(text in "[^$]*") {
            let env = Environment::new();
            proptest::prop_assert_eq!(env.resolve_placeholders(&text).unwrap(), text);
        }

        /// `key=value` 行解析后值保持不变
        #[test]
        fn properties_round_trip_simple_values(
            key in "[a-z][a-z0-9.]{0,12}",
            value in "[A-Za-z0-9][A-Za-z0-9 ,.]{0,20}",
        ) {
            let source = PropertiesPropertySource::parse(&format!("{}={}\n", key, value), "prop");
            proptest::prop_assert_eq!(source.get(&key), Some(ConfigValue::String(value.clone())));
        }
    }

    #[test]
    fn test_environment_source_key_mapping() {
        let source = EnvironmentPropertySource::new("TRELLIS_");
        assert_eq!(source.key_to_env("logging.level"), "TRELLIS_LOGGING_LEVEL");
        assert_eq!(source.env_to_key("TRELLIS_LOGGING_LEVEL"), "logging.level");
    }
}
