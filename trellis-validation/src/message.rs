//! 消息源 - 按代码和区域解析本地化消息
//!
//! 查找顺序：`fr_FR` → `fr` → 根区域。带参数的消息使用 [`MessageFormat`] 格式化。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use trellis_core::{PropertiesPropertySource, PropertySource, ResourceLoader};

use crate::error::{MessageError, MessageResult};
use crate::errors::FieldError;

/// 区域（语言 + 国家）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Locale {
    language: String,
    country: String,
}

impl Locale {
    /// 根区域，所有查找的最后一级
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_lowercase(),
            country: String::new(),
        }
    }

    pub fn with_country(language: &str, country: &str) -> Self {
        Self {
            language: language.to_lowercase(),
            country: country.to_uppercase(),
        }
    }

    /// 解析 `fr_FR`、`fr-FR`、`fr_FR.UTF-8` 形式的标签
    pub fn parse(tag: &str) -> Self {
        let tag = tag.split(['.', '@']).next().unwrap_or_default().trim();
        if tag.is_empty() || tag == "C" || tag == "POSIX" {
            return Self::root();
        }

        let mut parts = tag.split(['_', '-']);
        let language = parts.next().unwrap_or_default();
        match parts.next() {
            Some(country) => Self::with_country(language, country),
            None => Self::new(language),
        }
    }

    /// 系统默认区域（`LC_ALL`、`LC_MESSAGES`、`LANG`）
    pub fn system() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty())
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty()
    }

    /// 查找时依次尝试的区域
    pub fn fallbacks(&self) -> Vec<Locale> {
        let mut chain = vec![self.clone()];
        if !self.country.is_empty() {
            chain.push(Self::new(&self.language));
        }
        if !self.is_root() {
            chain.push(Self::root());
        }
        chain
    }

    /// 资源包文件名后缀：`_fr_FR`、`_fr` 或空
    fn bundle_suffix(&self) -> String {
        match (self.language.is_empty(), self.country.is_empty()) {
            (true, _) => String::new(),
            (false, true) => format!("_{}", self.language),
            (false, false) => format!("_{}_{}", self.language, self.country),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country.is_empty() {
            write!(f, "{}", self.language)
        } else {
            write!(f, "{}_{}", self.language, self.country)
        }
    }
}

/// 消息格式化
///
/// - `{0}`、`{1,number}` 替换为对应参数，越界的占位符原样保留
/// - `''` 表示一个单引号
/// - 单引号之间的内容按字面输出
pub struct MessageFormat;

impl MessageFormat {
    pub fn format(pattern: &str, args: &[String]) -> String {
        let mut out = String::with_capacity(pattern.len());
        let mut chars = pattern.chars().peekable();
        let mut quoted = false;

        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        out.push('\'');
                    } else {
                        quoted = !quoted;
                    }
                }
                '{' if !quoted => {
                    let mut element = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == '}' {
                            closed = true;
                            break;
                        }
                        element.push(next);
                    }

                    let index = element.split(',').next().unwrap_or_default().trim();
                    match index.parse::<usize>().ok().and_then(|i| args.get(i)) {
                        Some(arg) if closed => out.push_str(arg),
                        _ => {
                            out.push('{');
                            out.push_str(&element);
                            if closed {
                                out.push('}');
                            }
                        }
                    }
                }
                other => out.push(other),
            }
        }

        out
    }
}

/// 无参数时消息原样返回，有参数时才按 [`MessageFormat`] 处理
fn render(message: &str, args: &[String]) -> String {
    if args.is_empty() {
        message.to_string()
    } else {
        MessageFormat::format(message, args)
    }
}

/// 消息源
pub trait MessageSource: Send + Sync {
    /// 查找指定区域下的原始消息，不做区域回退
    fn lookup(&self, code: &str, locale: &Locale) -> Option<String>;

    /// 解析消息，按区域回退
    fn get_message(&self, code: &str, args: &[String], locale: &Locale) -> MessageResult<String> {
        locale
            .fallbacks()
            .iter()
            .find_map(|candidate| self.lookup(code, candidate))
            .map(|message| render(&message, args))
            .ok_or_else(|| MessageError::NoSuchMessage {
                code: code.to_string(),
                locale: locale.to_string(),
            })
    }

    /// 解析消息，找不到时使用默认消息
    fn get_message_or(&self, code: &str, args: &[String], default: &str, locale: &Locale) -> String {
        self.get_message(code, args, locale)
            .unwrap_or_else(|_| render(default, args))
    }

    /// 解析字段错误：依次尝试错误的所有代码，参数 `{0}` 为字段路径
    fn resolve_field_error(&self, error: &FieldError, locale: &Locale) -> MessageResult<String> {
        let mut args = vec![error.field.clone()];
        args.extend(error.arguments.iter().cloned());

        error
            .codes
            .iter()
            .find_map(|code| self.get_message(code, &args, locale).ok())
            .or_else(|| error.default_message.as_deref().map(|d| render(d, &args)))
            .ok_or_else(|| MessageError::NoSuchMessage {
                code: error.code().to_string(),
                locale: locale.to_string(),
            })
    }
}

/// 在代码中注册消息的消息源
#[derive(Debug, Default, Clone)]
pub struct StaticMessageSource {
    messages: HashMap<(String, Locale), String>,
}

impl StaticMessageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, code: impl Into<String>, locale: &Locale, message: impl Into<String>) {
        self.messages
            .insert((code.into(), locale.clone()), message.into());
    }

    pub fn add_messages<I, K, V>(&mut self, messages: I, locale: &Locale)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (code, message) in messages {
            self.add_message(code, locale, message);
        }
    }

    pub fn with_message(mut self, code: impl Into<String>, locale: &Locale, message: impl Into<String>) -> Self {
        self.add_message(code, locale, message);
        self
    }
}

impl MessageSource for StaticMessageSource {
    fn lookup(&self, code: &str, locale: &Locale) -> Option<String> {
        self.messages
            .get(&(code.to_string(), locale.clone()))
            .cloned()
    }
}

type BundleCache = HashMap<(String, Locale), Option<Arc<PropertiesPropertySource>>>;

/// 基于 `.properties` 资源包的消息源
///
/// `basename` 为 `messages` 时，`fr_FR` 依次查找
/// `messages_fr_FR.properties`、`messages_fr.properties`、`messages.properties`。
pub struct ResourceBundleMessageSource {
    loader: ResourceLoader,
    basenames: Vec<String>,
    bundles: RwLock<BundleCache>,
}

impl ResourceBundleMessageSource {
    pub fn new(loader: ResourceLoader) -> Self {
        Self {
            loader,
            basenames: Vec::new(),
            bundles: RwLock::new(HashMap::new()),
        }
    }

    /// 添加资源包基础名，例如 `classpath:messages` 或 `messages`
    pub fn with_basename(mut self, basename: &str) -> Self {
        let basename = if basename.contains(':') {
            basename.to_string()
        } else {
            format!("classpath:{}", basename)
        };
        self.basenames.push(basename);
        self
    }

    /// 加载资源包，不存在的资源包缓存为 None
    fn bundle(&self, basename: &str, locale: &Locale) -> MessageResult<Option<Arc<PropertiesPropertySource>>> {
        let key = (basename.to_string(), locale.clone());
        if let Some(cached) = self.bundles.read().get(&key) {
            return Ok(cached.clone());
        }

        let location = format!("{}{}.properties", basename, locale.bundle_suffix());
        let resource = self.loader.get_resource(&location);
        let bundle = if resource.exists() {
            let content = resource
                .read_to_string()
                .map_err(|e| MessageError::Bundle(e.to_string()))?;
            tracing::debug!("Loaded message bundle {}", resource);
            Some(Arc::new(PropertiesPropertySource::parse(&content, location)))
        } else {
            None
        };

        self.bundles.write().insert(key, bundle.clone());
        Ok(bundle)
    }

    /// 预先加载指定区域的全部资源包，读取失败时返回错误
    pub fn preload(&self, locale: &Locale) -> MessageResult<()> {
        for basename in &self.basenames {
            for candidate in locale.fallbacks() {
                self.bundle(basename, &candidate)?;
            }
        }
        Ok(())
    }
}

impl MessageSource for ResourceBundleMessageSource {
    fn lookup(&self, code: &str, locale: &Locale) -> Option<String> {
        self.basenames.iter().find_map(|basename| {
            match self.bundle(basename, locale) {
                Ok(bundle) => bundle?.get(code).and_then(|value| value.to_text()),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            }
        })
    }
}
