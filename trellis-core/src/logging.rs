//! 日志初始化
//!
//! 框架本身只通过 `tracing` 宏输出日志，订阅者由示例程序在 `main` 中安装。
//! 日志写到 stderr，stdout 留给示例的输出。
//!
//! 配置来源（后者覆盖前者）：默认值、环境变量 `LOG_LEVEL` / `LOG_FORMAT` / `RUST_LOG`、
//! `Environment` 中的 `logging.*` 键。

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::config::Environment;
use crate::error::{ApplicationError, ApplicationResult};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

const LEVEL_NAMES: [(&str, LogLevel); 6] = [
    ("trace", LogLevel::Trace),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("error", LogLevel::Error),
];

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        LEVEL_NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, level)| *level)
            .ok_or_else(|| format!("Invalid log level: {}", s))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 单行紧凑输出
    Compact,
    /// 默认 fmt 输出
    Full,
    Json,
    /// 多行输出，适合开发时阅读
    Pretty,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Full => "full",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [LogFormat::Compact, LogFormat::Full, LogFormat::Json, LogFormat::Pretty]
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid log format: {}", s))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 日志配置
///
/// 示例程序默认只输出警告及以上级别，避免干扰演示输出。
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// 显示模块路径
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// `EnvFilter` 指令，例如 `trellis_core=debug,trellis_aop=trace`；
    /// 设置后优先于 `level`
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 应用一个 `logging.*` 设置，无法解析的值保留原配置
    ///
    /// 此时订阅者尚未安装，问题只能写到 stderr。
    fn apply(&mut self, key: &str, value: &str) {
        let outcome = match key {
            "level" => value.parse().map(|level| self.level = level),
            "format" => value.parse().map(|format| self.format = format),
            "filter" => {
                self.filter = Some(value.to_string());
                Ok(())
            }
            "show-target" => value
                .parse()
                .map(|show| self.show_target = show)
                .map_err(|_| format!("expected true or false, got '{}'", value)),
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            eprintln!("Ignoring logging.{}: {}", key, e);
        }
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (variable, key) in [("LOG_LEVEL", "level"), ("LOG_FORMAT", "format"), ("RUST_LOG", "filter")] {
            if let Ok(value) = std::env::var(variable) {
                config.apply(key, &value);
            }
        }
        config
    }

    /// 在环境变量的基础上读取 `logging.level`、`logging.format`、
    /// `logging.filter`、`logging.show-target`
    pub fn from_environment(environment: &Environment) -> Self {
        let mut config = Self::from_env();
        for key in ["level", "format", "filter", "show-target"] {
            if let Some(value) = environment.get_string(&format!("logging.{}", key)) {
                config.apply(key, &value);
            }
        }
        config
    }

    /// 过滤器：`filter` 无效或未设置时退回到 `level`
    pub fn env_filter(&self) -> EnvFilter {
        self.filter
            .as_deref()
            .and_then(|directives| match EnvFilter::try_new(directives) {
                Ok(filter) => Some(filter),
                Err(e) => {
                    eprintln!("Ignoring log filter '{}': {}", directives, e);
                    None
                }
            })
            .unwrap_or_else(|| EnvFilter::new(self.level.as_str()))
    }

    /// 安装全局订阅者，重复安装返回 `LoggingInitFailed`
    pub fn init(self) -> ApplicationResult<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids);

        let installed = match self.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Full => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };
        installed.map_err(|e| ApplicationError::LoggingInitFailed(e.to_string()))
    }
}
