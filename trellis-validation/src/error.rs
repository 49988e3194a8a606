use thiserror::Error;

use crate::constraints::ConstraintViolation;

/// 验证错误
#[derive(Debug, Error, Clone)]
pub enum ValidationError {
    #[error("Validator [{validator}] does not support target type [{target}]")]
    UnsupportedTarget { validator: String, target: String },

    #[error("Cannot pop nested path: no nested path on stack")]
    EmptyNestedPath,

    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{} constraint violation(s)", .0.len())]
    ConstraintViolations(Vec<ConstraintViolation>),
}

impl ValidationError {
    /// 约束违规列表（其他错误返回空）
    pub fn violations(&self) -> &[ConstraintViolation] {
        match self {
            Self::ConstraintViolations(violations) => violations,
            _ => &[],
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// 类型转换错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Failed to convert '{value}' to {target_type}: {message}")]
    Parse {
        value: String,
        target_type: String,
        message: String,
    },

    #[error("Unparseable date: \"{value}\" (tried patterns {patterns:?})")]
    NoMatchingPattern { value: String, patterns: Vec<String> },

    #[error("Unsupported date pattern '{0}'")]
    InvalidPattern(String),
}

/// 数据绑定错误
#[derive(Debug, Error, Clone)]
pub enum BindError {
    #[error("Invalid property '{property}': not writable or does not exist")]
    NotWritable { property: String },

    #[error("Failed to convert property value for '{property}'")]
    TypeMismatch {
        property: String,
        value: String,
        #[source]
        source: ConversionError,
    },

    #[error("Invalid target for validator [{validator}]: {target}")]
    UnsupportedValidator { validator: String, target: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type BindResult<T> = Result<T, BindError>;

/// 消息解析错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("No message found under code '{code}' for locale '{locale}'.")]
    NoSuchMessage { code: String, locale: String },

    #[error("Failed to load message bundle: {0}")]
    Bundle(String),
}

pub type MessageResult<T> = Result<T, MessageError>;
