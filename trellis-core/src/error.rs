//! 统一的错误处理类型
//!
//! 容器内部使用 `ContainerError`，应用层（日志初始化、配置加载）使用 `ApplicationError`。
//! 需要携带任意错误时统一包装为 `anyhow::Error`。

use thiserror::Error;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Bean not found: {0}")]
    BeanNotFound(String),

    #[error("Bean already exists: {0}")]
    BeanAlreadyExists(String),

    #[error("No unique bean of type '{type_name}': expected single matching bean but found {candidates:?}")]
    NoUniqueBean {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Bean creation failed: {0}")]
    BeanCreationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Bean definition document error: {0}")]
    Xml(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 应用级错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ApplicationResult<T> = std::result::Result<T, ApplicationError>;

pub use anyhow::Result;
