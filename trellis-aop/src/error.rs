//! AOP 错误类型

use std::fmt;

use thiserror::Error;
use trellis_core::ContainerError;

/// AOP 错误
#[derive(Debug, Error)]
pub enum AopError {
    #[error("Invalid pointcut expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    #[error("Unknown named pointcut '{0}()'")]
    UnknownPointcut(String),

    #[error("Argument mismatch for {method}: expected {expected}, found {found}")]
    ArgumentMismatch {
        method: String,
        expected: String,
        found: String,
    },

    #[error("Return type mismatch for {method}: expected {expected}, found {found}")]
    ReturnTypeMismatch {
        method: String,
        expected: String,
        found: String,
    },

    #[error("Bean '{0}' is neither an Advisor nor a MethodInterceptor")]
    AdviceNotFound(String),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl AopError {
    pub(crate) fn invalid(expression: &str, message: impl Into<String>) -> Self {
        AopError::InvalidExpression {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}

impl From<AopError> for ContainerError {
    fn from(error: AopError) -> Self {
        match error {
            AopError::Container(inner) => inner,
            other => ContainerError::Other(anyhow::Error::new(other)),
        }
    }
}

pub type AopResult<T> = std::result::Result<T, AopError>;

/// 目标方法返回的错误，交给异常通知时的快照
///
/// `causes` 是 `anyhow` 错误链中最外层之后的各层消息，由外到内。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrownError {
    pub message: String,
    pub causes: Vec<String>,
}

impl ThrownError {
    pub fn capture(error: &anyhow::Error) -> Self {
        let mut chain = error.chain().map(|layer| layer.to_string());
        Self {
            message: chain.next().unwrap_or_default(),
            causes: chain.collect(),
        }
    }

    /// 带 `Caused by:` 段落的多行描述
    pub fn describe(&self) -> String {
        self.causes
            .iter()
            .fold(self.message.clone(), |text, cause| format!("{}\nCaused by: {}", text, cause))
    }
}

impl fmt::Display for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
