//! 方法拦截示例
//!
//! - `aop-api`：按 Bean 名称自动代理，名称匹配切点 + 日志拦截器
//! - `aop-aspectj`：切面自动代理，AspectJ 表达式选择方法，环绕通知改写参数

pub mod aspect;
pub mod config;
pub mod operations;

pub use aspect::OperationsAspect;
pub use config::{api_context, aspectj_context, resources_dir, AspectJApplication};
pub use operations::{DefaultOperations, Operations, OperationsProxy};
