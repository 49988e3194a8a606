//! Trellis AOP - 方法拦截支持
//!
//! 提供类似 Spring AOP 的功能，支持：
//! - 环绕、前置、返回后、异常通知，统一适配为 [`MethodInterceptor`]
//! - 方法名通配符切点和 AspectJ 风格的表达式切点
//! - 代理工厂：按签名筛选通知器并组成拦截器链
//! - 通过 BeanPostProcessor 按 Bean 名称或切面自动创建代理
//!
//! Rust 没有运行时动态代理，每个被代理的 trait 需要一个手写的代理结构体，
//! 并在 [`ProxyRegistry`] 中注册。

pub mod advice;
pub mod advisor;
pub mod aspect;
pub mod auto_proxy;
pub mod error;
pub mod joinpoint;
pub mod pointcut;
pub mod proxy;
pub mod value;

// 重新导出核心类型
pub use advice::{
    interceptor_fn, AdviceType, AfterReturningAdvice, AfterReturningAdviceInterceptor,
    FnInterceptor, MethodBeforeAdvice, MethodBeforeAdviceInterceptor, MethodInterceptor,
    ThrowsAdvice, ThrowsAdviceInterceptor,
};
pub use advisor::Advisor;
pub use aspect::{build_advisors, AdviceDeclaration, AdviceKind, Aspect};
pub use auto_proxy::{AspectJAutoProxyCreator, BeanNameAutoProxyCreator, ProxyRegistry, ProxyTarget};
pub use error::{AopError, AopResult, ThrownError};
pub use joinpoint::{JoinPoint, MethodInvocation, MethodSignature};
pub use pointcut::{
    simple_match, AspectJExpressionPointcut, ExecutionPattern, NameMatchMethodPointcut,
    ParamPattern, Pointcut, PointcutExpression, TruePointcut, TypePattern,
};
pub use proxy::{AopProxy, ProxyFactory};
pub use value::{arg_doubles, arg_f64, deep_to_string, Value};

/// 预导入模块
pub mod prelude {
    pub use crate::advice::*;
    pub use crate::advisor::Advisor;
    pub use crate::aspect::{AdviceDeclaration, Aspect};
    pub use crate::auto_proxy::{AspectJAutoProxyCreator, BeanNameAutoProxyCreator, ProxyRegistry};
    pub use crate::error::{AopError, AopResult, ThrownError};
    pub use crate::joinpoint::{JoinPoint, MethodInvocation, MethodSignature};
    pub use crate::pointcut::{
        AspectJExpressionPointcut, NameMatchMethodPointcut, Pointcut, PointcutExpression,
    };
    pub use crate::proxy::{AopProxy, ProxyFactory};
    pub use crate::value::{arg_doubles, arg_f64, deep_to_string, Value};
}
