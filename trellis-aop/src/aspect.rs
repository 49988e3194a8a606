//! 切面（Aspect）定义
//!
//! 切面是横切关注点的模块化：一组命名切点加上若干条通知声明，
//! 每条通知声明用 AspectJ 表达式选择要拦截的方法。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::advice::{
    AdviceType, AfterReturningAdvice, AfterReturningAdviceInterceptor, MethodBeforeAdvice,
    MethodBeforeAdviceInterceptor, MethodInterceptor, ThrowsAdvice, ThrowsAdviceInterceptor,
};
use crate::advisor::Advisor;
use crate::error::AopResult;
use crate::pointcut::AspectJExpressionPointcut;

/// 通知的具体实现
#[derive(Clone)]
pub enum AdviceKind {
    Around(Arc<dyn MethodInterceptor>),
    Before(Arc<dyn MethodBeforeAdvice>),
    AfterReturning(Arc<dyn AfterReturningAdvice>),
    AfterThrowing(Arc<dyn ThrowsAdvice>),
}

impl AdviceKind {
    pub fn advice_type(&self) -> AdviceType {
        match self {
            AdviceKind::Around(_) => AdviceType::Around,
            AdviceKind::Before(_) => AdviceType::Before,
            AdviceKind::AfterReturning(_) => AdviceType::AfterReturning,
            AdviceKind::AfterThrowing(_) => AdviceType::AfterThrowing,
        }
    }

    fn into_interceptor(self) -> Arc<dyn MethodInterceptor> {
        match self {
            AdviceKind::Around(interceptor) => interceptor,
            AdviceKind::Before(advice) => Arc::new(MethodBeforeAdviceInterceptor::new(advice)),
            AdviceKind::AfterReturning(advice) => {
                Arc::new(AfterReturningAdviceInterceptor::new(advice))
            }
            AdviceKind::AfterThrowing(advice) => Arc::new(ThrowsAdviceInterceptor::new(advice)),
        }
    }
}

/// 一条通知声明：切点表达式 + 通知
#[derive(Clone)]
pub struct AdviceDeclaration {
    pub expression: String,
    pub kind: AdviceKind,
}

impl AdviceDeclaration {
    pub fn around(expression: impl Into<String>, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self {
            expression: expression.into(),
            kind: AdviceKind::Around(interceptor),
        }
    }

    pub fn before(expression: impl Into<String>, advice: Arc<dyn MethodBeforeAdvice>) -> Self {
        Self {
            expression: expression.into(),
            kind: AdviceKind::Before(advice),
        }
    }

    pub fn after_returning(
        expression: impl Into<String>,
        advice: Arc<dyn AfterReturningAdvice>,
    ) -> Self {
        Self {
            expression: expression.into(),
            kind: AdviceKind::AfterReturning(advice),
        }
    }

    pub fn after_throwing(expression: impl Into<String>, advice: Arc<dyn ThrowsAdvice>) -> Self {
        Self {
            expression: expression.into(),
            kind: AdviceKind::AfterThrowing(advice),
        }
    }
}

impl fmt::Debug for AdviceDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.kind.advice_type(), self.expression)
    }
}

/// 切面 Trait
///
/// 切面以 `Arc<dyn Aspect>` 的形式注册为 Bean，由
/// [`AspectJAutoProxyCreator`](crate::auto_proxy::AspectJAutoProxyCreator) 发现。
pub trait Aspect: Send + Sync {
    /// 切面名称
    fn name(&self) -> &str;

    /// 切面之间的顺序，越小越靠外层
    fn order(&self) -> i32 {
        i32::MAX
    }

    /// 命名切点：`(名称, 表达式)`，通知表达式中以 `名称()` 引用
    fn named_pointcuts(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    /// 通知声明，按声明顺序执行
    fn advice(self: Arc<Self>) -> Vec<AdviceDeclaration>;
}

/// 把切面展开为通知器
pub fn build_advisors(aspect: Arc<dyn Aspect>) -> AopResult<Vec<Advisor>> {
    let named: HashMap<String, String> = aspect
        .named_pointcuts()
        .into_iter()
        .map(|(name, expression)| (name.to_string(), expression.to_string()))
        .collect();
    let aspect_name = aspect.name().to_string();
    let order = aspect.order();

    aspect
        .advice()
        .into_iter()
        .enumerate()
        .map(|(index, declaration)| {
            let pointcut = AspectJExpressionPointcut::parse_with(&declaration.expression, &named)?;
            let name = format!(
                "{}.{}#{}",
                aspect_name,
                declaration.kind.advice_type(),
                index
            );
            tracing::debug!(advisor = %name, expression = %declaration.expression, "built advisor");
            Ok(Advisor::new(name, Arc::new(pointcut), declaration.kind.into_interceptor())
                .with_order(order))
        })
        .collect()
}
