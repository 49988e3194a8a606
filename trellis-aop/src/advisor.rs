//! 通知器（Advisor）：切点 + 通知

use std::fmt;
use std::sync::Arc;

use crate::advice::MethodInterceptor;
use crate::joinpoint::MethodSignature;
use crate::pointcut::{Pointcut, TruePointcut};

/// 通知器
///
/// 持有一个切点和一个拦截器。`order` 越小越先执行（越靠外层）。
#[derive(Clone)]
pub struct Advisor {
    pub name: String,
    pub pointcut: Arc<dyn Pointcut>,
    pub interceptor: Arc<dyn MethodInterceptor>,
    pub order: i32,
}

impl Advisor {
    pub fn new(
        name: impl Into<String>,
        pointcut: Arc<dyn Pointcut>,
        interceptor: Arc<dyn MethodInterceptor>,
    ) -> Self {
        Self {
            name: name.into(),
            pointcut,
            interceptor,
            order: 0,
        }
    }

    /// 匹配所有方法的通知器
    pub fn always(name: impl Into<String>, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self::new(name, Arc::new(TruePointcut), interceptor)
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn matches(&self, signature: &MethodSignature) -> bool {
        self.pointcut.matches(signature)
    }
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish()
    }
}
