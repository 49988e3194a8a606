//! 通知（Advice）定义
//!
//! 所有通知最终都被适配为 [`MethodInterceptor`]（环绕通知），
//! 拦截器链只认这一种形式。

use std::fmt;
use std::sync::Arc;

use crate::error::ThrownError;
use crate::joinpoint::{MethodInvocation, MethodSignature};
use crate::value::Value;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceType {
    /// 前置通知
    Before,
    /// 返回后通知（成功返回时执行）
    AfterReturning,
    /// 异常通知（返回错误时执行）
    AfterThrowing,
    /// 环绕通知（可以控制方法执行）
    Around,
}

impl fmt::Display for AdviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdviceType::Before => write!(f, "before"),
            AdviceType::AfterReturning => write!(f, "afterReturning"),
            AdviceType::AfterThrowing => write!(f, "afterThrowing"),
            AdviceType::Around => write!(f, "around"),
        }
    }
}

/// 环绕通知
///
/// 可以完全控制目标方法的执行：不调用 `proceed` 则目标方法不会执行，
/// 也可以通过 `proceed_with` 替换参数，或替换返回值。
pub trait MethodInterceptor: Send + Sync {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> anyhow::Result<Value>;
}

/// 前置通知
pub trait MethodBeforeAdvice: Send + Sync {
    fn before(&self, signature: &MethodSignature, args: &[Value]) -> anyhow::Result<()>;
}

/// 返回后通知，只能观察返回值
pub trait AfterReturningAdvice: Send + Sync {
    fn after_returning(&self, result: &Value, signature: &MethodSignature, args: &[Value]);
}

/// 异常通知，只能观察错误，错误会继续向上传播
pub trait ThrowsAdvice: Send + Sync {
    fn after_throwing(&self, signature: &MethodSignature, error: &ThrownError);
}

/// 闭包形式的环绕通知
pub struct FnInterceptor<F> {
    f: F,
}

/// 用闭包创建环绕通知
pub fn interceptor_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(MethodInvocation<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    FnInterceptor { f }
}

impl<F> MethodInterceptor for FnInterceptor<F>
where
    F: Fn(MethodInvocation<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn invoke(&self, invocation: MethodInvocation<'_>) -> anyhow::Result<Value> {
        (self.f)(invocation)
    }
}

/// 前置通知适配器
pub struct MethodBeforeAdviceInterceptor {
    advice: Arc<dyn MethodBeforeAdvice>,
}

impl MethodBeforeAdviceInterceptor {
    pub fn new(advice: Arc<dyn MethodBeforeAdvice>) -> Self {
        Self { advice }
    }
}

impl MethodInterceptor for MethodBeforeAdviceInterceptor {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> anyhow::Result<Value> {
        self.advice
            .before(invocation.signature(), invocation.arguments())?;
        invocation.proceed()
    }
}

/// 返回后通知适配器
pub struct AfterReturningAdviceInterceptor {
    advice: Arc<dyn AfterReturningAdvice>,
}

impl AfterReturningAdviceInterceptor {
    pub fn new(advice: Arc<dyn AfterReturningAdvice>) -> Self {
        Self { advice }
    }
}

impl MethodInterceptor for AfterReturningAdviceInterceptor {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> anyhow::Result<Value> {
        let signature = invocation.signature().clone();
        let args = invocation.arguments().to_vec();
        let result = invocation.proceed()?;
        self.advice.after_returning(&result, &signature, &args);
        Ok(result)
    }
}

/// 异常通知适配器
pub struct ThrowsAdviceInterceptor {
    advice: Arc<dyn ThrowsAdvice>,
}

impl ThrowsAdviceInterceptor {
    pub fn new(advice: Arc<dyn ThrowsAdvice>) -> Self {
        Self { advice }
    }
}

impl MethodInterceptor for ThrowsAdviceInterceptor {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> anyhow::Result<Value> {
        let signature = invocation.signature().clone();
        invocation.proceed().map_err(|error| {
            self.advice
                .after_throwing(&signature, &ThrownError::capture(&error));
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joinpoint::JoinPoint;
    use parking_lot::Mutex;

    fn invoke(
        interceptor: Arc<dyn MethodInterceptor>,
        target: &dyn Fn(Vec<Value>) -> anyhow::Result<Value>,
    ) -> anyhow::Result<Value> {
        let chain = vec![interceptor];
        let jp = JoinPoint::new(
            MethodSignature::new("demo.Calc", "square").returns("double").params(["Double"]),
            "demo.CalcImpl",
            vec![Value::Double(3.0)],
        );
        MethodInvocation::new(jp, &chain, target).proceed()
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl MethodBeforeAdvice for Recorder {
        fn before(&self, signature: &MethodSignature, args: &[Value]) -> anyhow::Result<()> {
            self.events
                .lock()
                .push(format!("before {} {:?}", signature.name, args));
            Ok(())
        }
    }

    impl AfterReturningAdvice for Recorder {
        fn after_returning(&self, result: &Value, signature: &MethodSignature, _args: &[Value]) {
            self.events
                .lock()
                .push(format!("returned {} {}", signature.name, result));
        }
    }

    impl ThrowsAdvice for Recorder {
        fn after_throwing(&self, signature: &MethodSignature, error: &ThrownError) {
            self.events
                .lock()
                .push(format!("threw {} {}", signature.name, error.message));
        }
    }

    #[test]
    fn test_before_and_after_returning() {
        let recorder = Arc::new(Recorder::default());
        let square = |args: Vec<Value>| -> anyhow::Result<Value> {
            let x = args[0].as_f64().unwrap_or_default();
            Ok(Value::Double(x * x))
        };

        let before = Arc::new(MethodBeforeAdviceInterceptor::new(recorder.clone()));
        assert_eq!(invoke(before, &square).unwrap(), Value::Double(9.0));

        let after = Arc::new(AfterReturningAdviceInterceptor::new(recorder.clone()));
        assert_eq!(invoke(after, &square).unwrap(), Value::Double(9.0));

        let events = recorder.events.lock().clone();
        assert_eq!(
            events,
            vec!["before square [Double(3.0)]", "returned square 9.0"]
        );
    }

    #[test]
    fn test_throws_advice_propagates_error() {
        #[derive(Debug, thiserror::Error)]
        #[error("negative input")]
        struct Negative;

        let recorder = Arc::new(Recorder::default());
        let failing = |_args: Vec<Value>| -> anyhow::Result<Value> { Err(Negative.into()) };

        let throws = Arc::new(ThrowsAdviceInterceptor::new(recorder.clone()));
        let err = invoke(throws, &failing).unwrap_err();

        assert!(err.downcast_ref::<Negative>().is_some());
        assert_eq!(recorder.events.lock().clone(), vec!["threw square negative input"]);
    }

    #[test]
    fn test_before_advice_error_skips_target() {
        struct Veto;
        impl MethodBeforeAdvice for Veto {
            fn before(&self, _: &MethodSignature, _: &[Value]) -> anyhow::Result<()> {
                anyhow::bail!("vetoed")
            }
        }

        let called = std::sync::atomic::AtomicBool::new(false);
        let target = |_args: Vec<Value>| -> anyhow::Result<Value> {
            called.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(Value::Unit)
        };

        let err = invoke(Arc::new(MethodBeforeAdviceInterceptor::new(Arc::new(Veto))), &target)
            .unwrap_err();
        assert_eq!(err.to_string(), "vetoed");
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }
}
