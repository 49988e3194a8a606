//! 代理工厂
//!
//! Rust 没有运行时动态代理，被代理的 trait 需要一个手写的代理结构体：
//! 每个方法把参数转换为 [`Value`]，交给 [`AopProxy::invoke`]，
//! 再在目标闭包里调用真实对象。

use std::sync::Arc;

use crate::advice::MethodInterceptor;
use crate::advisor::Advisor;
use crate::joinpoint::{JoinPoint, MethodInvocation, MethodSignature};
use crate::value::Value;

/// 代理工厂
pub struct ProxyFactory {
    target_type: String,
    advisors: Vec<Advisor>,
}

impl ProxyFactory {
    /// `target_type` 是目标对象实际类型的名称，只用于显示
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            advisors: Vec::new(),
        }
    }

    pub fn add_advisor(mut self, advisor: Advisor) -> Self {
        self.advisors.push(advisor);
        self
    }

    pub fn add_advisors(mut self, advisors: impl IntoIterator<Item = Advisor>) -> Self {
        self.advisors.extend(advisors);
        self
    }

    /// 添加匹配所有方法的拦截器
    pub fn add_interceptor(self, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        let name = format!("interceptor#{}", self.advisors.len());
        self.add_advisor(Advisor::always(name, interceptor))
    }

    pub fn get_proxy(self) -> AopProxy {
        let mut advisors = self.advisors;
        // 稳定排序，order 相同时保持注册顺序
        advisors.sort_by_key(|advisor| advisor.order);
        AopProxy {
            target_type: self.target_type,
            advisors,
        }
    }
}

/// 代理
///
/// 每次调用时按签名筛选通知器，组成拦截器链。
#[derive(Clone, Debug)]
pub struct AopProxy {
    target_type: String,
    advisors: Vec<Advisor>,
}

impl AopProxy {
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn advisors(&self) -> &[Advisor] {
        &self.advisors
    }

    /// 该方法是否会被拦截
    pub fn is_advised(&self, signature: &MethodSignature) -> bool {
        self.advisors.iter().any(|advisor| advisor.matches(signature))
    }

    /// 通过拦截器链调用目标方法
    ///
    /// 没有匹配的通知器时直接调用目标方法；目标方法的错误原样返回。
    pub fn invoke<F>(
        &self,
        signature: &MethodSignature,
        args: Vec<Value>,
        target: F,
    ) -> anyhow::Result<Value>
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Value>,
    {
        let chain: Vec<Arc<dyn MethodInterceptor>> = self
            .advisors
            .iter()
            .filter(|advisor| advisor.matches(signature))
            .map(|advisor| advisor.interceptor.clone())
            .collect();

        if chain.is_empty() {
            return target(args);
        }

        tracing::debug!(
            method = %signature.short_name(),
            interceptors = chain.len(),
            "invoking advised method"
        );
        let join_point = JoinPoint::new(signature.clone(), self.target_type.clone(), args);
        MethodInvocation::new(join_point, &chain, &target).proceed()
    }

    /// 调用返回 `double` 的方法
    pub fn invoke_f64<F>(
        &self,
        signature: &MethodSignature,
        args: Vec<Value>,
        target: F,
    ) -> anyhow::Result<f64>
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Value>,
    {
        let method = signature.short_name();
        Ok(self.invoke(signature, args, target)?.into_f64(&method)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::interceptor_fn;
    use crate::pointcut::NameMatchMethodPointcut;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sig(name: &str) -> MethodSignature {
        MethodSignature::new("demo.aop.Operations", name)
            .returns("double")
            .params(["Double"])
    }

    fn tracing_interceptor(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn MethodInterceptor> {
        Arc::new(interceptor_fn(move |inv: MethodInvocation<'_>| {
            log.lock().push(format!("{} in", label));
            let result = inv.proceed();
            log.lock().push(format!("{} out", label));
            result
        }))
    }

    #[test]
    fn test_chain_respects_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let proxy = ProxyFactory::new("demo.aop.OperationsImpl")
            .add_advisor(Advisor::always("second", tracing_interceptor("second", log.clone())).with_order(2))
            .add_advisor(Advisor::always("first", tracing_interceptor("first", log.clone())).with_order(1))
            .get_proxy();

        let result = proxy
            .invoke(&sig("square"), vec![Value::Double(3.0)], |_| Ok(Value::Double(9.0)))
            .unwrap();

        assert_eq!(result, Value::Double(9.0));
        assert_eq!(
            log.lock().clone(),
            vec!["first in", "second in", "second out", "first out"]
        );
    }

    #[test]
    fn test_unmatched_method_is_not_intercepted() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let pointcut = NameMatchMethodPointcut::with_mapped_names(["*square*"]).unwrap();
        let proxy = ProxyFactory::new("Impl")
            .add_advisor(Advisor::new(
                "counting",
                Arc::new(pointcut),
                Arc::new(interceptor_fn(move |inv: MethodInvocation<'_>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    inv.proceed()
                })),
            ))
            .get_proxy();

        assert!(proxy.is_advised(&sig("square")));
        assert!(!proxy.is_advised(&sig("cube")));

        proxy.invoke(&sig("cube"), vec![], |_| Ok(Value::Unit)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        proxy.invoke(&sig("square"), vec![], |_| Ok(Value::Unit)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invoke_f64_rejects_wrong_return_type() {
        let proxy = ProxyFactory::new("Impl").get_proxy();
        let err = proxy
            .invoke_f64(&sig("square"), vec![], |_| Ok(Value::Text("oops".into())))
            .unwrap_err();
        assert!(err.to_string().contains("Operations.square"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("target failed with {0}")]
    struct TargetFailure(i64);

    proptest! {
        // 拦截器只观察时：目标方法最多执行一次，结果和错误原样返回
        #[test]
        fn prop_pass_through_interceptors(
            input in -1.0e6f64..1.0e6,
            depth in 0usize..5,
            fail in any::<bool>(),
            code in any::<i64>(),
        ) {
            let mut factory = ProxyFactory::new("Impl");
            for _ in 0..depth {
                factory = factory.add_interceptor(Arc::new(interceptor_fn(|inv: MethodInvocation<'_>| inv.proceed())));
            }
            let proxy = factory.get_proxy();

            let calls = AtomicUsize::new(0);
            let result = proxy.invoke(&sig("square"), vec![Value::Double(input)], |args| {
                calls.fetch_add(1, Ordering::SeqCst);
                if fail {
                    return Err(TargetFailure(code).into());
                }
                Ok(Value::Double(args[0].as_f64().unwrap_or_default() * 2.0))
            });

            prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
            match result {
                Ok(value) => {
                    prop_assert!(!fail);
                    prop_assert_eq!(value, Value::Double(input * 2.0));
                }
                Err(err) => {
                    prop_assert!(fail);
                    let failure = err.downcast_ref::<TargetFailure>();
                    prop_assert!(failure.is_some());
                    prop_assert_eq!(failure.map(|f| f.0), Some(code));
                }
            }
        }

        // 短路的拦截器不会调用目标方法
        #[test]
        fn prop_short_circuit_skips_target(value in any::<i64>()) {
            let proxy = ProxyFactory::new("Impl")
                .add_interceptor(Arc::new(interceptor_fn(move |_inv: MethodInvocation<'_>| Ok(Value::Long(value)))))
                .get_proxy();

            let calls = AtomicUsize::new(0);
            let result = proxy
                .invoke(&sig("square"), vec![], |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Unit)
                })
                .unwrap();

            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
            prop_assert_eq!(result, Value::Long(value));
        }
    }
}
