//! 连接点（JoinPoint）定义
//!
//! 连接点表示程序执行的特定点，这里只支持方法调用。
//! [`MethodInvocation`] 在连接点之上携带剩余的拦截器链和目标方法。

use std::fmt;
use std::sync::Arc;

use crate::advice::MethodInterceptor;
use crate::value::{deep_to_string, Value};

/// 方法签名
///
/// 切点匹配只看签名，不看参数值（`args(..)` 也按声明的参数类型匹配）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// 声明方法的类型全名，例如 `demo.aop.Operations`
    pub declaring_type: String,

    /// 方法名称
    pub name: String,

    /// 返回类型名称，例如 `double`
    pub return_type: String,

    /// 参数类型名称，例如 `Double`、`Double[]`
    pub param_types: Vec<String>,
}

impl MethodSignature {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            return_type: "void".to_string(),
            param_types: Vec::new(),
        }
    }

    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn params<I, S>(mut self, param_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_types = param_types.into_iter().map(Into::into).collect();
        self
    }

    /// 声明类型的简单名称
    pub fn declaring_simple_name(&self) -> &str {
        self.declaring_type
            .rsplit('.')
            .next()
            .unwrap_or(&self.declaring_type)
    }

    /// `Operations.square` 形式的短名称，用于日志
    pub fn short_name(&self) -> String {
        format!("{}.{}", self.declaring_simple_name(), self.name)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}({})",
            self.return_type,
            self.declaring_type,
            self.name,
            self.param_types.join(",")
        )
    }
}

/// 连接点信息
///
/// 包含方法调用时的上下文信息
#[derive(Debug, Clone)]
pub struct JoinPoint {
    pub signature: MethodSignature,

    /// 目标对象的实际类型名称
    pub target_type: String,

    /// 方法参数
    pub args: Vec<Value>,
}

impl JoinPoint {
    pub fn new(signature: MethodSignature, target_type: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            signature,
            target_type: target_type.into(),
            args,
        }
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn method_name(&self) -> &str {
        &self.signature.name
    }
}

impl fmt::Display for JoinPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution({})", self.signature)
    }
}

/// 目标方法：接收（可能被替换过的）参数，返回结果
pub type TargetFn<'a> = &'a (dyn Fn(Vec<Value>) -> anyhow::Result<Value> + 'a);

/// 一次方法调用
///
/// `proceed` 消耗调用本身，因此同一条拦截器路径上目标方法最多执行一次。
pub struct MethodInvocation<'a> {
    join_point: JoinPoint,
    interceptors: &'a [Arc<dyn MethodInterceptor>],
    target: TargetFn<'a>,
}

impl<'a> MethodInvocation<'a> {
    pub fn new(
        join_point: JoinPoint,
        interceptors: &'a [Arc<dyn MethodInterceptor>],
        target: TargetFn<'a>,
    ) -> Self {
        Self {
            join_point,
            interceptors,
            target,
        }
    }

    pub fn join_point(&self) -> &JoinPoint {
        &self.join_point
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.join_point.signature
    }

    pub fn arguments(&self) -> &[Value] {
        &self.join_point.args
    }

    /// 剩余的拦截器数量
    pub fn remaining(&self) -> usize {
        self.interceptors.len()
    }

    /// 以当前参数继续执行拦截器链
    pub fn proceed(self) -> anyhow::Result<Value> {
        match self.interceptors.split_first() {
            Some((next, rest)) => {
                let invocation = MethodInvocation {
                    join_point: self.join_point,
                    interceptors: rest,
                    target: self.target,
                };
                next.invoke(invocation)
            }
            None => {
                tracing::trace!(method = %self.join_point.signature.short_name(), "invoking target");
                (self.target)(self.join_point.args)
            }
        }
    }

    /// 替换参数后继续执行拦截器链
    pub fn proceed_with(mut self, args: Vec<Value>) -> anyhow::Result<Value> {
        self.join_point.args = args;
        self.proceed()
    }
}

impl fmt::Display for MethodInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectiveMethodInvocation: public {}; target is of class [{}]",
            self.join_point.signature, self.join_point.target_type
        )
    }
}

impl fmt::Debug for MethodInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("join_point", &self.join_point)
            .field("args", &deep_to_string(&self.join_point.args))
            .field("remaining", &self.interceptors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::interceptor_fn;
    use std::cell::Cell;

    fn square_signature() -> MethodSignature {
        MethodSignature::new("demo.aop.Operations", "square")
            .returns("double")
            .params(["Double"])
    }

    #[test]
    fn test_signature_display() {
        assert_eq!(
            square_signature().to_string(),
            "double demo.aop.Operations.square(Double)"
        );
        assert_eq!(square_signature().short_name(), "Operations.square");
    }

    #[test]
    fn test_invocation_display() {
        let target = |_args: Vec<Value>| -> anyhow::Result<Value> { Ok(Value::Unit) };
        let jp = JoinPoint::new(square_signature(), "demo.aop.OperationsImpl", vec![Value::Double(5.0)]);
        assert_eq!(jp.to_string(), "execution(double demo.aop.Operations.square(Double))");

        let invocation = MethodInvocation::new(jp, &[], &target);
        assert_eq!(
            invocation.to_string(),
            "ReflectiveMethodInvocation: public double demo.aop.Operations.square(Double); \
             target is of class [demo.aop.OperationsImpl]"
        );
    }

    #[test]
    fn test_chain_order_and_single_target_call() {
        let calls = Cell::new(0);
        let target = |args: Vec<Value>| -> anyhow::Result<Value> {
            calls.set(calls.get() + 1);
            let x = args[0].as_f64().unwrap_or_default();
            Ok(Value::Double(x * x))
        };

        let add_one: Arc<dyn MethodInterceptor> = Arc::new(interceptor_fn(|inv: MethodInvocation<'_>| {
            let x = inv.arguments()[0].as_f64().unwrap_or_default();
            inv.proceed_with(vec![Value::Double(x + 1.0)])
        }));
        let double_result: Arc<dyn MethodInterceptor> = Arc::new(interceptor_fn(|inv: MethodInvocation<'_>| {
            let value = inv.proceed()?;
            Ok(Value::Double(value.as_f64().unwrap_or_default() * 2.0))
        }));

        let chain = vec![add_one, double_result];
        let jp = JoinPoint::new(square_signature(), "Impl", vec![Value::Double(5.0)]);
        let result = MethodInvocation::new(jp, &chain, &target).proceed().unwrap();

        assert_eq!(result, Value::Double(72.0));
        assert_eq!(calls.get(), 1);
    }
}
