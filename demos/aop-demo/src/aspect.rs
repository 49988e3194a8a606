//! 环绕通知：每个数值参数加一后再调用目标方法

use std::sync::Arc;

use trellis_aop::prelude::*;

use crate::operations::flatten_numbers;

pub struct OperationsAspect;

impl OperationsAspect {
    pub const OPERATION_POINTCUT: &'static str = "execution(double demo..Oper*.*(..))";

    pub const AROUND_EXPRESSION: &'static str =
        "operationPointcut() && (args(Double, ..) || args(Double[], ..))";
}

/// 参数展开加一：多个数值合并成一个数组参数，单个数值保持标量
pub fn wrap_operation(pjp: MethodInvocation<'_>) -> anyhow::Result<Value> {
    println!("\nJoinPoint: {}", pjp.join_point());
    println!("Args: {}", deep_to_string(pjp.arguments()));

    let shifted: Vec<f64> = flatten_numbers(pjp.arguments())?
        .into_iter()
        .map(|n| n + 1.0)
        .collect();
    let args = if shifted.len() > 1 {
        vec![Value::Doubles(shifted)]
    } else {
        shifted.into_iter().map(Value::Double).collect()
    };

    let proceed = pjp.proceed_with(args)?;
    println!("Retour proceed(): {}", proceed);
    Ok(proceed)
}

impl Aspect for OperationsAspect {
    fn name(&self) -> &str {
        "aspectExample"
    }

    fn named_pointcuts(&self) -> Vec<(&'static str, &'static str)> {
        vec![("operationPointcut", Self::OPERATION_POINTCUT)]
    }

    fn advice(self: Arc<Self>) -> Vec<AdviceDeclaration> {
        vec![AdviceDeclaration::around(
            Self::AROUND_EXPRESSION,
            Arc::new(interceptor_fn(wrap_operation)),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{signatures, square_signature};
    use trellis_aop::build_advisors;

    #[test]
    fn test_advisor_matches_every_operation() {
        let advisors = build_advisors(Arc::new(OperationsAspect)).unwrap();
        assert_eq!(advisors.len(), 1);
        for signature in signatures() {
            assert!(advisors[0].matches(&signature), "{} should match", signature);
        }
    }

    #[test]
    fn test_arguments_are_shifted() {
        let proxy = ProxyFactory::new("demo.aop.beans.Operations")
            .add_advisors(build_advisors(Arc::new(OperationsAspect)).unwrap())
            .get_proxy();
        let seen = proxy
            .invoke(&square_signature(), vec![Value::Double(5.0)], |args| Ok(args[0].clone()))
            .unwrap();
        assert_eq!(seen, Value::Double(6.0));
    }
}
