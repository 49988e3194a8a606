//! 计算器 Bean 及其手写代理

use std::sync::Arc;

use anyhow::{anyhow, bail};
use trellis_aop::prelude::*;
use trellis_core::prelude::*;

/// 计算器实现类的全限定名
pub const OPERATIONS_TYPE: &str = "demo.aop.beans.Operations";

/// 计算器 Bean 名称
pub const OPERATIONS_BEAN: &str = "operations";

/// 计算器
pub trait Operations: Send + Sync {
    fn square(&self, number: f64) -> anyhow::Result<f64>;

    fn sum_of_squares(&self, numbers: &[f64]) -> anyhow::Result<f64>;

    fn square_of_sum(&self, numbers: &[f64]) -> anyhow::Result<f64>;
}

pub fn square_signature() -> MethodSignature {
    MethodSignature::new(OPERATIONS_TYPE, "square")
        .returns("double")
        .params(["Double"])
}

pub fn sum_of_squares_signature() -> MethodSignature {
    MethodSignature::new(OPERATIONS_TYPE, "sum_of_squares")
        .returns("double")
        .params(["Double[]"])
}

pub fn square_of_sum_signature() -> MethodSignature {
    MethodSignature::new(OPERATIONS_TYPE, "square_of_sum")
        .returns("double")
        .params(["Double[]"])
}

/// 计算器的全部方法签名
pub fn signatures() -> Vec<MethodSignature> {
    vec![square_signature(), sum_of_squares_signature(), square_of_sum_signature()]
}

/// 计算器实现，持有一个 classpath 资源用于演示资源注入
pub struct DefaultOperations {
    application_properties: Resource,
}

impl DefaultOperations {
    pub fn new(application_properties: Resource) -> Self {
        Self { application_properties }
    }

    fn show_resource(&self) -> anyhow::Result<()> {
        println!("applicationProperties: {}", self.application_properties);
        println!("{}", self.application_properties.absolute_path()?.display());
        Ok(())
    }
}

impl Operations for DefaultOperations {
    fn square(&self, number: f64) -> anyhow::Result<f64> {
        if let Err(e) = self.show_resource() {
            tracing::warn!("Cannot show application properties: {:#}", e);
        }
        Ok(number * number)
    }

    fn sum_of_squares(&self, numbers: &[f64]) -> anyhow::Result<f64> {
        if numbers.is_empty() {
            bail!("sum_of_squares requires at least one number");
        }
        Ok(numbers.iter().map(|n| n * n).sum())
    }

    fn square_of_sum(&self, numbers: &[f64]) -> anyhow::Result<f64> {
        if numbers.is_empty() {
            bail!("square_of_sum requires at least one number");
        }
        Ok(numbers.iter().sum::<f64>().powi(2))
    }
}

/// 计算器代理：每个方法都经过拦截器链
pub struct OperationsProxy {
    target: Arc<dyn Operations>,
    proxy: AopProxy,
}

impl OperationsProxy {
    pub fn new(target: Arc<dyn Operations>, proxy: AopProxy) -> Self {
        Self { target, proxy }
    }
}

impl Operations for OperationsProxy {
    fn square(&self, number: f64) -> anyhow::Result<f64> {
        self.proxy
            .invoke_f64(&square_signature(), vec![Value::Double(number)], |args| {
                let number = arg_f64("square", &args, 0)?;
                self.target.square(number).map(Value::Double)
            })
    }

    fn sum_of_squares(&self, numbers: &[f64]) -> anyhow::Result<f64> {
        self.proxy
            .invoke_f64(&sum_of_squares_signature(), vec![numbers.into()], |args| {
                let numbers = arg_doubles("sum_of_squares", &args, 0)?;
                self.target.sum_of_squares(&numbers).map(Value::Double)
            })
    }

    fn square_of_sum(&self, numbers: &[f64]) -> anyhow::Result<f64> {
        self.proxy
            .invoke_f64(&square_of_sum_signature(), vec![numbers.into()], |args| {
                let numbers = arg_doubles("square_of_sum", &args, 0)?;
                self.target.square_of_sum(&numbers).map(Value::Double)
            })
    }
}

/// 声明计算器可以被自动代理
pub fn proxy_registry() -> ProxyRegistry {
    ProxyRegistry::new().register::<Arc<dyn Operations>, _>(
        OPERATIONS_TYPE,
        signatures(),
        |target, proxy| Arc::new(OperationsProxy::new(target, proxy)) as Arc<dyn Operations>,
    )
}

/// 计算器 Bean 定义
pub fn operations_definition(application_properties: Resource) -> BeanDefinition {
    BeanDefinition::new(OPERATIONS_BEAN, move |_: &dyn BeanFactory| {
        Ok(Arc::new(DefaultOperations::new(application_properties.clone())) as Arc<dyn Operations>)
    })
}

/// 把参数展开为数值列表，非数值参数是错误
pub fn flatten_numbers(args: &[Value]) -> anyhow::Result<Vec<f64>> {
    args.iter()
        .map(|arg| {
            arg.as_doubles()
                .ok_or_else(|| anyhow!("cannot convert {} argument '{}' to a number", arg.type_name(), arg))
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .map(|lists| lists.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> DefaultOperations {
        DefaultOperations::new(ResourceLoader::new().get_resource("classpath:missing.properties"))
    }

    #[test]
    fn test_arithmetic() {
        let ops = plain();
        assert_eq!(ops.square(5.0).unwrap(), 25.0);
        assert_eq!(ops.sum_of_squares(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 55.0);
        assert_eq!(ops.square_of_sum(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 225.0);
        assert!(ops.sum_of_squares(&[]).is_err());
        assert!(ops.square_of_sum(&[]).is_err());
    }

    #[test]
    fn test_unadvised_proxy_passes_through() {
        let proxy = OperationsProxy::new(Arc::new(plain()), ProxyFactory::new(OPERATIONS_TYPE).get_proxy());
        assert_eq!(proxy.square(3.0).unwrap(), 9.0);
        assert_eq!(proxy.square_of_sum(&[1.0, 2.0]).unwrap(), 9.0);
    }

    #[test]
    fn test_flatten_numbers() {
        let args = vec![Value::Double(1.0), Value::Doubles(vec![2.0, 3.0])];
        assert_eq!(flatten_numbers(&args).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(flatten_numbers(&[Value::Text("x".into())]).is_err());
    }
}
