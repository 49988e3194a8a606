//! 两个示例的上下文配置

use std::path::PathBuf;
use std::sync::Arc;

use trellis_aop::prelude::*;
use trellis_core::prelude::*;

use crate::aspect::OperationsAspect;
use crate::operations::{operations_definition, proxy_registry, OPERATIONS_BEAN};

pub const APPLICATION_PROPERTIES: &str = "classpath:application.properties";

/// 示例资源目录（classpath 根）
pub fn resources_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

/// 打印每次调用的参数和返回值，结果原样返回
pub fn logging_interceptor() -> Arc<dyn MethodInterceptor> {
    Arc::new(interceptor_fn(|invocation: MethodInvocation<'_>| {
        println!("\nMethodInvocation=[{}]", invocation);
        println!("Args: {}", deep_to_string(invocation.arguments()));
        let rval = invocation.proceed()?;
        println!("Invocation returned : {}", rval);
        Ok(rval)
    }))
}

/// 方法名包含 `square` 的调用使用日志拦截器
pub struct AopApiConfiguration;

impl Configuration for AopApiConfiguration {
    fn name(&self) -> &str {
        "AopApiConfiguration"
    }

    fn configure(&self, context: &ApplicationContext) -> ContainerResult<()> {
        context.register(operations_definition(context.get_resource(APPLICATION_PROPERTIES)))?;

        context.register_singleton("operationsMethodInterceptor", |_: &dyn BeanFactory| {
            Ok(logging_interceptor())
        })?;

        context.register_singleton("operationsAdvisor", |factory: &dyn BeanFactory| {
            let interceptor =
                factory.get_typed_bean::<Arc<dyn MethodInterceptor>>("operationsMethodInterceptor")?;
            let pointcut = NameMatchMethodPointcut::with_mapped_names(["*Square*", "*square*"])?;
            Ok(Advisor::new("operationsAdvisor", Arc::new(pointcut), (*interceptor).clone()))
        })?;

        Ok(())
    }
}

/// 按名称自动代理计算器的上下文
pub fn api_context() -> ContainerResult<Arc<ApplicationContext>> {
    let creator = BeanNameAutoProxyCreator::new(proxy_registry())
        .with_bean_names([OPERATIONS_BEAN])
        .with_interceptor_names(["operationsAdvisor"]);

    ApplicationContext::builder()
        .classpath_root(resources_dir())
        .post_processor(Arc::new(creator))
        .configuration(AopApiConfiguration)
        .build()
}

/// 持有一条由配置拼出的消息
#[derive(Debug, Clone)]
pub struct AspectJApplication {
    pub message: String,
}

/// 切面自动代理的配置
pub struct AopAspectJConfiguration;

impl Configuration for AopAspectJConfiguration {
    fn name(&self) -> &str {
        "AopAspectJConfiguration"
    }

    fn configure(&self, context: &ApplicationContext) -> ContainerResult<()> {
        context.register(operations_definition(context.get_resource(APPLICATION_PROPERTIES)))?;

        context.register_singleton("aspectExample", |_: &dyn BeanFactory| {
            Ok(Arc::new(OperationsAspect) as Arc<dyn Aspect>)
        })?;

        let environment = Arc::clone(context.environment());
        context.register_singleton("aopAspectJApplication", move |_: &dyn BeanFactory| {
            Ok(AspectJApplication {
                message: environment.resolve_placeholders("${test} !")?,
            })
        })?;

        Ok(())
    }
}

/// 切面自动代理的上下文，读取 `application.properties`
pub fn aspectj_context() -> ContainerResult<Arc<ApplicationContext>> {
    ApplicationContext::builder()
        .classpath_root(resources_dir())
        .add_properties_resource(APPLICATION_PROPERTIES)?
        .post_processor(Arc::new(AspectJAutoProxyCreator::new(proxy_registry())))
        .configuration(AopAspectJConfiguration)
        .build()
}
