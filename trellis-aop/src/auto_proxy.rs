//! 自动代理 - 通过 BeanPostProcessor 在 Bean 初始化后包装代理
//!
//! ## 工作原理
//!
//! 1. [`ProxyRegistry`] 声明哪些 Bean 类型可以被代理：类型的方法签名，
//!    以及如何用 [`AopProxy`] 包装一个实例（手写的代理结构体）
//! 2. Bean 初始化后，后置处理器按类型查找注册项
//! 3. 找到通知器后创建代理，替换容器中的 Bean
//!
//! 被代理的 Bean 通常以 trait object 注册（`Arc<dyn Trait>`），
//! 代理包装后仍然是同一个 Bean 类型，按类型查找不受影响。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use trellis_core::prelude::*;

use crate::advice::MethodInterceptor;
use crate::advisor::Advisor;
use crate::aspect::{build_advisors, Aspect};
use crate::error::AopError;
use crate::joinpoint::MethodSignature;
use crate::pointcut::simple_match;
use crate::proxy::{AopProxy, ProxyFactory};

type ProxyWrapper = Arc<dyn Fn(SharedBean, AopProxy) -> ContainerResult<SharedBean> + Send + Sync>;

/// 可代理类型的注册项
pub struct ProxyTarget {
    pub target_type: String,
    pub signatures: Vec<MethodSignature>,
    wrap: ProxyWrapper,
}

impl ProxyTarget {
    pub fn wrap(&self, bean: SharedBean, proxy: AopProxy) -> ContainerResult<SharedBean> {
        (self.wrap)(bean, proxy)
    }
}

/// 可代理类型注册表，按 Bean 的值类型索引
#[derive(Default)]
pub struct ProxyRegistry {
    targets: HashMap<TypeId, Arc<ProxyTarget>>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册可代理的 Bean 类型 `B`
    ///
    /// `wrap` 接收原始 Bean 和代理，返回同类型的包装结果。
    pub fn register<B, F>(
        mut self,
        target_type: impl Into<String>,
        signatures: Vec<MethodSignature>,
        wrap: F,
    ) -> Self
    where
        B: Any + Send + Sync + Clone,
        F: Fn(B, AopProxy) -> B + Send + Sync + 'static,
    {
        let wrapper: ProxyWrapper = Arc::new(move |bean: SharedBean, proxy: AopProxy| {
            let inner = bean
                .downcast_ref::<B>()
                .cloned()
                .ok_or_else(|| ContainerError::TypeMismatch {
                    expected: std::any::type_name::<B>().to_string(),
                    found: "bean registered for proxying".to_string(),
                })?;
            Ok(Arc::new(wrap(inner, proxy)) as SharedBean)
        });

        self.targets.insert(
            TypeId::of::<B>(),
            Arc::new(ProxyTarget {
                target_type: target_type.into(),
                signatures,
                wrap: wrapper,
            }),
        );
        self
    }

    /// 查找 Bean 实例对应的注册项
    pub fn lookup(&self, bean: &SharedBean) -> Option<Arc<ProxyTarget>> {
        self.targets.get(&(**bean).type_id()).cloned()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// 按 Bean 名称自动代理
///
/// 名称匹配 `bean_names`（支持 `*` 通配符）的 Bean 被包装，
/// 通知来自 `interceptor_names` 指定的 Bean：`Advisor` 或 `Arc<dyn MethodInterceptor>`。
pub struct BeanNameAutoProxyCreator {
    bean_names: Vec<String>,
    interceptor_names: Vec<String>,
    registry: Arc<ProxyRegistry>,
}

impl BeanNameAutoProxyCreator {
    pub fn new(registry: ProxyRegistry) -> Self {
        Self {
            bean_names: Vec::new(),
            interceptor_names: Vec::new(),
            registry: Arc::new(registry),
        }
    }

    pub fn with_bean_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bean_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_interceptor_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interceptor_names.extend(names.into_iter().map(Into::into));
        self
    }

    fn matches_bean_name(&self, bean_name: &str) -> bool {
        self.bean_names
            .iter()
            .any(|pattern| simple_match(pattern, bean_name))
    }

    fn resolve_advisors(&self, factory: &dyn BeanFactory) -> ContainerResult<Vec<Advisor>> {
        self.interceptor_names
            .iter()
            .map(|name| {
                let bean = factory.get_bean(name)?;
                if let Some(advisor) = bean.downcast_ref::<Advisor>() {
                    Ok(advisor.clone())
                } else if let Some(interceptor) = bean.downcast_ref::<Arc<dyn MethodInterceptor>>() {
                    Ok(Advisor::always(name.clone(), interceptor.clone()))
                } else {
                    Err(AopError::AdviceNotFound(name.clone()).into())
                }
            })
            .collect()
    }
}

impl BeanPostProcessor for BeanNameAutoProxyCreator {
    fn name(&self) -> &str {
        "BeanNameAutoProxyCreator"
    }

    fn order(&self) -> i32 {
        2000
    }

    fn post_process_after_initialization(
        &self,
        bean: SharedBean,
        bean_name: &str,
        factory: &dyn BeanFactory,
    ) -> ContainerResult<SharedBean> {
        if !self.matches_bean_name(bean_name) {
            return Ok(bean);
        }

        let Some(target) = self.registry.lookup(&bean) else {
            tracing::debug!(
                "Bean '{}' matches proxy names but its type is not registered for proxying",
                bean_name
            );
            return Ok(bean);
        };

        let advisors = self.resolve_advisors(factory)?;
        tracing::info!(
            "Creating proxy for bean '{}' with interceptors {:?}",
            bean_name,
            self.interceptor_names
        );
        let proxy = ProxyFactory::new(target.target_type.clone())
            .add_advisors(advisors)
            .get_proxy();
        target.wrap(bean, proxy)
    }
}

/// AspectJ 风格的自动代理
///
/// 收集容器中所有 `Arc<dyn Aspect>` 和 `Advisor` Bean 以及手动添加的通知器，
/// 对至少有一个方法被匹配的已注册类型创建代理。
pub struct AspectJAutoProxyCreator {
    registry: Arc<ProxyRegistry>,
    advisors: Vec<Advisor>,
    discovered: RwLock<Option<Vec<Advisor>>>,
}

impl AspectJAutoProxyCreator {
    pub fn new(registry: ProxyRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            advisors: Vec::new(),
            discovered: RwLock::new(None),
        }
    }

    /// 手动添加通知器
    pub fn with_advisor(mut self, advisor: Advisor) -> Self {
        self.advisors.push(advisor);
        self
    }

    /// 候选通知器：容器中的切面和通知器，只收集一次
    fn candidate_advisors(&self, factory: &dyn BeanFactory) -> ContainerResult<Vec<Advisor>> {
        if let Some(cached) = self.discovered.read().as_ref() {
            return Ok(cached.clone());
        }

        // 不持有锁：获取切面 Bean 时会重新进入后置处理器
        let mut advisors = self.advisors.clone();
        for name in factory.get_bean_names_for_type(TypeId::of::<Advisor>()) {
            let advisor = factory.get_typed_bean::<Advisor>(&name)?;
            advisors.push((*advisor).clone());
        }
        for name in factory.get_bean_names_for_type(TypeId::of::<Arc<dyn Aspect>>()) {
            let aspect = factory.get_typed_bean::<Arc<dyn Aspect>>(&name)?;
            tracing::debug!("Building advisors for aspect bean '{}'", name);
            advisors.extend(build_advisors((*aspect).clone())?);
        }
        advisors.sort_by_key(|advisor| advisor.order);

        tracing::info!("Discovered {} advisor(s)", advisors.len());
        *self.discovered.write() = Some(advisors.clone());
        Ok(advisors)
    }
}

impl BeanPostProcessor for AspectJAutoProxyCreator {
    fn name(&self) -> &str {
        "AspectJAutoProxyCreator"
    }

    fn order(&self) -> i32 {
        2000
    }

    fn post_process_after_initialization(
        &self,
        bean: SharedBean,
        bean_name: &str,
        factory: &dyn BeanFactory,
    ) -> ContainerResult<SharedBean> {
        let Some(target) = self.registry.lookup(&bean) else {
            tracing::trace!("Bean '{}' is not a proxyable type, skipping", bean_name);
            return Ok(bean);
        };

        let advisors: Vec<Advisor> = self
            .candidate_advisors(factory)?
            .into_iter()
            .filter(|advisor| {
                target
                    .signatures
                    .iter()
                    .any(|signature| advisor.matches(signature))
            })
            .collect();

        if advisors.is_empty() {
            tracing::debug!("No advisor matches bean '{}', skipping proxy", bean_name);
            return Ok(bean);
        }

        tracing::info!(
            "Creating proxy for bean '{}' with {} advisor(s)",
            bean_name,
            advisors.len()
        );
        let proxy = ProxyFactory::new(target.target_type.clone())
            .add_advisors(advisors)
            .get_proxy();
        target.wrap(bean, proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::interceptor_fn;
    use crate::aspect::AdviceDeclaration;
    use crate::joinpoint::MethodInvocation;
    use crate::pointcut::NameMatchMethodPointcut;
    use crate::value::{arg_f64, Value};

    trait Greeter: Send + Sync {
        fn greet(&self, times: f64) -> anyhow::Result<f64>;
    }

    struct PlainGreeter;

    impl Greeter for PlainGreeter {
        fn greet(&self, times: f64) -> anyhow::Result<f64> {
            Ok(times)
        }
    }

    struct GreeterProxy {
        target: Arc<dyn Greeter>,
        proxy: AopProxy,
    }

    fn greet_signature() -> MethodSignature {
        MethodSignature::new("test.Greeter", "greet")
            .returns("double")
            .params(["Double"])
    }

    impl Greeter for GreeterProxy {
        fn greet(&self, times: f64) -> anyhow::Result<f64> {
            let signature = greet_signature();
            self.proxy
                .invoke_f64(&signature, vec![Value::Double(times)], |args| {
                    let times = arg_f64("greet", &args, 0)?;
                    self.target.greet(times).map(Value::Double)
                })
        }
    }

    fn registry() -> ProxyRegistry {
        ProxyRegistry::new().register::<Arc<dyn Greeter>, _>(
            "test.PlainGreeter",
            vec![greet_signature()],
            |target, proxy| Arc::new(GreeterProxy { target, proxy }) as Arc<dyn Greeter>,
        )
    }

    fn doubling() -> Arc<dyn MethodInterceptor> {
        Arc::new(interceptor_fn(|inv: MethodInvocation<'_>| {
            let value = inv.proceed()?;
            Ok(Value::Double(value.as_f64().unwrap_or_default() * 2.0))
        }))
    }

    fn factory_with_greeter(processor: Arc<dyn BeanPostProcessor>) -> DefaultListableBeanFactory {
        let factory = DefaultListableBeanFactory::new();
        factory.add_bean_post_processor(processor);
        factory
            .register_bean_definition(BeanDefinition::new("greeter", |_: &dyn BeanFactory| {
                Ok(Arc::new(PlainGreeter) as Arc<dyn Greeter>)
            }))
            .unwrap();
        factory
    }

    #[test]
    fn test_bean_name_auto_proxy_with_interceptor_bean() {
        let creator = BeanNameAutoProxyCreator::new(registry())
            .with_bean_names(["greet*"])
            .with_interceptor_names(["doubler"]);
        let factory = factory_with_greeter(Arc::new(creator));
        factory
            .register_bean_definition(BeanDefinition::new("doubler", |_: &dyn BeanFactory| Ok(doubling())))
            .unwrap();

        let greeter = factory.get_bean_by_type::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(3.0).unwrap(), 6.0);
    }

    #[test]
    fn test_bean_name_auto_proxy_rejects_non_advice_bean() {
        let creator = BeanNameAutoProxyCreator::new(registry())
            .with_bean_names(["greeter"])
            .with_interceptor_names(["notAdvice"]);
        let factory = factory_with_greeter(Arc::new(creator));
        factory
            .register_bean_definition(BeanDefinition::new("notAdvice", |_: &dyn BeanFactory| Ok(42_u32)))
            .unwrap();

        let err = factory.get_bean("greeter").unwrap_err();
        assert!(err.to_string().contains("notAdvice"));
    }

    #[test]
    fn test_unmatched_bean_name_is_left_alone() {
        let creator = BeanNameAutoProxyCreator::new(registry())
            .with_bean_names(["other"])
            .with_interceptor_names(["missing"]);
        let factory = factory_with_greeter(Arc::new(creator));

        let greeter = factory.get_bean_by_type::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(3.0).unwrap(), 3.0);
    }

    struct DoublingAspect;

    impl Aspect for DoublingAspect {
        fn name(&self) -> &str {
            "doublingAspect"
        }

        fn advice(self: Arc<Self>) -> Vec<AdviceDeclaration> {
            vec![AdviceDeclaration::around("execution(* test..*.greet(Double))", doubling())]
        }
    }

    #[test]
    fn test_aspectj_auto_proxy_discovers_aspects_and_advisors() {
        let pointcut = NameMatchMethodPointcut::with_mapped_names(["greet"]).unwrap();
        let creator = AspectJAutoProxyCreator::new(registry());
        let factory = factory_with_greeter(Arc::new(creator));
        factory
            .register_bean_definition(BeanDefinition::new("doublingAspect", |_: &dyn BeanFactory| {
                Ok(Arc::new(DoublingAspect) as Arc<dyn Aspect>)
            }))
            .unwrap();
        factory
            .register_bean_definition(BeanDefinition::new("plusOne", move |_: &dyn BeanFactory| {
                Ok(Advisor::new(
                    "plusOne",
                    Arc::new(pointcut.clone()),
                    Arc::new(interceptor_fn(|inv: MethodInvocation<'_>| {
                        let value = inv.proceed()?;
                        Ok(Value::Double(value.as_f64().unwrap_or_default() + 1.0))
                    })),
                ))
            }))
            .unwrap();

        let greeter = factory.get_bean_by_type::<Arc<dyn Greeter>>().unwrap();
        // Advisor Bean 的 order 为 0，位于切面（默认最低优先级）外层
        assert_eq!(greeter.greet(3.0).unwrap(), 7.0);
    }

    #[test]
    fn test_aspectj_auto_proxy_skips_unmatched_types() {
        let creator = AspectJAutoProxyCreator::new(registry()).with_advisor(Advisor::new(
            "nothing",
            Arc::new(NameMatchMethodPointcut::with_mapped_names(["other*"]).unwrap()),
            doubling(),
        ));
        let factory = factory_with_greeter(Arc::new(creator));

        let greeter = factory.get_bean_by_type::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(3.0).unwrap(), 3.0);
    }
}
