//! Java-config 风格的上下文
//!
//! - `adress`：原型，每次获取都是新的地址
//! - `adressService` / `adressServiceFalse`：延迟单例，第一次被请求时才创建
//! - `personService`：`env2` 激活时为 [`Env2PersonService`]，否则为 [`DefaultPersonService`]
//! - `person`：组件，构造时按类型注入地址

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use trellis_core::prelude::*;

use crate::beans::{Adress, Person};
use crate::services::{
    AdressService, AdressServiceFalse, AdressServiceTrue, DefaultPersonService, Env2PersonService,
    PersonService,
};

pub const ENV2_PROFILE: &str = "env2";

/// 组件形式的人员
pub struct ConfiguredPerson(Person);

impl Component for ConfiguredPerson {
    fn bean_name() -> String {
        "person".to_string()
    }

    fn create(factory: &dyn BeanFactory) -> ContainerResult<Self> {
        let adress = factory.get_bean_by_type::<Adress>()?;
        Ok(Self(Person::new("Arthur Shelby", "1892-06-30", Some(adress))?))
    }
}

impl Deref for ConfiguredPerson {
    type Target = Person;

    fn deref(&self) -> &Person {
        &self.0
    }
}

impl fmt::Display for ConfiguredPerson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 工厂方法被调用时打印的记录
#[derive(Debug, Clone, Default)]
pub struct CreationLog(Arc<RwLock<Vec<String>>>);

impl CreationLog {
    fn record(&self, line: String) {
        println!("{}", line);
        self.0.write().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.read().clone()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.0.read().iter().any(|line| line.starts_with(prefix))
    }
}

#[derive(Default)]
pub struct JavaConfiguration {
    log: CreationLog,
}

impl JavaConfiguration {
    pub fn new(log: CreationLog) -> Self {
        Self { log }
    }
}

impl Configuration for JavaConfiguration {
    fn name(&self) -> &str {
        "JavaConfiguration"
    }

    fn configure(&self, context: &ApplicationContext) -> ContainerResult<()> {
        context.register_prototype("adress", |_: &dyn BeanFactory| {
            Ok(Adress::new("73, traverse Régny", "13009", "Marseille"))
        })?;

        let log = self.log.clone();
        context.register(
            BeanDefinition::new("adressService", move |_: &dyn BeanFactory| {
                let adress_service = AdressServiceTrue;
                log.record(format!("adressServiceTrue: {:?}", adress_service));
                Ok(adress_service)
            })
            .with_lazy(true),
        )?;

        let log = self.log.clone();
        context.register(
            BeanDefinition::new("adressServiceFalse", move |_: &dyn BeanFactory| {
                let adress_service = AdressServiceFalse;
                log.record(format!("adressServiceFalse: {:?}", adress_service));
                Ok(adress_service)
            })
            .with_lazy(true),
        )?;

        let log = self.log.clone();
        context.register(
            BeanDefinition::new("personService", move |factory: &dyn BeanFactory| {
                let adress_service: Arc<dyn AdressService> =
                    factory.get_typed_bean::<AdressServiceTrue>("adressService")?;
                let service: Arc<dyn PersonService> = Arc::new(Env2PersonService::new(adress_service));
                log.record(format!("personService2: {}", service.name()));
                Ok(service)
            })
            .with_profile(ENV2_PROFILE),
        )?;

        let log = self.log.clone();
        context.register(
            BeanDefinition::new("personService", move |factory: &dyn BeanFactory| {
                let adress_service: Arc<dyn AdressService> =
                    factory.get_typed_bean::<AdressServiceTrue>("adressService")?;
                let service: Arc<dyn PersonService> = Arc::new(DefaultPersonService::new(adress_service));
                log.record(format!("personService: {}", service.name()));
                Ok(service)
            })
            .with_profile(format!("!{}", ENV2_PROFILE)),
        )?;

        context.register_component::<ConfiguredPerson>()?;
        Ok(())
    }
}

/// 激活的 profile 取自 `TRELLIS_PROFILES_ACTIVE`
pub fn java_context(log: CreationLog) -> ContainerResult<Arc<ApplicationContext>> {
    ApplicationContext::builder()
        .add_property_source(Box::new(EnvironmentPropertySource::new("TRELLIS_")))
        .configuration(JavaConfiguration::new(log))
        .build()
}

pub fn java_context_with_profiles<I, S>(log: CreationLog, profiles: I) -> ContainerResult<Arc<ApplicationContext>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ApplicationContext::builder()
        .active_profiles(profiles)
        .configuration(JavaConfiguration::new(log))
        .build()
}
