use std::any::{Any, TypeId};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean_factory::{
    BeanFactory, ConfigurableBeanFactory, ConfigurableListableBeanFactory,
    DefaultListableBeanFactory, ListableBeanFactory,
};
use crate::component::{Component, Configuration};
use crate::lifecycle::BeanPostProcessor;
use crate::{
    bean::{BeanDefinition, SharedBean},
    config::{Environment, PropertySource},
    error::{ContainerError, ContainerResult},
    resource::{Resource, ResourceLoader},
    xml::{ClassRegistry, XmlBeanDefinitionReader},
    Scope,
};

/// Shutdown hook类型
pub type ShutdownHook = Box<dyn Fn() -> ContainerResult<()> + Send + Sync>;

/// 配置中指定激活 profile 的键
pub const ACTIVE_PROFILES_PROPERTY: &str = "profiles.active";

/// 应用上下文
///
/// ApplicationContext 持有 BeanFactory、Environment 和资源加载器，
/// 负责按 profile 过滤 Bean 定义以及容器的启动和关闭。
pub struct ApplicationContext {
    /// Bean 工厂 - 负责 Bean 的创建和管理
    bean_factory: Arc<DefaultListableBeanFactory>,

    /// 配置环境
    environment: Arc<Environment>,

    /// classpath 资源加载
    resource_loader: ResourceLoader,

    /// XML 中可以引用的类
    class_registry: Arc<ClassRegistry>,

    /// Shutdown hooks
    shutdown_hooks: RwLock<Vec<ShutdownHook>>,

    /// 是否已刷新 / 已关闭
    active: RwLock<bool>,
    closed: RwLock<bool>,
}

impl ApplicationContext {
    /// 创建新的应用上下文
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(Environment::new()),
            ResourceLoader::new(),
            Arc::new(ClassRegistry::new()),
        )
    }

    fn with_parts(
        environment: Arc<Environment>,
        resource_loader: ResourceLoader,
        class_registry: Arc<ClassRegistry>,
    ) -> Self {
        Self {
            bean_factory: Arc::new(DefaultListableBeanFactory::new()),
            environment,
            resource_loader,
            class_registry,
            shutdown_hooks: RwLock::new(Vec::new()),
            active: RwLock::new(false),
            closed: RwLock::new(false),
        }
    }

    /// 构建器模式创建上下文
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    /// 获取内部的 BeanFactory
    pub fn get_bean_factory(&self) -> &Arc<DefaultListableBeanFactory> {
        &self.bean_factory
    }

    /// 获取 Environment
    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    /// 获取资源加载器
    pub fn resource_loader(&self) -> &ResourceLoader {
        &self.resource_loader
    }

    /// 获取资源
    pub fn get_resource(&self, location: &str) -> Resource {
        self.resource_loader.get_resource(location)
    }

    /// 注册 Bean 定义
    ///
    /// 定义的 profile 条件不满足时跳过注册，返回 `Ok(false)`。
    pub fn register(&self, definition: BeanDefinition) -> ContainerResult<bool> {
        if !self.environment.accepts_all(&definition.profiles) {
            tracing::debug!(
                "Skipping bean '{}': profiles {:?} not accepted by active profiles {:?}",
                definition.name,
                definition.profiles,
                self.environment.get_active_profiles()
            );
            return Ok(false);
        }

        self.bean_factory.register_bean_definition(definition)?;
        Ok(true)
    }

    /// 注册单例 Bean
    pub fn register_singleton<T, F>(&self, name: impl Into<String>, factory: F) -> ContainerResult<bool>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.register(BeanDefinition::new(name, factory).with_scope(Scope::Singleton))
    }

    /// 注册原型 Bean
    pub fn register_prototype<T, F>(&self, name: impl Into<String>, factory: F) -> ContainerResult<bool>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.register(BeanDefinition::new(name, factory).with_scope(Scope::Prototype))
    }

    /// 注册组件
    pub fn register_component<C: Component>(&self) -> ContainerResult<bool> {
        tracing::debug!("Registering component '{}'", C::bean_name());
        self.register(C::bean_definition())
    }

    /// 执行配置类
    pub fn register_configuration(&self, configuration: &dyn Configuration) -> ContainerResult<()> {
        tracing::info!("Processing configuration class '{}'", configuration.name());
        configuration.configure(self)
    }

    /// 从 XML 资源加载 Bean 定义，返回实际注册的数量
    pub fn load_xml(&self, location: &str) -> ContainerResult<usize> {
        let resource = self.get_resource(location);
        if !resource.exists() {
            return Err(ContainerError::Resource(format!(
                "IOException parsing XML document from {}: resource does not exist",
                resource
            )));
        }

        let reader = XmlBeanDefinitionReader::new(
            Arc::clone(&self.class_registry),
            Arc::clone(&self.environment),
        );

        let mut registered = 0;
        for definition in reader.load_bean_definitions(&resource)? {
            if self.register(definition)? {
                registered += 1;
            }
        }
        Ok(registered)
    }

    /// 注册 BeanPostProcessor
    pub fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        self.bean_factory.add_bean_post_processor(processor);
    }

    /// 注册 shutdown hook
    ///
    /// Shutdown hook 会在应用关闭时按注册顺序执行
    pub fn register_shutdown_hook<F>(&self, hook: F)
    where
        F: Fn() -> ContainerResult<()> + Send + Sync + 'static,
    {
        let mut hooks = self.shutdown_hooks.write();
        hooks.push(Box::new(hook));
        tracing::debug!("Registered shutdown hook, total: {}", hooks.len());
    }

    /// 获取所有 Bean 的名称
    pub fn get_bean_names(&self) -> Vec<String> {
        self.bean_factory.get_bean_names()
    }

    /// 刷新上下文
    ///
    /// 1. 校验声明的依赖
    /// 2. 预实例化所有非延迟单例
    /// 3. 冻结配置
    pub fn refresh(&self) -> ContainerResult<()> {
        if *self.closed.read() {
            return Err(ContainerError::Config(
                "Cannot refresh a closed application context".to_string(),
            ));
        }

        tracing::info!(
            "Refreshing application context with {} bean definition(s)",
            self.bean_factory.get_bean_definition_count()
        );

        self.bean_factory.validate_dependencies()?;
        self.bean_factory.preinstantiate_singletons()?;
        self.bean_factory.freeze_configuration();

        *self.active.write() = true;
        tracing::info!("Application context refreshed");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        *self.active.read() && !*self.closed.read()
    }

    /// 关闭上下文：执行 shutdown hooks 并销毁单例（多次调用只生效一次）
    pub fn close(&self) -> ContainerResult<()> {
        {
            let mut closed = self.closed.write();
            if *closed {
                return Ok(());
            }
            *closed = true;
        }

        tracing::info!("Closing application context");

        let hooks = self.shutdown_hooks.read();
        tracing::debug!("Executing {} shutdown hook(s)", hooks.len());
        for (idx, hook) in hooks.iter().enumerate() {
            match hook() {
                Ok(_) => tracing::debug!("Shutdown hook {} executed successfully", idx + 1),
                Err(e) => tracing::warn!("Shutdown hook {} failed: {}", idx + 1, e),
            }
        }
        drop(hooks);

        self.bean_factory.destroy_singletons()?;
        *self.active.write() = false;

        tracing::info!("Application context closed");
        Ok(())
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("active", &*self.active.read())
            .field("closed", &*self.closed.read())
            .field("beans", &self.bean_factory.get_bean_names())
            .field("environment", &self.environment)
            .finish()
    }
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanFactory for ApplicationContext {
    fn get_bean(&self, name: &str) -> ContainerResult<SharedBean> {
        self.bean_factory.get_bean(name)
    }

    fn get_bean_for_type(&self, type_id: TypeId, type_name: &str) -> ContainerResult<SharedBean> {
        self.bean_factory.get_bean_for_type(type_id, type_name)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.bean_factory.contains_bean(name)
    }

    fn get_bean_names_for_type(&self, type_id: TypeId) -> Vec<String> {
        self.bean_factory.get_bean_names_for_type(type_id)
    }
}

type Registration = Box<dyn FnOnce(&ApplicationContext) -> ContainerResult<()>>;

/// 应用上下文构建器
///
/// 收集配置源、profile、classpath、后置处理器和各种 Bean 来源，
/// `build()` 时按以下顺序注册并刷新：后置处理器、配置类、组件和 Bean 定义、XML 资源。
pub struct ApplicationContextBuilder {
    environment: Arc<Environment>,
    active_profiles: Option<Vec<String>>,
    classpath_roots: Vec<PathBuf>,
    class_registry: ClassRegistry,
    post_processors: Vec<Arc<dyn BeanPostProcessor>>,
    configurations: Vec<Box<dyn Configuration>>,
    registrations: Vec<Registration>,
    xml_locations: Vec<String>,
}

impl ApplicationContextBuilder {
    pub fn new() -> Self {
        Self {
            environment: Arc::new(Environment::new()),
            active_profiles: None,
            classpath_roots: Vec::new(),
            class_registry: ClassRegistry::new(),
            post_processors: Vec::new(),
            configurations: Vec::new(),
            registrations: Vec::new(),
            xml_locations: Vec::new(),
        }
    }

    /// 添加配置源到 Environment
    pub fn add_property_source(self, source: Box<dyn PropertySource>) -> Self {
        self.environment.add_property_source(source);
        self
    }

    /// 添加 classpath 中的 `.properties` 文件作为配置源
    pub fn add_properties_resource(self, location: &str) -> ContainerResult<Self> {
        let loader = self.resource_loader();
        let resource = loader.get_resource(location);
        let content = resource.read_to_string()?;
        let source = crate::config::PropertiesPropertySource::parse(&content, resource.to_string());
        Ok(self.add_property_source(Box::new(source)))
    }

    /// 设置激活的 profiles（未设置时读取 `profiles.active` 配置）
    pub fn active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    /// 添加 classpath 根目录
    pub fn classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.classpath_roots.push(root.into());
        self
    }

    /// 设置 XML 可以引用的类
    pub fn class_registry(mut self, registry: ClassRegistry) -> Self {
        self.class_registry = registry;
        self
    }

    /// 添加 BeanPostProcessor
    pub fn post_processor(mut self, processor: Arc<dyn BeanPostProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    /// 添加配置类
    pub fn configuration(mut self, configuration: impl Configuration + 'static) -> Self {
        self.configurations.push(Box::new(configuration));
        self
    }

    /// 添加组件
    pub fn component<C: Component>(mut self) -> Self {
        self.registrations
            .push(Box::new(|context: &ApplicationContext| {
                context.register_component::<C>().map(|_| ())
            }));
        self
    }

    /// 注册 Bean 定义
    pub fn bean(mut self, definition: BeanDefinition) -> Self {
        self.registrations
            .push(Box::new(move |context: &ApplicationContext| {
                context.register(definition).map(|_| ())
            }));
        self
    }

    /// 添加 XML Bean 定义资源，例如 `classpath:applicationContext.xml`
    pub fn xml(mut self, location: impl Into<String>) -> Self {
        self.xml_locations.push(location.into());
        self
    }

    fn resource_loader(&self) -> ResourceLoader {
        self.classpath_roots
            .iter()
            .fold(ResourceLoader::new(), |loader, root| loader.with_classpath_root(root.clone()))
    }

    /// 构建并刷新上下文
    pub fn build(self) -> ContainerResult<Arc<ApplicationContext>> {
        let context = self.build_unrefreshed()?;
        context.refresh()?;
        Ok(context)
    }

    /// 构建上下文但不刷新（不预实例化单例）
    pub fn build_unrefreshed(self) -> ContainerResult<Arc<ApplicationContext>> {
        let profiles = match self.active_profiles.clone() {
            Some(profiles) => profiles,
            None => self
                .environment
                .get_string_array(ACTIVE_PROFILES_PROPERTY)
                .unwrap_or_default(),
        };
        self.environment.set_active_profiles(profiles);

        let context = Arc::new(ApplicationContext::with_parts(
            Arc::clone(&self.environment),
            self.resource_loader(),
            Arc::new(self.class_registry),
        ));

        for processor in self.post_processors {
            context.add_bean_post_processor(processor);
        }

        for configuration in &self.configurations {
            context.register_configuration(configuration.as_ref())?;
        }

        for registration in self.registrations {
            registration(&context)?;
        }

        for location in &self.xml_locations {
            let count = context.load_xml(location)?;
            tracing::debug!("Registered {} bean definition(s) from '{}'", count, location);
        }

        Ok(context)
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_factory::BeanFactoryExt;
    use crate::config::{ConfigValue, MapPropertySource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct French;
    struct English;

    impl Greeter for French {
        fn greet(&self) -> String {
            "Bonjour".to_string()
        }
    }

    impl Greeter for English {
        fn greet(&self) -> String {
            "Hello".to_string()
        }
    }

    fn greeters() -> ApplicationContextBuilder {
        ApplicationContext::builder()
            .bean(
                BeanDefinition::new("greeter", |_| Ok(Arc::new(French) as Arc<dyn Greeter>))
                    .with_profile("!env2"),
            )
            .bean(
                BeanDefinition::new("greeter", |_| Ok(Arc::new(English) as Arc<dyn Greeter>))
                    .with_profile("env2"),
            )
    }

    #[test]
    fn test_profile_filtering() {
        let context = greeters().build().unwrap();
        let greeter = context.get_bean_by_type::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "Bonjour");

        let context = greeters().active_profiles(["env2"]).build().unwrap();
        let greeter = context.get_typed_bean::<Arc<dyn Greeter>>("greeter").unwrap();
        assert_eq!(greeter.greet(), "Hello");
    }

    #[test]
    fn test_profiles_from_properties() {
        let context = greeters()
            .add_property_source(Box::new(
                MapPropertySource::new("test")
                    .with_property(ACTIVE_PROFILES_PROPERTY, ConfigValue::String("env2".into())),
            ))
            .build()
            .unwrap();
        assert_eq!(context.environment().get_active_profiles(), vec!["env2"]);
        let greeter = context.get_bean_by_type::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "Hello");
    }

    #[test]
    fn test_refresh_instantiates_eager_singletons_only() {
        static EAGER: AtomicUsize = AtomicUsize::new(0);
        static LAZY: AtomicUsize = AtomicUsize::new(0);

        let context = ApplicationContext::builder()
            .bean(BeanDefinition::new("eager", |_| {
                EAGER.fetch_add(1, Ordering::SeqCst);
                Ok(1u8)
            }))
            .bean(
                BeanDefinition::new("lazy", |_| {
                    LAZY.fetch_add(1, Ordering::SeqCst);
                    Ok(2u16)
                })
                .with_lazy(true),
            )
            .build()
            .unwrap();

        assert!(context.is_active());
        assert_eq!(EAGER.load(Ordering::SeqCst), 1);
        assert_eq!(LAZY.load(Ordering::SeqCst), 0);

        assert_eq!(*context.get_typed_bean::<u16>("lazy").unwrap(), 2);
        assert_eq!(LAZY.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_state_and_bean_names() {
        let context = ApplicationContext::builder()
            .bean(BeanDefinition::new("person", |_| Ok(1u8)))
            .build()
            .unwrap();
        let text = format!("{:?}", context);
        assert!(text.starts_with("ApplicationContext { active: true, closed: false"), "{}", text);
        assert!(text.contains("beans: [\"person\"]"), "{}", text);

        let failed = ApplicationContext::builder()
            .bean(BeanDefinition::new("person", |_| Ok(())).with_dependencies(vec!["adress".into()]))
            .build()
            .unwrap_err();
        assert!(failed.to_string().contains("adress"), "{}", failed);
    }

    #[test]
    fn test_missing_declared_dependency_fails_refresh() {
        let result = ApplicationContext::builder()
            .bean(BeanDefinition::new("person", |_| Ok(())).with_dependencies(vec!["adress".into()]))
            .build();
        assert!(matches!(result, Err(ContainerError::Config(_))));
    }

    #[test]
    fn test_close_runs_hooks_once() {
        static HOOKS: AtomicUsize = AtomicUsize::new(0);

        let context = ApplicationContext::builder().build().unwrap();
        context.register_shutdown_hook(|| {
            HOOKS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        context.close().unwrap();
        context.close().unwrap();
        assert_eq!(HOOKS.load(Ordering::SeqCst), 1);
        assert!(!context.is_active());
        assert!(context.refresh().is_err());
    }

    #[test]
    fn test_missing_xml_resource() {
        let result = ApplicationContext::builder()
            .classpath_root(env!("CARGO_MANIFEST_DIR"))
            .xml("classpath:missing.xml")
            .build();
        assert!(matches!(result, Err(ContainerError::Resource(_))));
    }
}
