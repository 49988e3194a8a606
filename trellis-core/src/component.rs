use crate::{
    bean::BeanDefinition,
    bean_factory::BeanFactory,
    context::ApplicationContext,
    error::ContainerResult,
    utils::naming::default_bean_name,
    Scope,
};

/// Component trait - 可以自行注册到容器的组件
///
/// 组件通过 `create` 从 BeanFactory 中获取依赖完成构造函数注入，
/// 默认 Bean 名称为类型短名称的 camelCase 形式。
///
/// # 示例
///
/// ```
/// use std::sync::Arc;
/// use trellis_core::prelude::*;
///
/// struct Adress;
///
/// struct Person {
///     adress: Arc<Adress>,
/// }
///
/// impl Component for Person {
///     fn bean_name() -> String {
///         "bean".to_string()
///     }
///
///     fn create(factory: &dyn BeanFactory) -> ContainerResult<Self> {
///         Ok(Person { adress: factory.get_bean_by_type::<Adress>()? })
///     }
/// }
/// ```
pub trait Component: Sized + Send + Sync + 'static {
    /// 获取 Bean 名称
    fn bean_name() -> String {
        default_bean_name::<Self>()
    }

    /// 获取作用域
    fn scope() -> Scope {
        Scope::Singleton
    }

    /// 是否延迟初始化
    fn lazy() -> bool {
        false
    }

    /// 是否为首选 Bean
    fn primary() -> bool {
        false
    }

    /// 激活条件
    fn profiles() -> Vec<String> {
        Vec::new()
    }

    /// 获取依赖的 bean 名称列表
    fn dependencies() -> Vec<String> {
        Vec::new()
    }

    /// 初始化回调（类似 @PostConstruct）
    fn init_callback() -> Option<fn(&mut Self) -> ContainerResult<()>> {
        None
    }

    /// 销毁回调（类似 @PreDestroy）
    fn destroy_callback() -> Option<fn(&mut Self) -> ContainerResult<()>> {
        None
    }

    /// 从容器创建实例
    fn create(factory: &dyn BeanFactory) -> ContainerResult<Self>;

    /// 生成 Bean 定义
    fn bean_definition() -> BeanDefinition {
        let mut definition = BeanDefinition::new(Self::bean_name(), |factory: &dyn BeanFactory| {
            Self::create(factory)
        })
        .with_scope(Self::scope())
        .with_lazy(Self::lazy())
        .with_primary(Self::primary())
        .with_dependencies(Self::dependencies());

        for profile in Self::profiles() {
            definition = definition.with_profile(profile);
        }

        if let Some(init_fn) = Self::init_callback() {
            definition = definition.with_init(init_fn);
        }

        if let Some(destroy_fn) = Self::destroy_callback() {
            definition = definition.with_destroy(destroy_fn);
        }

        definition
    }
}

/// Configuration trait - Java Config 风格的配置类
///
/// 一个配置类在 `configure` 中注册多个工厂方法（`@Bean` 方法）。
pub trait Configuration: Send + Sync {
    /// 配置类名称（用于日志）
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 注册 Bean 定义
    fn configure(&self, context: &ApplicationContext) -> ContainerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_factory::BeanFactoryExt;

    struct AdressService;

    impl Component for AdressService {
        fn lazy() -> bool {
            true
        }

        fn create(_factory: &dyn BeanFactory) -> ContainerResult<Self> {
            Ok(AdressService)
        }
    }

    struct PersonService {
        adress_service: std::sync::Arc<AdressService>,
    }

    impl Component for PersonService {
        fn profiles() -> Vec<String> {
            vec!["!env2".to_string()]
        }

        fn dependencies() -> Vec<String> {
            vec!["adressService".to_string()]
        }

        fn create(factory: &dyn BeanFactory) -> ContainerResult<Self> {
            Ok(PersonService {
                adress_service: factory.get_typed_bean::<AdressService>("adressService")?,
            })
        }
    }

    #[test]
    fn test_component_definition_defaults() {
        let definition = AdressService::bean_definition();
        assert_eq!(definition.name, "adressService");
        assert_eq!(definition.scope, Scope::Singleton);
        assert!(definition.lazy);

        let definition = PersonService::bean_definition();
        assert_eq!(definition.name, "personService");
        assert_eq!(definition.profiles, vec!["!env2".to_string()]);
        assert_eq!(definition.dependencies, vec!["adressService".to_string()]);
    }

    #[test]
    fn test_component_wiring() {
        let context = ApplicationContext::builder()
            .component::<AdressService>()
            .component::<PersonService>()
            .build()
            .unwrap();

        let service = context.get_bean_by_type::<PersonService>().unwrap();
        let adress_service = context.get_bean_by_type::<AdressService>().unwrap();
        assert!(std::sync::Arc::ptr_eq(&service.adress_service, &adress_service));
    }
}
