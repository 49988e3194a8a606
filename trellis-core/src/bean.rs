use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::bean_factory::BeanFactory;
use crate::error::{ContainerError, ContainerResult};
use crate::Scope;

/// 容器中保存的 Bean 实例
pub type SharedBean = Arc<dyn Any + Send + Sync>;

/// 类型擦除后的工厂函数，协作者通过 `&dyn BeanFactory` 获取
pub type BeanCreator = Arc<dyn Fn(&dyn BeanFactory) -> ContainerResult<SharedBean> + Send + Sync>;

/// init / destroy 回调，只有容器持有唯一引用时才会被调用
pub type LifecycleCallback = Arc<dyn Fn(&mut dyn Any) -> ContainerResult<()> + Send + Sync>;

pub type InitCallback = LifecycleCallback;
pub type DestroyCallback = LifecycleCallback;

/// 一个 Bean 的配方：名称、产出类型、工厂函数，以及容器如何管理它
#[derive(Clone)]
pub struct BeanDefinition {
    pub name: String,
    pub scope: Scope,
    /// 单例在第一次被请求时才创建
    pub lazy: bool,
    /// 按类型查找有多个候选时胜出
    pub primary: bool,
    /// profile 表达式（`env2`、`!env2`），全部满足时定义才生效
    pub profiles: Vec<String>,
    /// `depends-on` 声明，只用于启动前的依赖图检查
    pub dependencies: Vec<String>,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub creator: BeanCreator,
    pub init_callback: Option<InitCallback>,
    pub destroy_callback: Option<DestroyCallback>,
}

impl BeanDefinition {
    /// 由返回 `T` 的工厂函数定义 Bean
    ///
    /// ```
    /// use trellis_core::prelude::*;
    ///
    /// let definition = BeanDefinition::new("greeting", |_: &dyn BeanFactory| Ok(String::from("Bonjour")))
    ///     .with_scope(Scope::Prototype);
    /// assert_eq!(definition.type_name, "alloc::string::String");
    /// ```
    pub fn new<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        let creator: BeanCreator = Arc::new(move |beans: &dyn BeanFactory| {
            factory(beans).map(|instance| Arc::new(instance) as SharedBean)
        });
        Self::from_creator(name, TypeId::of::<T>(), type_name::<T>(), creator)
    }

    /// 产出类型只在运行时才知道时使用，例如 XML 中按类名注册的定义
    pub fn from_creator(name: impl Into<String>, type_id: TypeId, type_name: &'static str, creator: BeanCreator) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Singleton,
            lazy: false,
            primary: false,
            profiles: Vec::new(),
            dependencies: Vec::new(),
            type_id,
            type_name,
            creator,
            init_callback: None,
            destroy_callback: None,
        }
    }

    pub fn with_scope(self, scope: Scope) -> Self {
        Self { scope, ..self }
    }

    pub fn with_lazy(self, lazy: bool) -> Self {
        Self { lazy, ..self }
    }

    pub fn with_primary(self, primary: bool) -> Self {
        Self { primary, ..self }
    }

    /// 可以多次调用，表达式之间是“且”的关系
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profiles.push(profile.into());
        self
    }

    pub fn with_dependencies(self, dependencies: Vec<String>) -> Self {
        Self { dependencies, ..self }
    }

    pub fn with_init<T: Any>(
        mut self,
        init: impl Fn(&mut T) -> ContainerResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.init_callback = Some(typed_callback(&self.name, init));
        self
    }

    pub fn with_destroy<T: Any>(
        mut self,
        destroy: impl Fn(&mut T) -> ContainerResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.destroy_callback = Some(typed_callback(&self.name, destroy));
        self
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    pub fn create(&self, factory: &dyn BeanFactory) -> ContainerResult<SharedBean> {
        (self.creator)(factory)
    }
}

fn typed_callback<T: Any>(
    bean_name: &str,
    callback: impl Fn(&mut T) -> ContainerResult<()> + Send + Sync + 'static,
) -> LifecycleCallback {
    let bean_name = bean_name.to_string();
    Arc::new(move |bean: &mut dyn Any| match bean.downcast_mut::<T>() {
        Some(typed) => callback(typed),
        None => Err(ContainerError::TypeMismatch {
            expected: type_name::<T>().to_string(),
            found: format!("bean '{}'", bean_name),
        }),
    })
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeanDefinition({} : {}, {}", self.name, self.type_name, self.scope)?;
        if self.lazy {
            f.write_str(", lazy")?;
        }
        if self.primary {
            f.write_str(", primary")?;
        }
        if !self.profiles.is_empty() {
            write!(f, ", profiles={:?}", self.profiles)?;
        }
        if !self.dependencies.is_empty() {
            write!(f, ", depends-on={:?}", self.dependencies)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_factory::DefaultListableBeanFactory;

    #[derive(Debug, Default)]
    struct Counter(u32);

    #[test]
    fn test_callbacks_check_the_bean_type() {
        let definition = BeanDefinition::new("counter", |_: &dyn BeanFactory| Ok(Counter::default()))
            .with_init(|counter: &mut Counter| {
                counter.0 += 1;
                Ok(())
            });
        let init = definition.init_callback.clone().unwrap();

        let mut counter = Counter::default();
        init(&mut counter).unwrap();
        assert_eq!(counter.0, 1);

        let mut wrong = String::new();
        assert!(matches!(init(&mut wrong), Err(ContainerError::TypeMismatch { .. })));
    }

    #[test]
    fn test_debug_lists_only_set_flags() {
        let definition = BeanDefinition::new("counter", |_: &dyn BeanFactory| Ok(Counter::default()))
            .with_lazy(true)
            .with_profile("!env2");
        let text = format!("{:?}", definition);
        assert!(text.starts_with("BeanDefinition(counter : "), "{}", text);
        assert!(text.ends_with("singleton, lazy, profiles=[\"!env2\"])"), "{}", text);

        let created = definition.create(&DefaultListableBeanFactory::new()).unwrap();
        assert!(created.downcast_ref::<Counter>().is_some());
    }
}
