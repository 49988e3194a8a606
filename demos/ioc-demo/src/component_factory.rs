//! 按类型或名称获取组件的门面，调用方不直接依赖容器

use std::any::Any;
use std::sync::Arc;

use trellis_core::prelude::*;

pub trait ComponentFactory {
    /// 按类型获取唯一的组件
    fn get_component<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>>;

    /// 按名称获取组件，类型由调用方自行判断
    fn get_component_by_name(&self, name: &str) -> ContainerResult<SharedBean>;

    /// 按名称获取组件并检查类型
    fn get_named_component<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>>;
}

/// 委托给任意 [`BeanFactory`]，通常是应用上下文
pub struct ContextComponentFactory<F: BeanFactory + ?Sized = ApplicationContext> {
    factory: Arc<F>,
}

impl<F: BeanFactory + ?Sized> ContextComponentFactory<F> {
    pub fn new(factory: Arc<F>) -> Self {
        Self { factory }
    }
}

impl<F: BeanFactory + ?Sized> ComponentFactory for ContextComponentFactory<F> {
    fn get_component<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        self.factory.get_bean_by_type::<T>()
    }

    fn get_component_by_name(&self, name: &str) -> ContainerResult<SharedBean> {
        self.factory.get_bean(name)
    }

    fn get_named_component<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.factory.get_typed_bean::<T>(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beans::Adress;
    use crate::java_config::{java_context, ConfiguredPerson, CreationLog};

    #[test]
    fn test_components_by_type_and_name() {
        let components = ContextComponentFactory::new(java_context(CreationLog::default()).unwrap());

        let person = components.get_component::<ConfiguredPerson>().unwrap();
        let by_name = components.get_named_component::<ConfiguredPerson>("person").unwrap();
        assert!(Arc::ptr_eq(&person, &by_name));

        let untyped = components.get_component_by_name("adress").unwrap();
        assert!(untyped.downcast_ref::<Adress>().is_some());

        assert!(matches!(
            components.get_named_component::<Adress>("person"),
            Err(ContainerError::TypeMismatch { .. })
        ));
        assert!(matches!(
            components.get_component_by_name("missing"),
            Err(ContainerError::BeanNotFound(_))
        ));
    }
}
