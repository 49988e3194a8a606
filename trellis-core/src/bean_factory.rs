//! Bean 工厂：按名称或类型取得 Bean，负责作用域、生命周期回调和后置处理器
//!
//! 接口按 Spring 的层次拆分：[`BeanFactory`] 只读且对象安全，工厂函数通过它获取协作者；
//! [`ListableBeanFactory`] 可以列举；[`ConfigurableBeanFactory`] 可以注册定义和后置处理器；
//! [`ConfigurableListableBeanFactory`] 驱动上下文的刷新和关闭。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::{
    bean::{BeanDefinition, SharedBean},
    error::{ContainerError, ContainerResult},
    lifecycle::BeanPostProcessor,
    utils::dependency::{check_dependency_graph, CreationStack},
};

/// 最基础的容器接口
///
/// 没有泛型方法，可以作为 `&dyn BeanFactory` 传给工厂函数。
pub trait BeanFactory: Send + Sync {
    fn get_bean(&self, name: &str) -> ContainerResult<SharedBean>;

    /// 按类型取得唯一的 Bean；多个候选时取 primary
    fn get_bean_for_type(&self, type_id: TypeId, type_name: &str) -> ContainerResult<SharedBean>;

    fn contains_bean(&self, name: &str) -> bool;

    /// 产出类型为 `type_id` 的定义，按注册顺序
    fn get_bean_names_for_type(&self, type_id: TypeId) -> Vec<String>;
}

/// 带类型的查找，对所有 [`BeanFactory`]（包括 trait object）自动实现
pub trait BeanFactoryExt: BeanFactory {
    fn get_bean_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        self.get_bean_for_type(TypeId::of::<T>(), type_name)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: type_name.to_string(),
                found: "a bean registered under another type".to_string(),
            })
    }

    fn get_typed_bean<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.get_bean(name)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: format!("bean '{}'", name),
            })
    }

    fn contains_bean_by_type<T: Any + Send + Sync>(&self) -> bool {
        !self.get_bean_names_for_type(TypeId::of::<T>()).is_empty()
    }
}

impl<F: BeanFactory + ?Sized> BeanFactoryExt for F {}

pub trait ListableBeanFactory: BeanFactory {
    /// 按注册顺序
    fn get_bean_names(&self) -> Vec<String>;

    fn get_bean_definition_count(&self) -> usize;
}

pub trait ConfigurableBeanFactory: BeanFactory {
    /// 名称重复或配置已冻结时失败
    fn register_bean_definition(&self, definition: BeanDefinition) -> ContainerResult<()>;

    fn get_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition>;

    /// 按 `order()` 升序插入，同序的按加入顺序
    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>);

    fn get_bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>>;
}

pub trait ConfigurableListableBeanFactory: ListableBeanFactory + ConfigurableBeanFactory {
    /// 创建所有非延迟的单例
    fn preinstantiate_singletons(&self) -> ContainerResult<()>;

    fn freeze_configuration(&self);

    fn is_configuration_frozen(&self) -> bool;

    /// 按创建的逆序调用 destroy 回调并清空单例缓存
    fn destroy_singletons(&self) -> ContainerResult<()>;

    /// 检查 `depends-on` 声明：缺失的 Bean 和环
    fn validate_dependencies(&self) -> ContainerResult<()>;
}

/// 定义表及其索引，三者总是一起修改
#[derive(Default)]
struct Registry {
    definitions: HashMap<String, BeanDefinition>,
    order: Vec<String>,
    by_type: HashMap<TypeId, Vec<String>>,
}

impl Registry {
    fn insert(&mut self, definition: BeanDefinition) -> ContainerResult<()> {
        if self.definitions.contains_key(&definition.name) {
            return Err(ContainerError::BeanAlreadyExists(definition.name));
        }
        let name = definition.name.clone();
        self.by_type.entry(definition.type_id).or_default().push(name.clone());
        self.order.push(name.clone());
        self.definitions.insert(name, definition);
        Ok(())
    }

    fn ordered(&self) -> impl Iterator<Item = &BeanDefinition> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }
}

/// 已创建的单例，保持创建顺序
#[derive(Default)]
struct SingletonCache {
    beans: HashMap<String, SharedBean>,
    created: Vec<String>,
}

/// 默认的 Bean 工厂
#[derive(Default)]
pub struct DefaultListableBeanFactory {
    registry: RwLock<Registry>,
    singletons: Mutex<SingletonCache>,
    /// 正在创建的 Bean，检测循环引用
    in_creation: CreationStack,
    post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    frozen: RwLock<bool>,
}

impl DefaultListableBeanFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 实例化，然后依次执行前置处理、init 回调、后置处理
    fn create_bean(&self, definition: &BeanDefinition) -> ContainerResult<SharedBean> {
        let name = definition.name.as_str();
        let _in_creation = self.in_creation.enter(name)?;

        let mut bean = definition.create(self).map_err(|e| match e {
            ContainerError::CircularDependency(_) => e,
            other => ContainerError::BeanCreationFailed(format!("{}: {}", name, other)),
        })?;

        let processors = self.get_bean_post_processors();
        for processor in &processors {
            bean = processor.post_process_before_initialization(bean, name, self)?;
        }

        if let Some(init) = &definition.init_callback {
            match Arc::get_mut(&mut bean) {
                Some(target) => init(target)
                    .map_err(|e| ContainerError::BeanCreationFailed(format!("{} init failed: {}", name, e)))?,
                None => tracing::warn!("Skipping init of '{}': the instance is already shared", name),
            }
        }

        for processor in &processors {
            tracing::trace!("Post-processing '{}' with {}", name, processor.name());
            bean = processor.post_process_after_initialization(bean, name, self)?;
        }
        Ok(bean)
    }

    fn singleton(&self, definition: &BeanDefinition) -> ContainerResult<SharedBean> {
        if let Some(bean) = self.singletons.lock().beans.get(&definition.name) {
            return Ok(Arc::clone(bean));
        }

        tracing::debug!("Creating singleton '{}'", definition.name);
        let bean = self.create_bean(definition)?;

        let mut cache = self.singletons.lock();
        // 创建期间可能已经有其他线程放入了实例，以先放入的为准
        if let Some(existing) = cache.beans.get(&definition.name) {
            return Ok(Arc::clone(existing));
        }
        cache.beans.insert(definition.name.clone(), Arc::clone(&bean));
        cache.created.push(definition.name.clone());
        Ok(bean)
    }

    /// 多个候选时只有一个 primary 才能确定
    fn pick_candidate(&self, candidates: Vec<String>, type_name: &str) -> ContainerResult<String> {
        if let [only] = candidates.as_slice() {
            return Ok(only.clone());
        }

        let primary = {
            let registry = self.registry.read();
            let mut primaries = candidates
                .iter()
                .filter(|name| registry.definitions.get(*name).is_some_and(|d| d.primary));
            match (primaries.next(), primaries.next()) {
                (Some(primary), None) => Some(primary.clone()),
                _ => None,
            }
        };
        primary.ok_or_else(|| ContainerError::NoUniqueBean {
            type_name: type_name.to_string(),
            candidates,
        })
    }
}

impl BeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<SharedBean> {
        let definition = self.get_bean_definition(name)?;
        if definition.is_singleton() {
            self.singleton(&definition)
        } else {
            tracing::trace!("Creating prototype '{}'", name);
            self.create_bean(&definition)
        }
    }

    fn get_bean_for_type(&self, type_id: TypeId, type_name: &str) -> ContainerResult<SharedBean> {
        let mut candidates = self.get_bean_names_for_type(type_id);
        if candidates.is_empty() {
            // 同一类型在不同编译单元中可能得到不同的 TypeId，退回到类型名比较
            candidates = self
                .registry
                .read()
                .ordered()
                .filter(|d| d.type_name == type_name)
                .map(|d| d.name.clone())
                .collect();
        }
        if candidates.is_empty() {
            return Err(ContainerError::BeanNotFound(format!("No bean found for type '{}'", type_name)));
        }

        let name = self.pick_candidate(candidates, type_name)?;
        self.get_bean(&name)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.registry.read().definitions.contains_key(name)
    }

    fn get_bean_names_for_type(&self, type_id: TypeId) -> Vec<String> {
        self.registry.read().by_type.get(&type_id).cloned().unwrap_or_default()
    }
}

impl ListableBeanFactory for DefaultListableBeanFactory {
    fn get_bean_names(&self) -> Vec<String> {
        self.registry.read().order.clone()
    }

    fn get_bean_definition_count(&self) -> usize {
        self.registry.read().definitions.len()
    }
}

impl ConfigurableBeanFactory for DefaultListableBeanFactory {
    fn register_bean_definition(&self, definition: BeanDefinition) -> ContainerResult<()> {
        if self.is_configuration_frozen() {
            return Err(ContainerError::Config(format!(
                "Cannot register bean '{}': configuration is frozen",
                definition.name
            )));
        }
        tracing::debug!("Registering {:?}", definition);
        self.registry.write().insert(definition)
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<BeanDefinition> {
        self.registry
            .read()
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))
    }

    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        tracing::debug!("Bean post processor '{}' added (order {})", processor.name(), processor.order());
        let mut processors = self.post_processors.write();
        let at = processors
            .iter()
            .position(|p| p.order() > processor.order())
            .unwrap_or(processors.len());
        processors.insert(at, processor);
    }

    fn get_bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.post_processors.read().clone()
    }
}

impl ConfigurableListableBeanFactory for DefaultListableBeanFactory {
    fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let eager: Vec<BeanDefinition> = self
            .registry
            .read()
            .ordered()
            .filter(|d| d.is_singleton() && !d.lazy)
            .cloned()
            .collect();

        tracing::debug!("Pre-instantiating {} singleton(s)", eager.len());
        eager.iter().try_for_each(|definition| self.singleton(definition).map(drop))
    }

    fn freeze_configuration(&self) {
        *self.frozen.write() = true;
    }

    fn is_configuration_frozen(&self) -> bool {
        *self.frozen.read()
    }

    fn destroy_singletons(&self) -> ContainerResult<()> {
        let SingletonCache { mut beans, created } = std::mem::take(&mut *self.singletons.lock());
        tracing::info!("Destroying {} singleton(s)", created.len());

        // 某个回调失败后继续销毁其余单例，最后返回第一个错误
        let mut first_error = None;
        for name in created.iter().rev() {
            let (Some(mut bean), Ok(definition)) = (beans.remove(name), self.get_bean_definition(name)) else {
                continue;
            };
            let Some(destroy) = definition.destroy_callback else {
                continue;
            };
            match Arc::get_mut(&mut bean) {
                Some(target) => {
                    if let Err(e) = destroy(target) {
                        tracing::warn!("Destroy callback of '{}' failed: {}", name, e);
                        first_error.get_or_insert(e);
                    }
                }
                None => tracing::warn!("Skipping destroy of '{}': the instance is still referenced", name),
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn validate_dependencies(&self) -> ContainerResult<()> {
        let graph: HashMap<String, Vec<String>> = self
            .registry
            .read()
            .definitions
            .values()
            .map(|d| (d.name.clone(), d.dependencies.clone()))
            .collect();

        check_dependency_graph(&graph)?;
        tracing::debug!("Dependencies of {} bean(s) checked", graph.len());
        Ok(())
    }
}
