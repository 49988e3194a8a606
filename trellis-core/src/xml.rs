//! XML Bean 定义
//!
//! 文档格式：
//!
//! ```xml
//! <beans>
//!     <bean id="adress" class="Adress" scope="prototype">
//!         <constructor-arg index="0" value="73, traverse Régny"/>
//!         <constructor-arg index="1" value="${adress.zip:13009}"/>
//!     </bean>
//!     <bean id="person" class="Person" lazy-init="true">
//!         <constructor-arg value="Arthur"/>
//!         <constructor-arg ref="adress"/>
//!         <property name="birthDate" value="1892-06-30"/>
//!     </bean>
//! </beans>
//! ```
//!
//! 没有反射，`class` 属性通过 [`ClassRegistry`] 映射到注册的构造函数。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::{
    bean::{BeanCreator, BeanDefinition, SharedBean},
    bean_factory::{BeanFactory, BeanFactoryExt},
    config::Environment,
    error::{ContainerError, ContainerResult},
    resource::Resource,
    Scope,
};

#[derive(Debug, Deserialize)]
struct BeansDocument {
    #[serde(rename = "bean", default)]
    beans: Vec<XmlBean>,
}

#[derive(Debug, Deserialize)]
struct XmlBean {
    id: String,
    class: String,
    #[serde(default)]
    scope: Option<String>,
    #[serde(rename = "lazy-init", default)]
    lazy_init: Option<String>,
    #[serde(default)]
    primary: Option<String>,
    #[serde(default)]
    profile: Option<String>,
    #[serde(rename = "constructor-arg", default)]
    constructor_args: Vec<XmlArgument>,
    #[serde(rename = "property", default)]
    properties: Vec<XmlProperty>,
}

#[derive(Debug, Deserialize)]
struct XmlArgument {
    #[serde(default)]
    index: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlProperty {
    name: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

/// 构造参数或属性的取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeanArgument {
    /// 字面值（可包含 `${...}` 占位符）
    Value(String),
    /// 引用另一个 Bean
    Ref(String),
}

impl BeanArgument {
    fn from_xml(
        bean_id: &str,
        what: &str,
        value: Option<String>,
        reference: Option<String>,
    ) -> ContainerResult<Self> {
        match (value, reference) {
            (Some(value), None) => Ok(BeanArgument::Value(value)),
            (None, Some(reference)) => Ok(BeanArgument::Ref(reference)),
            _ => Err(ContainerError::Xml(format!(
                "Bean '{}': {} must have exactly one of 'value' or 'ref'",
                bean_id, what
            ))),
        }
    }
}

/// 传给注册构造函数的参数集合
pub struct BeanArguments {
    bean_name: String,
    constructor_args: Vec<BeanArgument>,
    properties: Vec<(String, BeanArgument)>,
    environment: Arc<Environment>,
}

impl BeanArguments {
    pub fn new(
        bean_name: impl Into<String>,
        constructor_args: Vec<BeanArgument>,
        properties: Vec<(String, BeanArgument)>,
        environment: Arc<Environment>,
    ) -> Self {
        Self {
            bean_name: bean_name.into(),
            constructor_args,
            properties,
            environment,
        }
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn arg_count(&self) -> usize {
        self.constructor_args.len()
    }

    /// 位置参数的字面值（已替换占位符）
    pub fn value(&self, index: usize) -> ContainerResult<String> {
        match self.constructor_args.get(index) {
            Some(BeanArgument::Value(raw)) => self.environment.resolve_placeholders(raw),
            Some(BeanArgument::Ref(name)) => Err(self.unexpected_ref(&format!("constructor-arg {}", index), name)),
            None => Err(ContainerError::Xml(format!(
                "Bean '{}': missing constructor-arg {}",
                self.bean_name, index
            ))),
        }
    }

    /// 位置参数解析为指定类型
    pub fn parse<T>(&self, index: usize) -> ContainerResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.value(index)?;
        raw.parse::<T>().map_err(|e| {
            ContainerError::Xml(format!(
                "Bean '{}': cannot convert constructor-arg {} '{}': {}",
                self.bean_name, index, raw, e
            ))
        })
    }

    /// 位置参数引用的 Bean
    pub fn reference<T: Any + Send + Sync>(
        &self,
        index: usize,
        factory: &dyn BeanFactory,
    ) -> ContainerResult<Arc<T>> {
        match self.constructor_args.get(index) {
            Some(BeanArgument::Ref(name)) => factory.get_typed_bean::<T>(name),
            Some(BeanArgument::Value(_)) => Err(ContainerError::Xml(format!(
                "Bean '{}': constructor-arg {} must be a 'ref'",
                self.bean_name, index
            ))),
            None => Err(ContainerError::Xml(format!(
                "Bean '{}': missing constructor-arg {}",
                self.bean_name, index
            ))),
        }
    }

    /// 命名属性的字面值（已替换占位符），未声明时为 None
    pub fn property_value(&self, name: &str) -> ContainerResult<Option<String>> {
        match self.find_property(name) {
            Some(BeanArgument::Value(raw)) => self.environment.resolve_placeholders(raw).map(Some),
            Some(BeanArgument::Ref(reference)) => Err(self.unexpected_ref(&format!("property '{}'", name), reference)),
            None => Ok(None),
        }
    }

    /// 命名属性引用的 Bean，未声明时为 None
    pub fn property_ref<T: Any + Send + Sync>(
        &self,
        name: &str,
        factory: &dyn BeanFactory,
    ) -> ContainerResult<Option<Arc<T>>> {
        match self.find_property(name) {
            Some(BeanArgument::Ref(reference)) => factory.get_typed_bean::<T>(reference).map(Some),
            Some(BeanArgument::Value(_)) => Err(ContainerError::Xml(format!(
                "Bean '{}': property '{}' must be a 'ref'",
                self.bean_name, name
            ))),
            None => Ok(None),
        }
    }

    /// 声明的属性名称（按文档顺序）
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    fn find_property(&self, name: &str) -> Option<&BeanArgument> {
        self.properties
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, argument)| argument)
    }

    fn unexpected_ref(&self, what: &str, reference: &str) -> ContainerError {
        ContainerError::Xml(format!(
            "Bean '{}': {} is a reference to '{}', expected a value",
            self.bean_name, what, reference
        ))
    }

    /// 参数中引用的全部 Bean 名称
    fn references(&self) -> Vec<String> {
        self.constructor_args
            .iter()
            .chain(self.properties.iter().map(|(_, a)| a))
            .filter_map(|a| match a {
                BeanArgument::Ref(name) => Some(name.clone()),
                BeanArgument::Value(_) => None,
            })
            .collect()
    }
}

type ClassConstructor =
    Arc<dyn Fn(&BeanArguments, &dyn BeanFactory) -> ContainerResult<SharedBean> + Send + Sync>;

#[derive(Clone)]
struct ClassEntry {
    type_id: TypeId,
    type_name: &'static str,
    constructor: ClassConstructor,
}

/// 类名到构造函数的注册表
#[derive(Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个类
    pub fn register<T, F>(mut self, class_name: impl Into<String>, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&BeanArguments, &dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        let class_name = class_name.into();
        tracing::trace!("Registering class '{}' -> {}", class_name, std::any::type_name::<T>());
        self.classes.insert(
            class_name,
            ClassEntry {
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                constructor: Arc::new(move |args, factory| {
                    Ok(Arc::new(constructor(args, factory)?) as SharedBean)
                }),
            },
        );
        self
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.classes.keys().collect();
        names.sort();
        f.debug_struct("ClassRegistry").field("classes", &names).finish()
    }
}

/// 读取 XML 文档并生成 Bean 定义
pub struct XmlBeanDefinitionReader {
    registry: Arc<ClassRegistry>,
    environment: Arc<Environment>,
}

impl XmlBeanDefinitionReader {
    pub fn new(registry: Arc<ClassRegistry>, environment: Arc<Environment>) -> Self {
        Self {
            registry,
            environment,
        }
    }

    /// 从资源加载 Bean 定义
    pub fn load_bean_definitions(&self, resource: &Resource) -> ContainerResult<Vec<BeanDefinition>> {
        tracing::info!("Loading XML bean definitions from {}", resource);
        let content = resource.read_to_string()?;
        self.parse_bean_definitions(&content, &resource.to_string())
    }

    /// 从字符串解析 Bean 定义
    pub fn parse_bean_definitions(
        &self,
        content: &str,
        description: &str,
    ) -> ContainerResult<Vec<BeanDefinition>> {
        let document: BeansDocument = serde_xml_rs::from_str(content).map_err(|e| {
            ContainerError::Xml(format!("Invalid bean definition document {}: {}", description, e))
        })?;

        let definitions = document
            .beans
            .into_iter()
            .map(|bean| self.to_definition(bean))
            .collect::<ContainerResult<Vec<_>>>()?;

        tracing::debug!("Loaded {} bean definition(s) from {}", definitions.len(), description);
        Ok(definitions)
    }

    fn to_definition(&self, bean: XmlBean) -> ContainerResult<BeanDefinition> {
        let entry = self.registry.classes.get(&bean.class).cloned().ok_or_else(|| {
            ContainerError::Xml(format!(
                "Bean '{}': class '{}' is not registered",
                bean.id, bean.class
            ))
        })?;

        let mut indexed = Vec::with_capacity(bean.constructor_args.len());
        for (position, arg) in bean.constructor_args.into_iter().enumerate() {
            let index = match arg.index.as_deref() {
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    ContainerError::Xml(format!("Bean '{}': invalid constructor-arg index '{}'", bean.id, raw))
                })?,
                None => position,
            };
            let argument = BeanArgument::from_xml(&bean.id, "constructor-arg", arg.value, arg.reference)?;
            indexed.push((index, argument));
        }
        indexed.sort_by_key(|(index, _)| *index);
        let constructor_args: Vec<BeanArgument> = indexed.into_iter().map(|(_, a)| a).collect();

        let properties = bean
            .properties
            .into_iter()
            .map(|p| {
                let argument = BeanArgument::from_xml(&bean.id, "property", p.value, p.reference)?;
                Ok((p.name, argument))
            })
            .collect::<ContainerResult<Vec<_>>>()?;

        let arguments = Arc::new(BeanArguments::new(
            bean.id.clone(),
            constructor_args,
            properties,
            Arc::clone(&self.environment),
        ));
        let dependencies = arguments.references();

        let constructor = entry.constructor;
        let creator: BeanCreator = Arc::new(move |factory: &dyn BeanFactory| constructor(&arguments, factory));

        let mut definition = BeanDefinition::from_creator(bean.id.clone(), entry.type_id, entry.type_name, creator)
            .with_dependencies(dependencies)
            .with_lazy(parse_flag(&bean.id, "lazy-init", bean.lazy_init.as_deref())?)
            .with_primary(parse_flag(&bean.id, "primary", bean.primary.as_deref())?);

        if let Some(scope) = bean.scope.as_deref() {
            let scope = Scope::from_str(scope)
                .map_err(|e| ContainerError::Xml(format!("Bean '{}': {}", bean.id, e)))?;
            definition = definition.with_scope(scope);
        }

        if let Some(profile) = bean.profile {
            for expression in profile.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                definition = definition.with_profile(expression);
            }
        }

        Ok(definition)
    }
}

fn parse_flag(bean_id: &str, attribute: &str, raw: Option<&str>) -> ContainerResult<bool> {
    match raw.map(str::trim) {
        None | Some("default") | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ContainerError::Xml(format!(
            "Bean '{}': invalid {} value '{}'",
            bean_id, attribute, other
        ))),
    }
}
