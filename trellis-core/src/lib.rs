//! 显式装配的 IoC 容器
//!
//! Bean 由工厂函数定义，工厂函数通过 `&dyn BeanFactory` 按名称或类型取得协作者。
//! 定义可以来自代码（[`BeanDefinition`]、[`Component`]、[`Configuration`]）
//! 或 XML 文档（[`XmlBeanDefinitionReader`] 配合 [`ClassRegistry`]）。
//!
//! ```
//! use trellis_core::prelude::*;
//!
//! let context = ApplicationContext::builder()
//!     .bean(BeanDefinition::new("greeting", |_: &dyn BeanFactory| Ok(String::from("Bonjour"))))
//!     .build()
//!     .unwrap();
//! assert_eq!(*context.get_bean_by_type::<String>().unwrap(), "Bonjour");
//! ```

pub mod bean;
pub mod bean_factory;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod resource;
pub mod scope;
pub mod utils;
pub mod xml;

pub use bean::{BeanCreator, BeanDefinition, SharedBean};
pub use bean_factory::{
    BeanFactory, BeanFactoryExt, ConfigurableBeanFactory, ConfigurableListableBeanFactory,
    DefaultListableBeanFactory, ListableBeanFactory,
};
pub use component::{Component, Configuration};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource,
    PropertiesPropertySource, PropertySource, TomlPropertySource,
};
pub use context::{ApplicationContext, ApplicationContextBuilder, ShutdownHook};
pub use error::{ApplicationError, ApplicationResult, ContainerError, ContainerResult, Result};
pub use lifecycle::BeanPostProcessor;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use resource::{Resource, ResourceLoader};
pub use scope::Scope;
pub use xml::{BeanArgument, BeanArguments, ClassRegistry, XmlBeanDefinitionReader};

pub mod prelude {
    pub use crate::bean::{BeanDefinition, SharedBean};
    pub use crate::bean_factory::{
        BeanFactory, BeanFactoryExt, ConfigurableBeanFactory, ConfigurableListableBeanFactory,
        DefaultListableBeanFactory, ListableBeanFactory,
    };
    pub use crate::component::{Component, Configuration};
    pub use crate::config::{
        self, ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource,
        PropertiesPropertySource, PropertySource, TomlPropertySource,
    };
    pub use crate::context::{ApplicationContext, ApplicationContextBuilder};
    pub use crate::error::{ContainerError, ContainerResult, Result};
    pub use crate::lifecycle::BeanPostProcessor;
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::resource::{Resource, ResourceLoader};
    pub use crate::scope::Scope;
    pub use crate::utils;
    pub use crate::xml::{BeanArguments, ClassRegistry};
    pub use anyhow::{anyhow, Context};
}
