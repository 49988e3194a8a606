//! 容器装配示例
//!
//! - `xml-config`：XML 定义，依赖通过构造参数显式引用
//! - `annotation-config`：XML 定义，地址按类型注入
//! - `java-config`：配置类注册工厂方法，演示原型、延迟初始化和 profile
//!
//! 调用方通过 [`ComponentFactory`] 取组件，不直接接触上下文。

pub mod beans;
pub mod component_factory;
pub mod java_config;
pub mod services;
pub mod xml_config;

pub use beans::{Adress, AutowiredPerson, Person};
pub use component_factory::{ComponentFactory, ContextComponentFactory};
pub use java_config::{java_context, java_context_with_profiles, ConfiguredPerson, CreationLog};
pub use services::{AdressService, PersonService};
pub use xml_config::{annotation_context, resources_dir, xml_context};
