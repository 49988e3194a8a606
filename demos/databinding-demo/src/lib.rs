//! 数据绑定与验证示例
//!
//! - `data-binder-validation`：属性值经转换服务绑定到 `Person`，再由编程式验证器验证，
//!   错误消息由静态消息源解析
//! - `annotation-validation`：按声明的字段约束验证 `Person`，消息码从资源包解析

pub mod beans;
pub mod config;
pub mod messages;
pub mod service;
pub mod validators;

pub use beans::{Adress, Person};
pub use config::{annotation_context, data_binder_context, resources_dir};
pub use service::{LocalValidator, PersonService};
pub use validators::{AdressValidator, PersonValidator};
