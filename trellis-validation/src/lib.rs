//! Trellis Validation - 数据绑定与验证模块
//!
//! 提供数据绑定、编程式验证器、声明式约束、类型转换和国际化消息解析

pub mod binder;
pub mod constraints;
pub mod convert;
pub mod error;
pub mod errors;
pub mod message;
pub mod validator;
pub mod value;

pub use binder::*;
pub use constraints::*;
pub use convert::*;
pub use error::*;
pub use errors::*;
pub use message::*;
pub use validator::*;
pub use value::*;

/// 常用类型
pub mod prelude {
    pub use crate::binder::DataBinder;
    pub use crate::constraints::{ConstraintViolation, Validate, ValidationRules, ValidatorBuilder};
    pub use crate::convert::{DateFormatter, FormattingConversionService};
    pub use crate::error::{BindError, BindResult, ValidationError, ValidationResult};
    pub use crate::errors::{BindingResult, Errors, FieldError};
    pub use crate::message::{
        Locale, MessageSource, ResourceBundleMessageSource, StaticMessageSource,
    };
    pub use crate::validator::{ValidationUtils, Validator};
    pub use crate::value::{
        convert_property, FieldValue, PropertyAccessor, PropertyValues,
    };
}
