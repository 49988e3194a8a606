//! 数据绑定
//!
//! [`DataBinder`] 把字符串属性值写入目标对象，转换失败登记为
//! `typeMismatch` 字段错误，随后运行注册的验证器。

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::convert::FormattingConversionService;
use crate::error::{BindError, BindResult};
use crate::errors::{BindingResult, Errors, FieldError};
use crate::validator::{ValidationUtils, Validator};
use crate::value::{write_path, PropertyAccessor, PropertyValue, PropertyValues};

/// 类型转换失败的错误码
pub const TYPE_MISMATCH_CODE: &str = "typeMismatch";
/// 缺少必填字段的错误码
pub const MISSING_FIELD_CODE: &str = "required";

/// 字段名匹配，支持 `xxx*`、`*xxx`、`*xxx*` 和 `*`
fn field_matches(pattern: &str, field: &str) -> bool {
    match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
        _ if pattern == "*" => true,
        (Some(rest), _) if rest.ends_with('*') => field.contains(&rest[..rest.len() - 1]),
        (Some(suffix), _) => field.ends_with(suffix),
        (None, Some(prefix)) => field.starts_with(prefix),
        (None, None) => pattern == field,
    }
}

/// 数据绑定器
pub struct DataBinder<T: PropertyAccessor> {
    target: T,
    binding_result: BindingResult,
    conversion: FormattingConversionService,
    validators: Vec<Arc<dyn Validator>>,
    allowed_fields: Vec<String>,
    disallowed_fields: Vec<String>,
    required_fields: Vec<String>,
    ignore_unknown_fields: bool,
}

impl<T: PropertyAccessor> DataBinder<T> {
    pub fn new(target: T, object_name: impl Into<String>) -> Self {
        Self {
            target,
            binding_result: BindingResult::new(object_name),
            conversion: FormattingConversionService::new(),
            validators: Vec::new(),
            allowed_fields: Vec::new(),
            disallowed_fields: Vec::new(),
            required_fields: Vec::new(),
            ignore_unknown_fields: true,
        }
    }

    pub fn object_name(&self) -> &str {
        self.binding_result.object_name()
    }

    pub fn set_conversion_service(&mut self, conversion: FormattingConversionService) {
        self.conversion = conversion;
    }

    pub fn conversion_service(&self) -> &FormattingConversionService {
        &self.conversion
    }

    pub fn set_allowed_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = fields.into_iter().map(Into::into).collect();
    }

    pub fn set_disallowed_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disallowed_fields = fields.into_iter().map(Into::into).collect();
    }

    pub fn set_required_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
    }

    /// 未知字段是否忽略（默认忽略），不忽略时 `bind` 返回错误
    pub fn set_ignore_unknown_fields(&mut self, ignore: bool) {
        self.ignore_unknown_fields = ignore;
    }

    /// 注册验证器，验证器必须支持目标类型
    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) -> BindResult<()> {
        if !validator.supports(TypeId::of::<T>()) {
            return Err(BindError::UnsupportedValidator {
                validator: validator.name().to_string(),
                target: std::any::type_name::<T>().to_string(),
            });
        }
        self.validators.push(validator);
        Ok(())
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    fn is_allowed(&self, field: &str) -> bool {
        let allowed = self.allowed_fields.is_empty()
            || self.allowed_fields.iter().any(|p| field_matches(p, field));
        allowed && !self.disallowed_fields.iter().any(|p| field_matches(p, field))
    }

    /// 绑定属性值
    ///
    /// 只有未知字段（且不忽略）这类结构性问题返回错误；
    /// 转换失败和必填缺失都登记在绑定结果中。
    pub fn bind(&mut self, values: &PropertyValues) -> BindResult<()> {
        self.check_required_fields(values);

        for PropertyValue { name, value } in values.iter() {
            if !self.is_allowed(name) {
                tracing::debug!(
                    "Field [{}] has been removed from binding because it is not allowed",
                    name
                );
                continue;
            }
            self.apply(name, value)?;
        }
        Ok(())
    }

    fn apply(&mut self, name: &str, value: &str) -> BindResult<()> {
        match write_path(&mut self.target, name, value, &self.conversion) {
            Ok(()) => {
                tracing::trace!("Bound '{}' = '{}'", name, value);
                Ok(())
            }
            Err(BindError::TypeMismatch { value, source, .. }) => {
                let error = FieldError::new(self.binding_result.object_name(), name, TYPE_MISMATCH_CODE)
                    .with_rejected_value(Some(value))
                    .with_default_message(source.to_string())
                    .as_binding_failure();
                self.binding_result.add_field_error(error);
                Ok(())
            }
            Err(BindError::NotWritable { property }) if self.ignore_unknown_fields => {
                tracing::debug!("Ignoring unknown property '{}'", property);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn check_required_fields(&mut self, values: &PropertyValues) {
        for field in &self.required_fields {
            let missing = values.get(field).map_or(true, |v| v.trim().is_empty());
            if missing {
                let error = FieldError::new(self.binding_result.object_name(), field.as_str(), MISSING_FIELD_CODE)
                    .with_default_message(format!("Field '{}' is required", field))
                    .as_binding_failure();
                self.binding_result.add_field_error(error);
            }
        }
    }

    /// 依次运行全部验证器
    pub fn validate(&mut self) -> BindResult<()> {
        let target: &dyn Any = &self.target;
        let mut errors = Errors::new(&mut self.binding_result, &self.target);
        for validator in &self.validators {
            ValidationUtils::invoke_validator(validator.as_ref(), target, &mut errors)?;
        }
        Ok(())
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn binding_result(&self) -> &BindingResult {
        &self.binding_result
    }

    pub fn into_parts(self) -> (T, BindingResult) {
        (self.target, self.binding_result)
    }
}
