//! 绑定结果与错误登记
//!
//! [`BindingResult`] 保存字段错误和全局错误；[`Errors`] 是验证器看到的视图，
//! 它持有根对象与当前嵌套路径，把相对字段名展开成完整路径后登记错误。

use std::fmt;

use crate::error::{ValidationError, ValidationResult};
use crate::value::{read_path, FieldValue, PropertyAccessor};

/// 生成消息码：`code.object.field`、`code.field`、（嵌套时）`code.leaf`、`code`
fn field_codes(code: &str, object_name: &str, field: &str) -> Vec<String> {
    let mut codes = vec![
        format!("{}.{}.{}", code, object_name, field),
        format!("{}.{}", code, field),
    ];
    if let Some((_, leaf)) = field.rsplit_once('.') {
        codes.push(format!("{}.{}", code, leaf));
    }
    codes.push(code.to_string());
    codes
}

fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

/// 字段错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub object_name: String,
    /// 完整字段路径，如 `adress.postal_code`
    pub field: String,
    pub rejected_value: Option<String>,
    /// 按优先级排列的消息码，最后一个是原始错误码
    pub codes: Vec<String>,
    pub arguments: Vec<String>,
    pub default_message: Option<String>,
    /// 类型转换失败产生的错误
    pub binding_failure: bool,
}

impl FieldError {
    pub fn new(object_name: impl Into<String>, field: impl Into<String>, code: &str) -> Self {
        let object_name = object_name.into();
        let field = field.into();
        let codes = field_codes(code, &object_name, &field);
        Self {
            object_name,
            field,
            rejected_value: None,
            codes,
            arguments: Vec::new(),
            default_message: None,
            binding_failure: false,
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_rejected_value(mut self, value: Option<String>) -> Self {
        self.rejected_value = value;
        self
    }

    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = Some(message.into());
        self
    }

    pub fn as_binding_failure(mut self) -> Self {
        self.binding_failure = true;
        self
    }

    /// 原始错误码
    pub fn code(&self) -> &str {
        self.codes.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field error in object '{}' on field '{}': rejected value [{}]; codes [{}]; arguments [{}]; default message [{}]",
            self.object_name,
            self.field,
            display_opt(&self.rejected_value),
            self.codes.join(","),
            self.arguments.join(","),
            display_opt(&self.default_message),
        )
    }
}

/// 全局（对象级）错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectError {
    pub object_name: String,
    pub codes: Vec<String>,
    pub arguments: Vec<String>,
    pub default_message: Option<String>,
}

impl ObjectError {
    pub fn new(object_name: impl Into<String>, code: &str) -> Self {
        let object_name = object_name.into();
        Self {
            codes: vec![format!("{}.{}", code, object_name), code.to_string()],
            object_name,
            arguments: Vec::new(),
            default_message: None,
        }
    }

    pub fn code(&self) -> &str {
        self.codes.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error in object '{}': codes [{}]; arguments [{}]; default message [{}]",
            self.object_name,
            self.codes.join(","),
            self.arguments.join(","),
            display_opt(&self.default_message),
        )
    }
}

/// 绑定结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingResult {
    object_name: String,
    field_errors: Vec<FieldError>,
    global_errors: Vec<ObjectError>,
}

impl BindingResult {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            ..Default::default()
        }
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn add_field_error(&mut self, error: FieldError) {
        tracing::debug!("Registered field error on '{}': {}", error.field, error.code());
        self.field_errors.push(error);
    }

    pub fn add_global_error(&mut self, error: ObjectError) {
        tracing::debug!("Registered global error on '{}': {}", error.object_name, error.code());
        self.global_errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.field_errors.len() + self.global_errors.len()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn global_errors(&self) -> &[ObjectError] {
        &self.global_errors
    }

    /// 某个字段上的全部错误
    pub fn field_errors_for<'s>(&'s self, field: &'s str) -> impl Iterator<Item = &'s FieldError> + 's {
        self.field_errors.iter().filter(move |e| e.field == field)
    }

    /// 某个字段上的第一个错误
    pub fn field_error(&self, field: &str) -> Option<&FieldError> {
        self.field_errors.iter().find(|e| e.field == field)
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.field_error(field).is_some()
    }
}

impl fmt::Display for BindingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.error_count();
        write!(f, "BindingResult: {} error{}", count, if count == 1 { "" } else { "s" })?;
        for error in &self.global_errors {
            write!(f, "\n{}", error)?;
        }
        for error in &self.field_errors {
            write!(f, "\n{}", error)?;
        }
        Ok(())
    }
}

/// 验证器使用的错误登记视图
///
/// 字段名相对于当前嵌套路径，`push_nested_path("adress")` 之后
/// `reject_value("city", ..)` 登记在 `adress.city` 上。
pub struct Errors<'a> {
    result: &'a mut BindingResult,
    target: &'a dyn PropertyAccessor,
    nested_path: String,
    stack: Vec<String>,
}

impl<'a> Errors<'a> {
    pub fn new(result: &'a mut BindingResult, target: &'a dyn PropertyAccessor) -> Self {
        Self {
            result,
            target,
            nested_path: String::new(),
            stack: Vec::new(),
        }
    }

    pub fn object_name(&self) -> &str {
        self.result.object_name()
    }

    /// 当前嵌套路径（以 `.` 结尾，根路径为空）
    pub fn nested_path(&self) -> &str {
        &self.nested_path
    }

    pub fn push_nested_path(&mut self, sub_path: &str) {
        let previous = std::mem::take(&mut self.nested_path);
        self.nested_path = format!("{}{}.", previous, sub_path.trim_end_matches('.'));
        self.stack.push(previous);
    }

    pub fn pop_nested_path(&mut self) -> ValidationResult<()> {
        let previous = self.stack.pop().ok_or(ValidationError::EmptyNestedPath)?;
        self.nested_path = previous;
        Ok(())
    }

    fn full_path(&self, field: &str) -> String {
        format!("{}{}", self.nested_path, field)
    }

    /// 读取当前嵌套路径下的字段值，未知字段视为 null
    pub fn field_value(&self, field: &str) -> FieldValue {
        read_path(self.target, &self.full_path(field)).unwrap_or(FieldValue::Null)
    }

    pub fn reject(&mut self, code: &str) {
        self.reject_with(code, Vec::new(), None);
    }

    pub fn reject_with(&mut self, code: &str, arguments: Vec<String>, default_message: Option<&str>) {
        let mut error = ObjectError::new(self.result.object_name(), code);
        error.arguments = arguments;
        error.default_message = default_message.map(str::to_string);
        self.result.add_global_error(error);
    }

    pub fn reject_value(&mut self, field: &str, code: &str) {
        self.reject_value_with(field, code, Vec::new(), None);
    }

    pub fn reject_value_with(
        &mut self,
        field: &str,
        code: &str,
        arguments: Vec<String>,
        default_message: Option<&str>,
    ) {
        let rejected = self.field_value(field).to_rejected();
        let mut error = FieldError::new(self.result.object_name(), self.full_path(field), code)
            .with_arguments(arguments)
            .with_rejected_value(rejected);
        error.default_message = default_message.map(str::to_string);
        self.result.add_field_error(error);
    }

    pub fn has_errors(&self) -> bool {
        self.result.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.result.error_count()
    }

    pub fn binding_result(&self) -> &BindingResult {
        self.result
    }
}
