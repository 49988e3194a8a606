//! 属性值与属性访问
//!
//! 绑定目标通过实现 [`PropertyAccessor`] 暴露自己的属性：
//! 读取叶子属性、带类型转换的写入、以及访问嵌套对象。
//! 点分路径（`adress.city`）由本模块的函数逐级解析。

use std::any::Any;
use std::fmt;

use chrono::NaiveDate;

use crate::convert::FormattingConversionService;
use crate::error::{BindError, BindResult};

/// 一个待绑定的属性值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    pub name: String,
    pub value: String,
}

impl PropertyValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 有序的属性值集合，同名属性后添加的覆盖先添加的
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyValues {
    values: Vec<PropertyValue>,
}

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_property_value(PropertyValue::new(name, value));
        self
    }

    pub fn add_property_value(&mut self, pv: PropertyValue) {
        match self.values.iter_mut().find(|existing| existing.name == pv.name) {
            Some(existing) => existing.value = pv.value,
            None => self.values.push(pv),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|pv| pv.name == name)
            .map(|pv| pv.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let index = self.values.iter().position(|pv| pv.name == name)?;
        Some(self.values.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = PropertyValues::new();
        for (name, value) in iter {
            values.add_property_value(PropertyValue::new(name, value));
        }
        values
    }
}

/// 读取到的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    /// 嵌套对象，携带其描述
    Object(String),
}

impl FieldValue {
    /// 为空：null 或空字符串
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// 为空或只包含空白
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// 拒绝值的文本形式，null 为 None
    pub fn to_rejected(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Date(date) => write!(f, "{}", date),
            FieldValue::Object(description) => write!(f, "{}", description),
        }
    }
}

impl From<Option<&String>> for FieldValue {
    fn from(value: Option<&String>) -> Self {
        value.map_or(FieldValue::Null, |s| FieldValue::Text(s.clone()))
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

impl From<Option<NaiveDate>> for FieldValue {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Date)
    }
}

/// 属性访问器
///
/// 每个可绑定的类型手写实现，名称为单段属性名。
pub trait PropertyAccessor: Any {
    fn as_any(&self) -> &dyn Any;

    /// 读取属性，未知属性返回 None
    fn get_property(&self, name: &str) -> Option<FieldValue>;

    /// 写入属性，字符串值经转换服务转换为字段类型
    fn set_property(
        &mut self,
        name: &str,
        value: &str,
        conversion: &FormattingConversionService,
    ) -> BindResult<()>;

    /// 嵌套对象（只读），不存在时返回 None
    fn nested(&self, _name: &str) -> Option<&dyn PropertyAccessor> {
        None
    }

    /// 嵌套对象（可写），为 null 时自动创建
    fn nested_mut(&mut self, _name: &str) -> Option<&mut dyn PropertyAccessor> {
        None
    }
}

/// 按点分路径读取属性
pub fn read_path(root: &dyn PropertyAccessor, path: &str) -> Option<FieldValue> {
    match path.split_once('.') {
        Some((head, rest)) => match root.nested(head) {
            Some(nested) => read_path(nested, rest),
            // 中间对象为 null 时，路径上的值也视为 null
            None => root.get_property(head).map(|_| FieldValue::Null),
        },
        None => root.get_property(path),
    }
}

/// 按点分路径写入属性，中间对象按需创建
pub fn write_path(
    root: &mut dyn PropertyAccessor,
    path: &str,
    value: &str,
    conversion: &FormattingConversionService,
) -> BindResult<()> {
    match path.split_once('.') {
        Some((head, rest)) => match root.nested_mut(head) {
            Some(nested) => write_path(nested, rest, value, conversion),
            None => Err(BindError::NotWritable {
                property: path.to_string(),
            }),
        },
        None => root.set_property(path, value, conversion),
    }
}

/// 把转换错误包装为绑定错误，供 `set_property` 实现使用
pub fn convert_property<T>(
    conversion: &FormattingConversionService,
    property: &str,
    value: &str,
) -> BindResult<T>
where
    T: std::str::FromStr + 'static,
    T::Err: fmt::Display,
{
    conversion
        .convert::<T>(value)
        .map_err(|source| BindError::TypeMismatch {
            property: property.to_string(),
            value: value.to_string(),
            source,
        })
}
