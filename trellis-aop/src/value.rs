//! 方法调用的参数和返回值
//!
//! 代理在调用拦截器链之前把参数转换为 [`Value`]，拦截器可以读取或替换参数，
//! 目标方法执行后再把 [`Value`] 转换回具体类型。

use std::fmt;

use crate::error::{AopError, AopResult};

/// 动态值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 无返回值（void / null）
    Unit,
    Double(f64),
    /// 数组参数（可变参数）
    Doubles(Vec<f64>),
    Long(i64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// 参数类型名称，用于 `args(..)` 匹配和错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "void",
            Value::Double(_) => "Double",
            Value::Doubles(_) => "Double[]",
            Value::Long(_) => "Long",
            Value::Text(_) => "String",
            Value::Bool(_) => "Boolean",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// 数值或数值数组展开为数组
    pub fn as_doubles(&self) -> Option<Vec<f64>> {
        match self {
            Value::Doubles(values) => Some(values.clone()),
            Value::Double(v) => Some(vec![*v]),
            Value::Long(v) => Some(vec![*v as f64]),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Doubles(_))
    }

    /// 转换为 f64 返回值
    pub fn into_f64(self, method: &str) -> AopResult<f64> {
        self.as_f64().ok_or_else(|| AopError::ReturnTypeMismatch {
            method: method.to_string(),
            expected: "double".to_string(),
            found: self.type_name().to_string(),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "null"),
            Value::Double(v) => write!(f, "{}", JavaDouble(*v)),
            Value::Doubles(values) => {
                write!(f, "[")?;
                for (idx, v) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", JavaDouble(*v))?;
                }
                write!(f, "]")
            }
            Value::Long(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// 按 `Double.toString` 的规则输出：`[1e-3, 1e7)` 之外用 `1.0E20` 形式
struct JavaDouble(f64);

impl fmt::Display for JavaDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            return f.write_str("NaN");
        }
        if v.is_infinite() {
            return f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
        }
        let magnitude = v.abs();
        if v == 0.0 || (1e-3..1e7).contains(&magnitude) {
            return write!(f, "{:?}", v);
        }
        let scientific = format!("{:e}", v);
        let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
        if mantissa.contains('.') {
            write!(f, "{}E{}", mantissa, exponent)
        } else {
            write!(f, "{}.0E{}", mantissa, exponent)
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Doubles(values)
    }
}

impl From<&[f64]> for Value {
    fn from(values: &[f64]) -> Self {
        Value::Doubles(values.to_vec())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

/// 参数列表的 `[a, [b, c]]` 形式（与 Java 的 `Arrays.deepToString` 一致）
pub fn deep_to_string(args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// 读取第 `index` 个参数为 f64
pub fn arg_f64(method: &str, args: &[Value], index: usize) -> AopResult<f64> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| mismatch(method, "Double", args, index))
}

/// 读取第 `index` 个参数为 f64 数组
pub fn arg_doubles(method: &str, args: &[Value], index: usize) -> AopResult<Vec<f64>> {
    args.get(index)
        .and_then(Value::as_doubles)
        .ok_or_else(|| mismatch(method, "Double[]", args, index))
}

fn mismatch(method: &str, expected: &str, args: &[Value], index: usize) -> AopError {
    AopError::ArgumentMismatch {
        method: method.to_string(),
        expected: format!("{} at position {}", expected, index),
        found: args
            .get(index)
            .map(|v| v.type_name().to_string())
            .unwrap_or_else(|| format!("{} argument(s)", args.len())),
    }
}
