//! 切点（Pointcut）表达式系统
//!
//! 定义了如何匹配方法签名的规则：
//! - [`NameMatchMethodPointcut`]：按方法名通配符匹配（`*Square*`）
//! - [`AspectJExpressionPointcut`]：解析 `execution(..)`、`args(..)`、`within(..)`、
//!   命名切点引用以及 `&&`、`||`、`!` 组合
//! - [`PointcutExpression`]：可以直接用代码组合的表达式树

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{AopError, AopResult};
use crate::joinpoint::MethodSignature;

/// 切点 Trait
pub trait Pointcut: Send + Sync {
    /// 检查方法签名是否匹配
    fn matches(&self, signature: &MethodSignature) -> bool;
}

/// 匹配所有方法的切点
#[derive(Debug, Clone, Copy, Default)]
pub struct TruePointcut;

impl Pointcut for TruePointcut {
    fn matches(&self, _signature: &MethodSignature) -> bool {
        true
    }
}

/// 把 `*` 通配符模式编译为正则表达式
pub(crate) fn compile_glob(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body))
}

/// 简单的通配符匹配
///
/// 支持的模式：
/// - `*` - 匹配任意字符串
/// - `User*` - 以 User 开头
/// - `*Service` - 以 Service 结尾
/// - `*Service*` - 包含 Service
pub fn simple_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == text;
    }
    compile_glob(pattern)
        .map(|regex| regex.is_match(text))
        .unwrap_or(false)
}

/// 按方法名匹配的切点
#[derive(Debug, Clone, Default)]
pub struct NameMatchMethodPointcut {
    mapped_names: Vec<String>,
    patterns: Vec<Regex>,
}

impl NameMatchMethodPointcut {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个方法名模式
    pub fn add_method_name(mut self, name: &str) -> AopResult<Self> {
        let regex = compile_glob(name).map_err(|e| AopError::invalid(name, e.to_string()))?;
        self.mapped_names.push(name.to_string());
        self.patterns.push(regex);
        Ok(self)
    }

    /// 用一组方法名模式创建
    pub fn with_mapped_names<I, S>(names: I) -> AopResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(Self::new(), |pointcut, name| pointcut.add_method_name(name.as_ref()))
    }

    pub fn mapped_names(&self) -> &[String] {
        &self.mapped_names
    }
}

impl Pointcut for NameMatchMethodPointcut {
    fn matches(&self, signature: &MethodSignature) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(&signature.name))
    }
}

/// 类型模式（`demo..Oper*`、`Double`、`*`）
#[derive(Clone)]
pub struct TypePattern {
    source: String,
    regex: Regex,
}

impl TypePattern {
    /// 编译类型模式
    ///
    /// `*` 匹配名称中的一段，`..` 匹配任意层包；不含 `.` 的模式只比较简单名称。
    pub fn parse(pattern: &str) -> AopResult<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(AopError::invalid(pattern, "empty type pattern"));
        }

        let mut body = String::new();
        if !pattern.contains('.') {
            body.push_str(r"(?:[\w$]+\.)*");
        }

        let chars: Vec<char> = pattern.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '*' => body.push_str(r"[\w$]*"),
                '.' if chars.get(i + 1) == Some(&'.') => {
                    body.push_str(r"\.(?:[\w$]+\.)*");
                    i += 1;
                }
                c if c.is_whitespace() => {
                    return Err(AopError::invalid(pattern, "unexpected whitespace in type pattern"))
                }
                c => body.push_str(&regex::escape(&c.to_string())),
            }
            i += 1;
        }

        let regex = Regex::new(&format!("^{}$", body))
            .map_err(|e| AopError::invalid(pattern, e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, type_name: &str) -> bool {
        self.regex.is_match(type_name)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// 参数列表中的一项
#[derive(Clone, Debug)]
pub enum ParamPattern {
    /// `..`：零个或多个参数
    AnyMany,
    /// `*`：恰好一个任意类型的参数
    AnyOne,
    /// 指定类型（只比较简单名称）
    Type(TypePattern),
}

impl ParamPattern {
    fn parse_list(list: &str) -> AopResult<Vec<ParamPattern>> {
        let list = list.trim();
        if list.is_empty() {
            return Ok(Vec::new());
        }

        list.split(',')
            .map(|item| match item.trim() {
                ".." => Ok(ParamPattern::AnyMany),
                "*" => Ok(ParamPattern::AnyOne),
                "" => Err(AopError::invalid(list, "empty parameter pattern")),
                other => {
                    let simple = if other.contains("..") {
                        other
                    } else {
                        other.rsplit('.').next().unwrap_or(other)
                    };
                    TypePattern::parse(simple).map(ParamPattern::Type)
                }
            })
            .collect()
    }

    fn matches_one(&self, type_name: &str) -> bool {
        match self {
            ParamPattern::AnyMany | ParamPattern::AnyOne => true,
            ParamPattern::Type(pattern) => pattern.matches(type_name),
        }
    }

    /// 参数列表匹配，`..` 通过回溯尝试所有长度
    pub fn match_list(patterns: &[ParamPattern], types: &[String]) -> bool {
        match patterns.split_first() {
            None => types.is_empty(),
            Some((ParamPattern::AnyMany, rest)) => {
                (0..=types.len()).any(|skip| Self::match_list(rest, &types[skip..]))
            }
            Some((pattern, rest)) => match types.split_first() {
                Some((first, others)) => pattern.matches_one(first) && Self::match_list(rest, others),
                None => false,
            },
        }
    }
}

/// `execution(modifiers? ret-type declaring-type?.name(params))`
#[derive(Clone, Debug)]
pub struct ExecutionPattern {
    pub return_type: TypePattern,
    pub declaring_type: Option<TypePattern>,
    pub method_name: TypePattern,
    pub params: Vec<ParamPattern>,
}

const MODIFIERS: &[&str] = &["public", "protected", "private", "static", "final"];

impl ExecutionPattern {
    pub fn parse(body: &str) -> AopResult<Self> {
        let body = body.trim();
        let open = body
            .find('(')
            .ok_or_else(|| AopError::invalid(body, "missing parameter list"))?;
        if !body.ends_with(')') {
            return Err(AopError::invalid(body, "parameter list must close the execution pattern"));
        }
        let params = ParamPattern::parse_list(&body[open + 1..body.len() - 1])?;

        let tokens: Vec<&str> = body[..open]
            .split_whitespace()
            .skip_while(|token| MODIFIERS.contains(token))
            .collect();
        let (return_type, name_pattern) = match tokens.as_slice() {
            [ret, name] => (*ret, *name),
            _ => {
                return Err(AopError::invalid(
                    body,
                    "expected '<return-type> <type>.<method>(<params>)'",
                ))
            }
        };

        let (declaring_type, method_name) = match name_pattern.rfind('.') {
            Some(idx) => {
                let prefix = &name_pattern[..idx];
                let method = &name_pattern[idx + 1..];
                // `demo..*(..)`：最后一个点属于 `..`
                let declaring = if prefix.ends_with('.') {
                    format!("{}.*", prefix)
                } else {
                    prefix.to_string()
                };
                (Some(TypePattern::parse(&declaring)?), method)
            }
            None => (None, name_pattern),
        };

        Ok(Self {
            return_type: TypePattern::parse(return_type)?,
            declaring_type,
            method_name: TypePattern::parse(method_name)?,
            params,
        })
    }

    pub fn matches(&self, signature: &MethodSignature) -> bool {
        self.return_type.matches(&signature.return_type)
            && self
                .declaring_type
                .as_ref()
                .map_or(true, |pattern| pattern.matches(&signature.declaring_type))
            && self.method_name.matches(&signature.name)
            && ParamPattern::match_list(&self.params, &signature.param_types)
    }
}

/// 切点表达式
///
/// 用于匹配方法签名
#[derive(Clone)]
pub enum PointcutExpression {
    /// 匹配所有方法
    All,

    /// 例如：execution(double demo..Oper*.*(..))
    Execution(ExecutionPattern),

    /// 按声明的参数类型匹配，例如：args(Double, ..)
    Args(Vec<ParamPattern>),

    /// 匹配特定类型中的方法，例如：within(demo.aop..*)
    Within(TypePattern),

    /// 匹配特定方法名（通配符）
    MethodPattern(String),

    /// 自定义匹配函数
    Custom(Arc<dyn Fn(&MethodSignature) -> bool + Send + Sync>),

    /// 与运算（AND）
    And(Box<PointcutExpression>, Box<PointcutExpression>),

    /// 或运算（OR）
    Or(Box<PointcutExpression>, Box<PointcutExpression>),

    /// 非运算（NOT）
    Not(Box<PointcutExpression>),
}

impl PointcutExpression {
    /// 检查方法签名是否匹配
    pub fn matches(&self, signature: &MethodSignature) -> bool {
        match self {
            PointcutExpression::All => true,
            PointcutExpression::Execution(pattern) => pattern.matches(signature),
            PointcutExpression::Args(params) => {
                ParamPattern::match_list(params, &signature.param_types)
            }
            PointcutExpression::Within(pattern) => pattern.matches(&signature.declaring_type),
            PointcutExpression::MethodPattern(pattern) => simple_match(pattern, &signature.name),
            PointcutExpression::Custom(func) => func(signature),
            PointcutExpression::And(left, right) => {
                left.matches(signature) && right.matches(signature)
            }
            PointcutExpression::Or(left, right) => {
                left.matches(signature) || right.matches(signature)
            }
            PointcutExpression::Not(expr) => !expr.matches(signature),
        }
    }

    /// 创建 execution 表达式
    pub fn execution(body: &str) -> AopResult<Self> {
        ExecutionPattern::parse(body).map(PointcutExpression::Execution)
    }

    /// 与运算
    pub fn and(self, other: PointcutExpression) -> Self {
        PointcutExpression::And(Box::new(self), Box::new(other))
    }

    /// 或运算
    pub fn or(self, other: PointcutExpression) -> Self {
        PointcutExpression::Or(Box::new(self), Box::new(other))
    }

    /// 非运算
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        PointcutExpression::Not(Box::new(self))
    }
}

impl Pointcut for PointcutExpression {
    fn matches(&self, signature: &MethodSignature) -> bool {
        PointcutExpression::matches(self, signature)
    }
}

impl fmt::Debug for PointcutExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointcutExpression::All => write!(f, "All"),
            PointcutExpression::Execution(p) => write!(f, "Execution({:?})", p),
            PointcutExpression::Args(p) => write!(f, "Args({:?})", p),
            PointcutExpression::Within(p) => write!(f, "Within({:?})", p),
            PointcutExpression::MethodPattern(p) => write!(f, "MethodPattern({})", p),
            PointcutExpression::Custom(_) => write!(f, "Custom(...)"),
            PointcutExpression::And(l, r) => write!(f, "And({:?}, {:?})", l, r),
            PointcutExpression::Or(l, r) => write!(f, "Or({:?}, {:?})", l, r),
            PointcutExpression::Not(e) => write!(f, "Not({:?})", e),
        }
    }
}

/// AspectJ 风格的表达式切点
///
/// ```text
/// operationPointcut() && (args(Double, ..) || args(Double[], ..))
/// ```
#[derive(Clone, Debug)]
pub struct AspectJExpressionPointcut {
    expression: String,
    compiled: PointcutExpression,
}

impl AspectJExpressionPointcut {
    /// 解析不含命名切点引用的表达式
    pub fn parse(expression: &str) -> AopResult<Self> {
        Self::parse_with(expression, &HashMap::new())
    }

    /// 解析表达式，`name()` 引用从 `named` 中查找
    pub fn parse_with(expression: &str, named: &HashMap<String, String>) -> AopResult<Self> {
        let compiled = Parser::compile(expression, named, &mut Vec::new())?;
        Ok(Self {
            expression: expression.to_string(),
            compiled,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn compiled(&self) -> &PointcutExpression {
        &self.compiled
    }
}

impl Pointcut for AspectJExpressionPointcut {
    fn matches(&self, signature: &MethodSignature) -> bool {
        self.compiled.matches(signature)
    }
}

impl fmt::Display for AspectJExpressionPointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AspectJExpressionPointcut: {}", self.expression)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    /// `name(body)`，body 保留原文
    Call { name: String, body: String },
}

fn tokenize(expression: &str) -> AopResult<Vec<Token>> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_alphanumeric() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '$' | '.'))
                {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();

                let mut j = i;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if chars.get(j) != Some(&'(') {
                    match name.as_str() {
                        "and" => tokens.push(Token::And),
                        "or" => tokens.push(Token::Or),
                        "not" => tokens.push(Token::Not),
                        _ => {
                            return Err(AopError::invalid(
                                expression,
                                format!("expected '(' after '{}'", name),
                            ))
                        }
                    }
                    continue;
                }

                let mut depth = 0usize;
                let body_start = j + 1;
                let mut end = None;
                for (k, ch) in chars.iter().enumerate().skip(j) {
                    match ch {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(k);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| {
                    AopError::invalid(expression, format!("unclosed '(' after '{}'", name))
                })?;

                tokens.push(Token::Call {
                    name,
                    body: chars[body_start..end].iter().collect(),
                });
                i = end + 1;
            }
            other => {
                return Err(AopError::invalid(
                    expression,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }

    Ok(tokens)
}

/// 递归下降解析：`||` < `&&` < `!` < 括号 / 原子
struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    named: &'a HashMap<String, String>,
    resolving: &'a mut Vec<String>,
}

impl<'a> Parser<'a> {
    fn compile(
        expression: &'a str,
        named: &'a HashMap<String, String>,
        resolving: &'a mut Vec<String>,
    ) -> AopResult<PointcutExpression> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(AopError::invalid(expression, "empty expression"));
        }

        let mut parser = Parser {
            expression,
            tokens,
            pos: 0,
            named,
            resolving,
        };
        let result = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing tokens"));
        }
        Ok(result)
    }

    fn error(&self, message: &str) -> AopError {
        AopError::invalid(self.expression, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> AopResult<PointcutExpression> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            left = left.or(self.parse_and()?);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> AopResult<PointcutExpression> {
        let mut left = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            left = left.and(self.parse_not()?);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> AopResult<PointcutExpression> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(self.parse_not()?.not());
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> AopResult<PointcutExpression> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(Token::Call { name, body }) => self.primitive(&name, &body),
            Some(_) => Err(self.error("expected a pointcut designator")),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn primitive(&mut self, name: &str, body: &str) -> AopResult<PointcutExpression> {
        match name {
            "execution" => PointcutExpression::execution(body),
            "args" => ParamPattern::parse_list(body).map(PointcutExpression::Args),
            "within" => TypePattern::parse(body).map(PointcutExpression::Within),
            reference => {
                if !body.trim().is_empty() {
                    return Err(self.error("named pointcut references take no arguments"));
                }
                // `Aspect.name()` 形式只取最后一段
                let key = reference.rsplit('.').next().unwrap_or(reference);
                let referenced = self
                    .named
                    .get(key)
                    .ok_or_else(|| AopError::UnknownPointcut(key.to_string()))?;
                if self.resolving.iter().any(|name| name == key) {
                    return Err(self.error("cyclic named pointcut reference"));
                }

                self.resolving.push(key.to_string());
                let compiled = Parser::compile(referenced, self.named, self.resolving);
                self.resolving.pop();
                compiled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operations(name: &str, params: &[&str]) -> MethodSignature {
        MethodSignature::new("demo.aop.Operations", name)
            .returns("double")
            .params(params.iter().copied())
    }

    fn named() -> HashMap<String, String> {
        HashMap::from([(
            "operationPointcut".to_string(),
            "execution(double demo..Oper*.*(..))".to_string(),
        )])
    }

    #[test]
    fn test_simple_match() {
        assert!(simple_match("*", "anything"));
        assert!(simple_match("*Square*", "sumOfSquares"));
        assert!(simple_match("*square*", "square"));
        assert!(!simple_match("*Square*", "square"));
        assert!(simple_match("operations", "operations"));
        assert!(simple_match("oper*", "operations"));
    }

    #[test]
    fn test_name_match_pointcut() {
        let pointcut = NameMatchMethodPointcut::with_mapped_names(["*Square*", "*square*"]).unwrap();
        assert!(pointcut.matches(&operations("square", &["Double"])));
        assert!(pointcut.matches(&operations("sumOfSquares", &["Double[]"])));
        assert!(pointcut.matches(&operations("squareOfSum", &["Double[]"])));
        assert!(!pointcut.matches(&operations("toString", &[])));
    }

    #[test]
    fn test_type_patterns() {
        let pattern = TypePattern::parse("demo..Oper*").unwrap();
        assert!(pattern.matches("demo.aop.Operations"));
        assert!(pattern.matches("demo.Operations"));
        assert!(!pattern.matches("other.aop.Operations"));

        let simple = TypePattern::parse("Operations").unwrap();
        assert!(simple.matches("demo.aop.Operations"));
        assert!(simple.matches("Operations"));
        assert!(!simple.matches("demo.aop.OperationsImpl"));

        let array = TypePattern::parse("Double[]").unwrap();
        assert!(array.matches("Double[]"));
        assert!(!array.matches("Double"));
    }

    #[test]
    fn test_execution() {
        let expr = PointcutExpression::execution("double demo..Oper*.*(..)").unwrap();
        assert!(expr.matches(&operations("square", &["Double"])));
        assert!(expr.matches(&operations("sumOfSquares", &["Double[]"])));
        assert!(!expr.matches(&operations("square", &["Double"]).returns("void")));

        let any_in_package = PointcutExpression::execution("public * demo..*(..)").unwrap();
        assert!(any_in_package.matches(&operations("square", &["Double"])));

        let no_args = PointcutExpression::execution("* *.size()").unwrap();
        assert!(no_args.matches(&MethodSignature::new("demo.List", "size").returns("int")));
        assert!(!no_args.matches(&operations("square", &["Double"])));

        let exact = PointcutExpression::execution("* square(java.lang.Double)").unwrap();
        assert!(exact.matches(&operations("square", &["Double"])));
        assert!(!exact.matches(&operations("square", &["Double", "Double"])));
    }

    #[test]
    fn test_param_lists() {
        let types = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let parse = |s: &str| ParamPattern::parse_list(s).unwrap();

        assert!(ParamPattern::match_list(&parse("Double, .."), &types(&["Double"])));
        assert!(ParamPattern::match_list(&parse("Double, .."), &types(&["Double", "Long", "String"])));
        assert!(!ParamPattern::match_list(&parse("Double, .."), &types(&["Double[]"])));
        assert!(ParamPattern::match_list(&parse(".., String"), &types(&["Long", "String"])));
        assert!(ParamPattern::match_list(&parse("*, *"), &types(&["Long", "String"])));
        assert!(!ParamPattern::match_list(&parse("*"), &types(&[])));
        assert!(ParamPattern::match_list(&parse(""), &types(&[])));
    }

    #[test]
    fn test_aspectj_expression_with_named_pointcut() {
        let pointcut = AspectJExpressionPointcut::parse_with(
            "operationPointcut() && (args(Double, ..) || args(Double[], ..))",
            &named(),
        )
        .unwrap();

        assert!(pointcut.matches(&operations("square", &["Double"])));
        assert!(pointcut.matches(&operations("sumOfSquares", &["Double[]"])));
        assert!(!pointcut.matches(&operations("square", &["Long"])));
        assert!(!pointcut.matches(
            &MethodSignature::new("demo.aop.Other", "square")
                .returns("double")
                .params(["Double"])
        ));
    }

    #[test]
    fn test_not_and_within() {
        let pointcut =
            AspectJExpressionPointcut::parse("within(demo.aop..*) && !execution(* *.square(..))")
                .unwrap();
        assert!(pointcut.matches(&operations("sumOfSquares", &["Double[]"])));
        assert!(!pointcut.matches(&operations("square", &["Double"])));

        let keywords = AspectJExpressionPointcut::parse("within(Operations) and not args(Double)").unwrap();
        assert!(keywords.matches(&operations("sumOfSquares", &["Double[]"])));
        assert!(!keywords.matches(&operations("square", &["Double"])));
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(matches!(
            AspectJExpressionPointcut::parse("missing()"),
            Err(AopError::UnknownPointcut(name)) if name == "missing"
        ));
        assert!(AspectJExpressionPointcut::parse("execution(double *.square(..)").is_err());
        assert!(AspectJExpressionPointcut::parse("execution(square)").is_err());
        assert!(AspectJExpressionPointcut::parse("args(Double) &&").is_err());
        assert!(AspectJExpressionPointcut::parse("").is_err());
        assert!(AspectJExpressionPointcut::parse("(args(Double)").is_err());

        let cyclic = HashMap::from([
            ("a".to_string(), "b()".to_string()),
            ("b".to_string(), "a()".to_string()),
        ]);
        assert!(AspectJExpressionPointcut::parse_with("a()", &cyclic).is_err());
    }
}
