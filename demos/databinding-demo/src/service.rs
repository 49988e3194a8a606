//! 人员服务：属性绑定、验证以及错误消息解析

use std::sync::Arc;

use trellis_validation::prelude::*;

use crate::beans::Person;

/// 绑定结果对象名
pub const PERSON_OBJECT_NAME: &str = "person";

pub struct PersonService {
    person_validator: Arc<dyn Validator>,
    conversion: FormattingConversionService,
    message_source: Arc<dyn MessageSource>,
    locale: Locale,
}

impl PersonService {
    pub fn new(
        person_validator: Arc<dyn Validator>,
        conversion: FormattingConversionService,
        message_source: Arc<dyn MessageSource>,
    ) -> Self {
        Self {
            person_validator,
            conversion,
            message_source,
            locale: Locale::system(),
        }
    }

    /// 指定解析消息时使用的区域，默认取系统区域
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// 通过转换服务把属性值绑定到新建的对象上
    ///
    /// 转换失败登记在返回的绑定结果中，不会中断绑定。
    pub fn get_bean_from_properties<T>(
        &self,
        values: &PropertyValues,
        object_name: &str,
    ) -> BindResult<(T, BindingResult)>
    where
        T: PropertyAccessor + Default,
    {
        let mut binder = DataBinder::new(T::default(), object_name);
        binder.set_conversion_service(self.conversion.clone());
        binder.bind(values)?;
        Ok(binder.into_parts())
    }

    pub fn get_person_from_properties(&self, values: &PropertyValues) -> BindResult<(Person, BindingResult)> {
        self.get_bean_from_properties(values, PERSON_OBJECT_NAME)
    }

    /// 用人员验证器验证，打印每个字段错误解析后的消息
    pub fn validate_person(&self, person: Person) -> BindResult<BindingResult> {
        let mut binder = DataBinder::new(person, PERSON_OBJECT_NAME);
        binder.add_validator(Arc::clone(&self.person_validator))?;
        binder.validate()?;
        let (_, result) = binder.into_parts();

        for message in self.resolve_messages(&result) {
            println!("{}", message);
        }
        Ok(result)
    }

    /// 按错误顺序解析全部字段错误的消息
    pub fn resolve_messages(&self, result: &BindingResult) -> Vec<String> {
        result
            .field_errors()
            .iter()
            .map(|error| {
                self.message_source
                    .resolve_field_error(error, &self.locale)
                    .unwrap_or_else(|e| {
                        tracing::warn!("{}", e);
                        error.to_string()
                    })
            })
            .collect()
    }
}

/// 声明式约束的验证器
///
/// 形如 `{some.key}` 的违规消息视为消息码，由消息源解析。
pub struct LocalValidator {
    message_source: Arc<dyn MessageSource>,
    locale: Locale,
}

impl LocalValidator {
    pub fn new(message_source: Arc<dyn MessageSource>) -> Self {
        Self {
            message_source,
            locale: Locale::system(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn validate<T: Validate>(&self, target: &T) -> Vec<ConstraintViolation> {
        let mut builder = ValidatorBuilder::new();
        target.collect_violations(&mut builder);
        builder
            .into_violations()
            .into_iter()
            .map(|mut violation| {
                violation.message = self.interpolate(&violation.message);
                violation
            })
            .collect()
    }

    fn interpolate(&self, message: &str) -> String {
        match message.strip_prefix('{').and_then(|m| m.strip_suffix('}')) {
            Some(code) => self.message_source.get_message_or(code, &[], message, &self.locale),
            None => message.to_string(),
        }
    }
}
