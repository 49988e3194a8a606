//! 两个示例的上下文配置

use std::path::PathBuf;
use std::sync::Arc;

use trellis_core::prelude::*;
use trellis_validation::prelude::*;

use crate::messages::application_messages;
use crate::service::{LocalValidator, PersonService};
use crate::validators::{AdressValidator, PersonValidator};

pub const VALIDATION_MESSAGES: &str = "ValidationMessages";

/// 示例资源目录（classpath 根）
pub fn resources_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

/// 首选 `dd/MM/yyyy`，依次尝试其余格式
pub fn conversion_service() -> ContainerResult<FormattingConversionService> {
    let formatter = DateFormatter::new("dd/MM/yyyy", &["yyyy-MM-dd", "dd-MM-yyyy", "yyyyMMdd"])
        .map_err(anyhow::Error::from)?;
    let mut conversion = FormattingConversionService::new();
    conversion.add_formatter(formatter);
    Ok(conversion)
}

pub struct DataBinderValidationConfiguration;

impl Configuration for DataBinderValidationConfiguration {
    fn name(&self) -> &str {
        "DataBinderValidationConfiguration"
    }

    fn configure(&self, context: &ApplicationContext) -> ContainerResult<()> {
        context.register_singleton("conversionService", |_: &dyn BeanFactory| conversion_service())?;

        context.register_singleton("messageSource", |_: &dyn BeanFactory| {
            Ok(Arc::new(application_messages()) as Arc<dyn MessageSource>)
        })?;

        context.register_singleton("adressValidator", |_: &dyn BeanFactory| {
            Ok(Arc::new(AdressValidator) as Arc<dyn Validator>)
        })?;

        context.register_singleton("personValidator", |factory: &dyn BeanFactory| {
            let adress_validator = factory.get_typed_bean::<Arc<dyn Validator>>("adressValidator")?;
            Ok(Arc::new(PersonValidator::new((*adress_validator).clone())) as Arc<dyn Validator>)
        })?;

        context.register_singleton("personService", |factory: &dyn BeanFactory| {
            let person_validator = factory.get_typed_bean::<Arc<dyn Validator>>("personValidator")?;
            let conversion = factory.get_bean_by_type::<FormattingConversionService>()?;
            let message_source = factory.get_bean_by_type::<Arc<dyn MessageSource>>()?;
            Ok(PersonService::new(
                (*person_validator).clone(),
                (*conversion).clone(),
                (*message_source).clone(),
            ))
        })?;

        Ok(())
    }
}

pub fn data_binder_context() -> ContainerResult<Arc<ApplicationContext>> {
    ApplicationContext::builder()
        .classpath_root(resources_dir())
        .configuration(DataBinderValidationConfiguration)
        .build()
}

/// 声明式约束：消息码从 `ValidationMessages*.properties` 解析
pub struct AnnotationValidationConfiguration;

impl Configuration for AnnotationValidationConfiguration {
    fn name(&self) -> &str {
        "AnnotationValidationConfiguration"
    }

    fn configure(&self, context: &ApplicationContext) -> ContainerResult<()> {
        let loader = context.resource_loader().clone();
        context.register_singleton("messageSource", move |_: &dyn BeanFactory| {
            let source = ResourceBundleMessageSource::new(loader.clone()).with_basename(VALIDATION_MESSAGES);
            source.preload(&Locale::system()).map_err(anyhow::Error::from)?;
            Ok(Arc::new(source) as Arc<dyn MessageSource>)
        })?;

        context.register_singleton("validator", |factory: &dyn BeanFactory| {
            let message_source = factory.get_bean_by_type::<Arc<dyn MessageSource>>()?;
            Ok(LocalValidator::new((*message_source).clone()))
        })?;

        Ok(())
    }
}

pub fn annotation_context() -> ContainerResult<Arc<ApplicationContext>> {
    ApplicationContext::builder()
        .classpath_root(resources_dir())
        .configuration(AnnotationValidationConfiguration)
        .build()
}
