//! XML 定义的上下文
//!
//! 两个文档共用一张类注册表：
//!
//! - `applicationContext.xml`：构造参数和属性显式声明依赖
//! - `applicationContextWithAnnotations.xml`：`demo.ioc.annotated.Person` 按类型注入地址

use std::path::PathBuf;
use std::sync::Arc;

use trellis_core::prelude::*;

use crate::beans::{Adress, AutowiredPerson, Person};

pub const ADRESS_CLASS: &str = "demo.ioc.beans.Adress";
pub const PERSON_CLASS: &str = "demo.ioc.beans.Person";
pub const AUTOWIRED_PERSON_CLASS: &str = "demo.ioc.annotated.Person";

pub const APPLICATION_CONTEXT_XML: &str = "classpath:applicationContext.xml";
pub const ANNOTATION_CONTEXT_XML: &str = "classpath:applicationContextWithAnnotations.xml";

/// 示例资源目录（classpath 根）
pub fn resources_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

/// 三个构造参数，或 `adressDetail`、`zipCode`、`city` 属性
fn create_adress(args: &BeanArguments) -> ContainerResult<Adress> {
    if args.arg_count() > 0 {
        return Ok(Adress::new(args.value(0)?, args.value(1)?, args.value(2)?));
    }
    Ok(Adress {
        adress_detail: args.property_value("adressDetail")?,
        zip_code: args.property_value("zipCode")?,
        city: args.property_value("city")?,
    })
}

/// 构造参数 `(name, birthDate, adress)`，或 `name`、`strBirthDate`、`adress` 属性
fn create_person(args: &BeanArguments, factory: &dyn BeanFactory) -> ContainerResult<Person> {
    if args.arg_count() > 0 {
        let adress = match args.arg_count() {
            n if n > 2 => Some(args.reference::<Adress>(2, factory)?),
            _ => None,
        };
        return Person::new(args.value(0)?, &args.value(1)?, adress);
    }

    let mut person = Person {
        name: args.property_value("name")?,
        adress: args.property_ref::<Adress>("adress", factory)?,
        ..Default::default()
    };
    if let Some(birth_date) = args.property_value("strBirthDate")? {
        person.set_str_birth_date(&birth_date)?;
    }
    Ok(person)
}

pub fn class_registry() -> ClassRegistry {
    ClassRegistry::new()
        .register(ADRESS_CLASS, |args: &BeanArguments, _: &dyn BeanFactory| create_adress(args))
        .register(PERSON_CLASS, create_person)
        .register(AUTOWIRED_PERSON_CLASS, |args: &BeanArguments, factory: &dyn BeanFactory| {
            AutowiredPerson::autowire(factory, create_person(args, factory)?)
        })
}

fn xml_context_for(location: &str) -> ContainerResult<Arc<ApplicationContext>> {
    ApplicationContext::builder()
        .classpath_root(resources_dir())
        .add_property_source(Box::new(EnvironmentPropertySource::new("TRELLIS_")))
        .class_registry(class_registry())
        .xml(location)
        .build()
}

pub fn xml_context() -> ContainerResult<Arc<ApplicationContext>> {
    xml_context_for(APPLICATION_CONTEXT_XML)
}

pub fn annotation_context() -> ContainerResult<Arc<ApplicationContext>> {
    xml_context_for(ANNOTATION_CONTEXT_XML)
}
