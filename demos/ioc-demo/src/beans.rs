//! 人员和地址

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use trellis_core::prelude::*;

/// 出生日期的文本格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(text: &str) -> ContainerResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|e| {
        ContainerError::BeanCreationFailed(format!("Unparseable date: \"{}\": {}", text, e))
    })
}

fn or_null(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adress {
    pub adress_detail: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
}

impl Adress {
    pub fn new(adress_detail: impl Into<String>, zip_code: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            adress_detail: Some(adress_detail.into()),
            zip_code: Some(zip_code.into()),
            city: Some(city.into()),
        }
    }
}

impl fmt::Display for Adress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Adress [adressDetail={}, zipCode={}, city={}]",
            or_null(&self.adress_detail),
            or_null(&self.zip_code),
            or_null(&self.city)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Person {
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub adress: Option<Arc<Adress>>,
}

impl Person {
    /// 出生日期按 `yyyy-MM-dd` 解析
    pub fn new(name: impl Into<String>, birth_date: &str, adress: Option<Arc<Adress>>) -> ContainerResult<Self> {
        Ok(Self {
            name: Some(name.into()),
            birth_date: Some(parse_date(birth_date)?),
            adress,
        })
    }

    pub fn set_str_birth_date(&mut self, birth_date: &str) -> ContainerResult<()> {
        self.birth_date = Some(parse_date(birth_date)?);
        Ok(())
    }

    /// 各字段的文本，缺失的字段不出现
    fn fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(format!("name={}", name));
        }
        if let Some(birth_date) = &self.birth_date {
            fields.push(format!("birthDate={}", birth_date));
        }
        if let Some(adress) = &self.adress {
            fields.push(format!("adress={}", adress));
        }
        fields
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Person [{}]", self.fields().join(", "))
    }
}

/// 按类型注入地址的人员，注入的地址记在 `bean` 中
#[derive(Debug, Clone, Default)]
pub struct AutowiredPerson {
    pub bean: Option<Arc<Adress>>,
    pub person: Person,
}

impl AutowiredPerson {
    /// 从容器中按类型取得唯一的地址
    pub fn autowire(factory: &dyn BeanFactory, person: Person) -> ContainerResult<Self> {
        Ok(Self {
            bean: Some(factory.get_bean_by_type::<Adress>()?),
            person,
        })
    }
}

impl fmt::Display for AutowiredPerson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(bean) = &self.bean {
            fields.push(format!("bean={}", bean));
        }
        fields.extend(self.person.fields());
        write!(f, "Person [{}]", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regny() -> Arc<Adress> {
        Arc::new(Adress::new("73, traverse Régny", "13009", "Marseille"))
    }

    #[test]
    fn test_display_omits_absent_fields() {
        let person = Person::new("Arthur Shelby", "1892-06-30", Some(regny())).unwrap();
        assert_eq!(
            person.to_string(),
            "Person [name=Arthur Shelby, birthDate=1892-06-30, \
             adress=Adress [adressDetail=73, traverse Régny, zipCode=13009, city=Marseille]]"
        );
        assert_eq!(Person::default().to_string(), "Person []");
        assert_eq!(
            Adress::default().to_string(),
            "Adress [adressDetail=null, zipCode=null, city=null]"
        );
    }

    #[test]
    fn test_birth_date_must_be_iso() {
        assert!(Person::new("Arthur", "30/06/1892", None).is_err());
        let mut person = Person::default();
        person.set_str_birth_date("1892-06-30").unwrap();
        assert_eq!(person.birth_date, NaiveDate::from_ymd_opt(1892, 6, 30));
    }

    #[test]
    fn test_autowired_display_lists_bean_first() {
        let person = AutowiredPerson {
            bean: Some(regny()),
            person: Person {
                name: Some("Polly".into()),
                ..Default::default()
            },
        };
        assert_eq!(
            person.to_string(),
            "Person [bean=Adress [adressDetail=73, traverse Régny, zipCode=13009, city=Marseille], name=Polly]"
        );
    }
}
