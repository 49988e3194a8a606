//! 绑定目标：人员和地址

use std::any::Any;

use chrono::NaiveDate;
use trellis_validation::prelude::*;

/// 姓名长度违规时的消息
pub const NAME_SIZE_MESSAGE: &str = "Le nom doit doit comporter entre 2 et 30 caractères";
/// 邮编格式违规时的消息
pub const POSTAL_CODE_MESSAGE: &str = "Le code postal doit être numérique sur 5 positions";
/// INSEE 违规消息模板，花括号中的键由消息源解析
pub const INSEE_MESSAGE: &str = "{demo.databinding.constraints.Insee}";

pub const POSTAL_CODE_PATTERN: &str = "[0-9]{5}";

fn text(value: &Option<String>) -> FieldValue {
    value.as_ref().into()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adress {
    pub street: Option<String>,
    pub number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

impl Adress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn set_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn set_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn set_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

impl PropertyAccessor for Adress {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get_property(&self, name: &str) -> Option<FieldValue> {
        match name {
            "street" => Some(text(&self.street)),
            "number" => Some(text(&self.number)),
            "postal_code" => Some(text(&self.postal_code)),
            "city" => Some(text(&self.city)),
            _ => None,
        }
    }

    fn set_property(
        &mut self,
        name: &str,
        value: &str,
        _conversion: &FormattingConversionService,
    ) -> BindResult<()> {
        let slot = match name {
            "street" => &mut self.street,
            "number" => &mut self.number,
            "postal_code" => &mut self.postal_code,
            "city" => &mut self.city,
            _ => {
                return Err(BindError::NotWritable {
                    property: name.to_string(),
                })
            }
        };
        *slot = Some(value.to_string());
        Ok(())
    }
}

impl Validate for Adress {
    fn collect_violations(&self, builder: &mut ValidatorBuilder) {
        builder.check("street", self.street.clone(), ValidationRules::not_blank(self.street.as_deref()));
        match ValidationRules::pattern(self.postal_code.as_deref(), POSTAL_CODE_PATTERN) {
            Ok(result) => {
                builder.check_with_message("postal_code", self.postal_code.clone(), result, POSTAL_CODE_MESSAGE);
            }
            Err(e) => {
                builder.add_violation("postal_code", "Pattern", e.to_string());
            }
        }
        builder.check("city", self.city.clone(), ValidationRules::not_blank(self.city.as_deref()));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub adress: Option<Adress>,
    pub birth_date: Option<NaiveDate>,
    pub insee: Option<String>,
}

impl Person {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn set_adress(mut self, adress: Adress) -> Self {
        self.adress = Some(adress);
        self
    }

    pub fn set_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn set_insee(mut self, insee: impl Into<String>) -> Self {
        self.insee = Some(insee.into());
        self
    }
}

impl PropertyAccessor for Person {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get_property(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(text(&self.name)),
            "age" => Some(self.age.map(i64::from).into()),
            "adress" => Some(match &self.adress {
                Some(adress) => FieldValue::Object(format!("{:?}", adress)),
                None => FieldValue::Null,
            }),
            "birth_date" => Some(self.birth_date.into()),
            "insee" => Some(text(&self.insee)),
            _ => None,
        }
    }

    fn set_property(
        &mut self,
        name: &str,
        value: &str,
        conversion: &FormattingConversionService,
    ) -> BindResult<()> {
        match name {
            "name" => self.name = Some(value.to_string()),
            "age" => self.age = Some(convert_property(conversion, name, value)?),
            "birth_date" => self.birth_date = Some(convert_property(conversion, name, value)?),
            "insee" => self.insee = Some(value.to_string()),
            _ => {
                return Err(BindError::NotWritable {
                    property: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Option<&dyn PropertyAccessor> {
        match name {
            "adress" => self.adress.as_ref().map(|a| a as &dyn PropertyAccessor),
            _ => None,
        }
    }

    fn nested_mut(&mut self, name: &str) -> Option<&mut dyn PropertyAccessor> {
        match name {
            "adress" => Some(self.adress.get_or_insert_with(Adress::default)),
            _ => None,
        }
    }
}

impl Validate for Person {
    fn collect_violations(&self, builder: &mut ValidatorBuilder) {
        let today = builder.today();
        let age = self.age.map(|a| a.to_string());
        let birth_date = self.birth_date.map(|d| d.to_string());

        builder
            .check_with_message(
                "name",
                self.name.clone(),
                ValidationRules::size(self.name.as_deref(), 2, 30),
                NAME_SIZE_MESSAGE,
            )
            .check("age", age.clone(), ValidationRules::not_null(self.age.as_ref()))
            .check("age", age.clone(), ValidationRules::min(self.age.map(i64::from), 16))
            .check("age", age, ValidationRules::max(self.age.map(i64::from), 130))
            .check("adress", None, ValidationRules::not_null(self.adress.as_ref()))
            .nested("adress", self.adress.as_ref())
            .check("birth_date", birth_date.clone(), ValidationRules::not_null(self.birth_date.as_ref()))
            .check("birth_date", birth_date, ValidationRules::past(self.birth_date, today))
            .check_with_message(
                "insee",
                self.insee.clone(),
                ValidationRules::insee(self.insee.as_deref(), true),
                INSEE_MESSAGE,
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_validation::{read_path, write_path};

    fn valid_adress() -> Adress {
        Adress::new()
            .set_street("Rue de la République")
            .set_number("12")
            .set_postal_code("13002")
            .set_city("Marseille")
    }

    fn valid_person() -> Person {
        Person::new()
            .set_name("Mathieu")
            .set_age(42)
            .set_birth_date(NaiveDate::from_ymd_opt(1981, 11, 8).unwrap())
            .set_adress(valid_adress())
            .set_insee("198118401219145")
    }

    #[test]
    fn test_valid_person_has_no_violations() {
        assert!(valid_person().validate().is_ok());
    }

    #[test]
    fn test_missing_adress_fields_are_reported_with_prefix() {
        let person = valid_person().set_adress(Adress::new().set_postal_code("13002"));
        let err = person.validate().unwrap_err();
        let paths: Vec<&str> = err.violations().iter().map(|v| v.property_path.as_str()).collect();
        assert_eq!(paths, vec!["adress.street", "adress.city"]);
    }

    #[test]
    fn test_custom_messages() {
        let person = valid_person()
            .set_name("M")
            .set_adress(valid_adress().set_postal_code("1300B"));
        let err = person.validate().unwrap_err();
        let messages: Vec<String> = err.violations().iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                format!("name: {}", NAME_SIZE_MESSAGE),
                format!("adress.postal_code: {}", POSTAL_CODE_MESSAGE),
            ]
        );
    }

    #[test]
    fn test_nested_property_access() {
        let conversion = FormattingConversionService::new();
        let mut person = Person::new();
        write_path(&mut person, "adress.city", "Marseille", &conversion).unwrap();
        assert_eq!(person.adress.as_ref().and_then(|a| a.city.as_deref()), Some("Marseille"));
        assert_eq!(read_path(&person, "adress.street"), Some(FieldValue::Null));
        assert!(write_path(&mut person, "adress.country", "FR", &conversion).is_err());
    }
}
