//! 编程式验证器

use std::any::{Any, TypeId};
use std::sync::Arc;

use trellis_validation::prelude::*;

use crate::beans::{Adress, Person, POSTAL_CODE_PATTERN};
use crate::messages::{FIELD_REQUIRED, NAME_EMPTY, NEGATIVE_VALUE, NUMBER_FORMAT, TOO_OLD};

pub struct AdressValidator;

impl Validator for AdressValidator {
    fn name(&self) -> &str {
        "adressValidator"
    }

    fn supports(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<Adress>()
    }

    fn validate(&self, target: &dyn Any, errors: &mut Errors<'_>) -> ValidationResult<()> {
        for field in ["street", "number", "postal_code", "city"] {
            ValidationUtils::reject_if_empty_or_whitespace(errors, field, FIELD_REQUIRED);
        }

        let postal_code = target
            .downcast_ref::<Adress>()
            .and_then(|adress| adress.postal_code.as_deref());
        if ValidationRules::pattern(postal_code, POSTAL_CODE_PATTERN)?.is_err() {
            errors.reject_value_with("postal_code", NUMBER_FORMAT, vec!["5".to_string()], None);
        }
        Ok(())
    }
}

/// 人员验证器，地址交给嵌套的地址验证器并加 `adress.` 前缀
pub struct PersonValidator {
    adress_validator: Arc<dyn Validator>,
}

impl PersonValidator {
    pub fn new(adress_validator: Arc<dyn Validator>) -> Self {
        Self { adress_validator }
    }
}

impl Validator for PersonValidator {
    fn name(&self) -> &str {
        "personValidator"
    }

    fn supports(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<Person>()
    }

    fn validate(&self, target: &dyn Any, errors: &mut Errors<'_>) -> ValidationResult<()> {
        ValidationUtils::reject_if_empty(errors, "name", NAME_EMPTY);

        let Some(person) = target.downcast_ref::<Person>() else {
            return Ok(());
        };
        match person.age {
            Some(age) if age <= 0 => errors.reject_value("age", NEGATIVE_VALUE),
            Some(age) if age > 110 => errors.reject_value("age", TOO_OLD),
            _ => {}
        }

        ValidationUtils::reject_if_empty(errors, "adress", FIELD_REQUIRED);

        if let Some(adress) = &person.adress {
            errors.push_nested_path("adress");
            ValidationUtils::invoke_validator(self.adress_validator.as_ref(), adress, errors)?;
            errors.pop_nested_path()?;
        }
        Ok(())
    }
}
