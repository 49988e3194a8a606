//! 编程式验证器
//!
//! 验证器声明自己支持的目标类型，并通过 [`Errors`] 登记错误。

use std::any::{Any, TypeId};

use crate::error::{ValidationError, ValidationResult};
use crate::errors::Errors;

/// 验证器 trait
pub trait Validator: Send + Sync {
    /// 验证器名称，用于错误信息
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn supports(&self, type_id: TypeId) -> bool;

    fn validate(&self, target: &dyn Any, errors: &mut Errors<'_>) -> ValidationResult<()>;
}

/// 验证工具
pub struct ValidationUtils;

impl ValidationUtils {
    /// 字段为 null 或空字符串时登记错误
    pub fn reject_if_empty(errors: &mut Errors<'_>, field: &str, code: &str) {
        if errors.field_value(field).is_empty() {
            errors.reject_value(field, code);
        }
    }

    /// 字段为 null、空字符串或只含空白时登记错误
    pub fn reject_if_empty_or_whitespace(errors: &mut Errors<'_>, field: &str, code: &str) {
        if errors.field_value(field).is_blank() {
            errors.reject_value(field, code);
        }
    }

    /// 调用验证器，目标类型不受支持时返回错误
    pub fn invoke_validator(
        validator: &dyn Validator,
        target: &dyn Any,
        errors: &mut Errors<'_>,
    ) -> ValidationResult<()> {
        if !validator.supports(target.type_id()) {
            return Err(ValidationError::UnsupportedTarget {
                validator: validator.name().to_string(),
                target: format!("{:?}", target.type_id()),
            });
        }
        tracing::debug!("Invoking validator {} at '{}'", validator.name(), errors.nested_path());
        validator.validate(target, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BindingResult;
    use crate::value::fixtures::{Address, Customer};

    struct AddressValidator;

    impl Validator for AddressValidator {
        fn supports(&self, type_id: TypeId) -> bool {
            type_id == TypeId::of::<Address>()
        }

        fn validate(&self, _target: &dyn Any, errors: &mut Errors<'_>) -> ValidationResult<()> {
            ValidationUtils::reject_if_empty_or_whitespace(errors, "street", "field.required");
            ValidationUtils::reject_if_empty(errors, "zip", "field.required");
            Ok(())
        }
    }

    #[test]
    fn test_reject_helpers_in_nested_path() {
        let customer = Customer {
            address: Some(Address { street: Some("   ".into()), zip: Some("13009".into()) }),
            ..Default::default()
        };
        let mut result = BindingResult::new("customer");
        let mut errors = Errors::new(&mut result, &customer);

        errors.push_nested_path("address");
        let address = customer.address.as_ref().unwrap();
        ValidationUtils::invoke_validator(&AddressValidator, address, &mut errors).unwrap();
        errors.pop_nested_path().unwrap();

        assert_eq!(result.error_count(), 1);
        let error = result.field_error("address.street").unwrap();
        assert_eq!(error.code(), "field.required");
        assert_eq!(error.rejected_value.as_deref(), Some("   "));
    }

    #[test]
    fn test_invoke_validator_rejects_unsupported_target() {
        let customer = Customer::default();
        let mut result = BindingResult::new("customer");
        let mut errors = Errors::new(&mut result, &customer);

        let err = ValidationUtils::invoke_validator(&AddressValidator, &customer, &mut errors).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedTarget { .. }));
        assert!(!errors.has_errors());
    }
}
