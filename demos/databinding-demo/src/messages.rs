//! 错误码和对应的法语消息

use trellis_validation::prelude::*;

pub const NAME_EMPTY: &str = "name.empty";
pub const NEGATIVE_VALUE: &str = "negativevalue";
pub const TOO_OLD: &str = "too.darn.old";
pub const FIELD_REQUIRED: &str = "field.required";
pub const NUMBER_FORMAT: &str = "number.format.error";

/// 消息表，`{0}` 为字段路径，`{1}` 起为错误参数
pub const MESSAGES: [(&str, &str); 5] = [
    (NAME_EMPTY, "Le nom doit être renseigné"),
    (NEGATIVE_VALUE, "La valeur du champ ''{0}'' ne doit pas être négative"),
    (TOO_OLD, "L''âge est trop vieux"),
    (FIELD_REQUIRED, "Le champ ''{0}'' est obligatoire"),
    (NUMBER_FORMAT, "Le champ ''{0}'' doit être numérique sur {1} positions"),
];

/// 以根区域登记全部消息，任意区域都能回退到它们
pub fn application_messages() -> StaticMessageSource {
    let mut source = StaticMessageSource::new();
    source.add_messages(MESSAGES, &Locale::root());
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_resolve_for_any_locale() {
        let source = application_messages();
        let args = vec!["adress.number".to_string(), "5".to_string()];
        assert_eq!(
            source.get_message(NUMBER_FORMAT, &args, &Locale::with_country("fr", "FR")).unwrap(),
            "Le champ 'adress.number' doit être numérique sur 5 positions"
        );
        assert_eq!(
            source.get_message(TOO_OLD, &args[..1], &Locale::new("en")).unwrap(),
            "L'âge est trop vieux"
        );
    }
}
