use std::sync::Arc;

use chrono::NaiveDate;
use databinding_demo::config::VALIDATION_MESSAGES;
use databinding_demo::messages::{FIELD_REQUIRED, NUMBER_FORMAT};
use databinding_demo::{annotation_context, data_binder_context, Adress, LocalValidator, Person, PersonService};
use proptest::prelude::*;
use trellis_core::prelude::*;
use trellis_validation::prelude::*;

fn demo_values() -> PropertyValues {
    PropertyValues::new()
        .add("name", "Thomas")
        .add("birth_date", "1998-06-21")
        .add("adress.city", "Marseille")
        .add("adress.postal_code", "1300B")
}

#[test]
fn test_data_binder_demo_reports_adress_errors() {
    let context = data_binder_context().unwrap();
    let service = context.get_bean_by_type::<PersonService>().unwrap();

    let (person, binding) = service.get_person_from_properties(&demo_values()).unwrap();
    assert!(!binding.has_errors());
    assert_eq!(person.birth_date, NaiveDate::from_ymd_opt(1998, 6, 21));

    let result = service.validate_person(person).unwrap();
    let errors: Vec<(&str, &str)> = result
        .field_errors()
        .iter()
        .map(|e| (e.field.as_str(), e.code()))
        .collect();
    assert_eq!(
        errors,
        vec![
            ("adress.street", FIELD_REQUIRED),
            ("adress.number", FIELD_REQUIRED),
            ("adress.postal_code", NUMBER_FORMAT),
        ]
    );
    assert!(result.to_string().starts_with("BindingResult: 3 errors\n"));

    let messages = service.resolve_messages(&result);
    assert_eq!(messages[0], "Le champ 'adress.street' est obligatoire");
    assert_eq!(messages[2], "Le champ 'adress.postal_code' doit être numérique sur 5 positions");

    context.close().unwrap();
}

#[test]
fn test_every_date_pattern_binds() {
    let context = data_binder_context().unwrap();
    let service = context.get_bean_by_type::<PersonService>().unwrap();
    let expected = NaiveDate::from_ymd_opt(1998, 6, 21);

    for text in ["21/06/1998", "1998-06-21", "21-06-1998", "19980621"] {
        let values = PropertyValues::new().add("birth_date", text);
        let (person, binding) = service.get_person_from_properties(&values).unwrap();
        assert!(!binding.has_errors(), "{} should parse", text);
        assert_eq!(person.birth_date, expected, "{}", text);
    }

    let (_, binding) = service
        .get_person_from_properties(&PropertyValues::new().add("birth_date", "June 21st"))
        .unwrap();
    assert_eq!(binding.field_error("birth_date").unwrap().code(), "typeMismatch");
}

#[test]
fn test_validators_are_shared_singletons() {
    let context = data_binder_context().unwrap();
    let first = context.get_typed_bean::<Arc<dyn Validator>>("personValidator").unwrap();
    let second = context.get_typed_bean::<Arc<dyn Validator>>("personValidator").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.supports(std::any::TypeId::of::<Person>()));
}

fn annotation_person() -> Person {
    Person::new()
        .set_name("Mathieu")
        .set_insee("1981184012191")
        .set_adress(Adress::new().set_city("Marseille").set_postal_code("1300B"))
}

#[test]
fn test_annotation_demo_reports_five_violations() {
    let context = annotation_context().unwrap();
    let validator = context.get_bean_by_type::<LocalValidator>().unwrap();

    let paths: Vec<String> = validator
        .validate(&annotation_person())
        .into_iter()
        .map(|v| v.property_path)
        .collect();
    assert_eq!(paths, vec!["age", "adress.street", "adress.postal_code", "birth_date", "insee"]);
}

#[test]
fn test_insee_message_follows_locale() {
    let context = annotation_context().unwrap();
    let source: Arc<dyn MessageSource> = Arc::new(
        ResourceBundleMessageSource::new(context.resource_loader().clone()).with_basename(VALIDATION_MESSAGES),
    );

    let insee_message = |locale: Locale| {
        LocalValidator::new(Arc::clone(&source))
            .with_locale(locale)
            .validate(&annotation_person())
            .into_iter()
            .find(|v| v.property_path == "insee")
            .map(|v| v.message)
    };

    assert_eq!(
        insee_message(Locale::with_country("fr", "FR")).as_deref(),
        Some("Le numéro INSEE n'est pas valide")
    );
    assert_eq!(insee_message(Locale::new("en")).as_deref(), Some("The INSEE number is not valid"));
}

fn valid_person(name: String, age: i32, days_ago: i64) -> Person {
    let birth_date = chrono::Local::now().date_naive() - chrono::Duration::days(days_ago);
    Person::new()
        .set_name(name)
        .set_age(age)
        .set_birth_date(birth_date)
        .set_insee("198118401219145")
        .set_adress(
            Adress::new()
                .set_street("Rue Paradis")
                .set_number("4")
                .set_postal_code("13006")
                .set_city("Marseille"),
        )
}

proptest! {
    #[test]
    fn prop_well_formed_person_has_no_violations(
        name in "[A-Za-z]{2,30}",
        age in 16i32..=130,
        days_ago in 1i64..40_000,
    ) {
        prop_assert!(valid_person(name, age, days_ago).validate().is_ok());
    }

    #[test]
    fn prop_out_of_range_age_is_one_violation(age in prop_oneof![-50i32..16, 131i32..500]) {
        let err = valid_person("Mathieu".into(), age, 10_000).validate().unwrap_err();
        prop_assert_eq!(err.violations().len(), 1);
        prop_assert_eq!(err.violations()[0].property_path.as_str(), "age");
    }
}
