use databinding_demo::data_binder_context;
use databinding_demo::PersonService;
use trellis_core::prelude::*;
use trellis_validation::prelude::*;

fn main() -> anyhow::Result<()> {
    let context = data_binder_context()?;
    LoggingConfig::from_environment(context.environment()).init()?;

    let person_service = context.get_bean_by_type::<PersonService>()?;

    let values = PropertyValues::new()
        .add("name", "Thomas")
        .add("birth_date", "1998-06-21")
        .add("adress.city", "Marseille")
        .add("adress.postal_code", "1300B");

    let (person, binding) = person_service.get_person_from_properties(&values)?;
    if binding.has_errors() {
        println!("{}", binding);
    }

    let binding_result = person_service.validate_person(person)?;
    println!("{}", binding_result);

    context.close()?;
    Ok(())
}
