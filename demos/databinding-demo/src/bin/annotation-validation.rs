use databinding_demo::{annotation_context, Adress, LocalValidator, Person};
use trellis_core::prelude::*;

fn main() -> anyhow::Result<()> {
    let context = annotation_context()?;
    LoggingConfig::from_environment(context.environment()).init()?;

    let validator = context.get_bean_by_type::<LocalValidator>()?;

    let person = Person::new()
        .set_name("Mathieu")
        .set_insee("1981184012191")
        .set_adress(Adress::new().set_city("Marseille").set_postal_code("1300B"));

    for violation in validator.validate(&person) {
        println!("{}", violation);
    }

    context.close()?;
    Ok(())
}
