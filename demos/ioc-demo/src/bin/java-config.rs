use std::sync::Arc;

use ioc_demo::{java_context, ComponentFactory, ConfiguredPerson, ContextComponentFactory, CreationLog, PersonService};
use trellis_core::prelude::*;

fn main() -> anyhow::Result<()> {
    let context = java_context(CreationLog::default())?;
    LoggingConfig::from_environment(context.environment()).init()?;

    let components = ContextComponentFactory::new(context.clone());
    let person = components.get_component::<ConfiguredPerson>()?;
    println!("{}", person);

    let service = components.get_named_component::<Arc<dyn PersonService>>("personService")?;
    println!("{}", service.validate_person(&person));

    context.close()?;
    Ok(())
}
