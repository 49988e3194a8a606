use ioc_demo::{xml_context, Person};
use trellis_core::prelude::*;

fn main() -> anyhow::Result<()> {
    let context = xml_context()?;
    LoggingConfig::from_environment(context.environment()).init()?;

    let person = context.get_typed_bean::<Person>("person")?;
    println!("{}", person);

    context.close()?;
    Ok(())
}
