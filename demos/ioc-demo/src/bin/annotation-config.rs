use ioc_demo::{annotation_context, AutowiredPerson};
use trellis_core::prelude::*;

fn main() -> anyhow::Result<()> {
    let context = annotation_context()?;
    LoggingConfig::from_environment(context.environment()).init()?;

    let bean = context.get_typed_bean::<AutowiredPerson>("bean")?;
    println!("{}", bean);

    context.close()?;
    Ok(())
}
