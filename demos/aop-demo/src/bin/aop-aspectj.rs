use std::sync::Arc;

use aop_demo::{aspectj_context, AspectJApplication, Operations};
use trellis_core::prelude::*;

fn main() -> anyhow::Result<()> {
    let context = aspectj_context()?;
    LoggingConfig::from_environment(context.environment()).init()?;

    let operations = context.get_bean_by_type::<Arc<dyn Operations>>()?;
    operations.square(5.0)?;
    operations.sum_of_squares(&[1.0, 2.0, 3.0, 4.0, 5.0])?;
    operations.square_of_sum(&[1.0, 2.0, 3.0, 4.0, 5.0])?;

    let application = context.get_bean_by_type::<AspectJApplication>()?;
    println!("{}", application.message);

    context.close()?;
    Ok(())
}
