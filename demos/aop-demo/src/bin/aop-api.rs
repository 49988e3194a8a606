use std::sync::Arc;

use aop_demo::{api_context, Operations};
use trellis_core::prelude::*;

fn main() -> anyhow::Result<()> {
    LoggingConfig::from_env().init()?;

    let context = api_context()?;

    let operations = context.get_bean_by_type::<Arc<dyn Operations>>()?;
    operations.square(5.0)?;
    operations.sum_of_squares(&[1.0, 2.0, 3.0, 4.0, 5.0])?;
    operations.square_of_sum(&[1.0, 2.0, 3.0, 4.0, 5.0])?;

    context.close()?;
    Ok(())
}
