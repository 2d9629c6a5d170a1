use cpebridge_frame::ControlOrder;

use crate::cmd::OrderArgs;
use crate::exit::{order_error, CliResult, SUCCESS};
use crate::output::{print_order, OutputFormat};

pub fn run(args: OrderArgs, format: OutputFormat) -> CliResult<i32> {
    let order =
        ControlOrder::parse(args.order.trim()).map_err(|err| order_error("invalid order", err))?;
    print_order(order, format);
    Ok(SUCCESS)
}
