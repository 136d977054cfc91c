//! Order history.

use clap::Subcommand;
use hoe_core::OrderId;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show {
        /// Order ID
        id: OrderId,
    },
}

pub async fn run(ctx: &Context, action: OrdersAction) -> Result<(), CommandError> {
    let orders = ctx.storefront.orders();
    match action {
        OrdersAction::List => output::orders(&orders.list_orders().await?),
        OrdersAction::Show { id } => output::order(&orders.get_order(&id).await?),
    }
    Ok(())
}
