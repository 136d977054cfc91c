//! Shopping cart commands. Every change prints the cart as the server now
//! holds it.

use clap::Subcommand;
use hoe_core::{CartItemId, ProductId};
use hoe_storefront::cart::CartManager;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart and its totals
    Show,
    /// Add a product
    Add {
        /// Product ID
        product: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line by cart item ID
    Remove {
        /// Cart item ID
        item: CartItemId,
    },
    /// Remove the line holding a product
    RemoveProduct {
        /// Product ID
        product: ProductId,
    },
    /// Change a line's quantity (0 removes it)
    Set {
        /// Cart item ID
        item: CartItemId,
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

pub async fn run(ctx: &Context, action: CartAction) -> Result<(), CommandError> {
    let mut cart = ctx.storefront.cart();
    match action {
        CartAction::Show => {
            cart.refresh().await?;
        }
        CartAction::Add { product, quantity } => cart.add(&product, quantity).await?,
        CartAction::Remove { item } => cart.remove(&item).await?,
        CartAction::RemoveProduct { product } => cart.remove_by_product_id(&product).await?,
        CartAction::Set { item, quantity } => cart.set_quantity(&item, quantity).await?,
        CartAction::Clear => cart.clear().await?,
    }
    show(&cart);
    Ok(())
}

fn show(cart: &CartManager) {
    output::cart(cart.items(), &cart.totals());
}
