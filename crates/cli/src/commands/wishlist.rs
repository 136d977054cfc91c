//! Wishlist commands.

use clap::Subcommand;
use hoe_core::ProductId;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show saved products
    Show,
    /// Save a product
    Add {
        /// Product ID
        product: ProductId,
    },
    /// Forget a product
    Remove {
        /// Product ID
        product: ProductId,
    },
    /// Put one unit in the cart and drop it from the wishlist
    MoveToCart {
        /// Product ID
        product: ProductId,
    },
}

pub async fn run(ctx: &Context, action: WishlistAction) -> Result<(), CommandError> {
    let mut wishlist = ctx.storefront.wishlist();
    match action {
        WishlistAction::Show => {
            wishlist.refresh().await?;
        }
        WishlistAction::Add { product } => wishlist.add(&product).await?,
        WishlistAction::Remove { product } => wishlist.remove(&product).await?,
        WishlistAction::MoveToCart { product } => {
            let mut cart = ctx.storefront.cart();
            wishlist.move_to_cart(&product, &mut cart).await?;
            output::message(&format!(
                "Moved to cart ({} items in cart).",
                cart.item_count()
            ));
        }
    }
    output::wishlist(wishlist.items());
    Ok(())
}
