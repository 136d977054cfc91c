//! Browse brands, categories and products.

use clap::Subcommand;
use hoe_core::{CategoryId, ProductId};
use hoe_storefront::catalog::ProductQuery;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List brands
    Brands,
    /// List categories
    Categories,
    /// List subcategories
    Subcategories {
        /// Only subcategories of this category ID
        #[arg(long)]
        category: Option<CategoryId>,
    },
    /// List products
    Products {
        /// Brand ID
        #[arg(long)]
        brand: Option<String>,

        /// Category ID
        #[arg(long)]
        category: Option<String>,

        /// Subcategory ID
        #[arg(long)]
        subcategory: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: ProductId,
    },
}

pub async fn run(ctx: &Context, action: CatalogAction) -> Result<(), CommandError> {
    let catalog = ctx.storefront.catalog();
    match action {
        CatalogAction::Brands => output::brands(&catalog.list_brands().await?),
        CatalogAction::Categories => output::categories(&catalog.list_categories().await?),
        CatalogAction::Subcategories { category } => {
            output::subcategories(&catalog.list_subcategories(category.as_ref()).await?);
        }
        CatalogAction::Products {
            brand,
            category,
            subcategory,
            search,
            page,
            limit,
        } => {
            let query = ProductQuery {
                brand,
                category,
                subcategory,
                search,
                page,
                limit,
            };
            output::product_page(&*catalog.list_products(&query).await?);
        }
        CatalogAction::Product { id } => output::product(&*catalog.get_product(&id).await?),
    }
    Ok(())
}
