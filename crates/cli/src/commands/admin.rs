//! Admin and vendor portal commands.
//!
//! # Usage
//!
//! ```bash
//! hoe admin brands create --name "Kalki" --logo https://cdn.example.com/kalki.png
//! hoe admin subcategories create --name Sarees --category 64f0c2...
//! hoe admin orders list --status pending
//! hoe admin orders ship 65a1... --carrier Delhivery --tracking DL123 --eta 2026-11-02
//! hoe vendor products create --name "Silk Saree" --brand 64f... --category 64f... \
//!     --price 4999 --stock 12 --attribute Color=Red --image https://cdn.example.com/1.jpg
//! ```
//!
//! Each portal uses its own session: sign in with `hoe auth login --as admin`
//! or `--as vendor` first.

use std::slice;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use hoe_admin::{Collection, OrderFilter, Portal, PortalClient, Resource, ShipmentUpdate};
use hoe_core::{
    BrandId, BrandInput, CategoryId, CategoryInput, OrderId, OrderStatus, ProductAttribute,
    ProductId, ProductInput, ShipmentStatus, SubcategoryId, SubcategoryInput,
};
use rust_decimal::Decimal;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Manage brands
    Brands {
        #[command(subcommand)]
        action: BrandAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage subcategories
    Subcategories {
        #[command(subcommand)]
        action: SubcategoryAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Fulfil orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
pub enum VendorAction {
    /// Manage your products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Fulfil orders for your products
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

// =============================================================================
// Catalog actions
// =============================================================================

#[derive(Subcommand)]
pub enum BrandAction {
    List,
    Create(BrandArgs),
    Update {
        id: BrandId,
        #[command(flatten)]
        form: BrandArgs,
    },
    Delete {
        id: BrandId,
    },
}

#[derive(Args)]
pub struct BrandArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    /// Logo image URL
    #[arg(long)]
    logo: Option<String>,
}

impl From<BrandArgs> for BrandInput {
    fn from(args: BrandArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            logo: args.logo,
        }
    }
}

#[derive(Subcommand)]
pub enum CategoryAction {
    List,
    Create(CategoryArgs),
    Update {
        id: CategoryId,
        #[command(flatten)]
        form: CategoryArgs,
    },
    Delete {
        id: CategoryId,
    },
}

#[derive(Args)]
pub struct CategoryArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    /// Image URL
    #[arg(long)]
    image: Option<String>,
}

impl From<CategoryArgs> for CategoryInput {
    fn from(args: CategoryArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            image: args.image,
        }
    }
}

#[derive(Subcommand)]
pub enum SubcategoryAction {
    List,
    Create(SubcategoryArgs),
    Update {
        id: SubcategoryId,
        #[command(flatten)]
        form: SubcategoryArgs,
    },
    Delete {
        id: SubcategoryId,
    },
}

#[derive(Args)]
pub struct SubcategoryArgs {
    #[arg(long)]
    name: String,
    /// Parent category ID
    #[arg(long)]
    category: CategoryId,
    #[arg(long)]
    description: Option<String>,
}

impl From<SubcategoryArgs> for SubcategoryInput {
    fn from(args: SubcategoryArgs) -> Self {
        Self {
            name: args.name,
            category: args.category,
            description: args.description,
        }
    }
}

#[derive(Subcommand)]
pub enum ProductAction {
    List,
    Create(ProductArgs),
    Update {
        id: ProductId,
        #[command(flatten)]
        form: ProductArgs,
    },
    Delete {
        id: ProductId,
    },
}

#[derive(Args)]
pub struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    brand: BrandId,
    #[arg(long)]
    category: CategoryId,
    #[arg(long)]
    subcategory: Option<SubcategoryId>,
    /// Price in rupees
    #[arg(long)]
    price: Decimal,
    /// Sale price in rupees
    #[arg(long)]
    discount_price: Option<Decimal>,
    #[arg(long, default_value_t = 0)]
    stock: i64,
    /// `name=value`, repeatable
    #[arg(long = "attribute", value_parser = parse_attribute)]
    attributes: Vec<ProductAttribute>,
    /// Image URL, repeatable
    #[arg(long = "image")]
    images: Vec<String>,
}

impl From<ProductArgs> for ProductInput {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            brand: args.brand,
            category: args.category,
            subcategory: args.subcategory,
            price: args.price,
            discount_price: args.discount_price,
            stock: args.stock,
            attributes: args.attributes,
            images: args.images,
        }
    }
}

fn parse_attribute(value: &str) -> Result<ProductAttribute, String> {
    let (name, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected name=value but got {value}"))?;
    Ok(ProductAttribute {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
    })
}

/// One CRUD request, independent of the document kind.
enum Crud<R: Resource> {
    List,
    Create(R::Input),
    Update(R::Id, R::Input),
    Delete(R::Id),
}

macro_rules! into_crud {
    ($action:ident, $resource:ty) => {
        impl From<$action> for Crud<$resource> {
            fn from(action: $action) -> Self {
                match action {
                    $action::List => Self::List,
                    $action::Create(form) => Self::Create(form.into()),
                    $action::Update { id, form } => Self::Update(id, form.into()),
                    $action::Delete { id } => Self::Delete(id),
                }
            }
        }
    };
}

into_crud!(BrandAction, hoe_core::Brand);
into_crud!(CategoryAction, hoe_core::Category);
into_crud!(SubcategoryAction, hoe_core::Subcategory);
into_crud!(ProductAction, hoe_core::Product);

async fn crud<R: Resource>(
    collection: Collection<R>,
    request: Crud<R>,
    show: fn(&[R]),
) -> Result<(), CommandError> {
    match request {
        Crud::List => show(&collection.list().await?),
        Crud::Create(input) => {
            let created = collection.create(&input).await?;
            output::message("Created:");
            show(slice::from_ref(&created));
        }
        Crud::Update(id, input) => {
            let updated = collection.update(&id, &input).await?;
            output::message("Updated:");
            show(slice::from_ref(&updated));
        }
        Crud::Delete(id) => {
            collection.delete(&id).await?;
            output::message(&format!("Deleted {id}."));
        }
    }
    Ok(())
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Subcommand)]
pub enum OrderAction {
    /// List orders
    List {
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one order
    Show { id: OrderId },
    /// Change an order's status
    Status { id: OrderId, status: OrderStatus },
    /// Record shipment tracking
    Ship {
        id: OrderId,
        #[arg(long)]
        carrier: Option<String>,
        /// Tracking number
        #[arg(long)]
        tracking: Option<String>,
        #[arg(long)]
        status: Option<ShipmentStatus>,
        /// Estimated delivery (`YYYY-MM-DD` or RFC 3339)
        #[arg(long, value_parser = parse_eta)]
        eta: Option<DateTime<Utc>>,
    },
}

async fn orders(portal: &PortalClient, action: OrderAction) -> Result<(), CommandError> {
    let desk = portal.orders();
    match action {
        OrderAction::List {
            status,
            page,
            limit,
        } => {
            let filter = OrderFilter {
                status,
                page,
                limit,
            };
            output::orders(&desk.list(&filter).await?);
        }
        OrderAction::Show { id } => output::order(&desk.get(&id).await?),
        OrderAction::Status { id, status } => {
            let order = desk.update_status(&id, status).await?;
            output::message(&format!("Order {} is now {}.", order.reference(), order.status));
        }
        OrderAction::Ship {
            id,
            carrier,
            tracking,
            status,
            eta,
        } => {
            let update = ShipmentUpdate {
                carrier,
                tracking_number: tracking,
                status,
                estimated_delivery: eta,
            };
            output::order(&desk.update_shipment(&id, &update).await?);
        }
    }
    Ok(())
}

fn parse_eta(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| format!("expected YYYY-MM-DD or an RFC 3339 time but got {value}"))
}

// =============================================================================
// Entry points
// =============================================================================

pub async fn run_admin(ctx: &Context, action: AdminAction) -> Result<(), CommandError> {
    let portal = ctx.portal(Portal::Admin);
    match action {
        AdminAction::Brands { action } => {
            crud(portal.brands()?, action.into(), output::brands).await
        }
        AdminAction::Categories { action } => {
            crud(portal.categories()?, action.into(), output::categories).await
        }
        AdminAction::Subcategories { action } => {
            crud(portal.subcategories()?, action.into(), output::subcategories).await
        }
        AdminAction::Products { action } => {
            crud(portal.products()?, action.into(), output::products).await
        }
        AdminAction::Orders { action } => orders(&portal, action).await,
    }
}

pub async fn run_vendor(ctx: &Context, action: VendorAction) -> Result<(), CommandError> {
    let portal = ctx.portal(Portal::Vendor);
    match action {
        VendorAction::Products { action } => {
            crud(portal.products()?, action.into(), output::products).await
        }
        VendorAction::Orders { action } => orders(&portal, action).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn test_parse_attribute() {
        let attribute = parse_attribute("Color = Red").unwrap();
        assert_eq!(attribute.name, "Color");
        assert_eq!(attribute.value, "Red");
        assert!(parse_attribute("Color").is_err());
    }

    #[test]
    fn test_parse_eta() {
        let date = parse_eta("2026-11-02").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2026, 11, 2));
        assert!(parse_eta("2026-11-02T10:00:00+05:30").is_ok());
        assert!(parse_eta("next week").is_err());
    }

    #[test]
    fn test_product_args_become_input() {
        let input = ProductInput::from(ProductArgs {
            name: "Silk Saree".to_string(),
            description: None,
            brand: BrandId::new("b1"),
            category: CategoryId::new("c1"),
            subcategory: None,
            price: Decimal::new(4999, 0),
            discount_price: None,
            stock: 3,
            attributes: vec![parse_attribute("Color=Red").unwrap()],
            images: vec![],
        });
        assert_eq!(input.attributes.len(), 1);
        assert_eq!(input.brand.as_str(), "b1");
    }
}
