//! Terminal output and prompts.
//!
//! Results go to stdout; prompts and error messages go to stderr so output
//! can be piped.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, BufRead, Write};

use hoe_core::{
    Brand, CartItem, Category, Order, OrderTotals, Price, Product, Subcategory, User, WishlistItem,
};
use hoe_storefront::catalog::ProductPage;
use hoe_storefront::session::TokenNamespace;

const UNAVAILABLE: &str = "(unavailable product)";

pub fn message(text: &str) {
    println!("{text}");
}

/// Informational text that is not part of the command's result.
pub fn notice(text: &str) {
    eprintln!("{text}");
}

pub fn error(text: &str) {
    eprintln!("error: {text}");
}

/// Ask for one line of input on stderr and read it from stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub fn ask(label: &str) -> io::Result<String> {
    eprint!("{label}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn user(namespace: TokenNamespace, user: &User) {
    println!(
        "{namespace:<8} {} <{}> ({}, id {})",
        user.name, user.email, user.role, user.id
    );
}

pub fn brands(brands: &[Brand]) {
    if brands.is_empty() {
        println!("No brands.");
    }
    for brand in brands {
        let inactive = if brand.is_active { "" } else { " [inactive]" };
        println!("{:<26} {}{inactive}", brand.id, brand.name);
    }
}

pub fn categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories.");
    }
    for category in categories {
        println!("{:<26} {}", category.id, category.name);
    }
}

pub fn subcategories(subcategories: &[Subcategory]) {
    if subcategories.is_empty() {
        println!("No subcategories.");
    }
    for sub in subcategories {
        let parent = sub
            .category
            .as_ref()
            .and_then(|c| c.populated().map(|c| c.name.as_str()).or_else(|| c.id()))
            .unwrap_or_default();
        println!("{:<26} {:<24} {parent}", sub.id, sub.name);
    }
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products.");
    }
    for product in products {
        let stock = if product.in_stock() {
            format!("{} in stock", product.stock)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{:<26} {:<32} {:>12}  {stock}",
            product.id,
            product.name,
            product.display_price().to_string()
        );
    }
}

pub fn product_page(page: &ProductPage) {
    products(&page.products);
    if let (Some(current), Some(pages)) = (page.page, page.pages) {
        let total = page
            .total
            .map(|t| format!(", {t} products"))
            .unwrap_or_default();
        println!("Page {current} of {pages}{total}");
    }
}

pub fn product(product: &Product) {
    println!("{} ({})", product.name, product.id);
    if product.effective_price() < product.price {
        println!(
            "Price:  {} (was {})",
            product.display_price(),
            Price::inr(product.price)
        );
    } else {
        println!("Price:  {}", product.display_price());
    }
    println!("Stock:  {}", product.stock);
    if let Some(description) = &product.description {
        println!("\n{description}\n");
    }
    for attribute in &product.attributes {
        println!("  {}: {}", attribute.name, attribute.value);
    }
    for image in &product.images {
        println!("  image: {image}");
    }
}

pub fn cart(items: &[CartItem], totals: &OrderTotals) {
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in items {
        println!(
            "{:<26} {:<32} {:>3} x {:>10} = {:>10}",
            item.id,
            item.display_name(),
            item.quantity,
            Price::inr(item.unit_price()).to_string(),
            Price::inr(item.line_total()).to_string()
        );
    }
    totals_block(totals);
}

pub fn totals_block(totals: &OrderTotals) {
    println!("{:>60} {:>12}", "Subtotal", Price::inr(totals.subtotal).to_string());
    println!("{:>60} {:>12}", "Tax (10%)", Price::inr(totals.tax).to_string());
    println!("{:>60} {:>12}", "Shipping", Price::inr(totals.shipping).to_string());
    println!("{:>60} {:>12}", "Total", totals.total_price().to_string());
}

pub fn wishlist(items: &[WishlistItem]) {
    if items.is_empty() {
        println!("Your wishlist is empty.");
    }
    for item in items {
        let id = item.product_id().unwrap_or("-");
        let name = item
            .product
            .populated()
            .map_or(UNAVAILABLE, |p| p.name.as_str());
        println!("{id:<26} {name}");
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
    }
    for order in orders {
        let placed = order
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<26} {placed:<10} {:<11} {:>3} items {:>12}",
            order.reference(),
            order.status,
            order.unit_count(),
            order.total_price().to_string()
        );
    }
}

pub fn order(order: &Order) {
    println!("Order {} ({})", order.reference(), order.status);
    if let Some(placed) = order.created_at {
        println!("Placed:   {}", placed.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("Ship to:  {}", order.shipping_address.full_name);
    println!("          {}", order.shipping_address.one_line());
    if let Some(payment) = &order.payment {
        println!(
            "Payment:  {} {}",
            payment.status,
            payment.razorpay_payment_id.as_deref().unwrap_or_default()
        );
    }
    if let Some(shipment) = &order.shipment {
        println!(
            "Shipment: {} {} {}",
            shipment.status,
            shipment.carrier.as_deref().unwrap_or_default(),
            shipment.tracking_number.as_deref().unwrap_or_default()
        );
    }
    for line in &order.items {
        let name = line
            .name
            .clone()
            .or_else(|| line.product.populated().map(|p| p.name.clone()))
            .or_else(|| line.product.id().map(str::to_string))
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        println!(
            "  {:<40} {:>3} x {:>10}",
            name,
            line.quantity,
            Price::inr(line.price).to_string()
        );
    }
    totals_block(&OrderTotals {
        subtotal: order.subtotal,
        tax: order.tax,
        shipping: order.shipping,
        total: order.total,
    });
}
