//! Check out the current cart.
//!
//! # Usage
//!
//! ```bash
//! # Fill the address from a location, pay interactively
//! hoe checkout --near 12.9716,77.5946 --name "Asha Rao" --phone 9876543210 --line1 "12 MG Road"
//!
//! # Attach a payment completed in the browser
//! hoe checkout --name ... --payment-id pay_123 --signature 5f0c...
//! ```
//!
//! Without `--payment-id`, the Razorpay order is printed and the payment ID
//! and signature are read from the terminal once the payment is made.
//! Leaving the payment ID empty cancels.

use clap::Args;
use hoe_core::{AddressInput, Coordinates, Price};
use hoe_storefront::geocode::parse_coordinates;
use hoe_storefront::payment::{
    PaymentPrefill, PaymentReceipt, PaymentSession, PaymentWidget, ProvidedReceipt, WidgetOutcome,
};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::{CommandError, Context};
use crate::output;

const DEFAULT_COUNTRY: &str = "India";

#[derive(Args)]
pub struct CheckoutArgs {
    /// Prefill the address from a location (`lat,lng`)
    #[arg(long, value_parser = parse_near)]
    near: Option<Coordinates>,

    /// Recipient's full name
    #[arg(long)]
    name: Option<String>,

    /// Mobile number
    #[arg(long)]
    phone: Option<String>,

    /// Street address
    #[arg(long)]
    line1: Option<String>,

    /// Apartment, landmark
    #[arg(long)]
    line2: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    state: Option<String>,

    /// PIN code
    #[arg(long)]
    postal_code: Option<String>,

    /// Country (default: India)
    #[arg(long)]
    country: Option<String>,

    /// Email shown in the payment window
    #[arg(long)]
    email: Option<String>,

    /// Razorpay payment ID of a completed payment
    #[arg(long, requires = "signature")]
    payment_id: Option<String>,

    /// Razorpay signature of a completed payment
    #[arg(long, requires = "payment_id")]
    signature: Option<String>,
}

impl CheckoutArgs {
    /// Overlay the flags on `form`; flags win over prefilled values.
    fn apply(&self, mut form: AddressInput) -> AddressInput {
        let set = |field: &mut String, flag: Option<&str>| {
            if let Some(value) = flag {
                value.clone_into(field);
            }
        };
        set(&mut form.full_name, self.name.as_deref());
        set(&mut form.phone, self.phone.as_deref());
        set(&mut form.address_line1, self.line1.as_deref());
        set(&mut form.city, self.city.as_deref());
        set(&mut form.state, self.state.as_deref());
        set(&mut form.postal_code, self.postal_code.as_deref());
        set(&mut form.country, self.country.as_deref());
        if self.line2.is_some() {
            form.address_line2.clone_from(&self.line2);
        }
        if form.country.trim().is_empty() {
            form.country = DEFAULT_COUNTRY.to_string();
        }
        form
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &Context, args: CheckoutArgs) -> Result<(), CommandError> {
    let mut cart = ctx.storefront.cart();
    cart.refresh().await?;
    let mut checkout = ctx.storefront.checkout(&cart)?;

    let mut form = AddressInput::default();
    if let Some(near) = args.near {
        form = checkout.prefill_from_location(near, form).await?;
    }
    let address = checkout.set_shipping_address(args.apply(form)).await?;
    output::notice(&format!("Shipping to {}", address.one_line()));
    if let Some(email) = &args.email {
        checkout.set_contact_email(email.clone());
    }
    checkout.continue_to_payment()?;

    output::cart(checkout.lines(), checkout.totals());
    match (args.payment_id, args.signature) {
        (Some(payment_id), Some(signature)) => {
            checkout
                .pay(&ProvidedReceipt {
                    payment_id,
                    signature,
                })
                .await?;
        }
        (None, None) => {
            checkout.pay(&TerminalWidget).await?;
        }
        _ => {
            return Err(CommandError::Usage(
                "--payment-id and --signature must be given together".to_string(),
            ));
        }
    }

    let order = checkout.place_order(&mut cart).await?;
    info!(order_id = %order.id, "order placed");
    output::message(&format!("Order placed: {}", order.reference()));
    output::order(order);
    Ok(())
}

fn parse_near(value: &str) -> Result<Coordinates, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng but got {value}"))?;
    parse_coordinates(lat, lng).map_err(|e| e.to_string())
}

/// Prints the Razorpay order and reads the result back from the terminal.
struct TerminalWidget;

impl PaymentWidget for TerminalWidget {
    async fn collect(&self, session: &PaymentSession, prefill: &PaymentPrefill) -> WidgetOutcome {
        let amount = Price::inr(Decimal::new(session.amount, 2));
        output::notice(&format!(
            "Pay {amount} for Razorpay order {} (key {}).",
            session.razorpay_order_id,
            session.key_id.as_deref().unwrap_or("not configured")
        ));
        if let Some(name) = &prefill.name {
            output::notice(&format!("Payer: {name}"));
        }

        let order_id = session.razorpay_order_id.clone();
        let answer = tokio::task::spawn_blocking(move || {
            let payment_id = output::ask("Payment ID (empty to cancel)")?;
            if payment_id.is_empty() {
                return Ok(None);
            }
            let signature = output::ask("Signature")?;
            Ok::<_, std::io::Error>(Some(PaymentReceipt {
                order_id,
                payment_id,
                signature,
            }))
        })
        .await;

        match answer {
            Ok(Ok(Some(receipt))) => WidgetOutcome::Paid(receipt),
            Ok(Ok(None)) => WidgetOutcome::Dismissed,
            Ok(Err(err)) => WidgetOutcome::Failed(err.to_string()),
            Err(err) => WidgetOutcome::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: CheckoutArgs,
    }

    fn args(flags: &[&str]) -> CheckoutArgs {
        Harness::try_parse_from(std::iter::once("checkout").chain(flags.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_flags_override_prefill() {
        let prefilled = AddressInput {
            address_line1: "MG Road".to_string(),
            city: "Bengaluru".to_string(),
            country: "India".to_string(),
            ..AddressInput::default()
        };
        let form = args(&["--name", "Asha", "--city", "Mysuru"]).apply(prefilled);
        assert_eq!(form.full_name, "Asha");
        assert_eq!(form.city, "Mysuru");
        assert_eq!(form.address_line1, "MG Road");
    }

    #[test]
    fn test_country_defaults_to_india() {
        let form = args(&[]).apply(AddressInput::default());
        assert_eq!(form.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn test_receipt_flags_come_in_pairs() {
        assert!(Harness::try_parse_from(["checkout", "--payment-id", "pay_1"]).is_err());
        let parsed = args(&["--payment-id", "pay_1", "--signature", "sig"]);
        assert_eq!(parsed.payment_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn test_near_parsing() {
        let c = parse_near("12.97,77.59").unwrap();
        assert!((c.lng - 77.59).abs() < f64::EPSILON);
        assert!(parse_near("12.97").is_err());
        assert!(parse_near("120,77").is_err());
    }
}
