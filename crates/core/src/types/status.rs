//! Status enums for marketplace documents.
//!
//! The backend owns every status transition; the client only displays these
//! values and sends them back in admin status updates. Unknown wire values
//! decode to `Unknown` so a newly added backend status never breaks a page.

use serde::{Deserialize, Serialize};

/// Declares a lowercase string-backed status enum with `Display`/`FromStr`.
macro_rules! wire_status {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant,)+
            /// A value this client does not know about.
            #[serde(other)]
            Unknown,
        }

        impl $name {
            /// Wire representation of the status.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown => "unknown",
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

wire_status! {
    /// Order lifecycle status.
    OrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
        Returned => "returned",
    }
}

wire_status! {
    /// Payment sub-document status.
    PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

wire_status! {
    /// Shipment sub-document status.
    ShipmentStatus {
        Pending => "pending",
        Packed => "packed",
        InTransit => "in_transit",
        OutForDelivery => "out_for_delivery",
        Delivered => "delivered",
    }
}

wire_status! {
    /// Role attached to a user account.
    UserRole {
        /// Shopper on the customer site.
        Customer => "customer",
        /// Seller managing products through the vendor portal.
        Vendor => "vendor",
        /// Marketplace operator with full catalog access.
        Admin => "admin",
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for ShipmentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Customer
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"shipped\"");
    }

    #[test]
    fn test_unknown_status_decodes_tolerantly() {
        let status: OrderStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("on_hold".parse::<OrderStatus>().is_err());
        assert_eq!(
            "Delivered".parse::<OrderStatus>().unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_shipment_status_snake_case() {
        let status: ShipmentStatus = serde_json::from_str("\"in_transit\"").unwrap();
        assert_eq!(status, ShipmentStatus::InTransit);
        assert_eq!(status.to_string(), "in_transit");
    }
}
