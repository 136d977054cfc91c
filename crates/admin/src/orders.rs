//! Order fulfilment: listing, status changes and shipment tracking.

use chrono::{DateTime, Utc};
use hoe_core::{Order, OrderId, OrderStatus, ShipmentStatus, ValidationErrors};
use hoe_storefront::api::{ApiClient, ApiError, envelope};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::AdminError;
use crate::portal::Portal;

/// Filters for the order list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Tracking details for a shipped order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl ShipmentUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self == &Self::default() {
            errors.push("shipment", "at least one field must be set");
        }
        if self
            .tracking_number
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            errors.push("trackingNumber", "cannot be blank");
        }
        if matches!(self.status, Some(ShipmentStatus::Unknown)) {
            errors.push("status", "is not a shipment status");
        }
        errors.into_result()
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: OrderStatus,
}

/// Orders as seen by one portal.
#[derive(Clone)]
pub struct OrderDesk {
    api: ApiClient,
    portal: Portal,
}

impl OrderDesk {
    #[must_use]
    pub const fn new(api: ApiClient, portal: Portal) -> Self {
        Self { api, portal }
    }

    /// Orders matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(portal = %self.portal))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, AdminError> {
        let raw = self
            .api
            .get_raw(&self.portal.path("orders"), filter, self.portal.auth())
            .await?;
        Ok(envelope::decode_list(raw)?)
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` (wrapped) for unknown IDs.
    #[instrument(skip(self), fields(portal = %self.portal, order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Order, AdminError> {
        let value = self
            .api
            .get::<Value>(&self.portal.path(&format!("orders/{id}")), self.portal.auth())
            .await?;
        order_from(value)
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for [`OrderStatus::Unknown`], otherwise
    /// the backend's refusal.
    #[instrument(skip(self), fields(portal = %self.portal, order_id = %id, %status))]
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminError> {
        if status == OrderStatus::Unknown {
            let mut errors = ValidationErrors::default();
            errors.push("status", "is not an order status");
            return Err(errors.into());
        }
        let value = self
            .api
            .put::<Value, _>(
                &self.portal.path(&format!("orders/{id}/status")),
                &StatusBody { status },
                self.portal.auth(),
            )
            .await?;
        let order = order_from(value)?;
        info!("order status updated");
        Ok(order)
    }

    /// Record carrier and tracking details.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for an empty update, otherwise the
    /// backend's refusal.
    #[instrument(skip(self, shipment), fields(portal = %self.portal, order_id = %id))]
    pub async fn update_shipment(
        &self,
        id: &OrderId,
        shipment: &ShipmentUpdate,
    ) -> Result<Order, AdminError> {
        shipment.validate()?;
        let value = self
            .api
            .put::<Value, _>(
                &self.portal.path(&format!("orders/{id}/shipment")),
                shipment,
                self.portal.auth(),
            )
            .await?;
        let order = order_from(value)?;
        info!("shipment updated");
        Ok(order)
    }
}

fn order_from(value: Value) -> Result<Order, AdminError> {
    serde_json::from_value(envelope::unnest(value, "order"))
        .map_err(|e| AdminError::Api(ApiError::from(e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filter_query() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
            ..OrderFilter::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"status": "shipped"})
        );
    }

    #[test]
    fn test_shipment_update_rules() {
        assert!(ShipmentUpdate::default().validate().unwrap_err().has("shipment"));

        let blank = ShipmentUpdate {
            tracking_number: Some("  ".to_string()),
            ..ShipmentUpdate::default()
        };
        assert!(blank.validate().unwrap_err().has("trackingNumber"));

        let ok = ShipmentUpdate {
            carrier: Some("Delhivery".to_string()),
            tracking_number: Some("DL123".to_string()),
            status: Some(ShipmentStatus::InTransit),
            estimated_delivery: None,
        };
        ok.validate().unwrap();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"carrier": "Delhivery", "trackingNumber": "DL123", "status": "in_transit"})
        );
    }
}
