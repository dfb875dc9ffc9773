//! Wire types for the balance service contract.

use chrono::{DateTime, Utc};
use common::Money;
use serde::{Deserialize, Serialize};

/// Status a pre-order must carry for a block to count as granted.
pub const STATUS_BLOCKED: &str = "blocked";

/// Status a completion response must carry for payment to count as captured.
pub const STATUS_COMPLETED: &str = "completed";

/// Response wrapper used by every balance service endpoint.
///
/// A response with `success == false` or a missing `data` payload is
/// never partially interpreted as success, even though the transport
/// succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// The remote service's view of a pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    pub order_id: String,
    pub amount: Money,
    pub status: String,
}

/// The remote service's balance snapshot after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub user_id: String,
    pub total_balance: Money,
    pub available_balance: Money,
    pub blocked_balance: Money,
    pub currency: String,
    pub last_updated: DateTime<Utc>,
}

/// Payload of a successful block or completion call: the pre-order plus
/// the balance snapshot it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreorderData {
    pub pre_order: RemoteOrder,
    pub updated_balance: BalanceSnapshot,
}

/// A product as listed by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub currency: String,
    #[serde(default)]
    pub category: String,
    pub stock: u32,
}

/// Request body for placing a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreorderRequest {
    pub order_id: String,
    pub amount: Money,
}

/// Request body for completing a blocked pre-order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub order_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_message_and_data() {
        let json = r#"{"success": false}"#;
        let envelope: ApiEnvelope<PreorderData> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert!(envelope.message.is_none());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn preorder_data_uses_camel_case_keys() {
        let data = PreorderData {
            pre_order: RemoteOrder {
                order_id: "7".to_string(),
                amount: Money::from_cents(2000),
                status: STATUS_BLOCKED.to_string(),
            },
            updated_balance: BalanceSnapshot {
                user_id: "user-001".to_string(),
                total_balance: Money::from_cents(100_000),
                available_balance: Money::from_cents(98_000),
                blocked_balance: Money::from_cents(2000),
                currency: "USD".to_string(),
                last_updated: Utc::now(),
            },
        };
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("preOrder").is_some());
        assert!(json.get("updatedBalance").is_some());
        assert_eq!(json["preOrder"]["orderId"], "7");
    }

    #[test]
    fn preorder_request_roundtrip() {
        let req = PreorderRequest {
            order_id: "12".to_string(),
            amount: Money::from_cents(500),
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: PreorderRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.order_id, "12");
        assert_eq!(back.amount, Money::from_cents(500));
    }
}
