use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Address {
    pub city: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub postal_code: String,
    pub state: String,
    pub country: String,
}

impl Address {
    /// Single-line address for list views
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.trim().is_empty()) {
            parts.push(line2);
        }
        parts.push(self.city.as_str());
        parts.push(self.state.as_str());
        parts.push(self.postal_code.as_str());
        parts.push(self.country.as_str());
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Order {
    pub id: i64,
    /// Serialized product lines as stored by the checkout
    pub products: String,
    pub status: String,
    pub price: f64,
    #[serde(rename = "adress")]
    pub address: Address,
    pub email: String,
    pub date: String,
    pub token: String,
    pub metaid: String,
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        OrderStatus::parse(&self.status)
    }

    pub fn placed_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }
}

/// Order lifecycle states the dashboard knows how to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub total_products: i64,
    pub pending_orders: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{"id":12,"products":"[]","status":"Shipped","price":99.5,
        "adress":{"city":"Cluj","line1":"Str. Lunga 1","line2":null,"postal_code":"400000",
        "state":"CJ","country":"RO"},"email":"c@d.ro","date":"2024-03-01T10:00:00+02:00",
        "token":"tok","metaid":"m1"}"#;

    #[test]
    fn test_order_parses_address_wire_name() {
        let order: Order = serde_json::from_str(ORDER_JSON).expect("valid order JSON");
        assert_eq!(order.address.city, "Cluj");
        assert_eq!(order.address.one_line(), "Str. Lunga 1, Cluj, CJ, 400000, RO");
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert!(order.placed_at().is_some());
    }

    #[test]
    fn test_order_status_parse() {
        assert_eq!(OrderStatus::parse("canceled"), OrderStatus::Cancelled);
        assert!(OrderStatus::parse(" Pending ").is_open());
        let other = OrderStatus::parse("Returned");
        assert_eq!(other.as_str(), "Returned");
        assert!(!other.is_open());
    }

    #[test]
    fn test_stats_wire_names() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"totalRevenue":10.5,"totalOrders":3,"totalProducts":8,"pendingOrders":1}"#,
        )
        .expect("valid stats JSON");
        assert_eq!(stats.pending_orders, 1);
    }
}
