//! Typed endpoint functions. Pure request/response mappings; credentials
//! and session handling happen in `ApiClient::execute`.

use reqwest::Method;
use serde::Serialize;

use crate::models::{
    Category, CategoryDraft, DashboardStats, Filter, FilterDraft, Order, Product, ProductDraft,
    WeightPrice,
};

use super::{ApiClient, ApiError, PendingRequest};

/// Create/update payloads are wrapped as `{"data": ...}` by the server
#[derive(Serialize)]
struct DataEnvelope<'a, T> {
    data: &'a T,
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
}

fn with_data<T: Serialize>(method: Method, path: String, data: &T) -> Result<PendingRequest, ApiError> {
    PendingRequest::new(method, path).json(&DataEnvelope { data })
}

impl ApiClient {
    // ===== Products =====

    pub async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        self.fetch(PendingRequest::get("/products")).await
    }

    pub async fn fetch_product(&self, id: i64) -> Result<Product, ApiError> {
        self.fetch(PendingRequest::get(format!("/products/{}", id))).await
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        self.fetch(with_data(Method::POST, "/products".to_string(), draft)?)
            .await
    }

    /// Update a product. `changes` may be a full `ProductDraft` or any
    /// serializable subset of its wire fields; the server merges it.
    pub async fn update_product<P: Serialize>(&self, id: i64, changes: &P) -> Result<Product, ApiError> {
        self.fetch(with_data(Method::PUT, format!("/products/{}", id), changes)?)
            .await
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.send(PendingRequest::delete(format!("/products/{}", id)))
            .await
    }

    /// Search suggestions by free-text query
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        self.fetch(PendingRequest::get("/search/suggestions").query("q", query))
            .await
    }

    // ===== Orders =====

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.fetch(PendingRequest::get("/orders")).await
    }

    pub async fn fetch_order(&self, id: i64) -> Result<Order, ApiError> {
        self.fetch(PendingRequest::get(format!("/orders/{}", id))).await
    }

    pub async fn update_order_status(&self, id: i64, status: &str) -> Result<Order, ApiError> {
        let request = PendingRequest::new(Method::PATCH, format!("/orders/{}", id))
            .json(&StatusUpdate { status })?;
        self.fetch(request).await
    }

    pub async fn delete_order(&self, id: i64) -> Result<(), ApiError> {
        self.send(PendingRequest::delete(format!("/orders/{}", id)))
            .await
    }

    // ===== Categories =====

    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.fetch(PendingRequest::get("/categories2")).await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        self.fetch(with_data(Method::POST, "/categories".to_string(), draft)?)
            .await
    }

    pub async fn update_category<P: Serialize>(&self, id: i64, changes: &P) -> Result<Category, ApiError> {
        self.fetch(with_data(Method::PUT, format!("/categories/{}", id), changes)?)
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.send(PendingRequest::delete(format!("/categories/{}", id)))
            .await
    }

    // ===== Filters =====

    pub async fn fetch_filters(&self) -> Result<Vec<Filter>, ApiError> {
        self.fetch(PendingRequest::get("/filters2")).await
    }

    pub async fn create_filter(&self, draft: &FilterDraft) -> Result<Filter, ApiError> {
        self.fetch(with_data(Method::POST, "/filters".to_string(), draft)?)
            .await
    }

    pub async fn update_filter<P: Serialize>(&self, id: i64, changes: &P) -> Result<Filter, ApiError> {
        self.fetch(with_data(Method::PUT, format!("/filters/{}", id), changes)?)
            .await
    }

    pub async fn delete_filter(&self, id: i64) -> Result<(), ApiError> {
        self.send(PendingRequest::delete(format!("/filters/{}", id)))
            .await
    }

    // ===== Shipping tiers =====

    pub async fn fetch_weight_prices(&self) -> Result<Vec<WeightPrice>, ApiError> {
        self.fetch(PendingRequest::get("/getWeightPrices")).await
    }

    pub async fn update_weight_price<P: Serialize>(
        &self,
        id: i64,
        changes: &P,
    ) -> Result<WeightPrice, ApiError> {
        self.fetch(with_data(Method::PUT, format!("/weight-prices/{}", id), changes)?)
            .await
    }

    // ===== Analytics =====

    pub async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
        self.fetch(PendingRequest::get("/analytics/stats")).await
    }

    /// Revenue series; the shape is chart-specific so it is left untyped
    pub async fn fetch_revenue_data(&self) -> Result<serde_json::Value, ApiError> {
        self.fetch(PendingRequest::get("/analytics/revenue")).await
    }

    pub async fn fetch_orders_data(&self) -> Result<serde_json::Value, ApiError> {
        self.fetch(PendingRequest::get("/analytics/orders")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_data_wraps_payload() {
        let draft = CategoryDraft {
            parent_id: 0,
            name: "Lighting".to_string(),
        };
        let request = with_data(Method::POST, "/categories".to_string(), &draft).unwrap();
        let body = request.body.expect("body set");
        assert_eq!(body["data"]["name"], "Lighting");
        assert_eq!(body["data"]["parentId"], 0);
    }

    #[test]
    fn test_with_data_keeps_partial_payload_as_is() {
        let changes = serde_json::json!({ "price": 99.5 });
        let request = with_data(Method::PUT, "/products/3".to_string(), &changes).unwrap();
        assert_eq!(request.body.unwrap(), serde_json::json!({ "data": { "price": 99.5 } }));
    }
}
