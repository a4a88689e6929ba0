use serde::{Deserialize, Serialize};

/// A product category; top-level categories have `parent_id == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub parent_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub parent_id: i64,
    pub name: String,
}

impl Category {
    pub fn is_top_level(&self) -> bool {
        self.parent_id == 0
    }
}

/// A search filter bound to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FilterDraft {
    pub category_id: i64,
    pub name: String,
}

/// A shipping tier: orders weighing between the two bounds ship at `price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct WeightPrice {
    pub id: i64,
    pub first_number: f64,
    pub second_number: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct WeightPriceDraft {
    pub first_number: f64,
    pub second_number: f64,
    pub price: f64,
}

impl WeightPrice {
    /// Whether a parcel of `weight` falls inside this tier (bounds inclusive)
    pub fn covers(&self, weight: f64) -> bool {
        self.first_number <= weight && weight <= self.second_number
    }

    pub fn range_display(&self) -> String {
        format!("{} - {} kg", self.first_number, self.second_number)
    }
}
