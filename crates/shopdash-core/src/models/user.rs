use serde::{Deserialize, Deserializer, Serialize};

/// The identity returned by the login and verify endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "telefon", default)]
    pub phone: String,
}

impl User {
    /// Name for display, falling back to the email when the name is blank
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// User ids arrive as strings from some deployments and as numbers from others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Transaction history attached to a verified session.
///
/// The entries are passed through untouched; the dashboard only counts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Transactions {
    #[serde(rename = "userTransactions", default)]
    #[cfg_attr(feature = "ts", ts(type = "Array<unknown>"))]
    pub user_transactions: Vec<serde_json::Value>,
}
