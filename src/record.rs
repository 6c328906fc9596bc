use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Customer,
    Salesman,
    Product,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Customer => "customer",
            RecordKind::Salesman => "salesman",
            RecordKind::Product => "product",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown record kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(RecordKind::Customer),
            "salesman" => Ok(RecordKind::Salesman),
            "product" => Ok(RecordKind::Product),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl Default for AccountStatus {
    fn default() -> Self {
        AccountStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub route: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salesman {
    pub customer_id: Option<String>,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_code: Option<String>,
    pub product_name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub uom: Option<String>,
}

/// One record of the order-management backend. Each role carries its own
/// field set; the code accessor is the shared identity surface.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    Customer(Customer),
    Salesman(Salesman),
    Product(Product),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Customer(_) => RecordKind::Customer,
            Record::Salesman(_) => RecordKind::Salesman,
            Record::Product(_) => RecordKind::Product,
        }
    }

    /// The stored code, when the record has one. Customers and salesmen keep
    /// it in `customer_id`, products in `product_code`. Records without a
    /// code never participate in allocation scans.
    pub fn code(&self) -> Option<&str> {
        match self {
            Record::Customer(c) => c.customer_id.as_deref(),
            Record::Salesman(s) => s.customer_id.as_deref(),
            Record::Product(p) => p.product_code.as_deref(),
        }
    }

    pub fn from_kind_value(
        kind: RecordKind,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            RecordKind::Customer => Record::Customer(serde_json::from_value(value)?),
            RecordKind::Salesman => Record::Salesman(serde_json::from_value(value)?),
            RecordKind::Product => Record::Product(serde_json::from_value(value)?),
        })
    }
}
