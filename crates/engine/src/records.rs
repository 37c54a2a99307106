//! Persisted record kinds.
//!
//! Field names on disk follow the files written by earlier versions of the
//! bot (`fecha`, `bolivares`, `dolares`, ...), so existing data keeps loading.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Category;

/// Timestamp format used on disk and in exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single expense, priced in USD at the official rate of the moment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(rename = "fecha", with = "timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "bolivares")]
    pub local_amount: f64,
    #[serde(rename = "dolares")]
    pub usd_amount: f64,
    #[serde(rename = "tipo_cambio")]
    pub rate_used: f64,
    #[serde(rename = "categoria", default)]
    pub category: Category,
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

/// Monthly income, converted to USDT at the parallel rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Income {
    #[serde(rename = "bolivares")]
    pub local_amount: f64,
    #[serde(rename = "usdt")]
    pub usdt_amount: f64,
    #[serde(rename = "tasa_paralela")]
    pub rate_used: f64,
    #[serde(rename = "fecha_registro", with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

/// Local currency turned into USDT. Never an expense.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: String,
    #[serde(rename = "fecha", with = "timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "bolivares")]
    pub local_amount: f64,
    #[serde(rename = "usdt")]
    pub usdt_amount: f64,
    #[serde(rename = "tasa_paralela")]
    pub rate_used: f64,
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

/// Input of [`Ledger::register_expense`](crate::Ledger::register_expense).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewExpense {
    pub amount_local: f64,
    pub rate: Option<f64>,
    pub category: Category,
    pub description: String,
}

/// Input of [`Ledger::register_exchange`](crate::Ledger::register_exchange).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewExchange {
    pub amount_local: f64,
    pub rate: Option<f64>,
    pub description: String,
}

/// Partial update of an expense. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseEdit {
    pub amount_local: Option<f64>,
    pub category: Option<Category>,
    pub description: Option<String>,
}

pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_reads_legacy_layout() {
        let raw = r#"{
            "id": "ab12cd34",
            "fecha": "2025-11-11 13:45:00",
            "bolivares": 22000,
            "dolares": 602.74,
            "tipo_cambio": 36.5,
            "categoria": "comida",
            "descripcion": "almuerzo",
            "month_key": "2025-11"
        }"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.local_amount, 22000.0);
        assert_eq!(expense.category, Category::Comida);
        assert_eq!(expense.timestamp.to_string(), "2025-11-11 13:45:00");
    }

    #[test]
    fn missing_optional_fields_default() {
        let raw = r#"{"id":"x","fecha":"2025-01-02 00:00:00","bolivares":1,"dolares":0.1,"tipo_cambio":10}"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.category, Category::Otros);
        assert!(expense.description.is_empty());
    }
}
