//! CSV dump of an expense history.

use csv::Writer;
use serde::Serialize;

use crate::{EngineError, Expense, ResultEngine};

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Fecha")]
    timestamp: String,
    #[serde(rename = "Bolívares")]
    local_amount: f64,
    #[serde(rename = "Dólares")]
    usd_amount: f64,
    #[serde(rename = "Tipo Cambio")]
    rate_used: f64,
    #[serde(rename = "Categoría")]
    category: &'a str,
    #[serde(rename = "Descripción")]
    description: &'a str,
}

/// One row per expense, in the given order, under a fixed header.
pub(crate) fn expenses_csv(expenses: &[Expense]) -> ResultEngine<Vec<u8>> {
    let mut writer = Writer::from_writer(vec![]);
    for expense in expenses {
        writer
            .serialize(ExportRow {
                id: &expense.id,
                timestamp: expense.timestamp.format(crate::TIMESTAMP_FORMAT).to_string(),
                local_amount: expense.local_amount,
                usd_amount: expense.usd_amount,
                rate_used: expense.rate_used,
                category: expense.category.as_str(),
                description: &expense.description,
            })
            .map_err(|err| EngineError::Export(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::Category;

    #[test]
    fn writes_header_and_one_row_per_expense() {
        let expense = Expense {
            id: "ab12cd34".to_string(),
            timestamp: NaiveDateTime::parse_from_str("2025-11-11 13:45:00", crate::TIMESTAMP_FORMAT)
                .unwrap(),
            local_amount: 22000.0,
            usd_amount: 602.74,
            rate_used: 36.5,
            category: Category::Comida,
            description: "almuerzo, postre".to_string(),
        };
        let data = expenses_csv(&[expense]).unwrap();
        let text = String::from_utf8(data).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Fecha,Bolívares,Dólares,Tipo Cambio,Categoría,Descripción")
        );
        assert_eq!(
            lines.next(),
            Some("ab12cd34,2025-11-11 13:45:00,22000.0,602.74,36.5,comida,\"almuerzo, postre\"")
        );
        assert_eq!(lines.next(), None);
    }
}
