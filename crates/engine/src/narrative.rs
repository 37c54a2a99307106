//! Context block handed to the [`NarrativeComposer`](crate::NarrativeComposer).
//!
//! The composer only phrases the answer. Every figure comes from here, and
//! the instructions ask for them to be reproduced as given.

use std::fmt::Write as _;

use crate::{
    Balance, Exchange, Income, MonthKey, MonthSummary, Totals,
    money::{format_amount, USDT_DECIMALS},
};

const RECENT_RECORDS: usize = 5;

const PERSONA: &str = "Eres un asistente profesional para un bot de Telegram que ayuda a llevar \
control de gastos en Venezuela.";

const INSTRUCTIONS: &str = "INSTRUCCIONES IMPORTANTES:
- Responde de forma SERIA, PROFESIONAL y DIRECTA
- NO uses lenguaje informal, slang, o expresiones coloquiales
- NO uses emojis ni simbolos decorativos
- Se CONCISO y CLARO en tus respuestas
- Si la pregunta es sobre el dolar o tipo de cambio, usa la informacion actual proporcionada de forma precisa
- Si la pregunta es sobre los gastos del usuario, usa EXACTAMENTE los numeros de la informacion proporcionada, no los recalcules
- Los intercambios (compra de USDT) NO son gastos, son compra de divisa
- Si pregunta sobre saldo disponible, usa el ingreso menos gastos menos intercambios indicado arriba";

/// The user's figures for one month, as the ledger computes them.
#[derive(Clone, Debug, PartialEq)]
pub struct FinancialContext {
    pub month: MonthKey,
    pub income: Option<Income>,
    pub summary: Option<MonthSummary>,
    pub exchanges: Vec<Exchange>,
    pub balance: Option<Balance>,
    pub official_rate: Option<f64>,
}

impl FinancialContext {
    /// Spanish data block listing income, totals, balance and the last few records.
    #[must_use]
    pub fn render(&self) -> String {
        let usdt = USDT_DECIMALS as usize;
        let mut out = format!("INFORMACION FINANCIERA DEL USUARIO ({}):\n", self.month);

        if let Some(income) = &self.income {
            let _ = writeln!(
                out,
                "- Ingreso mensual: {} Bs ({} USDT)",
                format_amount(income.local_amount, 2),
                format_amount(income.usdt_amount, usdt)
            );
        }
        if let Some(summary) = &self.summary {
            let _ = writeln!(
                out,
                "- Total gastado: {} Bs ({} USD)",
                format_amount(summary.total_local, 2),
                format_amount(summary.total_usd, 2)
            );
            let _ = writeln!(out, "- Numero de gastos: {}", summary.count());
        }
        if !self.exchanges.is_empty() {
            let totals = Totals::of_exchanges(&self.exchanges);
            let _ = writeln!(
                out,
                "- Intercambios (Bs->USDT): {} Bs -> {} USDT",
                format_amount(totals.local, 2),
                format_amount(totals.usd, usdt)
            );
            let _ = writeln!(out, "- Numero de intercambios: {}", totals.count);
        }
        if let Some(balance) = &self.balance {
            let _ = writeln!(
                out,
                "- Saldo disponible: {} Bs ({} USD equivalente)",
                format_amount(balance.local, 2),
                format_amount(balance.usd, 2)
            );
        }
        if let Some(rate) = self.official_rate {
            let _ = writeln!(out, "- Tipo de cambio oficial actual: {} Bs/$", format_amount(rate, 2));
        }

        if let Some(summary) = &self.summary {
            out.push_str("\nUltimos gastos:\n");
            for (idx, expense) in last(&summary.expenses).iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {}: {} Bs ({} USD)",
                    idx + 1,
                    expense.timestamp.format(crate::TIMESTAMP_FORMAT),
                    format_amount(expense.local_amount, 2),
                    format_amount(expense.usd_amount, 2)
                );
            }
        }
        if !self.exchanges.is_empty() {
            out.push_str("\nUltimos intercambios:\n");
            for (idx, exchange) in last(&self.exchanges).iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {}: {} Bs -> {} USDT (tasa: {})",
                    idx + 1,
                    exchange.timestamp.format(crate::TIMESTAMP_FORMAT),
                    format_amount(exchange.local_amount, 2),
                    format_amount(exchange.usdt_amount, usdt),
                    format_amount(exchange.rate_used, 2)
                );
            }
        }
        out
    }
}

fn last<T>(records: &[T]) -> &[T] {
    &records[records.len().saturating_sub(RECENT_RECORDS)..]
}

/// Full context block: persona, optional rate and finance sections, instructions.
pub(crate) fn context_block(rate: Option<f64>, finances: Option<&FinancialContext>) -> String {
    let mut out = String::from(PERSONA);
    out.push_str("\n\n");
    if let Some(rate) = rate {
        let _ = writeln!(
            out,
            "INFORMACION ACTUAL DEL DOLAR:\n- Tipo de cambio oficial: {} bolivares = 1 dolar USD\n",
            format_amount(rate, 2)
        );
    }
    if let Some(finances) = finances {
        out.push_str(&finances.render());
        out.push('\n');
    }
    out.push_str(INSTRUCTIONS);
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::{Category, Expense};

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, crate::TIMESTAMP_FORMAT).unwrap()
    }

    fn context() -> FinancialContext {
        let month = MonthKey::parse("2025-11").unwrap();
        let expenses = (1..=7)
            .map(|day| Expense {
                id: format!("e{day}"),
                timestamp: at(&format!("2025-11-0{day} 09:00:00")),
                local_amount: 1000.0 * f64::from(day),
                usd_amount: 25.0 * f64::from(day),
                rate_used: 40.0,
                category: Category::Comida,
                description: String::new(),
            })
            .collect();
        FinancialContext {
            month: month.clone(),
            income: Some(Income {
                local_amount: 120000.0,
                usdt_amount: 3000.0,
                rate_used: 40.0,
                timestamp: at("2025-11-01 08:00:00"),
            }),
            summary: MonthSummary::from_expenses(month, expenses),
            exchanges: Vec::new(),
            balance: None,
            official_rate: Some(36.5),
        }
    }

    #[test]
    fn render_lists_only_the_last_five_expenses() {
        let rendered = context().render();
        assert!(rendered.contains("- Ingreso mensual: 120,000.00 Bs (3,000.0000 USDT)"));
        assert!(rendered.contains("- Total gastado: 28,000.00 Bs (700.00 USD)"));
        assert!(rendered.contains("- Numero de gastos: 7"));
        assert!(!rendered.contains("2025-11-02 09:00:00"));
        assert!(rendered.contains("5. 2025-11-07 09:00:00: 7,000.00 Bs (175.00 USD)"));
        assert!(!rendered.contains("Intercambios"));
    }

    #[test]
    fn context_block_always_carries_instructions() {
        let block = context_block(Some(36.5), None);
        assert!(block.contains("36.50 bolivares = 1 dolar USD"));
        assert!(block.contains("NO son gastos"));
        assert!(!block.contains("INFORMACION FINANCIERA"));
    }
}
