use std::fmt::Write as _;

use chrono::NaiveDate;
use engine::{
    Balance, BudgetLevel, BudgetStatus, Category, Exchange, Expense, Income, MonthComparison,
    MonthKey, MonthOverview, MonthSummary, Reply, Statistics, TIMESTAMP_FORMAT, Totals,
    money::{format_amount, format_signed},
};

const SEARCH_ROWS: usize = 10;

fn bs(value: f64) -> String {
    format!("{} Bs", format_amount(value, 2))
}

fn usd(value: f64) -> String {
    format!("${} USD", format_amount(value, 2))
}

fn usdt(value: f64) -> String {
    format!("{} USDT", format_amount(value, 4))
}

/// `22,000.00 Bs ($602.74 USD)`
fn pair(local: f64, usd_value: f64) -> String {
    format!("{} ({})", bs(local), usd(usd_value))
}

fn timestamp(expense: &Expense) -> String {
    expense.timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn balance_block(balance: &Balance) -> String {
    format!(
        "Saldo disponible:\n{} (${} USD equivalente)",
        bs(balance.local),
        format_amount(balance.usd, 2)
    )
}

pub(crate) fn start_text(first_name: &str, ai_enabled: bool) -> String {
    let ai_status = if ai_enabled { "Activada" } else { "No disponible" };
    format!(
        "Hola {first_name}\n\n\
         Bot de Control de Gastos con IA\n\n\
         Comandos principales:\n\
         /gasto <cantidad> [categoria] [descripcion] - Registra un gasto\n\
         /resumen - Resumen del mes\n\
         /listar [n] - Lista ultimos gastos\n\
         /estadisticas - Estadisticas avanzadas\n\
         /presupuesto [monto] - Ver o establecer presupuesto\n\
         /comparar - Comparar con mes anterior\n\
         /buscar <fecha|rango> - Buscar gastos\n\
         /gastos_hoy - Gastos del dia actual\n\
         /exportar - Exportar a CSV\n\
         /eliminar <id> - Eliminar gasto\n\
         /editar <id> <monto> - Editar gasto\n\n\
         Sistema de Ingresos:\n\
         /ingreso <cantidad_bs> [tasa] - Registrar ingreso mensual\n\n\
         Intercambios (Binance/USDT):\n\
         /binance_rate - Tasa paralela (Binance)\n\
         /cambiar <bs> [tasa] - Intercambiar Bs a USDT\n\n\
         /dolar - Tipo de cambio oficial\n\
         /ai <pregunta> - Pregunta a la IA\n\n\
         IA: {ai_status}\n\n\
         Categorias disponibles: {}",
        Category::names()
    )
}

pub(crate) fn help_text() -> &'static str {
    "Para registrar un gasto, escribe:\n\
     /gasto <cantidad>\n\n\
     O escribe: 'gasté 22000'\n\n\
     Tambien puedes hacer preguntas sobre el dolar, tipo de cambio, o cualquier otra cosa.\n\n\
     Otros comandos:\n\
     /resumen - Ver resumen del mes\n\
     /dolar - Ver tipo de cambio\n\
     /ai <pregunta> - Pregunta a la IA\n\
     Usa /start para ver todos los comandos disponibles."
}

pub(crate) fn expense_registered(expense: &Expense) -> String {
    let mut text = format!(
        "Gasto registrado (ID: {})\n\n{}\n${} USD\nTipo de cambio: {} Bs/$\nCategoria: {}\n",
        expense.id,
        bs(expense.local_amount),
        format_amount(expense.usd_amount, 2),
        format_amount(expense.rate_used, 2),
        expense.category
    );
    if !expense.description.is_empty() {
        let _ = write!(text, "Descripcion: {}", expense.description);
    }
    text
}

pub(crate) fn expense_list(expenses: &[Expense]) -> String {
    let mut text = format!("Ultimos {} gastos:\n\n", expenses.len());
    for expense in expenses {
        let _ = write!(
            text,
            "ID: {}\nFecha: {}\nMonto: {}\nCategoria: {}\n",
            expense.id,
            timestamp(expense),
            pair(expense.local_amount, expense.usd_amount),
            expense.category
        );
        if !expense.description.is_empty() {
            let _ = writeln!(text, "Descripcion: {}", expense.description);
        }
        text.push('\n');
    }
    text
}

pub(crate) fn expense_deleted(expense: &Expense) -> String {
    format!(
        "Gasto eliminado:\n{}\nFecha: {}",
        pair(expense.local_amount, expense.usd_amount),
        timestamp(expense)
    )
}

pub(crate) fn expense_edited(expense: &Expense) -> String {
    format!(
        "Gasto editado:\nNuevo monto: {}\nCategoria: {}\nID: {}",
        pair(expense.local_amount, expense.usd_amount),
        expense.category,
        expense.id
    )
}

pub(crate) fn month_overview(overview: &MonthOverview) -> String {
    let mut text = format!("Resumen del mes ({})\n\n", overview.month);

    match &overview.income {
        Some(income) => {
            let _ = write!(
                text,
                "Ingreso mensual:\n{} (${})\nTasa: {} Bs/USDT\n\n",
                bs(income.local_amount),
                usdt(income.usdt_amount),
                format_amount(income.rate_used, 2)
            );
        }
        None => text.push_str("Ingreso mensual: No registrado\n\n"),
    }

    match &overview.summary {
        Some(summary) => {
            let _ = write!(
                text,
                "Gastos:\n{}\nNumero de gastos: {}\n\n",
                pair(summary.total_local, summary.total_usd),
                summary.count()
            );
        }
        None => text.push_str("Gastos: 0\n\n"),
    }

    if overview.exchanges.count > 0 {
        let _ = write!(
            text,
            "Intercambios (Bs -> USDT):\n{} -> {}\nNumero de intercambios: {}\n\n",
            bs(overview.exchanges.local),
            usdt(overview.exchanges.usd),
            overview.exchanges.count
        );
    }

    if let Some(balance) = &overview.balance {
        let _ = write!(text, "{}\n\n", balance_block(balance));
    }

    if let Some(summary) = &overview.summary {
        text.push_str("Por categoria:\n");
        for entry in summary.by_category() {
            let _ = writeln!(
                text,
                "{}: {}",
                entry.category,
                pair(entry.totals.local, entry.totals.usd)
            );
        }
    }

    if let Some(budget) = &overview.budget {
        let _ = write!(
            text,
            "\nPresupuesto: {} (Usado: {:.1}%)",
            usd(budget.budget_usd),
            budget.percent
        );
    }
    text.trim_end().to_string()
}

pub(crate) fn statistics(stats: &Statistics) -> String {
    let mut text = format!(
        "Estadisticas del mes ({})\n\n\
         Total: {}\n\
         Numero de gastos: {}\n\
         Promedio diario: {} ({} dias)\n\n\
         Gasto maximo: {}\nFecha: {}\nCategoria: {}\n\n\
         Gasto minimo: {}\nFecha: {}\nCategoria: {}\n",
        stats.month,
        pair(stats.total.local, stats.total.usd),
        stats.total.count,
        pair(stats.daily_average_local, stats.daily_average_usd),
        stats.days_counted,
        pair(stats.max_expense.local_amount, stats.max_usd),
        timestamp(&stats.max_expense),
        stats.max_expense.category,
        pair(stats.min_expense.local_amount, stats.min_usd),
        timestamp(&stats.min_expense),
        stats.min_expense.category,
    );

    let day = &stats.busiest_day;
    let _ = write!(
        text,
        "\nDia con mas gastos: {}\nTotal: {}\nGastos: {}",
        day.date,
        pair(day.totals.local, day.totals.usd),
        day.totals.count
    );
    text
}

pub(crate) fn budget_status(status: &BudgetStatus) -> String {
    let mut text = format!(
        "Presupuesto del mes ({})\n\nPresupuesto: {}\nGastado: {} ({:.1}%)\nRestante: {}",
        status.month,
        usd(status.budget_usd),
        usd(status.spent_usd),
        status.percent,
        usd(status.remaining_usd)
    );
    match status.level() {
        BudgetLevel::Exceeded => text.push_str("\n\nPRESUPUESTO EXCEDIDO"),
        BudgetLevel::NearLimit => text.push_str("\n\nCerca del limite"),
        BudgetLevel::UnderBudget => {}
    }
    text
}

pub(crate) fn no_budget() -> &'static str {
    "No hay presupuesto establecido para este mes.\nUsa: /presupuesto <monto_en_usd>"
}

pub(crate) fn budget_set(amount: f64, month: &MonthKey) -> String {
    format!("Presupuesto establecido: {} para el mes {month}", usd(amount))
}

fn comparison_side(label: &str, month: &MonthKey, summary: Option<&MonthSummary>) -> String {
    match summary {
        Some(summary) => format!(
            "{label} ({month}):\nTotal: {}\nGastos: {}\n\n",
            pair(summary.total_local, summary.total_usd),
            summary.count()
        ),
        None => format!("{label} ({month}): Sin datos\n\n"),
    }
}

pub(crate) fn comparison(comparison: &MonthComparison) -> String {
    let mut text = String::from("Comparacion de meses\n\n");
    text.push_str(&comparison_side(
        "Mes anterior",
        &comparison.previous_month,
        comparison.previous.as_ref(),
    ));
    text.push_str(&comparison_side(
        "Mes actual",
        &comparison.current_month,
        comparison.current.as_ref(),
    ));
    if let Some(delta) = comparison.delta() {
        let _ = write!(
            text,
            "Diferencia:\n{} Bs (${} USD)\n{:+.1}%",
            format_signed(delta.local, 2),
            format_signed(delta.usd, 2),
            delta.percent
        );
    }
    text.trim_end().to_string()
}

pub(crate) fn search_results(expenses: &[Expense]) -> String {
    let totals = Totals::of_expenses(expenses);
    let mut text = format!(
        "Gastos encontrados: {}\nTotal: {}\n\n",
        totals.count,
        pair(totals.local, totals.usd)
    );
    for expense in expenses.iter().take(SEARCH_ROWS) {
        let _ = write!(
            text,
            "ID: {}\nFecha: {}\nMonto: {}\nCategoria: {}\n\n",
            expense.id,
            timestamp(expense),
            pair(expense.local_amount, expense.usd_amount),
            expense.category
        );
    }
    if expenses.len() > SEARCH_ROWS {
        let _ = write!(text, "... y {} mas", expenses.len() - SEARCH_ROWS);
    }
    text.trim_end().to_string()
}

pub(crate) fn today_expenses(date: NaiveDate, expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return "No hay gastos registrados hoy.".to_string();
    }
    let totals = Totals::of_expenses(expenses);
    let mut text = format!(
        "Gastos de hoy ({date})\n\nTotal: {}\nNumero de gastos: {}\n\n",
        pair(totals.local, totals.usd),
        totals.count
    );
    for expense in expenses {
        let _ = writeln!(
            text,
            "{} - {}",
            expense.timestamp.format("%H:%M:%S"),
            pair(expense.local_amount, expense.usd_amount)
        );
        if expense.category != Category::Otros {
            let _ = writeln!(text, "Categoria: {}", expense.category);
        }
        if !expense.description.is_empty() {
            let _ = writeln!(text, "Descripcion: {}", expense.description);
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

pub(crate) fn official_rate(rate: f64) -> String {
    format!("Tipo de cambio del dolar oficial:\n\n{} Bs = 1 USD", format_amount(rate, 2))
}

pub(crate) fn parallel_rate(parallel: f64, official: Option<f64>) -> String {
    let official = official.unwrap_or(0.0);
    let (difference, percent) = if official > 0.0 {
        let difference = parallel - official;
        (difference, difference * 100.0 / official)
    } else {
        (0.0, 0.0)
    };
    format!(
        "Tipo de cambio paralelo (Binance/USDT):\n\n{} Bs = 1 USDT\n\n\
         Comparacion:\nOficial: {} Bs/$\nDiferencia: {} Bs ({percent:+.1}%)",
        format_amount(parallel, 2),
        format_amount(official, 2),
        format_signed(difference, 2)
    )
}

pub(crate) fn exchange_recorded(
    exchange: &Exchange,
    purchased_usdt: Option<f64>,
    balance: Option<&Balance>,
) -> String {
    let mut text = format!("Intercambio registrado (ID: {})\n\n", exchange.id);
    match purchased_usdt {
        Some(purchased) => {
            let _ = write!(
                text,
                "USDT comprado: {}\nBolivares: {}\n",
                usdt(purchased),
                bs(exchange.local_amount)
            );
        }
        None => {
            let _ = write!(
                text,
                "Bolivares: {}\nUSDT recibido: {}\n",
                bs(exchange.local_amount),
                usdt(exchange.usdt_amount)
            );
        }
    }
    let _ = writeln!(text, "Tasa usada: {} Bs/USDT", format_amount(exchange.rate_used, 2));
    if let Some(balance) = balance {
        let _ = write!(text, "\n{}", balance_block(balance));
    }
    text.trim_end().to_string()
}

pub(crate) fn expenses_recorded(
    expenses: &[Expense],
    skipped: usize,
    rate: f64,
    balance: Option<&Balance>,
) -> String {
    let lines: Vec<String> = expenses
        .iter()
        .map(|expense| {
            let mut line = pair(expense.local_amount, expense.usd_amount);
            if expense.category != Category::Otros {
                let _ = write!(line, " - {}", expense.category);
            }
            if !expense.description.is_empty() {
                let _ = write!(line, " - {}", expense.description);
            }
            line
        })
        .collect();

    let mut text = match lines.as_slice() {
        [single] => format!("Gasto registrado:\n\n{single}\n"),
        _ => {
            let mut text = format!("{} gastos registrados:\n\n", lines.len());
            for (idx, line) in lines.iter().enumerate() {
                let _ = writeln!(text, "{}. {line}", idx + 1);
            }
            let totals = Totals::of_expenses(expenses);
            let _ = write!(text, "\nTotal: {}\n", pair(totals.local, totals.usd));
            text
        }
    };
    let _ = writeln!(text, "Tipo de cambio: {} Bs/$", format_amount(rate, 2));
    match skipped {
        0 => {}
        1 => text.push_str("\nNo se pudo guardar 1 gasto del mensaje, intentalo de nuevo.\n"),
        n => {
            let _ = writeln!(text, "\nNo se pudieron guardar {n} gastos del mensaje, intentalo de nuevo.");
        }
    }
    if let Some(balance) = balance {
        let _ = write!(text, "\n{}", balance_block(balance));
    }
    text.trim_end().to_string()
}

pub(crate) fn income_recorded(income: &Income) -> String {
    format!(
        "Ingreso mensual registrado\n\nIngreso: {}\nEquivalente: {}\nTasa usada: {} Bs/USDT\n\n\
         El bot ahora llevara cuenta de tus gastos e intercambios contra este ingreso.",
        bs(income.local_amount),
        usdt(income.usdt_amount),
        format_amount(income.rate_used, 2)
    )
}

pub(crate) fn income_status(month: &MonthKey, income: &Income, balance: Option<&Balance>) -> String {
    let mut text = format!(
        "Ingreso mensual ({month})\n\nIngreso: {}\nEquivalente: {}\nTasa usada: {} Bs/USDT\n",
        bs(income.local_amount),
        usdt(income.usdt_amount),
        format_amount(income.rate_used, 2)
    );
    if let Some(balance) = balance {
        let _ = write!(text, "\n{}", balance_block(balance));
    }
    text.trim_end().to_string()
}

pub(crate) fn no_income() -> &'static str {
    "No hay ingreso registrado para este mes.\n\n\
     Uso: /ingreso <cantidad_bs> [tasa]\n\
     Ejemplo: /ingreso 120000\n\
     Ejemplo: /ingreso 120000 330\n\n\
     Si no especificas la tasa, se usara la tasa paralela actual."
}

/// Text for a free-text outcome.
pub(crate) fn reply(reply: &Reply) -> String {
    match reply {
        Reply::ExchangeRecorded {
            exchange,
            purchased_usdt,
            balance,
        } => exchange_recorded(exchange, *purchased_usdt, balance.as_ref()),
        Reply::ExpensesRecorded {
            expenses,
            skipped,
            rate,
            balance,
        } => expenses_recorded(expenses, *skipped, *rate, balance.as_ref()),
        Reply::TodayExpenses { date, expenses } => today_expenses(*date, expenses),
        Reply::Answer(answer) => answer.clone(),
        Reply::OfficialRate(rate) => {
            format!("{}\n\nEsta es la tasa oficial actualizada.", official_rate(*rate))
        }
        Reply::Help => help_text().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn expense(id: &str, at: &str, local: f64, usd_value: f64, category: Category) -> Expense {
        Expense {
            id: id.to_string(),
            timestamp: NaiveDateTime::parse_from_str(at, TIMESTAMP_FORMAT).unwrap(),
            local_amount: local,
            usd_amount: usd_value,
            rate_used: 36.5,
            category,
            description: String::new(),
        }
    }

    #[test]
    fn registered_expense_uses_thousands_separators() {
        let mut e = expense("abc12345", "2025-11-11 13:45:00", 22000.0, 602.74, Category::Comida);
        e.description = "almuerzo".to_string();
        assert_eq!(
            expense_registered(&e),
            "Gasto registrado (ID: abc12345)\n\n22,000.00 Bs\n$602.74 USD\n\
             Tipo de cambio: 36.50 Bs/$\nCategoria: comida\nDescripcion: almuerzo"
        );
    }

    #[test]
    fn several_expenses_are_numbered_with_a_total() {
        let expenses = vec![
            expense("a", "2025-11-11 13:00:00", 100.0, 2.5, Category::Comida),
            expense("b", "2025-11-11 13:00:00", 200.0, 5.0, Category::Otros),
        ];
        let balance = Balance {
            local: 99700.0,
            usd: 292.5,
            exchanged_local: 0.0,
            exchanged_usdt: 0.0,
        };
        let text = expenses_recorded(&expenses, 0, 40.0, Some(&balance));
        assert!(text.starts_with("2 gastos registrados:\n\n1. 100.00 Bs ($2.50 USD) - comida\n2. 200.00 Bs ($5.00 USD)\n"));
        assert!(text.contains("Total: 300.00 Bs ($7.50 USD)"));
        assert!(text.contains("Tipo de cambio: 40.00 Bs/$"));
        assert!(!text.contains("No se pudo"));
        assert!(text.ends_with("Saldo disponible:\n99,700.00 Bs ($292.50 USD equivalente)"));
    }

    #[test]
    fn skipped_expenses_are_reported_next_to_saved_ones() {
        let outcome = Reply::ExpensesRecorded {
            expenses: vec![expense("a", "2025-11-11 13:00:00", 100.0, 2.5, Category::Comida)],
            skipped: 1,
            rate: 40.0,
            balance: None,
        };
        assert_eq!(
            reply(&outcome),
            "Gasto registrado:\n\n100.00 Bs ($2.50 USD) - comida\nTipo de cambio: 40.00 Bs/$\n\n\
             No se pudo guardar 1 gasto del mensaje, intentalo de nuevo."
        );
    }

    #[test]
    fn exchange_shows_usdt_with_four_decimals() {
        let exchange = Exchange {
            id: "ff00aa11".to_string(),
            timestamp: NaiveDateTime::parse_from_str("2025-11-11 10:00:00", TIMESTAMP_FORMAT)
                .unwrap(),
            local_amount: 10000.0,
            usdt_amount: 238.0952,
            rate_used: 42.0,
            description: String::new(),
        };
        assert_eq!(
            exchange_recorded(&exchange, None, None),
            "Intercambio registrado (ID: ff00aa11)\n\nBolivares: 10,000.00 Bs\n\
             USDT recibido: 238.0952 USDT\nTasa usada: 42.00 Bs/USDT"
        );
    }

    #[test]
    fn comparison_carries_signed_deltas() {
        let summary = |month: &str, local: f64, usd_value: f64| MonthSummary {
            month: MonthKey::parse(month).unwrap(),
            total_local: local,
            total_usd: usd_value,
            expenses: vec![expense("x", "2025-11-01 10:00:00", local, usd_value, Category::Otros)],
        };
        let comparison_data = MonthComparison {
            current_month: MonthKey::parse("2025-11").unwrap(),
            previous_month: MonthKey::parse("2025-10").unwrap(),
            current: Some(summary("2025-11", 1000.0, 25.0)),
            previous: Some(summary("2025-10", 2000.0, 50.0)),
        };
        let text = comparison(&comparison_data);
        assert!(text.contains("Mes anterior (2025-10):\nTotal: 2,000.00 Bs ($50.00 USD)"));
        assert!(text.ends_with("Diferencia:\n-1,000.00 Bs ($-25.00 USD)\n-50.0%"));

        let only_current = MonthComparison {
            previous: None,
            ..comparison_data
        };
        let text = comparison(&only_current);
        assert!(text.contains("Mes anterior (2025-10): Sin datos"));
        assert!(!text.contains("Diferencia"));
    }

    #[test]
    fn budget_warns_near_the_limit() {
        let status = BudgetStatus {
            month: MonthKey::parse("2025-11").unwrap(),
            budget_usd: 500.0,
            spent_usd: 450.0,
            percent: 90.0,
            remaining_usd: 50.0,
        };
        assert_eq!(
            budget_status(&status),
            "Presupuesto del mes (2025-11)\n\nPresupuesto: $500.00 USD\n\
             Gastado: $450.00 USD (90.0%)\nRestante: $50.00 USD\n\nCerca del limite"
        );
    }

    #[test]
    fn search_shows_at_most_ten_rows() {
        let expenses: Vec<Expense> = (0..12)
            .map(|i| expense(&format!("id{i}"), "2025-11-11 10:00:00", 10.0, 1.0, Category::Otros))
            .collect();
        let text = search_results(&expenses);
        assert!(text.starts_with("Gastos encontrados: 12\nTotal: 120.00 Bs ($12.00 USD)"));
        assert!(text.contains("ID: id9\n"));
        assert!(!text.contains("ID: id10\n"));
        assert!(text.ends_with("... y 2 mas"));
    }

    #[test]
    fn parallel_rate_compares_with_official() {
        let text = parallel_rate(330.0, Some(300.0));
        assert!(text.contains("330.00 Bs = 1 USDT"));
        assert!(text.ends_with("Diferencia: +30.00 Bs (+10.0%)"));
        assert!(parallel_rate(330.0, None).ends_with("Diferencia: +0.00 Bs (+0.0%)"));
    }

    #[test]
    fn empty_day_has_its_own_text() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 11).unwrap();
        assert_eq!(today_expenses(date, &[]), "No hay gastos registrados hoy.");
    }
}
