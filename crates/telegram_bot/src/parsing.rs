use chrono::NaiveDate;
use engine::{Category, ExpenseEdit, money::parse_amount};

pub(crate) const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ExpenseArgs {
    pub amount: f64,
    pub category: Category,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EditArgs {
    pub id: String,
    pub edit: ExpenseEdit,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ExchangeArgs {
    pub amount: f64,
    pub rate: Option<f64>,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct IncomeArgs {
    pub amount: f64,
    pub rate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Search {
    Date(NaiveDate),
    Range { min: f64, max: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum ParseError {
    #[error("faltan argumentos")]
    Missing,
    #[error("monto no valido")]
    InvalidAmount,
    #[error("la cantidad debe ser mayor a 0")]
    NotPositive,
    #[error("fecha no valida")]
    InvalidDate,
    #[error("demasiados argumentos")]
    TooManyArguments,
}

fn amount(token: &str) -> Result<f64, ParseError> {
    parse_amount(token).ok_or(ParseError::InvalidAmount)
}

fn positive_amount(token: &str) -> Result<f64, ParseError> {
    let value = amount(token)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ParseError::NotPositive)
    }
}

/// A non-positive rate counts as "not given", so the provider rate is used.
fn optional_rate(token: &str) -> Option<f64> {
    parse_amount(token).filter(|r| *r > 0.0)
}

/// Splits `[categoria] [descripcion...]`: the first word is a category only
/// when it names one exactly.
fn category_and_description(rest: &[&str]) -> (Option<Category>, String) {
    match rest.split_first() {
        Some((first, tail)) => match Category::from_keyword(first) {
            Some(category) => (Some(category), tail.join(" ")),
            None => (None, rest.join(" ")),
        },
        None => (None, String::new()),
    }
}

/// `/gasto <monto> [categoria] [descripcion]`
pub(crate) fn parse_expense(input: &str) -> Result<ExpenseArgs, ParseError> {
    let args: Vec<&str> = input.split_whitespace().collect();
    let (first, rest) = args.split_first().ok_or(ParseError::Missing)?;
    let amount = positive_amount(first)?;
    let (category, description) = category_and_description(rest);
    Ok(ExpenseArgs {
        amount,
        category: category.unwrap_or_default(),
        description,
    })
}

/// `/editar <id> <monto> [categoria] [descripcion]`
///
/// A description is only changed when one is written.
pub(crate) fn parse_edit(input: &str) -> Result<EditArgs, ParseError> {
    let args: Vec<&str> = input.split_whitespace().collect();
    let [id, value, rest @ ..] = args.as_slice() else {
        return Err(ParseError::Missing);
    };
    let amount = positive_amount(value)?;
    let (category, description) = category_and_description(rest);
    Ok(EditArgs {
        id: (*id).to_string(),
        edit: ExpenseEdit {
            amount_local: Some(amount),
            category,
            description: (!description.is_empty()).then_some(description),
        },
    })
}

/// `/cambiar <bs> [tasa] [descripcion]`
///
/// The second word is a rate when it reads as a number, otherwise the
/// description starts there.
pub(crate) fn parse_exchange(input: &str) -> Result<ExchangeArgs, ParseError> {
    let args: Vec<&str> = input.split_whitespace().collect();
    let (first, rest) = args.split_first().ok_or(ParseError::Missing)?;
    let amount = positive_amount(first)?;

    let (rate, description) = match rest.split_first() {
        Some((second, tail)) if parse_amount(second).is_some() => {
            (optional_rate(second), tail.join(" "))
        }
        _ => (None, rest.join(" ")),
    };
    Ok(ExchangeArgs {
        amount,
        rate,
        description,
    })
}

/// `/ingreso [monto] [tasa]`; `None` asks for the current income.
pub(crate) fn parse_income(input: &str) -> Result<Option<IncomeArgs>, ParseError> {
    let mut args = input.split_whitespace();
    let Some(first) = args.next() else {
        return Ok(None);
    };
    let amount = positive_amount(first)?;
    Ok(Some(IncomeArgs {
        amount,
        rate: args.next().and_then(optional_rate),
    }))
}

/// `/presupuesto [monto_usd]`; `None` asks for the current status.
pub(crate) fn parse_budget(input: &str) -> Result<Option<f64>, ParseError> {
    match input.split_whitespace().next() {
        Some(token) => positive_amount(token).map(Some),
        None => Ok(None),
    }
}

/// `/buscar <YYYY-MM-DD>` or `/buscar <min> <max>`
pub(crate) fn parse_search(input: &str) -> Result<Search, ParseError> {
    let args: Vec<&str> = input.split_whitespace().collect();
    match args.as_slice() {
        [] => Err(ParseError::Missing),
        [date] => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(Search::Date)
            .map_err(|_| ParseError::InvalidDate),
        [min, max] => Ok(Search::Range {
            min: amount(min)?,
            max: amount(max)?,
        }),
        _ => Err(ParseError::TooManyArguments),
    }
}

/// `/listar [n]`: anything unreadable or outside 1..=50 falls back to 10.
pub(crate) fn parse_limit(input: &str) -> usize {
    input
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|n| (1..=MAX_LIST_LIMIT).contains(n))
        .unwrap_or(DEFAULT_LIST_LIMIT)
}

/// First word of the arguments, for commands taking a record id.
pub(crate) fn parse_id(input: &str) -> Result<&str, ParseError> {
    input.split_whitespace().next().ok_or(ParseError::Missing)
}
