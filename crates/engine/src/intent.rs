//! Free-text classification.
//!
//! [`classify`] runs an ordered table of matchers over the message and returns
//! the first structured match, or a [`Intent::Question`] for the narrative
//! composer. Nothing here touches the ledger or the network.
//!
//! Keywords are looked up in a lowercase, accent-folded copy of the message so
//! that "gasté" and "gaste" match alike. Amounts, segments and descriptions are
//! taken from the lowercase text, accents included.
//!
//! ```rust
//! use engine::{Category, intent::{classify, Intent}};
//!
//! let Intent::Expenses(drafts) = classify("gasté 100 en comida, 200 en transporte") else {
//!     panic!("not an expense");
//! };
//! assert_eq!(drafts.len(), 2);
//! assert_eq!(drafts[1].category, Category::Transporte);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{Category, money::parse_amount};

/// What a free-text message asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Local currency turned into USDT.
    Exchange(ExchangeRequest),
    /// One or more expenses, in the order they were written.
    Expenses(Vec<ExpenseDraft>),
    /// "How much did I spend today".
    TodayExpenses,
    /// Anything else, handed to the narrative composer.
    Question(Topics),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExchangeRequest {
    pub amount: ExchangeAmount,
    /// Local units per USDT, when the message states one.
    pub rate: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExchangeAmount {
    /// USDT bought; the local amount is this times the rate.
    Usdt(f64),
    /// Local currency handed over.
    Local(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    pub amount: f64,
    pub category: Category,
    pub description: String,
}

/// What a question is about, to decide which figures to fetch before asking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Topics {
    pub rates: bool,
    pub finances: bool,
}

const EXCHANGE_TRIGGERS: &[&str] = &["compre", "comprar", "cambie", "cambiar"];
const LOCAL_EXCHANGE_TRIGGERS: &[&str] = &["cambie", "cambiar"];
const RATE_KEYWORDS: &[&str] = &[
    "dolar",
    "dollar",
    "tasa",
    "tipo de cambio",
    "cambio",
    "usd",
    "cotizacion",
];
const FINANCE_KEYWORDS: &[&str] = &[
    "gasto",
    "gaste",
    "gastado",
    "resumen",
    "total",
    "balance",
    "saldo",
    "ingreso",
    "intercambio",
];

type Matcher = fn(&Message) -> Option<Intent>;

/// Evaluated in order; the first match wins.
const MATCHERS: [Matcher; 3] = [match_exchange, match_expenses, match_today];

#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("literal pattern compiles")
}

static NUMBER: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d+(?:[.,]\d+)?"));
static AND_WORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s+y\s+"));
static EN_WORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"\ben\b"));
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d+(?:[.,]\d+)?\s*(?:bs|en)\b"));

struct Message {
    lower: String,
    folded: String,
}

impl Message {
    fn new(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        Self {
            folded: fold(&lower),
            lower,
        }
    }

    fn has(&self, keyword: &str) -> bool {
        self.folded.contains(keyword)
    }

    fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.has(k))
    }
}

/// Lowercases and strips diacritics: "Gasté" → "gaste".
#[must_use]
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Every number in `text`, accepting `.` or `,` as decimal separator.
#[must_use]
pub fn numbers(text: &str) -> Vec<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect()
}

pub fn classify(text: &str) -> Intent {
    let message = Message::new(text);
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(&message))
        .unwrap_or_else(|| Intent::Question(topics(&message)))
}

/// Topics of a message that matched nothing else.
pub fn question_topics(text: &str) -> Topics {
    topics(&Message::new(text))
}

fn topics(message: &Message) -> Topics {
    Topics {
        rates: message.has_any(RATE_KEYWORDS),
        finances: message.has_any(FINANCE_KEYWORDS),
    }
}

fn match_exchange(message: &Message) -> Option<Intent> {
    if !message.has_any(EXCHANGE_TRIGGERS) {
        return None;
    }
    let numbers = numbers(&message.lower);
    let first = *numbers.first()?;
    let rate = numbers.get(1).copied();

    let amount = if message.has("usdt") {
        ExchangeAmount::Usdt(first)
    } else if message.has_any(LOCAL_EXCHANGE_TRIGGERS) && !message.has("gast") {
        ExchangeAmount::Local(first)
    } else {
        return None;
    };
    Some(Intent::Exchange(ExchangeRequest { amount, rate }))
}

fn match_expenses(message: &Message) -> Option<Intent> {
    if !message.has("gast") {
        return None;
    }
    let numbers = numbers(&message.lower);
    let first = *numbers.first()?;

    let mut segments = split_segments(&message.lower);
    if segments.len() <= 1 || numbers.len() > segments.len() {
        let anchored: Vec<String> = ANCHOR
            .find_iter(&message.lower)
            .filter_map(|m| split_segments(&message.lower[m.start()..]).into_iter().next())
            .collect();
        if !anchored.is_empty() {
            segments = anchored;
        }
    }

    let mut drafts: Vec<ExpenseDraft> = segments.iter().filter_map(|s| draft(s)).collect();
    if drafts.is_empty() && first > 0.0 {
        drafts.push(ExpenseDraft {
            amount: first,
            category: Category::Otros,
            description: String::new(),
        });
    }

    if drafts.is_empty() {
        None
    } else {
        Some(Intent::Expenses(drafts))
    }
}

fn match_today(message: &Message) -> Option<Intent> {
    (message.has("hoy") && message.has("gast")).then_some(Intent::TodayExpenses)
}

/// Expense described by one segment, if the segment carries a positive amount.
fn draft(segment: &str) -> Option<ExpenseDraft> {
    let folded = fold(segment);
    let mentions_expense =
        folded.contains("gast") || folded.contains("bs") || EN_WORD.is_match(&folded);
    if !mentions_expense {
        return None;
    }

    let amount = numbers(segment).into_iter().next().filter(|a| *a > 0.0)?;
    let description = EN_WORD
        .find(segment)
        .map(|m| segment[m.end()..].trim().to_string())
        .unwrap_or_default();

    Some(ExpenseDraft {
        amount,
        category: Category::find_in(&folded).unwrap_or_default(),
        description,
    })
}

/// Splits on commas that are not decimal separators and on the word "y".
fn split_segments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    for (idx, &ch) in chars.iter().enumerate() {
        let decimal_comma = ch == ','
            && idx > 0
            && chars[idx - 1].is_ascii_digit()
            && chars.get(idx + 1).is_some_and(char::is_ascii_digit);
        if ch == ',' && !decimal_comma {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);

    parts
        .iter()
        .flat_map(|part| AND_WORD.split(part))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expenses(text: &str) -> Vec<ExpenseDraft> {
        match classify(text) {
            Intent::Expenses(drafts) => drafts,
            other => panic!("expected expenses, got {other:?}"),
        }
    }

    #[test]
    fn two_expenses_split_on_comma() {
        let drafts = expenses("gasté 100 en comida, 200 en transporte");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].amount, 100.0);
        assert_eq!(drafts[0].category, Category::Comida);
        assert_eq!(drafts[0].description, "comida");
        assert_eq!(drafts[1].amount, 200.0);
        assert_eq!(drafts[1].category, Category::Transporte);
    }

    #[test]
    fn expenses_split_on_standalone_y_only() {
        let drafts = expenses("gaste 50bs en pan y 120 bs en ropa de playa");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].description, "pan");
        assert_eq!(drafts[1].amount, 120.0);
        assert_eq!(drafts[1].category, Category::Ropa);
        assert_eq!(drafts[1].description, "ropa de playa");
    }

    #[test]
    fn decimal_comma_is_not_a_separator() {
        let drafts = expenses("gasté 22,5 en salud");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].amount, 22.5);
        assert_eq!(drafts[0].category, Category::Salud);
    }

    #[test]
    fn bare_amount_becomes_a_single_uncategorized_expense() {
        let drafts = expenses("Gasté 22000");
        assert_eq!(
            drafts,
            vec![ExpenseDraft {
                amount: 22000.0,
                category: Category::Otros,
                description: String::new(),
            }]
        );
    }

    #[test]
    fn segments_are_reanchored_on_amounts() {
        let drafts = expenses("hoy gaste 300 en comida 150bs");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].amount, 300.0);
        assert_eq!(drafts[1].amount, 150.0);
    }

    #[test]
    fn usdt_purchase_with_and_without_rate() {
        assert_eq!(
            classify("compré 20 usdt a 320"),
            Intent::Exchange(ExchangeRequest {
                amount: ExchangeAmount::Usdt(20.0),
                rate: Some(320.0),
            })
        );
        assert_eq!(
            classify("compre 20 USDT"),
            Intent::Exchange(ExchangeRequest {
                amount: ExchangeAmount::Usdt(20.0),
                rate: None,
            })
        );
    }

    #[test]
    fn local_exchange_needs_cambie_without_gast() {
        assert_eq!(
            classify("cambié 6400 a 320"),
            Intent::Exchange(ExchangeRequest {
                amount: ExchangeAmount::Local(6400.0),
                rate: Some(320.0),
            })
        );
        assert!(matches!(classify("cambie y gaste 500"), Intent::Expenses(_)));
    }

    #[test]
    fn today_query_without_amounts() {
        assert_eq!(classify("cuánto gasté hoy?"), Intent::TodayExpenses);
    }

    #[test]
    fn questions_carry_topics() {
        assert_eq!(
            classify("a cuánto está el dólar?"),
            Intent::Question(Topics {
                rates: true,
                finances: false,
            })
        );
        assert_eq!(
            classify("dame el resumen del mes"),
            Intent::Question(Topics {
                rates: false,
                finances: true,
            })
        );
    }

    #[test]
    fn fold_strips_accents() {
        assert_eq!(fold("Gasté en Educación"), "gaste en educacion");
    }
}
