//! Derived aggregates. None of these are stored; the ledger recomputes them
//! from the record collections on every query.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::{
    Category, Exchange, Expense, Income, MonthKey,
    money::{delta_percent, usage_percent},
};

/// Local and USD-equivalent sums over a set of records.
///
/// For exchanges `usd` holds the USDT amount.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub local: f64,
    pub usd: f64,
    pub count: usize,
}

impl Totals {
    fn add(&mut self, local: f64, usd: f64) {
        self.local += local;
        self.usd += usd;
        self.count += 1;
    }

    #[must_use]
    pub fn of_expenses<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Self {
        let mut totals = Self::default();
        for expense in expenses {
            totals.add(expense.local_amount, expense.usd_amount);
        }
        totals
    }

    #[must_use]
    pub fn of_exchanges<'a>(exchanges: impl IntoIterator<Item = &'a Exchange>) -> Self {
        let mut totals = Self::default();
        for exchange in exchanges {
            totals.add(exchange.local_amount, exchange.usdt_amount);
        }
        totals
    }
}

/// Expenses of one month, in registration order, with their totals.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub total_local: f64,
    pub total_usd: f64,
    pub expenses: Vec<Expense>,
}

impl MonthSummary {
    /// `None` when the month has no expenses at all.
    pub(crate) fn from_expenses(month: MonthKey, expenses: Vec<Expense>) -> Option<Self> {
        if expenses.is_empty() {
            return None;
        }
        let totals = Totals::of_expenses(&expenses);
        Some(Self {
            month,
            total_local: totals.local,
            total_usd: totals.usd,
            expenses,
        })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.expenses.len()
    }

    /// Per-category totals, largest USD amount first.
    #[must_use]
    pub fn by_category(&self) -> Vec<CategoryTotals> {
        category_breakdown(&self.expenses)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryTotals {
    pub category: Category,
    pub totals: Totals,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub totals: Totals,
}

/// Month statistics, see [`Ledger::statistics`](crate::Ledger::statistics).
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub month: MonthKey,
    pub total: Totals,
    /// Days the totals are averaged over.
    pub days_counted: u32,
    pub daily_average_local: f64,
    pub daily_average_usd: f64,
    /// Largest expense by local amount (the first one on ties).
    pub max_expense: Expense,
    /// Smallest expense by local amount (the first one on ties).
    pub min_expense: Expense,
    pub max_usd: f64,
    pub min_usd: f64,
    pub by_category: Vec<CategoryTotals>,
    /// Day with the highest local total.
    pub busiest_day: DayTotals,
}

impl Statistics {
    /// Averages are taken over the days elapsed in `month` as seen from
    /// `today`: the current day for the running month, the whole month for
    /// any other.
    pub(crate) fn compute(month: &MonthKey, expenses: &[Expense], today: NaiveDate) -> Option<Self> {
        let first = expenses.first()?;
        let total = Totals::of_expenses(expenses);

        let days_counted = if *month == MonthKey::from_date(today) {
            today.day()
        } else {
            month.days_in_month().unwrap_or_else(|| today.day())
        };
        let days = f64::from(days_counted.max(1));

        let mut max_expense = first;
        let mut min_expense = first;
        let mut max_usd = first.usd_amount;
        let mut min_usd = first.usd_amount;
        for expense in &expenses[1..] {
            if expense.local_amount > max_expense.local_amount {
                max_expense = expense;
            }
            if expense.local_amount < min_expense.local_amount {
                min_expense = expense;
            }
            max_usd = max_usd.max(expense.usd_amount);
            min_usd = min_usd.min(expense.usd_amount);
        }

        let mut by_day: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
        for expense in expenses {
            by_day
                .entry(expense.timestamp.date())
                .or_default()
                .add(expense.local_amount, expense.usd_amount);
        }
        let busiest_day = by_day
            .into_iter()
            .map(|(date, totals)| DayTotals { date, totals })
            .reduce(|best, day| {
                if day.totals.local > best.totals.local {
                    day
                } else {
                    best
                }
            })?;

        Some(Self {
            month: month.clone(),
            total,
            days_counted,
            daily_average_local: total.local / days,
            daily_average_usd: total.usd / days,
            max_expense: max_expense.clone(),
            min_expense: min_expense.clone(),
            max_usd,
            min_usd,
            by_category: category_breakdown(expenses),
            busiest_day,
        })
    }
}

/// What is left of a month's income after expenses and exchanges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Balance {
    pub local: f64,
    /// Income USDT minus expense USD minus exchange USDT, as stored.
    pub usd: f64,
    pub exchanged_local: f64,
    pub exchanged_usdt: f64,
}

impl Balance {
    pub(crate) fn compute(income: &Income, expenses: Totals, exchanges: Totals) -> Self {
        Self {
            local: income.local_amount - expenses.local - exchanges.local,
            usd: income.usdt_amount - expenses.usd - exchanges.usd,
            exchanged_local: exchanges.local,
            exchanged_usdt: exchanges.usd,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delta {
    pub local: f64,
    pub usd: f64,
    /// Change relative to the previous USD total; 0 when that total is 0.
    pub percent: f64,
}

/// Two month summaries side by side.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthComparison {
    pub current_month: MonthKey,
    pub previous_month: MonthKey,
    pub current: Option<MonthSummary>,
    pub previous: Option<MonthSummary>,
}

impl MonthComparison {
    /// Defined only when both months have data.
    #[must_use]
    pub fn delta(&self) -> Option<Delta> {
        let current = self.current.as_ref()?;
        let previous = self.previous.as_ref()?;
        Some(Delta {
            local: current.total_local - previous.total_local,
            usd: current.total_usd - previous.total_usd,
            percent: delta_percent(current.total_usd, previous.total_usd),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetLevel {
    UnderBudget,
    /// 80 % or more of the budget is spent.
    NearLimit,
    Exceeded,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BudgetStatus {
    pub month: MonthKey,
    pub budget_usd: f64,
    pub spent_usd: f64,
    pub percent: f64,
    pub remaining_usd: f64,
}

impl BudgetStatus {
    pub(crate) fn compute(month: MonthKey, budget_usd: f64, spent_usd: f64) -> Self {
        Self {
            month,
            budget_usd,
            spent_usd,
            percent: usage_percent(spent_usd, budget_usd),
            remaining_usd: budget_usd - spent_usd,
        }
    }

    #[must_use]
    pub fn level(&self) -> BudgetLevel {
        if self.percent >= 100.0 {
            BudgetLevel::Exceeded
        } else if self.percent >= 80.0 {
            BudgetLevel::NearLimit
        } else {
            BudgetLevel::UnderBudget
        }
    }
}

/// Everything the month report shows, gathered in one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthOverview {
    pub month: MonthKey,
    pub income: Option<Income>,
    pub summary: Option<MonthSummary>,
    pub exchanges: Totals,
    pub balance: Option<Balance>,
    pub budget: Option<BudgetStatus>,
}

fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryTotals> {
    let mut out: Vec<CategoryTotals> = Vec::new();
    for expense in expenses {
        match out.iter_mut().find(|c| c.category == expense.category) {
            Some(entry) => entry.totals.add(expense.local_amount, expense.usd_amount),
            None => {
                let mut totals = Totals::default();
                totals.add(expense.local_amount, expense.usd_amount);
                out.push(CategoryTotals {
                    category: expense.category,
                    totals,
                });
            }
        }
    }
    out.sort_by(|a, b| b.totals.usd.total_cmp(&a.totals.usd));
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn expense(at: &str, local: f64, usd: f64, category: Category) -> Expense {
        Expense {
            id: format!("{local}"),
            timestamp: NaiveDateTime::parse_from_str(at, crate::TIMESTAMP_FORMAT).unwrap(),
            local_amount: local,
            usd_amount: usd,
            rate_used: local / usd,
            category,
            description: String::new(),
        }
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn statistics_average_over_current_day_for_running_month() {
        let month = MonthKey::parse("2025-11").unwrap();
        let expenses = vec![
            expense("2025-11-01 10:00:00", 100.0, 2.0, Category::Comida),
            expense("2025-11-03 10:00:00", 300.0, 6.0, Category::Hogar),
            expense("2025-11-03 18:00:00", 50.0, 1.0, Category::Comida),
        ];
        let stats = Statistics::compute(&month, &expenses, date("2025-11-10")).unwrap();
        assert_eq!(stats.days_counted, 10);
        assert_eq!(stats.daily_average_local, 45.0);
        assert_eq!(stats.max_expense.local_amount, 300.0);
        assert_eq!(stats.min_expense.local_amount, 50.0);
        assert_eq!(stats.busiest_day.date, date("2025-11-03"));
        assert_eq!(stats.busiest_day.totals.count, 2);
        assert_eq!(stats.by_category[0].category, Category::Hogar);
    }

    #[test]
    fn statistics_use_full_length_of_past_months() {
        let month = MonthKey::parse("2025-02").unwrap();
        let expenses = vec![expense("2025-02-10 10:00:00", 280.0, 7.0, Category::Otros)];
        let stats = Statistics::compute(&month, &expenses, date("2025-11-10")).unwrap();
        assert_eq!(stats.days_counted, 28);
        assert_eq!(stats.daily_average_local, 10.0);
    }

    #[test]
    fn statistics_keep_first_expense_on_ties() {
        let month = MonthKey::parse("2025-11").unwrap();
        let mut first = expense("2025-11-01 10:00:00", 100.0, 2.0, Category::Comida);
        first.id = "first".to_string();
        let mut second = expense("2025-11-02 10:00:00", 100.0, 2.0, Category::Comida);
        second.id = "second".to_string();
        let stats = Statistics::compute(&month, &[first, second], date("2025-11-02")).unwrap();
        assert_eq!(stats.max_expense.id, "first");
        assert_eq!(stats.min_expense.id, "first");
        assert_eq!(stats.busiest_day.date, date("2025-11-01"));
    }

    #[test]
    fn no_expenses_no_statistics() {
        let month = MonthKey::parse("2025-11").unwrap();
        assert!(Statistics::compute(&month, &[], date("2025-11-02")).is_none());
    }

    #[test]
    fn delta_percent_is_zero_without_previous_spending() {
        let month = MonthKey::parse("2025-11").unwrap();
        let previous = MonthKey::parse("2025-10").unwrap();
        let comparison = MonthComparison {
            current_month: month.clone(),
            previous_month: previous.clone(),
            current: MonthSummary::from_expenses(
                month,
                vec![expense("2025-11-01 10:00:00", 100.0, 2.0, Category::Otros)],
            ),
            previous: MonthSummary::from_expenses(
                previous,
                vec![expense("2025-10-01 10:00:00", 0.0, 0.0, Category::Otros)],
            ),
        };
        let delta = comparison.delta().unwrap();
        assert_eq!(delta.percent, 0.0);
        assert_eq!(delta.local, 100.0);
    }

    #[test]
    fn budget_levels() {
        let month = MonthKey::parse("2025-11").unwrap();
        let status = BudgetStatus::compute(month.clone(), 500.0, 450.0);
        assert_eq!(status.percent, 90.0);
        assert_eq!(status.remaining_usd, 50.0);
        assert_eq!(status.level(), BudgetLevel::NearLimit);
        assert_eq!(
            BudgetStatus::compute(month.clone(), 500.0, 500.0).level(),
            BudgetLevel::Exceeded
        );
        assert_eq!(
            BudgetStatus::compute(month, 0.0, 10.0).percent,
            0.0
        );
    }
}
