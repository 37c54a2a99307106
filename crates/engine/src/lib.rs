//! Ledger engine of the expense assistant.
//!
//! The [`Ledger`] registers expenses, incomes, exchanges and budgets in a
//! [`RecordStore`] and derives month summaries, statistics, comparisons and
//! the available balance from them at query time. [`intent::classify`] turns
//! free text into structured requests, and the [`Assistant`] executes them
//! against the ledger, the [`RateProvider`] and the [`NarrativeComposer`].

pub use assistant::{Assistant, Reply};
pub use categories::Category;
pub use error::{EngineError, ProviderError};
pub use month::MonthKey;
pub use narrative::FinancialContext;
pub use ops::Ledger;
pub use providers::{NarrativeComposer, RateProvider};
pub use records::{Exchange, Expense, ExpenseEdit, Income, NewExchange, NewExpense, TIMESTAMP_FORMAT};
pub use reports::{
    Balance, BudgetLevel, BudgetStatus, CategoryTotals, DayTotals, Delta, MonthComparison,
    MonthOverview, MonthSummary, Statistics, Totals,
};
pub use store::{JsonFileStore, MemoryStore, RecordKind, RecordStore};

pub mod intent;
pub mod money;

mod assistant;
mod categories;
mod error;
mod export;
mod month;
mod narrative;
mod ops;
mod providers;
mod records;
mod reports;
mod store;

pub type ResultEngine<T> = Result<T, EngineError>;
