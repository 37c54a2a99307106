use chrono::NaiveDate;

use crate::{
    Balance, EngineError, FinancialContext, MonthComparison, MonthKey, MonthOverview,
    MonthSummary, RecordStore, ResultEngine, Statistics, Totals, export,
};

use super::Ledger;

impl<S: RecordStore> Ledger<S> {
    /// Expense totals of `month`, `None` when the month has no expenses.
    pub fn month_summary(&self, user_id: &str, month: &MonthKey) -> Option<MonthSummary> {
        MonthSummary::from_expenses(month.clone(), self.month_expenses(user_id, month))
    }

    /// Statistics of `month`, averaged over the days elapsed as of `today`.
    pub fn statistics(&self, user_id: &str, month: &MonthKey, today: NaiveDate) -> Option<Statistics> {
        Statistics::compute(month, &self.month_expenses(user_id, month), today)
    }

    /// Income minus expenses minus exchanges, each in the unit it was stored in.
    ///
    /// Defined only once an income is registered for `month`.
    pub fn available_balance(&self, user_id: &str, month: &MonthKey) -> Option<Balance> {
        let income = self.income(user_id, month)?;
        let expenses = Totals::of_expenses(&self.month_expenses(user_id, month));
        let exchanges = Totals::of_exchanges(&self.month_exchanges(user_id, month));
        Some(Balance::compute(&income, expenses, exchanges))
    }

    /// Both month summaries side by side; fails only when neither month has data.
    pub fn compare_months(
        &self,
        user_id: &str,
        current: &MonthKey,
        previous: &MonthKey,
    ) -> ResultEngine<MonthComparison> {
        let comparison = MonthComparison {
            current_month: current.clone(),
            previous_month: previous.clone(),
            current: self.month_summary(user_id, current),
            previous: self.month_summary(user_id, previous),
        };
        if comparison.current.is_none() && comparison.previous.is_none() {
            return Err(EngineError::NoDataForPeriod(format!("{current} / {previous}")));
        }
        Ok(comparison)
    }

    pub fn month_overview(&self, user_id: &str, month: &MonthKey) -> MonthOverview {
        let income = self.income(user_id, month);
        let expenses = self.month_expenses(user_id, month);
        let exchanges = Totals::of_exchanges(&self.month_exchanges(user_id, month));
        let balance = income
            .as_ref()
            .map(|income| Balance::compute(income, Totals::of_expenses(&expenses), exchanges));

        MonthOverview {
            month: month.clone(),
            income,
            summary: MonthSummary::from_expenses(month.clone(), expenses),
            exchanges,
            balance,
            budget: self.budget_status(user_id, month),
        }
    }

    /// Figures handed to the narrative composer for questions about the user's money.
    pub fn financial_context(
        &self,
        user_id: &str,
        month: &MonthKey,
        official_rate: Option<f64>,
    ) -> FinancialContext {
        FinancialContext {
            month: month.clone(),
            income: self.income(user_id, month),
            summary: self.month_summary(user_id, month),
            exchanges: self.month_exchanges(user_id, month),
            balance: self.available_balance(user_id, month),
            official_rate,
        }
    }

    /// The whole expense history of the user as CSV.
    pub fn export_csv(&self, user_id: &str) -> ResultEngine<Vec<u8>> {
        let expenses = self.history(user_id);
        if expenses.is_empty() {
            return Err(EngineError::NoDataForPeriod("all".to_string()));
        }
        tracing::debug!("exporting {} expenses of {user_id}", expenses.len());
        export::expenses_csv(&expenses)
    }
}
