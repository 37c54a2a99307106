use crate::{
    BudgetStatus, MonthKey, RecordKind, RecordStore, ResultEngine, Totals,
    money::ensure_positive,
    store::Budgets,
};

use super::Ledger;

impl<S: RecordStore> Ledger<S> {
    /// Set the USD budget of `month`, replacing any previous one.
    pub fn set_budget(&self, user_id: &str, month: &MonthKey, amount_usd: f64) -> ResultEngine<()> {
        let amount = ensure_positive(amount_usd)?;
        self.store.update(RecordKind::Budgets, |all: &mut Budgets| {
            all.entry(user_id.to_string())
                .or_default()
                .insert(month.clone(), amount);
            Ok(())
        })?;
        tracing::debug!("budget of {user_id} for {month} set to {amount}");
        Ok(())
    }

    pub fn budget(&self, user_id: &str, month: &MonthKey) -> Option<f64> {
        let all: Budgets = self.store.load(RecordKind::Budgets);
        all.get(user_id)?.get(month).copied()
    }

    /// Budget usage of `month`, `None` when no budget is set.
    pub fn budget_status(&self, user_id: &str, month: &MonthKey) -> Option<BudgetStatus> {
        let budget = self.budget(user_id, month)?;
        let spent = Totals::of_expenses(&self.month_expenses(user_id, month)).usd;
        Some(BudgetStatus::compute(month.clone(), budget, spent))
    }
}
