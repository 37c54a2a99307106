use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    EngineError, Expense, ExpenseEdit, MonthKey, NewExpense, RecordKind, RecordStore, ResultEngine,
    money::{USD_DECIMALS, ensure_positive, round_to, usable_rate},
    store::Expenses,
};

use super::{Ledger, month_records};

impl<S: RecordStore> Ledger<S> {
    /// Register an expense priced at `new.rate` (local units per USD).
    pub fn register_expense(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        new: NewExpense,
    ) -> ResultEngine<Expense> {
        let amount = ensure_positive(new.amount_local)?;
        let rate = usable_rate(new.rate).ok_or(EngineError::RateUnavailable)?;
        let month = MonthKey::from_datetime(now);

        let existing: Expenses = self.store.load(RecordKind::Expenses);
        let id = self.issue_id(user_id, |candidate| {
            existing
                .get(user_id)
                .is_some_and(|months| months.values().flatten().any(|e| e.id == candidate))
        })?;

        let expense = self
            .store
            .update(RecordKind::Expenses, |all: &mut Expenses| {
                let months = all.entry(user_id.to_string()).or_default();
                let expense = Expense {
                    id,
                    timestamp: now,
                    local_amount: amount,
                    usd_amount: round_to(amount / rate, USD_DECIMALS),
                    rate_used: rate,
                    category: new.category,
                    description: new.description.trim().to_string(),
                };
                months.entry(month.clone()).or_default().push(expense.clone());
                Ok(expense)
            })?;

        tracing::debug!("expense {} registered for {user_id} in {month}", expense.id);
        Ok(expense)
    }

    /// Look an expense up across the whole history of the user.
    pub fn expense_by_id(&self, user_id: &str, id: &str) -> Option<(MonthKey, Expense)> {
        let all: Expenses = self.store.load(RecordKind::Expenses);
        all.get(user_id)?.iter().find_map(|(month, expenses)| {
            expenses
                .iter()
                .find(|e| e.id == id)
                .map(|e| (month.clone(), e.clone()))
        })
    }

    /// Apply `edit` to the expense with `id`.
    ///
    /// A new amount is priced again at the rate stored in the expense. Returns
    /// `false` when no such expense exists.
    pub fn edit_expense(&self, user_id: &str, id: &str, edit: ExpenseEdit) -> ResultEngine<bool> {
        if let Some(amount) = edit.amount_local {
            ensure_positive(amount)?;
        }

        let result = self.store.update(RecordKind::Expenses, |all: &mut Expenses| {
            let expense = all
                .get_mut(user_id)
                .and_then(|months| months.values_mut().flatten().find(|e| e.id == id))
                .ok_or_else(|| EngineError::RecordNotFound(id.to_string()))?;

            if let Some(amount) = edit.amount_local {
                expense.local_amount = amount;
                if let Some(rate) = usable_rate(Some(expense.rate_used)) {
                    expense.usd_amount = round_to(amount / rate, USD_DECIMALS);
                }
            }
            if let Some(category) = edit.category {
                expense.category = category;
            }
            if let Some(description) = edit.description {
                expense.description = description.trim().to_string();
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                tracing::debug!("expense {id} of {user_id} edited");
                Ok(true)
            }
            Err(EngineError::RecordNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove the expense with `id` from whichever month holds it.
    pub fn delete_expense(&self, user_id: &str, id: &str) -> ResultEngine<bool> {
        let result = self.store.update(RecordKind::Expenses, |all: &mut Expenses| {
            let months = all
                .get_mut(user_id)
                .ok_or_else(|| EngineError::RecordNotFound(id.to_string()))?;
            for expenses in months.values_mut() {
                if let Some(pos) = expenses.iter().position(|e| e.id == id) {
                    expenses.remove(pos);
                    return Ok(());
                }
            }
            Err(EngineError::RecordNotFound(id.to_string()))
        });

        match result {
            Ok(()) => {
                tracing::debug!("expense {id} of {user_id} deleted");
                Ok(true)
            }
            Err(EngineError::RecordNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Expenses of `month` in registration order.
    pub fn month_expenses(&self, user_id: &str, month: &MonthKey) -> Vec<Expense> {
        let all: Expenses = self.store.load(RecordKind::Expenses);
        month_records(all.get(user_id), month).to_vec()
    }

    /// The last `limit` expenses of `month`, most recent first.
    pub fn recent_expenses(&self, user_id: &str, month: &MonthKey, limit: usize) -> Vec<Expense> {
        let mut expenses = self.month_expenses(user_id, month);
        expenses.reverse();
        expenses.truncate(limit);
        expenses
    }

    /// Every expense of the user registered on `date`, oldest month first.
    pub fn find_by_date(&self, user_id: &str, date: NaiveDate) -> Vec<Expense> {
        self.history(user_id)
            .into_iter()
            .filter(|e| e.timestamp.date() == date)
            .collect()
    }

    /// Every expense whose local amount lies within the inclusive bounds.
    pub fn find_by_range(&self, user_id: &str, min: Option<f64>, max: Option<f64>) -> Vec<Expense> {
        self.history(user_id)
            .into_iter()
            .filter(|e| min.is_none_or(|min| e.local_amount >= min))
            .filter(|e| max.is_none_or(|max| e.local_amount <= max))
            .collect()
    }

    /// The full expense history of the user, month by month.
    pub(crate) fn history(&self, user_id: &str) -> Vec<Expense> {
        let mut all: Expenses = self.store.load(RecordKind::Expenses);
        all.remove(user_id)
            .map(|months| months.into_values().flatten().collect())
            .unwrap_or_default()
    }
}
