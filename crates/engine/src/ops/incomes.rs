use chrono::NaiveDateTime;

use crate::{
    Income, MonthKey, RecordKind, RecordStore, ResultEngine,
    money::{USDT_DECIMALS, ensure_positive, round_to, usable_rate},
    store::Incomes,
};

use super::Ledger;

impl<S: RecordStore> Ledger<S> {
    /// Set (or overwrite) the income of the month containing `now`.
    ///
    /// Without a usable rate the income is kept with a USDT equivalent of 0
    /// and a rate of 0.
    pub fn register_income(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        amount_local: f64,
        rate: Option<f64>,
    ) -> ResultEngine<Income> {
        let amount = ensure_positive(amount_local)?;
        let rate = usable_rate(rate);
        if rate.is_none() {
            tracing::warn!("income of {user_id} registered without a usable rate");
        }

        let income = Income {
            local_amount: amount,
            usdt_amount: rate.map_or(0.0, |rate| round_to(amount / rate, USDT_DECIMALS)),
            rate_used: rate.unwrap_or(0.0),
            timestamp: now,
        };
        let month = MonthKey::from_datetime(now);
        self.store.update(RecordKind::Incomes, |all: &mut Incomes| {
            all.entry(user_id.to_string())
                .or_default()
                .insert(month.clone(), income.clone());
            Ok(())
        })?;

        tracing::debug!("income of {user_id} set for {month}");
        Ok(income)
    }

    pub fn income(&self, user_id: &str, month: &MonthKey) -> Option<Income> {
        let mut all: Incomes = self.store.load(RecordKind::Incomes);
        all.get_mut(user_id)?.remove(month)
    }
}
