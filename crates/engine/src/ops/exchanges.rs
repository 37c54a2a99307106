use chrono::NaiveDateTime;

use crate::{
    EngineError, Exchange, MonthKey, NewExchange, RecordKind, RecordStore, ResultEngine,
    money::{USDT_DECIMALS, ensure_positive, round_to, usable_rate},
    store::Exchanges,
};

use super::{Ledger, month_records};

impl<S: RecordStore> Ledger<S> {
    /// Register a purchase of USDT with local currency.
    ///
    /// Exchanges reduce the available balance but never count as expenses.
    pub fn register_exchange(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        new: NewExchange,
    ) -> ResultEngine<Exchange> {
        let amount = ensure_positive(new.amount_local)?;
        let rate = usable_rate(new.rate).ok_or(EngineError::RateUnavailable)?;
        let month = MonthKey::from_datetime(now);

        let existing: Exchanges = self.store.load(RecordKind::Exchanges);
        let id = self.issue_id(user_id, |candidate| {
            existing
                .get(user_id)
                .is_some_and(|months| months.values().flatten().any(|e| e.id == candidate))
        })?;

        let exchange = self
            .store
            .update(RecordKind::Exchanges, |all: &mut Exchanges| {
                let months = all.entry(user_id.to_string()).or_default();
                let exchange = Exchange {
                    id,
                    timestamp: now,
                    local_amount: amount,
                    usdt_amount: round_to(amount / rate, USDT_DECIMALS),
                    rate_used: rate,
                    description: new.description.trim().to_string(),
                };
                months.entry(month.clone()).or_default().push(exchange.clone());
                Ok(exchange)
            })?;

        tracing::debug!("exchange {} registered for {user_id} in {month}", exchange.id);
        Ok(exchange)
    }

    pub fn month_exchanges(&self, user_id: &str, month: &MonthKey) -> Vec<Exchange> {
        let all: Exchanges = self.store.load(RecordKind::Exchanges);
        month_records(all.get(user_id), month).to_vec()
    }

    /// Remove an exchange registered by mistake. Returns `false` when the id is unknown.
    pub fn delete_exchange(&self, user_id: &str, id: &str) -> ResultEngine<bool> {
        let result = self.store.update(RecordKind::Exchanges, |all: &mut Exchanges| {
            let removed = all.get_mut(user_id).is_some_and(|months| {
                months.values_mut().any(|exchanges| {
                    let before = exchanges.len();
                    exchanges.retain(|e| e.id != id);
                    exchanges.len() != before
                })
            });
            if removed {
                Ok(())
            } else {
                Err(EngineError::RecordNotFound(id.to_string()))
            }
        });

        match result {
            Ok(()) => {
                tracing::debug!("exchange {id} of {user_id} deleted");
                Ok(true)
            }
            Err(EngineError::RecordNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
