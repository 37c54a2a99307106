use std::io;

use uuid::Uuid;

use crate::{
    MonthKey, RecordKind, RecordStore, ResultEngine,
    store::{IssuedIds, MonthMap},
};

mod budgets;
mod exchanges;
mod expenses;
mod incomes;
mod reports;

/// Business rules over the record collections of a [`RecordStore`].
///
/// Every operation is scoped to a user id; registrations receive the
/// wall-clock `now` of the caller, which decides the month key.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
}

impl<S: RecordStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Hands out a fresh record id for `user_id` and remembers it for good.
    ///
    /// `live` reports ids held by records written before issued ids were kept.
    fn issue_id(&self, user_id: &str, live: impl Fn(&str) -> bool) -> ResultEngine<String> {
        self.issue_id_from(user_id, live, random_ids())
    }

    fn issue_id_from(
        &self,
        user_id: &str,
        live: impl Fn(&str) -> bool,
        candidates: impl IntoIterator<Item = String>,
    ) -> ResultEngine<String> {
        self.store.update(RecordKind::IssuedIds, |issued: &mut IssuedIds| {
            let ids = issued.entry(user_id.to_string()).or_default();
            let id = candidates
                .into_iter()
                .find(|candidate| !ids.contains(candidate) && !live(candidate))
                .ok_or_else(|| io::Error::other("no record id left to issue"))?;
            ids.insert(id.clone());
            Ok(id)
        })
    }
}

/// Endless 8 hex digit candidates.
fn random_ids() -> impl Iterator<Item = String> {
    std::iter::repeat_with(|| {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    })
}

/// Records of `month`, or an empty slice.
fn month_records<'a, T>(months: Option<&'a MonthMap<Vec<T>>>, month: &MonthKey) -> &'a [T] {
    months
        .and_then(|months| months.get(month))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, NewExpense};
    use chrono::NaiveDateTime;

    fn candidates(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn record_ids_are_eight_hex_digits() {
        let ledger = Ledger::new(MemoryStore::new());
        let id = ledger.issue_id("1", |_| false).unwrap();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn deleted_ids_are_not_issued_again() {
        let ledger = Ledger::new(MemoryStore::new());
        let now = NaiveDateTime::parse_from_str("2025-11-01 10:00:00", crate::TIMESTAMP_FORMAT).unwrap();
        let expense = ledger
            .register_expense(
                "1",
                now,
                NewExpense {
                    amount_local: 100.0,
                    rate: Some(10.0),
                    ..NewExpense::default()
                },
            )
            .unwrap();
        assert!(ledger.delete_expense("1", &expense.id).unwrap());

        let next = ledger
            .issue_id_from("1", |_| false, candidates(&[&expense.id, "0000beef"]))
            .unwrap();
        assert_eq!(next, "0000beef");
    }

    #[test]
    fn ids_are_tracked_per_user() {
        let ledger = Ledger::new(MemoryStore::new());
        let first = ledger.issue_id_from("1", |_| false, candidates(&["abcd0001"])).unwrap();
        let other = ledger.issue_id_from("2", |_| false, candidates(&["abcd0001"])).unwrap();
        assert_eq!(first, other);
    }

    #[test]
    fn live_ids_and_exhausted_candidates() {
        let ledger = Ledger::new(MemoryStore::new());
        let id = ledger
            .issue_id_from("1", |c| c == "abcd0001", candidates(&["abcd0001", "abcd0002"]))
            .unwrap();
        assert_eq!(id, "abcd0002");

        let result = ledger.issue_id_from("1", |_| false, candidates(&["abcd0002"]));
        assert!(matches!(result, Err(crate::EngineError::Storage(_))));
    }
}
