//! Executes classified messages and commands against the ledger and the
//! external providers.

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    Balance, Category, EngineError, Exchange, Expense, Income, Ledger, MonthKey,
    NarrativeComposer, NewExchange, NewExpense, RateProvider, RecordStore, ResultEngine,
    intent::{self, ExchangeAmount, ExchangeRequest, ExpenseDraft, Intent, Topics},
    money::{ensure_positive, usable_rate},
    narrative,
};

/// Outcome of a free-text message.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    ExchangeRecorded {
        exchange: Exchange,
        /// USDT amount as written by the user, for purchases stated in USDT.
        purchased_usdt: Option<f64>,
        balance: Option<Balance>,
    },
    ExpensesRecorded {
        expenses: Vec<Expense>,
        /// Expenses of the same message that could not be saved.
        skipped: usize,
        rate: f64,
        balance: Option<Balance>,
    },
    TodayExpenses {
        date: NaiveDate,
        expenses: Vec<Expense>,
    },
    /// Text produced by the narrative composer.
    Answer(String),
    /// The composer failed on a rate question, but the rate is known.
    OfficialRate(f64),
    /// Nothing matched and no composer is available.
    Help,
}

/// The ledger plus the collaborators it needs to turn messages into records.
#[derive(Debug)]
pub struct Assistant<S, R, C> {
    ledger: Ledger<S>,
    rates: R,
    composer: C,
}

impl<S, R, C> Assistant<S, R, C>
where
    S: RecordStore,
    R: RateProvider,
    C: NarrativeComposer,
{
    pub fn new(ledger: Ledger<S>, rates: R, composer: C) -> Self {
        Self {
            ledger,
            rates,
            composer,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn composer_enabled(&self) -> bool {
        self.composer.is_enabled()
    }

    pub async fn official_rate(&self) -> ResultEngine<f64> {
        match self.rates.official_rate().await {
            Ok(rate) => usable_rate(Some(rate)).ok_or(EngineError::RateUnavailable),
            Err(err) => {
                tracing::warn!("official rate unavailable: {err}");
                Err(EngineError::RateUnavailable)
            }
        }
    }

    pub async fn parallel_rate(&self) -> ResultEngine<f64> {
        match self.rates.parallel_rate().await {
            Ok(rate) => usable_rate(Some(rate)).ok_or(EngineError::RateUnavailable),
            Err(err) => {
                tracing::warn!("parallel rate unavailable: {err}");
                Err(EngineError::RateUnavailable)
            }
        }
    }

    /// Register an expense priced at the current official rate.
    pub async fn record_expense(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        amount_local: f64,
        category: Category,
        description: String,
    ) -> ResultEngine<Expense> {
        ensure_positive(amount_local)?;
        let rate = self.official_rate().await?;
        self.ledger.register_expense(
            user_id,
            now,
            NewExpense {
                amount_local,
                rate: Some(rate),
                category,
                description,
            },
        )
    }

    /// Register an exchange, at the current parallel rate when `rate` is `None`.
    pub async fn record_exchange(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        amount_local: f64,
        rate: Option<f64>,
        description: String,
    ) -> ResultEngine<Exchange> {
        ensure_positive(amount_local)?;
        let rate = match usable_rate(rate) {
            Some(rate) => rate,
            None => self.parallel_rate().await?,
        };
        self.ledger.register_exchange(
            user_id,
            now,
            NewExchange {
                amount_local,
                rate: Some(rate),
                description,
            },
        )
    }

    /// Set the month's income. Without a rate the parallel one is used, then
    /// the official one; with neither the income is kept at a USDT value of 0.
    pub async fn record_income(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        amount_local: f64,
        rate: Option<f64>,
    ) -> ResultEngine<Income> {
        ensure_positive(amount_local)?;
        let rate = match usable_rate(rate) {
            Some(rate) => Some(rate),
            None => match self.parallel_rate().await {
                Ok(rate) => Some(rate),
                Err(_) => self.official_rate().await.ok(),
            },
        };
        self.ledger.register_income(user_id, now, amount_local, rate)
    }

    /// Answer an explicit question through the composer.
    pub async fn ask(&self, user_id: &str, question: &str, now: NaiveDateTime) -> ResultEngine<String> {
        let topics = intent::question_topics(question);
        self.consult(user_id, question, topics, now).await.0
    }

    /// Classify `text` and carry out what it asks for.
    pub async fn handle_text(&self, user_id: &str, text: &str, now: NaiveDateTime) -> ResultEngine<Reply> {
        self.handle_intent(user_id, text, intent::classify(text), now).await
    }

    /// Carry out an already classified `text`.
    pub async fn handle_intent(
        &self,
        user_id: &str,
        text: &str,
        intent: Intent,
        now: NaiveDateTime,
    ) -> ResultEngine<Reply> {
        match intent {
            Intent::Exchange(request) => self.exchange_from_text(user_id, now, request).await,
            Intent::Expenses(drafts) => self.expenses_from_text(user_id, now, drafts).await,
            Intent::TodayExpenses => Ok(Reply::TodayExpenses {
                date: now.date(),
                expenses: self.ledger.find_by_date(user_id, now.date()),
            }),
            Intent::Question(topics) => self.answer(user_id, text, topics, now).await,
        }
    }

    async fn exchange_from_text(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        request: ExchangeRequest,
    ) -> ResultEngine<Reply> {
        let rate = match usable_rate(request.rate) {
            Some(rate) => rate,
            None => self.parallel_rate().await?,
        };
        let (amount_local, purchased_usdt, description) = match request.amount {
            ExchangeAmount::Usdt(usdt) => (usdt * rate, Some(usdt), format!("Compra de {usdt} USDT")),
            ExchangeAmount::Local(local) => (local, None, "Intercambio Bs a USDT".to_string()),
        };

        let exchange = self
            .record_exchange(user_id, now, amount_local, Some(rate), description)
            .await?;
        Ok(Reply::ExchangeRecorded {
            exchange,
            purchased_usdt,
            balance: self
                .ledger
                .available_balance(user_id, &MonthKey::from_datetime(now)),
        })
    }

    /// Every draft is registered on its own: a failing one does not undo the
    /// ones before it.
    async fn expenses_from_text(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        drafts: Vec<ExpenseDraft>,
    ) -> ResultEngine<Reply> {
        let rate = self.official_rate().await?;

        let mut expenses = Vec::with_capacity(drafts.len());
        let mut skipped = 0;
        let mut last_error = None;
        for draft in drafts {
            let new = NewExpense {
                amount_local: draft.amount,
                rate: Some(rate),
                category: draft.category,
                description: draft.description,
            };
            match self.ledger.register_expense(user_id, now, new) {
                Ok(expense) => expenses.push(expense),
                Err(err) => {
                    tracing::warn!("expense of {user_id} skipped: {err}");
                    skipped += 1;
                    last_error = Some(err);
                }
            }
        }

        if expenses.is_empty()
            && let Some(err) = last_error
        {
            return Err(err);
        }
        Ok(Reply::ExpensesRecorded {
            expenses,
            skipped,
            rate,
            balance: self
                .ledger
                .available_balance(user_id, &MonthKey::from_datetime(now)),
        })
    }

    async fn answer(
        &self,
        user_id: &str,
        text: &str,
        topics: Topics,
        now: NaiveDateTime,
    ) -> ResultEngine<Reply> {
        if !self.composer.is_enabled() {
            return Ok(Reply::Help);
        }
        match self.consult(user_id, text, topics, now).await {
            (Ok(answer), _) => Ok(Reply::Answer(answer)),
            (Err(_), Some(rate)) if topics.rates => Ok(Reply::OfficialRate(rate)),
            (Err(err), _) => {
                tracing::warn!("no answer for {user_id}: {err}");
                Ok(Reply::Help)
            }
        }
    }

    /// Runs the composer; also hands back the official rate if it was fetched.
    async fn consult(
        &self,
        user_id: &str,
        question: &str,
        topics: Topics,
        now: NaiveDateTime,
    ) -> (ResultEngine<String>, Option<f64>) {
        let rate = if topics.rates || topics.finances {
            self.official_rate().await.ok()
        } else {
            None
        };
        let finances = topics.finances.then(|| {
            self.ledger
                .financial_context(user_id, &MonthKey::from_datetime(now), rate)
        });
        let context = narrative::context_block(rate.filter(|_| topics.rates), finances.as_ref());

        let answer = match self.composer.generate(question, &context).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => Err(EngineError::ProviderFailure("empty answer".to_string())),
            Err(err) => Err(EngineError::ProviderFailure(err.to_string())),
        };
        (answer, rate)
    }
}
