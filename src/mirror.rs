// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Local mirror of one user's transactions and categories.
//!
//! A [`Mirror`] holds two live queries against a [`DocumentStore`] while a
//! session is active. Each delivery carries the complete current result set,
//! so the snapshot is rebuilt from scratch every time and the last delivery
//! wins. After each rebuild the aggregates are recomputed and every
//! registered [`ViewNotifier`] is handed the new state.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde_json::Value;

use crate::aggregate::Aggregates;
use crate::error::{SessionError, StoreError, WriteError};
use crate::filter::TransactionFilter;
use crate::models::{self, Category, NewTransaction, Transaction};
use crate::notify::ViewNotifier;
use crate::store::{Document, DocumentStore, Filter, Subscription};

const OWNER_FIELD: &str = "uid";

pub const DEFAULT_CATEGORY_MESSAGE: &str = "Cannot delete default categories.";

/// What `start_session` does when another user's session is still active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Refuse with [`SessionError::AlreadyActive`]; the caller must stop the
    /// old session first.
    Reject,
    /// Tear the old session down, then start the new one.
    #[default]
    Replace,
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(SessionPolicy::Reject),
            "replace" => Ok(SessionPolicy::Replace),
            other => Err(format!("Unknown session policy '{}' (use reject|replace)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The category was a built-in default; nothing was deleted.
    DefaultCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Transactions,
    Categories,
}

impl Feed {
    fn collection(self) -> &'static str {
        match self {
            Feed::Transactions => models::TRANSACTIONS,
            Feed::Categories => models::CATEGORIES,
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Feed::Transactions => "Failed to load transactions. Please refresh the page.",
            Feed::Categories => "Failed to load categories. Please refresh the page.",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

struct Session {
    user_id: String,
    generation: u64,
    subscriptions: Vec<Subscription>,
    transactions_alerted: bool,
    categories_alerted: bool,
}

impl Session {
    fn alerted(&mut self, feed: Feed) -> &mut bool {
        match feed {
            Feed::Transactions => &mut self.transactions_alerted,
            Feed::Categories => &mut self.categories_alerted,
        }
    }
}

struct State {
    generation: u64,
    session: Option<Session>,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    aggregates: Aggregates,
}

impl State {
    /// The active session, if `generation` still belongs to it.
    fn current(&mut self, generation: u64) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|s| s.generation == generation)
    }
}

/// State shared with the subscription callbacks, which only hold a `Weak`.
struct Shared {
    state: RefCell<State>,
    views: RefCell<Vec<Rc<dyn ViewNotifier>>>,
    today: fn() -> NaiveDate,
}

impl Shared {
    fn views(&self) -> Vec<Rc<dyn ViewNotifier>> {
        self.views.borrow().clone()
    }

    fn deliver(&self, feed: Feed, generation: u64, docs: Vec<Document>) {
        match feed {
            Feed::Transactions => self.rebuild_transactions(generation, docs),
            Feed::Categories => self.rebuild_categories(generation, docs),
        }
    }

    fn rebuild_transactions(&self, generation: u64, docs: Vec<Document>) {
        let (transactions, aggregates) = {
            let mut st = self.state.borrow_mut();
            if st.current(generation).is_none() {
                tracing::debug!(generation, "dropping stale transactions delivery");
                return;
            }
            let mut transactions: Vec<Transaction> = decode_all(Feed::Transactions, docs);
            // stable: same-day entries keep the store's delivery order
            transactions.sort_by(|a, b| b.date.cmp(&a.date));
            tracing::info!("Loaded {} transactions", transactions.len());
            st.aggregates = Aggregates::compute(&transactions, (self.today)());
            st.transactions = transactions;
            (st.transactions.clone(), st.aggregates.clone())
        };
        for view in self.views() {
            view.render(&aggregates, &transactions);
        }
    }

    fn rebuild_categories(&self, generation: u64, docs: Vec<Document>) {
        let display = {
            let mut st = self.state.borrow_mut();
            if st.current(generation).is_none() {
                tracing::debug!(generation, "dropping stale categories delivery");
                return;
            }
            st.categories = decode_all(Feed::Categories, docs);
            tracing::info!("Loaded {} categories", st.categories.len());
            models::display_categories(&st.categories)
        };
        for view in self.views() {
            view.render_categories(&display);
        }
    }

    /// Keeps the last good snapshot and tells the user once per feed and
    /// session.
    fn fail(&self, feed: Feed, generation: u64, err: &StoreError) {
        tracing::error!(%feed, "live query failed: {err}");
        let first = {
            let mut st = self.state.borrow_mut();
            match st.current(generation) {
                Some(session) => !std::mem::replace(session.alerted(feed), true),
                None => false,
            }
        };
        if first {
            self.alert(feed.failure_message());
        }
    }

    fn alert(&self, message: &str) {
        for view in self.views() {
            view.alert(message);
        }
    }
}

fn decode_all<T: DeserializeOwned>(feed: Feed, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            match serde_json::from_value(Value::Object(doc)) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(%feed, %id, "skipping malformed document: {err}");
                    None
                }
            }
        })
        .collect()
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Document(serde_json::Error::custom(
            "expected a JSON object",
        ))),
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub struct Mirror<S: DocumentStore> {
    store: Rc<S>,
    policy: SessionPolicy,
    shared: Rc<Shared>,
}

impl<S: DocumentStore> Mirror<S> {
    pub fn new(store: Rc<S>, policy: SessionPolicy) -> Self {
        Self::with_clock(store, policy, local_today)
    }

    /// Like [`new`](Self::new), with `today` deciding which month the
    /// dashboard treats as current.
    pub fn with_clock(store: Rc<S>, policy: SessionPolicy, today: fn() -> NaiveDate) -> Self {
        let state = State {
            generation: 0,
            session: None,
            transactions: Vec::new(),
            categories: Vec::new(),
            aggregates: Aggregates::compute(&[], today()),
        };
        Self {
            store,
            policy,
            shared: Rc::new(Shared {
                state: RefCell::new(state),
                views: RefCell::new(Vec::new()),
                today,
            }),
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Registers a view to be pushed every update from now on.
    pub fn subscribe(&self, view: Rc<dyn ViewNotifier>) {
        self.shared.views.borrow_mut().push(view);
    }

    pub fn active_user(&self) -> Option<String> {
        self.shared
            .state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.user_id.clone())
    }

    /// Opens the transaction and category live queries for `user_id`.
    ///
    /// Starting the session that is already active does nothing. Starting a
    /// session for someone else is refused or replaces the old one, depending
    /// on the [`SessionPolicy`].
    pub fn start_session(&self, user_id: &str) -> Result<(), SessionError> {
        if let Some(active) = self.active_user() {
            if active == user_id {
                tracing::debug!(user = %user_id, "session already active");
                return Ok(());
            }
            match self.policy {
                SessionPolicy::Reject => {
                    tracing::warn!(active = %active, requested = %user_id, "session start refused");
                    return Err(SessionError::AlreadyActive { active });
                }
                SessionPolicy::Replace => self.stop_session(),
            }
        }

        let generation = {
            let mut st = self.shared.state.borrow_mut();
            st.generation += 1;
            let generation = st.generation;
            st.session = Some(Session {
                user_id: user_id.to_string(),
                generation,
                subscriptions: Vec::new(),
                transactions_alerted: false,
                categories_alerted: false,
            });
            generation
        };
        tracing::info!(user = %user_id, generation, "session started");

        let subscriptions = vec![
            self.listen(Feed::Transactions, user_id, generation),
            self.listen(Feed::Categories, user_id, generation),
        ];
        let mut st = self.shared.state.borrow_mut();
        if let Some(session) = st.current(generation) {
            session.subscriptions = subscriptions;
        }
        Ok(())
    }

    fn listen(&self, feed: Feed, user_id: &str, generation: u64) -> Subscription {
        let shared: Weak<Shared> = Rc::downgrade(&self.shared);
        let on_change = Box::new(move |docs: Vec<Document>| {
            if let Some(shared) = shared.upgrade() {
                shared.deliver(feed, generation, docs);
            }
        });
        let shared: Weak<Shared> = Rc::downgrade(&self.shared);
        let on_error = Box::new(move |err: &StoreError| {
            if let Some(shared) = shared.upgrade() {
                shared.fail(feed, generation, err);
            }
        });
        self.store.subscribe(
            feed.collection(),
            Filter::eq(OWNER_FIELD, user_id),
            on_change,
            on_error,
        )
    }

    /// Cancels both live queries and forgets the user's data. Safe to call
    /// with no session active.
    pub fn stop_session(&self) {
        let session = {
            let mut st = self.shared.state.borrow_mut();
            let session = st.session.take();
            st.transactions.clear();
            st.categories.clear();
            st.aggregates = Aggregates::compute(&[], (self.shared.today)());
            session
        };
        if let Some(session) = session {
            for subscription in session.subscriptions {
                subscription.cancel();
            }
            tracing::info!(user = %session.user_id, "session stopped");
        }
    }

    /// Newest first.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.shared.state.borrow().transactions.clone()
    }

    /// The user's stored categories, without defaults.
    pub fn categories(&self) -> Vec<Category> {
        self.shared.state.borrow().categories.clone()
    }

    pub fn display_categories(&self) -> Vec<Category> {
        models::display_categories(&self.shared.state.borrow().categories)
    }

    pub fn aggregates(&self) -> Aggregates {
        self.shared.state.borrow().aggregates.clone()
    }

    pub fn filtered(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        filter.apply(&self.shared.state.borrow().transactions)
    }

    /// Filters the snapshot and pushes the result to every view.
    pub fn apply_filter(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        let filtered = self.filtered(filter);
        for view in self.shared.views() {
            view.render_filtered(&filtered);
        }
        filtered
    }

    /// Stores a new transaction owned by `user_id` and returns its id.
    pub fn add_transaction(&self, user_id: &str, tx: &NewTransaction) -> Result<String, WriteError> {
        const OP: &str = "add transaction";
        let mut fields = to_document(tx).map_err(|e| write_failed(OP, e))?;
        fields.insert(OWNER_FIELD.to_string(), Value::String(user_id.to_string()));
        self.store
            .add(models::TRANSACTIONS, fields)
            .map_err(|e| write_failed(OP, e))
    }

    /// Deletes one of the active user's transactions. Ids outside the
    /// current snapshot are refused without touching the store.
    pub fn remove_transaction(&self, id: &str) -> Result<(), WriteError> {
        const OP: &str = "delete transaction";
        let owned = {
            let st = self.shared.state.borrow();
            st.session.is_some() && st.transactions.iter().any(|t| t.id.as_deref() == Some(id))
        };
        if !owned {
            return Err(write_failed(OP, not_found(models::TRANSACTIONS, id)));
        }
        self.store
            .delete(models::TRANSACTIONS, id)
            .map_err(|e| write_failed(OP, e))
    }

    pub fn add_category(&self, user_id: &str, name: &str) -> Result<String, WriteError> {
        const OP: &str = "add category";
        let category = Category {
            id: None,
            uid: user_id.to_string(),
            name: name.to_string(),
            created_at: None,
        };
        let fields = to_document(&category).map_err(|e| write_failed(OP, e))?;
        self.store
            .add(models::CATEGORIES, fields)
            .map_err(|e| write_failed(OP, e))
    }

    /// Deletes a stored category. Built-in defaults have no id and are left
    /// alone; the views get told why.
    pub fn remove_category(&self, category: &Category) -> Result<RemoveOutcome, WriteError> {
        const OP: &str = "delete category";
        let Some(id) = category.id.as_deref() else {
            self.shared.alert(DEFAULT_CATEGORY_MESSAGE);
            return Ok(RemoveOutcome::DefaultCategory);
        };
        let owned = {
            let st = self.shared.state.borrow();
            st.session.is_some() && st.categories.iter().any(|c| c.id.as_deref() == Some(id))
        };
        if !owned {
            return Err(write_failed(OP, not_found(models::CATEGORIES, id)));
        }
        self.store
            .delete(models::CATEGORIES, id)
            .map_err(|e| write_failed(OP, e))?;
        Ok(RemoveOutcome::Removed)
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn write_failed(op: &'static str, reason: StoreError) -> WriteError {
    tracing::error!("Error during {op}: {reason}");
    WriteError::new(op, reason)
}
