// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The document store the mirror talks to.
//!
//! [`DocumentStore`] is the whole contract: live queries that re-deliver the
//! complete matching set after every change, plus add and delete.
//! [`SqliteStore`] implements it on a local SQLite file.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::utils::random_id;

/// A stored document: its fields plus an `"id"` entry.
pub type Document = Map<String, Value>;

pub type OnChange = Box<dyn FnMut(Vec<Document>)>;
pub type OnError = Box<dyn FnMut(&StoreError)>;

const ID_LEN: usize = 20;

/// Server-assigned creation time, stamped on every added document.
pub const CREATED_AT: &str = "createdAt";

/// Matches documents whose top-level string field equals a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn eq(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// Handle to a live query. Cancelling (or dropping) it stops deliveries.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub trait DocumentStore {
    /// Starts a live query over `collection`. `on_change` receives the full
    /// matching set, once right away and again after every change to the
    /// collection; `on_error` is called instead when a delivery fails.
    ///
    /// Callbacks run on the caller's thread. A write made from inside a
    /// callback is delivered after the current round of deliveries.
    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        on_change: OnChange,
        on_error: OnError,
    ) -> Subscription;

    /// Stores `fields` as a new document and returns the id assigned to it.
    fn add(&self, collection: &str, fields: Document) -> Result<String, StoreError>;

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

struct Listener {
    key: u64,
    collection: String,
    filter: Filter,
    on_change: OnChange,
    on_error: OnError,
}

#[derive(Default)]
struct Registry {
    next_key: u64,
    listeners: Vec<Listener>,
    /// Keys cancelled while their listener was out of `listeners` being run.
    cancelled: HashSet<u64>,
    /// Collections written since their listeners last ran.
    pending: Vec<String>,
    notifying: bool,
}

impl Registry {
    fn cancel(&mut self, key: u64) {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.key != key);
        if self.listeners.len() == before {
            self.cancelled.insert(key);
        }
    }
}

pub struct SqliteStore {
    conn: Connection,
    registry: Rc<RefCell<Registry>>,
}

impl SqliteStore {
    /// Wraps a connection whose schema is already in place
    /// (see [`crate::db::init_schema`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body FROM documents
             WHERE collection=?1 AND json_extract(body, ?2)=?3
             ORDER BY rowid",
        )?;
        let path = format!("$.{}", filter.field);
        let rows = stmt.query_map(params![collection, path, filter.value], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let mut doc: Document = serde_json::from_str(&body)?;
            doc.insert("id".to_string(), Value::String(id));
            docs.push(doc);
        }
        Ok(docs)
    }

    fn deliver(&self, listener: &mut Listener) {
        match self.query(&listener.collection, &listener.filter) {
            Ok(docs) => (listener.on_change)(docs),
            Err(err) => (listener.on_error)(&err),
        }
    }

    /// Re-runs every live query on `collection`. Called again while
    /// listeners are running, it queues the collection for the outer call.
    fn notify(&self, collection: &str) {
        {
            let mut reg = self.registry.borrow_mut();
            if !reg.pending.iter().any(|c| c == collection) {
                reg.pending.push(collection.to_string());
            }
            if reg.notifying {
                tracing::debug!(collection, "write from a listener, delivery deferred");
                return;
            }
            reg.notifying = true;
        }
        loop {
            let next = {
                let mut reg = self.registry.borrow_mut();
                if reg.pending.is_empty() {
                    reg.notifying = false;
                    return;
                }
                reg.pending.remove(0)
            };
            self.run_listeners(&next);
        }
    }

    fn run_listeners(&self, collection: &str) {
        let mut running = std::mem::take(&mut self.registry.borrow_mut().listeners);
        for listener in running.iter_mut().filter(|l| l.collection == collection) {
            if self.registry.borrow().cancelled.contains(&listener.key) {
                continue;
            }
            self.deliver(listener);
        }
        let mut reg = self.registry.borrow_mut();
        running.append(&mut reg.listeners);
        let cancelled = std::mem::take(&mut reg.cancelled);
        running.retain(|l| !cancelled.contains(&l.key));
        reg.listeners = running;
    }
}

impl DocumentStore for SqliteStore {
    fn subscribe(
        &self,
        collection: &str,
        filter: Filter,
        on_change: OnChange,
        on_error: OnError,
    ) -> Subscription {
        let mut listener = Listener {
            key: 0,
            collection: collection.to_string(),
            filter,
            on_change,
            on_error,
        };
        {
            let mut reg = self.registry.borrow_mut();
            listener.key = reg.next_key;
            reg.next_key += 1;
        }
        let key = listener.key;
        self.deliver(&mut listener);

        let mut reg = self.registry.borrow_mut();
        if !reg.cancelled.remove(&key) {
            reg.listeners.push(listener);
        }
        drop(reg);

        let registry = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().cancel(key);
            }
        })
    }

    fn add(&self, collection: &str, mut fields: Document) -> Result<String, StoreError> {
        fields.remove("id");
        fields.insert(
            CREATED_AT.to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        let id = random_id(ID_LEN);
        let body = serde_json::to_string(&fields)?;
        self.conn.execute(
            "INSERT INTO documents(id, collection, body) VALUES (?1, ?2, ?3)",
            params![id, collection, body],
        )?;
        tracing::debug!(collection, %id, "document added");
        self.notify(collection);
        Ok(id)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection=?1 AND id=?2",
            params![collection, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        tracing::debug!(collection, %id, "document deleted");
        self.notify(collection);
        Ok(())
    }
}
