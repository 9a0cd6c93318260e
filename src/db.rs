// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Document store backing the sync gateway.
//!
//! Documents are JSON objects grouped into named collections and partitioned
//! by the owning user's id. Writers notify every watch registered for the
//! written partition; watches receive a bare ping and re-read the data they
//! care about.

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pennywise", "pennywise"));

pub const ACCOUNTS: &str = "accounts";
pub const TRANSACTIONS: &str = "transactions";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed document {collection}/{id}: {source}")]
    Document {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("document body must be a JSON object")]
    NotAnObject,

    #[error("could not determine platform-specific data dir")]
    NoDataDir,

    #[error("failed to create data dir {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document: its key plus the JSON body (without `userId`).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

pub type WatchId = u64;

/// User-partitioned document collections with change notification.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its generated id.
    fn insert(&self, collection: &str, user_id: &str, body: Value) -> StoreResult<String>;

    /// Merge the top-level fields of `patch` into a document owned by
    /// `user_id`. Documents in other partitions count as missing.
    fn update(&self, collection: &str, user_id: &str, id: &str, patch: Value) -> StoreResult<()>;

    /// Remove a document owned by `user_id`. Removing a missing document, or
    /// one in another partition, succeeds and changes nothing.
    fn delete(&self, collection: &str, user_id: &str, id: &str) -> StoreResult<()>;

    /// All documents of `collection` owned by `user_id`, in insertion order.
    fn query(&self, collection: &str, user_id: &str) -> StoreResult<Vec<Document>>;

    /// Register a watch on `user_id`'s partition. An initial ping is sent
    /// immediately; later pings follow every write to the partition.
    fn watch(&self, user_id: &str, ping: Sender<()>) -> StoreResult<WatchId>;

    fn unwatch(&self, id: WatchId);

    /// Notify watches about writes made by other connections since the last
    /// poll. Returns whether anything changed.
    fn poll_external(&self) -> StoreResult<bool>;
}

pub fn db_path() -> StoreResult<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2).ok_or(StoreError::NoDataDir)?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).map_err(|source| StoreError::DataDir {
        path: data_dir.to_path_buf(),
        source,
    })?;
    Ok(data_dir.join("pennywise.sqlite"))
}

struct Watch {
    id: WatchId,
    user_id: String,
    ping: Sender<()>,
}

#[derive(Default)]
struct Watches {
    next_id: WatchId,
    list: Vec<Watch>,
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    watches: Mutex<Watches>,
    data_version: Mutex<i64>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened document store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        let version = data_version(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            watches: Mutex::new(Watches::default()),
            data_version: Mutex::new(version),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }


    /// Ping watches on `user_id`, or on every partition when `None`.
    fn notify(&self, user_id: Option<&str>) {
        let Ok(mut watches) = self.watches.lock() else {
            return;
        };
        watches.list.retain(|w| {
            if user_id.is_some_and(|u| u != w.user_id) {
                return true;
            }
            // a closed receiver means the subscriber went away
            w.ping.send(()).is_ok()
        });
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS documents(
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(collection, id)
    );
    CREATE INDEX IF NOT EXISTS idx_documents_partition ON documents(collection, user_id);
    "#,
    )?;
    Ok(())
}

// Changes only when another connection commits.
fn data_version(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("PRAGMA data_version", [], |r| r.get(0))?)
}

fn parse_body(collection: &str, id: &str, raw: &str) -> StoreResult<Value> {
    serde_json::from_str(raw).map_err(|source| StoreError::Document {
        collection: collection.to_string(),
        id: id.to_string(),
        source,
    })
}

impl DocumentStore for SqliteStore {
    fn insert(&self, collection: &str, user_id: &str, body: Value) -> StoreResult<String> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO documents(collection, id, user_id, body) VALUES (?1, ?2, ?3, ?4)",
                params![collection, id, user_id, body.to_string()],
            )?;
        }
        tracing::debug!(collection, %id, "inserted document");
        self.notify(Some(user_id));
        Ok(id)
    }

    fn update(&self, collection: &str, user_id: &str, id: &str, patch: Value) -> StoreResult<()> {
        let Value::Object(fields) = patch else {
            return Err(StoreError::NotAnObject);
        };
        {
            let conn = self.conn()?;
            let raw: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection=?1 AND id=?2 AND user_id=?3",
                    params![collection, id, user_id],
                    |r| r.get(0),
                )
                .optional()?;
            let Some(raw) = raw else {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            };
            let mut body = match parse_body(collection, id, &raw)? {
                Value::Object(m) => m,
                _ => Map::new(),
            };
            for (k, v) in fields {
                body.insert(k, v);
            }
            conn.execute(
                "UPDATE documents SET body=?3, updated_at=datetime('now') WHERE collection=?1 AND id=?2",
                params![collection, id, Value::Object(body).to_string()],
            )?;
        }
        tracing::debug!(collection, id, "updated document");
        self.notify(Some(user_id));
        Ok(())
    }

    fn delete(&self, collection: &str, user_id: &str, id: &str) -> StoreResult<()> {
        let removed = {
            let conn = self.conn()?;
            conn.execute(
                "DELETE FROM documents WHERE collection=?1 AND id=?2 AND user_id=?3",
                params![collection, id, user_id],
            )?
        };
        if removed == 0 {
            tracing::debug!(collection, id, "delete of missing document ignored");
        } else {
            tracing::debug!(collection, id, "deleted document");
            self.notify(Some(user_id));
        }
        Ok(())
    }

    fn query(&self, collection: &str, user_id: &str) -> StoreResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents WHERE collection=?1 AND user_id=?2 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![collection, user_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, raw) = row?;
            let body = parse_body(collection, &id, &raw)?;
            out.push(Document { id, body });
        }
        Ok(out)
    }

    fn watch(&self, user_id: &str, ping: Sender<()>) -> StoreResult<WatchId> {
        let mut watches = self.watches.lock().map_err(|_| StoreError::Poisoned)?;
        watches.next_id += 1;
        let id = watches.next_id;
        // receiver is still in the caller's hands, so this cannot fail
        let _ = ping.send(());
        watches.list.push(Watch {
            id,
            user_id: user_id.to_string(),
            ping,
        });
        tracing::debug!(watch = id, user_id, "registered watch");
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        if let Ok(mut watches) = self.watches.lock() {
            watches.list.retain(|w| w.id != id);
            tracing::debug!(watch = id, "released watch");
        }
    }

    fn poll_external(&self) -> StoreResult<bool> {
        let v = {
            let conn = self.conn()?;
            data_version(&conn)?
        };
        let changed = {
            let mut cur = self.data_version.lock().map_err(|_| StoreError::Poisoned)?;
            let changed = *cur != v;
            *cur = v;
            changed
        };
        if changed {
            tracing::debug!("external write detected");
            self.notify(None);
        }
        Ok(changed)
    }
}
