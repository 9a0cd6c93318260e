// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Process configuration: store descriptor, signed-in user, advisory key.
//!
//! Values come from global CLI flags, each of which falls back to an
//! environment variable (see `cli::build_cli`).

use crate::advisor::{Advisor, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::db::{self, SqliteStore};
use crate::gateway::{Backend, SyncGateway};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Parsed store connection descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Nothing configured: fixture mode.
    Absent,
    InMemory,
    File(PathBuf),
    DataDir,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Descriptor {
    path: Option<String>,
    #[serde(default)]
    data_dir: bool,
}

impl StoreConfig {
    /// Parse a JSON descriptor. Only blank input and a literal `{}` mean
    /// "no store"; any other object must name one.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::Absent);
        };
        let value: Value = serde_json::from_str(raw)
            .with_context(|| format!("Invalid store descriptor '{}'", raw))?;
        if value.as_object().is_some_and(|m| m.is_empty()) {
            return Ok(Self::Absent);
        }
        let d: Descriptor = serde_json::from_value(value)
            .with_context(|| format!("Invalid store descriptor '{}'", raw))?;
        match (d.path.as_deref().map(str::trim), d.data_dir) {
            (None, false) => bail!("Store descriptor names neither 'path' nor 'dataDir': '{}'", raw),
            (Some(_), true) => bail!("Store descriptor sets both 'path' and 'dataDir'"),
            (Some(""), false) => bail!("Store descriptor has an empty 'path'"),
            (Some(":memory:"), false) => Ok(Self::InMemory),
            (Some(p), false) => Ok(Self::File(PathBuf::from(p))),
            (None, true) => Ok(Self::DataDir),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreConfig,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub ai_endpoint: String,
    pub ai_model: String,
}

impl Settings {
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let opt = |name: &str| {
            m.get_one::<String>(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Ok(Self {
            store: StoreConfig::parse(m.get_one::<String>("store").map(|s| s.as_str()))?,
            user_id: opt("user"),
            email: opt("email"),
            api_key: opt("api-key"),
            ai_endpoint: opt("ai-endpoint").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ai_model: opt("ai-model").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn gateway(&self) -> Result<SyncGateway> {
        let store = match &self.store {
            StoreConfig::Absent => return Ok(SyncGateway::fixture()),
            StoreConfig::InMemory => SqliteStore::open_in_memory()?,
            StoreConfig::File(path) => SqliteStore::open(path)
                .with_context(|| format!("Open store at {}", path.display()))?,
            StoreConfig::DataDir => {
                let path = db::db_path()?;
                SqliteStore::open(&path).with_context(|| format!("Open store at {}", path.display()))?
            }
        };
        Ok(SyncGateway::new(Backend::Remote(Arc::new(store))))
    }

    /// Signed-in user. Fixture mode runs under a placeholder identity.
    pub fn session(&self) -> Result<Session> {
        match (&self.user_id, self.store.is_absent()) {
            (Some(u), _) => Ok(Session {
                user_id: u.clone(),
                email: self.email.clone(),
            }),
            (None, true) => Ok(Session {
                user_id: "demo".to_string(),
                email: None,
            }),
            (None, false) => bail!("Sign-in required: pass --user or set PENNYWISE_USER"),
        }
    }

    pub fn advisor(&self) -> Advisor {
        Advisor::new(self.api_key.clone())
            .with_endpoint(self.ai_endpoint.clone())
            .with_model(self.ai_model.clone())
    }
}
