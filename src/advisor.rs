// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Financial advice from a hosted text-generation model.
//!
//! [`Advisor::get_advice`] always yields text: a missing key or any failure
//! along the way turns into one of the fallback messages below.

use crate::aggregate::recent_transactions;
use crate::models::{category_name, Account, Category, Transaction};
use crate::utils::http_client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Transactions included in a prompt, newest first.
pub const PROMPT_TRANSACTIONS: usize = 50;

pub const NOT_CONFIGURED: &str =
    "AI advice is not configured. Set PENNYWISE_API_KEY (or pass --api-key) to get suggestions.";
pub const EMPTY_RESPONSE: &str = "The AI could not generate advice right now. Please try again later.";
pub const CALL_FAILED: &str = "An error occurred while calling the AI service.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct Advisor {
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl Advisor {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn get_advice(
        &self,
        transactions: &[Transaction],
        accounts: &[Account],
        categories: &[Category],
    ) -> String {
        let Some(key) = self.api_key.as_deref() else {
            tracing::info!("advice requested without an API key");
            return NOT_CONFIGURED.to_string();
        };
        let prompt = build_prompt(transactions, accounts, categories);
        match self.generate(key, &prompt) {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_RESPONSE.to_string(),
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "text generation call failed");
                CALL_FAILED.to_string()
            }
        }
    }

    fn generate(&self, key: &str, prompt: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting advice");
        let client = http_client(REQUEST_TIMEOUT)?;
        let resp = client
            .post(url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()?
            .error_for_status()?;
        let parsed: GenerateResponse = resp.json()?;
        Ok(response_text(&parsed))
    }
}

/// Prompt text: account balances plus the most recent transactions.
pub fn build_prompt(
    transactions: &[Transaction],
    accounts: &[Account],
    categories: &[Category],
) -> String {
    let summary = recent_transactions(transactions, PROMPT_TRANSACTIONS)
        .iter()
        .map(|t| {
            format!(
                "{}: {}{} ({}) - {}",
                t.date,
                t.kind.sign(),
                t.amount,
                category_name(categories, &t.category_id),
                t.note
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let balances = accounts
        .iter()
        .map(|a| format!("{}: {}", a.name, a.balance))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a professional personal finance advisor. Based on the records below, give 3 specific suggestions.\n\
         \n\
         Account balances: {balances}\n\
         Recent records (latest {PROMPT_TRANSACTIONS}):\n\
         {summary}\n\
         \n\
         Reply with exactly 3 concise bullet points."
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Text of the first candidate, `None` when it is empty.
pub fn response_text(resp: &GenerateResponse) -> Option<String> {
    let text: String = resp
        .candidates
        .first()?
        .content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}
