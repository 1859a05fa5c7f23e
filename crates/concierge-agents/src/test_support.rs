//! Test doubles for the chat, research and embedding services.
//!
//! `ScriptedChat` picks its reply by looking for marker text in the request,
//! so a single instance can stand in for the classifier, the synthesis call
//! and an agent's model at once. Every request is recorded for assertions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use concierge_data::{ClientPortfolio, DataError, Embedder, PortfolioStore};
use concierge_models::{AgentKind, PortfolioRow};
use rust_decimal::Decimal;

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};
use crate::specialist::SpecialistAgent;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn produce(&self, service: &str) -> Result<String, AgentError> {
        match self {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(AgentError::Service {
                service: service.to_string(),
                status: 503,
                body: message.clone(),
            }),
        }
    }
}

/// A chat model whose replies are chosen by rules on the request text.
///
/// Rules are checked in the order they were added; a rule fires when its
/// marker occurs in the system prompt or the user message.
pub struct ScriptedChat {
    name: String,
    rules: Vec<(String, Reply)>,
    fallback: Option<Reply>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl Default for ScriptedChat {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::named("scripted")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply_when(mut self, marker: &str, reply: &str) -> Self {
        self.rules
            .push((marker.to_string(), Reply::Text(reply.to_string())));
        self
    }

    pub fn fail_when(mut self, marker: &str, message: &str) -> Self {
        self.rules
            .push((marker.to_string(), Reply::Fail(message.to_string())));
        self
    }

    /// Reply used when no rule matches.
    pub fn otherwise(mut self, reply: &str) -> Self {
        self.fallback = Some(Reply::Text(reply.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock().clone()
    }

    /// Recorded requests whose system prompt contains `marker`.
    pub fn requests_matching(&self, marker: &str) -> Vec<ChatRequest> {
        self.lock()
            .iter()
            .filter(|r| r.system.contains(marker))
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        self.lock().push(request.clone());

        let rule = self
            .rules
            .iter()
            .find(|(marker, _)| request.system.contains(marker) || request.user.contains(marker))
            .map(|(_, reply)| reply);

        match rule.or(self.fallback.as_ref()) {
            Some(reply) => reply.produce(&self.name),
            None => Err(AgentError::Parse(format!(
                "{} has no reply for this request",
                self.name
            ))),
        }
    }
}

/// A specialist with a canned answer or failure that counts its calls.
pub struct MockSpecialist {
    kind: AgentKind,
    name: String,
    reply: Reply,
    calls: AtomicUsize,
    questions: Mutex<Vec<String>>,
}

impl MockSpecialist {
    pub fn answering(kind: AgentKind, text: &str) -> Self {
        Self::with_reply(kind, Reply::Text(text.to_string()))
    }

    pub fn failing(kind: AgentKind, message: &str) -> Self {
        Self::with_reply(kind, Reply::Fail(message.to_string()))
    }

    fn with_reply(kind: AgentKind, reply: Reply) -> Self {
        Self {
            kind,
            name: kind.as_str().to_lowercase(),
            reply,
            calls: AtomicUsize::new(0),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl SpecialistAgent for MockSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn answer(&self, question: &str) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.questions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(question.to_string());
        self.reply.produce(&self.name)
    }
}

/// Deterministic bag-of-words embedder: each lowercase word is hashed into
/// one of `dimensions` buckets.
pub struct HashEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

fn row(family: &str, name: &str, class: &str, value: i64, liquidity: &str) -> PortfolioRow {
    PortfolioRow {
        family: family.to_string(),
        asset_name: name.to_string(),
        asset_class: class.to_string(),
        value_usd: Decimal::from(value),
        liquidity: liquidity.to_string(),
    }
}

/// Two families' holdings: Wayne (four rows, $100M) and Lannister (three rows).
pub fn sample_rows() -> Vec<PortfolioRow> {
    vec![
        row("Wayne", "Wayne Manor", "Real Estate", 50_000_000, "Low"),
        row("Wayne", "Wayne Enterprises Stock", "Equity", 30_000_000, "High"),
        row("Wayne", "Cash Reserve", "Cash", 15_000_000, "High"),
        row("Wayne", "Batmobile Fleet", "Collectibles", 5_000_000, "Low"),
        row("Lannister", "Casterly Rock Gold Mine", "Commodities", 80_000_000, "Low"),
        row("Lannister", "Lannister Bank Deposit", "Cash", 20_000_000, "High"),
        row("Lannister", "Iron Bank Bonds", "Fixed Income", 10_000_000, "Medium"),
    ]
}

pub fn sample_store() -> PortfolioStore {
    PortfolioStore::from_rows(sample_rows())
}

pub fn sample_portfolio(client: &str) -> Arc<ClientPortfolio> {
    Arc::new(sample_store().for_client(client))
}
