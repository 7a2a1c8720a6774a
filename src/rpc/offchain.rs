// DANS : src/rpc/offchain.rs
// Le JSON off-chain pointé par l'URI des métadonnées (liens sociaux).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};

const SOCIAL_KEYS: [&str; 4] = ["website", "twitter", "telegram", "discord"];

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch_json(&self, uri: &str) -> Result<Value>;
}

/// Récupère le JSON via HTTP, avec un timeout court.
#[derive(Clone)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Impossible de construire le client HTTP")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch_json(&self, uri: &str) -> Result<Value> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .with_context(|| format!("Requête vers {} échouée", uri))?
            .error_for_status()?;
        response
            .json::<Value>()
            .await
            .with_context(|| format!("JSON invalide à {}", uri))
    }
}

/// Documents servis depuis la mémoire (replays hors ligne, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataFetcher {
    documents: HashMap<String, Value>,
}

impl StaticMetadataFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, uri: impl Into<String>, document: Value) -> Self {
        self.documents.insert(uri.into(), document);
        self
    }
}

#[async_trait]
impl MetadataFetcher for StaticMetadataFetcher {
    async fn fetch_json(&self, uri: &str) -> Result<Value> {
        self.documents
            .get(uri)
            .cloned()
            .with_context(|| format!("Aucun document pour {}", uri))
    }
}

/// Un token a des "socials" si une valeur de `extensions` est une chaîne non vide,
/// ou si l'une des clés website / twitter / telegram / discord l'est à la racine.
pub fn has_socials(document: &Value) -> bool {
    let non_empty = |value: &Value| value.as_str().is_some_and(|s| !s.trim().is_empty());

    let in_extensions = document
        .get("extensions")
        .and_then(Value::as_object)
        .is_some_and(|extensions| extensions.values().any(non_empty));

    in_extensions || SOCIAL_KEYS.iter().any(|key| document.get(*key).is_some_and(non_empty))
}
