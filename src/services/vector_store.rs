use crate::models::{Cohort, ExcludedParticipant, Participant};
use crate::services::source::{CohortFetch, ParticipantSource, SourceError};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Vector store client speaking the Qdrant REST API
///
/// Participants are stored as points: the point id is the participant id,
/// the vector is the profile embedding and the payload carries the rest.
/// The client has an explicit lifecycle: call [`connect`](Self::connect)
/// before fetching and [`close`](Self::close) when done.
pub struct VectorStoreClient {
    base_url: String,
    api_key: Option<String>,
    collection: String,
    vector_name: Option<String>,
    page_size: usize,
    client: Client,
    connected: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Debug, Serialize)]
struct ScrollRequest {
    limit: usize,
    offset: Option<Value>,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<StoredPoint>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RetrieveRequest {
    ids: Vec<Value>,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointVector {
    Dense(Vec<f64>),
    Named(HashMap<String, Vec<f64>>),
}

#[derive(Debug, Deserialize)]
struct StoredPoint {
    id: PointId,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    vector: Option<PointVector>,
}

/// Typed view of a participant payload
#[derive(Debug, Deserialize)]
struct ParticipantPayload {
    name: String,
    category: String,
    #[serde(default)]
    q1: Option<f64>,
    #[serde(default)]
    q2: Option<f64>,
    #[serde(default)]
    q3: Option<f64>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

impl VectorStoreClient {
    /// Create a new vector store client
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        collection: String,
        timeout_secs: u64,
        page_size: usize,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            collection,
            vector_name: None,
            page_size: page_size.max(1),
            client,
            connected: AtomicBool::new(false),
        })
    }

    /// Read embeddings from a named vector instead of the default one
    pub fn with_vector_name(mut self, name: impl Into<String>) -> Self {
        self.vector_name = Some(name.into());
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Verify the collection exists and mark the client usable
    pub async fn connect(&self) -> Result<(), SourceError> {
        let url = self.collection_url("");
        tracing::debug!("Connecting to vector store collection: {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::CollectionNotFound(self.collection.clone()));
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        self.connected.store(true, Ordering::Release);
        tracing::info!("Connected to vector store collection '{}'", self.collection);
        Ok(())
    }

    /// Mark the client closed; fetches fail until the next `connect`
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::info!("Closed vector store connection for '{}'", self.collection);
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.base_url,
            urlencoding::encode(&self.collection),
            suffix
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    fn ensure_connected(&self) -> Result<(), SourceError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SourceError::NotConnected)
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, SourceError> {
        let response = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;
        let parsed: ApiResponse<T> = serde_json::from_str(&text)
            .map_err(|e| SourceError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.result)
    }

    fn to_participant(&self, point: StoredPoint) -> Result<Participant, ExcludedParticipant> {
        let id = point.id.to_string();
        let exclude = |reason: String| ExcludedParticipant {
            id: id.clone(),
            reason,
        };

        let payload = point
            .payload
            .ok_or_else(|| exclude("missing payload".to_string()))?;
        let payload: ParticipantPayload = serde_json::from_value(payload)
            .map_err(|e| exclude(format!("invalid payload: {}", e)))?;

        let category = Cohort::from_tag(&payload.category)
            .ok_or_else(|| exclude(format!("unknown category '{}'", payload.category)))?;

        let embedding = match point.vector {
            Some(PointVector::Dense(v)) => v,
            Some(PointVector::Named(mut named)) => {
                let picked = match &self.vector_name {
                    Some(name) => named.remove(name),
                    None if named.len() == 1 => named.into_values().next(),
                    None => None,
                };
                picked.ok_or_else(|| exclude("no usable named vector".to_string()))?
            }
            None => return Err(exclude("missing vector".to_string())),
        };

        Ok(Participant {
            id: id.clone(),
            name: payload.name,
            category,
            embedding,
            q1: payload.q1,
            q2: payload.q2,
            q3: payload.q3,
            metadata: payload.metadata,
        })
    }
}

impl ParticipantSource for VectorStoreClient {
    async fn fetch_all_participants(&self) -> Result<CohortFetch, SourceError> {
        self.ensure_connected()?;

        let url = self.collection_url("/points/scroll");
        let mut fetch = CohortFetch::default();
        let mut offset: Option<Value> = None;

        loop {
            let request = ScrollRequest {
                limit: self.page_size,
                offset: offset.take(),
                with_payload: true,
                with_vector: true,
            };
            let page: ScrollResult = self.post(&url, &request).await?;
            let page_len = page.points.len();

            for point in page.points {
                match self.to_participant(point) {
                    Ok(p) if p.category == Cohort::Seeker => fetch.left.push(p),
                    Ok(p) => fetch.right.push(p),
                    Err(excluded) => {
                        tracing::warn!("Excluding participant {}: {}", excluded.id, excluded.reason);
                        fetch.excluded.push(excluded);
                    }
                }
            }

            match page.next_page_offset {
                Some(next) if !next.is_null() && page_len > 0 => offset = Some(next),
                _ => break,
            }
        }

        tracing::debug!(
            "Fetched {} seekers, {} providers ({} excluded) from '{}'",
            fetch.left.len(),
            fetch.right.len(),
            fetch.excluded.len(),
            self.collection
        );

        Ok(fetch)
    }

    async fn fetch_participants_by_ids(&self, ids: &[String]) -> Result<Vec<Participant>, SourceError> {
        self.ensure_connected()?;

        let request = RetrieveRequest {
            ids: ids
                .iter()
                .map(|id| match id.parse::<u64>() {
                    Ok(n) => Value::from(n),
                    Err(_) => Value::String(id.clone()),
                })
                .collect(),
            with_payload: true,
            with_vector: true,
        };
        let points: Vec<StoredPoint> = self.post(&self.collection_url("/points"), &request).await?;

        let participants = points
            .into_iter()
            .filter_map(|point| match self.to_participant(point) {
                Ok(p) => Some(p),
                Err(excluded) => {
                    tracing::warn!("Skipping participant {}: {}", excluded.id, excluded.reason);
                    None
                }
            })
            .collect();

        Ok(participants)
    }
}

async fn api_error(response: reqwest::Response) -> SourceError {
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Vector store request failed: {} - {}", status, message);
    SourceError::ApiError {
        status: status.as_u16(),
        message,
    }
}
