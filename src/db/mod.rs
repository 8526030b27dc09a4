//! Database module

mod pipeline;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use mongodb::bson::{self, doc, Bson};
use mongodb::{Client, Collection};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

pub use pipeline::LogFilter;

/// One nginx access-log document. Only the fields the report reads are mapped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogRecord {
    pub method: Option<String>,
    pub path: Option<String>,
    pub ip: Option<String>,
}

/// Request total for one client IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpCount {
    pub ip: String,
    pub count: i64,
}

/// Row shape produced by the top-IP pipeline
#[derive(Debug, Deserialize)]
struct IpGroup {
    #[serde(rename = "_id")]
    ip: Bson,
    #[serde(rename = "totalRequests")]
    total_requests: i64,
}

impl From<IpGroup> for IpCount {
    fn from(group: IpGroup) -> Self {
        let ip = match group.ip {
            Bson::String(ip) => ip,
            Bson::Null => "null".to_string(),
            other => other.to_string(),
        };
        Self {
            ip,
            count: group.total_requests,
        }
    }
}

/// Read queries the report is built from
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Number of documents in the collection
    async fn count_all(&self) -> Result<u64>;

    /// Number of documents matching `filter`
    async fn count_matching(&self, filter: &LogFilter) -> Result<u64>;

    /// IPs with the most documents, highest first, at most `limit` of them
    async fn top_ips(&self, limit: u32) -> Result<Vec<IpCount>>;
}

#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<LogRecord>,
}

impl MongoStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.url)
            .await
            .with_context(|| format!("Invalid MongoDB URL {}", config.url))?;

        // The driver connects lazily; ping so an unreachable server fails here
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("Failed to reach MongoDB at {}", config.url))?;
        info!("Connected to MongoDB at {}", config.url);

        let collection = client
            .database(&config.name)
            .collection::<LogRecord>(&config.collection);
        Ok(Self { collection })
    }

    fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }
}

#[async_trait]
impl LogStore for MongoStore {
    async fn count_all(&self) -> Result<u64> {
        debug!("Counting all documents in {}", self.namespace());
        let count = self
            .collection
            .count_documents(doc! {})
            .await
            .with_context(|| format!("Failed to count documents in {}", self.namespace()))?;
        Ok(count)
    }

    async fn count_matching(&self, filter: &LogFilter) -> Result<u64> {
        let filter = filter.to_document();
        debug!("Counting documents in {} matching {}", self.namespace(), filter);
        let count = self
            .collection
            .count_documents(filter.clone())
            .await
            .with_context(|| format!("Failed to count {} in {}", filter, self.namespace()))?;
        Ok(count)
    }

    async fn top_ips(&self, limit: u32) -> Result<Vec<IpCount>> {
        let namespace = self.namespace();
        debug!("Aggregating top {} IPs in {}", limit, namespace);
        let cursor = self
            .collection
            .aggregate(pipeline::top_ips(limit))
            .await
            .with_context(|| format!("Failed to aggregate IPs in {}", namespace))?;

        collect_ip_counts(cursor, &namespace).await
    }
}

/// Drain top-IP aggregation rows into `IpCount`s
async fn collect_ip_counts<S, E>(rows: S, namespace: &str) -> Result<Vec<IpCount>>
where
    S: Stream<Item = std::result::Result<bson::Document, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let groups: Vec<bson::Document> = rows
        .try_collect()
        .await
        .with_context(|| format!("Failed to aggregate IPs in {}", namespace))?;

    groups
        .into_iter()
        .map(|group| -> Result<IpCount> { Ok(bson::from_document::<IpGroup>(group)?.into()) })
        .collect()
}
