//! Query documents sent to the nginx collection

use mongodb::bson::{doc, Document};

/// Field the top-IP aggregation stores its per-IP total under
pub const TOTAL_FIELD: &str = "totalRequests";

/// Equality filter over the `method` and `path` fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub method: Option<String>,
    pub path: Option<String>,
}

impl LogFilter {
    pub fn method(method: &str) -> Self {
        Self {
            method: Some(method.to_string()),
            path: None,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(method) = &self.method {
            filter.insert("method", method.as_str());
        }
        if let Some(path) = &self.path {
            filter.insert("path", path.as_str());
        }
        filter
    }
}

/// Group by `ip`, count, sort descending, keep the first `limit`.
///
/// Ties keep whatever order the server's `$sort` yields.
pub fn top_ips(limit: u32) -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$ip", TOTAL_FIELD: { "$sum": 1 } } },
        doc! { "$sort": { TOTAL_FIELD: -1 } },
        doc! { "$limit": i64::from(limit) },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(LogFilter::default().to_document().is_empty());
    }

    #[test]
    fn status_check_filter() {
        let filter = LogFilter::method("GET").with_path("/status");
        assert_eq!(filter.to_document(), doc! { "method": "GET", "path": "/status" });
    }

    #[test]
    fn top_ips_pipeline_stages() {
        let pipeline = top_ips(10);
        assert_eq!(pipeline.len(), 3);
        assert_eq!(
            pipeline[0],
            doc! { "$group": { "_id": "$ip", "totalRequests": { "$sum": 1 } } }
        );
        assert_eq!(pipeline[1], doc! { "$sort": { "totalRequests": -1 } });
        assert_eq!(pipeline[2].get_i64("$limit").unwrap(), 10);
    }
}
