//! nginx request statistics report

use anyhow::Result;
use std::fmt;
use tracing::info;

use crate::config::ReportConfig;
use crate::db::{IpCount, LogFilter, LogStore};

/// Methods listed under "Methods:", in print order
pub const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub total: u64,
    pub methods: Vec<(&'static str, u64)>,
    pub status_checks: u64,
    pub top_ips: Vec<IpCount>,
}

impl Report {
    /// Run the report queries one after another against `store`.
    ///
    /// Nothing is returned if any query fails.
    pub async fn collect(store: &dyn LogStore, options: &ReportConfig) -> Result<Self> {
        let total = store.count_all().await?;

        let mut methods = Vec::with_capacity(METHODS.len());
        for method in METHODS {
            let count = store.count_matching(&LogFilter::method(method)).await?;
            methods.push((method, count));
        }

        let status_filter = LogFilter::method("GET").with_path(&options.status_path);
        let status_checks = store.count_matching(&status_filter).await?;

        let top_ips = store.top_ips(options.top_ips).await?;

        info!(
            "Report collected: {} logs, {} status checks, {} IPs",
            total,
            status_checks,
            top_ips.len()
        );

        Ok(Self {
            total,
            methods,
            status_checks,
            top_ips,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} logs", self.total)?;
        writeln!(f, "Methods:")?;
        for (method, count) in &self.methods {
            writeln!(f, "\tmethod {}: {}", method, count)?;
        }
        writeln!(f, "{} status check", self.status_checks)?;
        writeln!(f, "IPs:")?;
        for entry in &self.top_ips {
            writeln!(f, "\t{}: {}", entry.ip, entry.count)?;
        }
        Ok(())
    }
}
