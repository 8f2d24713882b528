//! Wire format for batch submission to the tracker ingest endpoint.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::record::{IssueRecord, SourceKind};

/// Identifies this tool in submitted payloads.
pub const PAYLOAD_SOURCE: &str = "gitship";

/// Repository object an issue was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Short hash of the originating commit.
    pub id: String,
    pub repository: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source: IssueSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMetadata {
    pub tool_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_url: Option<String>,
    pub import_timestamp: DateTime<Utc>,
}

/// Everything the ingest endpoint receives in one POST.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub issues: Vec<IssuePayload>,
    pub source: String,
    pub metadata: PayloadMetadata,
}

impl BatchPayload {
    /// Wrap shaped records into a submittable batch.
    pub fn from_records(
        records: &[IssueRecord],
        repo_path: &Path,
        project_id: Option<String>,
    ) -> Self {
        let repository = repo_path.display().to_string();
        let issues = records
            .iter()
            .map(|record| IssuePayload {
                title: record.title.clone(),
                description: record.description.clone(),
                created_at: record.created_at,
                updated_at: record.updated_at,
                source: IssueSource {
                    kind: record.kind,
                    id: record.git_hash.clone(),
                    repository: repository.clone(),
                },
            })
            .collect();
        BatchPayload {
            project_id,
            issues,
            source: PAYLOAD_SOURCE.to_string(),
            metadata: PayloadMetadata {
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                git_repo_url: Some(repository),
                import_timestamp: Utc::now(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Reject payloads the endpoint would bounce before spending an attempt
    /// on them.
    pub fn validate(&self) -> Result<()> {
        if self.issues.is_empty() {
            bail!("batch has no issues");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if issue.title.trim().is_empty() {
                bail!("issue {i} has an empty title");
            }
            if issue.description.trim().is_empty() {
                bail!("issue {i} has an empty description");
            }
            if issue.source.id.trim().is_empty() {
                bail!("issue {i} has no source id");
            }
            if issue.source.repository.trim().is_empty() {
                bail!("issue {i} has no source repository");
            }
        }
        if self.metadata.tool_version.trim().is_empty() {
            bail!("payload metadata is missing a tool version");
        }
        Ok(())
    }
}
