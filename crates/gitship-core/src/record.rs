//! Shape extracted history into tracker-agnostic issue records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::history::{CommitInfo, RefInfo, RefKind, RepoHistory};

/// Commit subject length carried into a record title before truncation.
const TITLE_SUBJECT_LIMIT: usize = 50;

/// Which repository object a record was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Commit,
    Branch,
    Tag,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Commit => "commit",
            SourceKind::Branch => "branch",
            SourceKind::Tag => "tag",
        }
    }
}

/// One issue record, not yet in wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Short id of the originating commit.
    pub git_hash: String,
    pub kind: SourceKind,
}

/// Convert every commit and reference in `history` into a record, commits
/// first.
pub fn records_from_history(history: &RepoHistory) -> Vec<IssueRecord> {
    let mut records = Vec::with_capacity(history.commits.len() + history.references.len());
    records.extend(history.commits.iter().map(commit_record));
    records.extend(history.references.iter().map(reference_record));
    records
}

fn commit_record(commit: &CommitInfo) -> IssueRecord {
    let subject = commit.message.lines().next().unwrap_or("");
    IssueRecord {
        title: format!("{}: {}", commit.hash, truncate_subject(subject)),
        description: format!(
            "Git Commit\nHash: {}\nAuthor: {}\nDate: {}\n\nFull Message:\n{}",
            commit.hash,
            commit.author,
            commit.date.to_rfc3339(),
            commit.message
        ),
        created_at: commit.date,
        updated_at: commit.date,
        git_hash: commit.hash.clone(),
        kind: SourceKind::Commit,
    }
}

fn reference_record(reference: &RefInfo) -> IssueRecord {
    let (label, heading, kind) = match reference.kind {
        RefKind::Branch => ("BRANCH", "Branch", SourceKind::Branch),
        RefKind::Tag => ("TAG", "Tag", SourceKind::Tag),
    };
    // References carry no timestamp of their own; now() is the closest truth.
    let now = Utc::now();
    IssueRecord {
        title: format!("{}: {}", label, reference.name),
        description: format!(
            "Git {}\nName: {}\nHash: {}\nType: {}",
            heading,
            reference.name,
            reference.hash,
            heading.to_lowercase()
        ),
        created_at: now,
        updated_at: now,
        git_hash: reference.hash.clone(),
        kind,
    }
}

fn truncate_subject(subject: &str) -> String {
    let mut truncated: String = subject.chars().take(TITLE_SUBJECT_LIMIT).collect();
    if subject.chars().count() > TITLE_SUBJECT_LIMIT {
        truncated.push_str("...");
    }
    truncated
}

/// Map each record's git hash to its title, for reporting which repository
/// objects produced which records.
pub fn traceability_map(records: &[IssueRecord]) -> HashMap<String, String> {
    records
        .iter()
        .map(|record| (record.git_hash.clone(), record.title.clone()))
        .collect()
}
