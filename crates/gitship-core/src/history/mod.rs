//! Repository history extraction: commits and references via libgit2.

mod analyze;

pub use analyze::{analyze_repo, analyze_repo_async};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One commit, reduced to what the record shaper needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Short (7 character) commit id.
    pub hash: String,
    /// Full commit message; the first line is the subject.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Author time, normalized to UTC.
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Branch,
    Tag,
}

/// A branch or tag pointing into the analyzed history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefInfo {
    pub name: String,
    pub kind: RefKind,
    /// Short id of the commit the reference resolves to.
    pub hash: String,
}

/// Everything extracted from one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoHistory {
    pub repo_path: PathBuf,
    pub commits: Vec<CommitInfo>,
    pub references: Vec<RefInfo>,
}

/// Filters controlling which history is extracted.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Walk at most this many commits from HEAD.
    pub max_commits: usize,
    /// Keep only these branches (empty = all local branches).
    pub include_branches: Vec<String>,
    /// Drop these branches.
    pub exclude_branches: Vec<String>,
    /// Keep only commits at or after this time.
    pub since: Option<DateTime<Utc>>,
    /// Keep only commits at or before this time.
    pub until: Option<DateTime<Utc>>,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_commits: 100_000,
            include_branches: Vec::new(),
            exclude_branches: Vec::new(),
            since: None,
            until: None,
        }
    }
}
