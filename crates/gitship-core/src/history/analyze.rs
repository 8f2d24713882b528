//! Blocking libgit2 walk. Call `analyze_repo_async` from async code.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use git2::{BranchType, Repository, Sort};
use std::path::{Path, PathBuf};

use super::{CommitInfo, HistoryOptions, RefInfo, RefKind, RepoHistory};

const SHORT_HASH_LEN: usize = 7;

/// Open the repository at `path` and extract commits plus references per
/// `options`. Blocking (libgit2 does synchronous I/O).
pub fn analyze_repo(path: &Path, options: &HistoryOptions) -> Result<RepoHistory> {
    let repo = Repository::open(path)
        .with_context(|| format!("{} is not a git repository", path.display()))?;

    let commits = walk_commits(&repo, options)?;
    let references = list_references(&repo, options);
    tracing::info!(
        commits = commits.len(),
        references = references.len(),
        "analyzed {}",
        path.display()
    );

    Ok(RepoHistory {
        repo_path: path.to_path_buf(),
        commits,
        references,
    })
}

/// Runs `analyze_repo` on the blocking pool.
pub async fn analyze_repo_async(path: PathBuf, options: HistoryOptions) -> Result<RepoHistory> {
    tokio::task::spawn_blocking(move || analyze_repo(&path, &options))
        .await
        .context("analysis task join")?
}

fn walk_commits(repo: &Repository, options: &HistoryOptions) -> Result<Vec<CommitInfo>> {
    let mut revwalk = repo.revwalk().context("failed to start revision walk")?;
    revwalk
        .push_head()
        .context("repository has no commits on HEAD")?;
    revwalk.set_sorting(Sort::TIME)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        if commits.len() >= options.max_commits {
            break;
        }
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        let date = DateTime::from_timestamp(commit.time().seconds(), 0)
            .with_context(|| format!("commit {oid} has an out-of-range timestamp"))?;
        // Time sort is not strictly monotonic under clock skew, so filter
        // instead of stopping at the first out-of-range commit.
        if options.since.is_some_and(|since| date < since) {
            continue;
        }
        if options.until.is_some_and(|until| date > until) {
            continue;
        }
        commits.push(CommitInfo {
            hash: short_hash(oid),
            message: commit.message().unwrap_or("").trim_end().to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            date,
        });
    }
    Ok(commits)
}

/// Local branches (filtered) and tags. Individual reference failures are
/// skipped so one broken ref does not sink the analysis.
fn list_references(repo: &Repository, options: &HistoryOptions) -> Vec<RefInfo> {
    let mut refs = Vec::new();

    match repo.branches(Some(BranchType::Local)) {
        Ok(branches) => {
            for (branch, _) in branches.flatten() {
                let name = match branch.name() {
                    Ok(Some(name)) => name.to_string(),
                    _ => continue,
                };
                if !branch_selected(&name, options) {
                    continue;
                }
                let Some(target) = branch.get().target() else {
                    continue;
                };
                refs.push(RefInfo {
                    name,
                    kind: RefKind::Branch,
                    hash: short_hash(target),
                });
            }
        }
        Err(err) => tracing::warn!("skipping branch listing: {err}"),
    }

    match repo.tag_names(None) {
        Ok(names) => {
            for name in names.iter().flatten() {
                let Ok(obj) = repo.revparse_single(&format!("refs/tags/{name}")) else {
                    continue;
                };
                // Annotated tags point at a tag object; peel to the commit.
                let oid = obj
                    .peel_to_commit()
                    .map(|commit| commit.id())
                    .unwrap_or_else(|_| obj.id());
                refs.push(RefInfo {
                    name: name.to_string(),
                    kind: RefKind::Tag,
                    hash: short_hash(oid),
                });
            }
        }
        Err(err) => tracing::warn!("skipping tag listing: {err}"),
    }

    refs
}

fn branch_selected(name: &str, options: &HistoryOptions) -> bool {
    if !options.include_branches.is_empty()
        && !options.include_branches.iter().any(|b| b == name)
    {
        return false;
    }
    !options.exclude_branches.iter().any(|b| b == name)
}

fn short_hash(oid: git2::Oid) -> String {
    let full = oid.to_string();
    full[..SHORT_HASH_LEN.min(full.len())].to_string()
}
