//! Shared helpers for integration tests: throwaway git repositories and a
//! scripted ingest server.

#![allow(dead_code)]

pub mod ingest_server;

use git2::{Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

/// Creates a repository with `n` commits on the default branch, one file per
/// commit, commit times spaced one hour apart starting at `base_epoch`.
pub fn repo_with_commits(n: usize, base_epoch: i64) -> (TempDir, Repository) {
    let dir = TempDir::new().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init repo");
    for i in 0..n {
        commit_file(
            &repo,
            &format!("file{i}.txt"),
            &format!("contents {i}"),
            &format!("commit {i}"),
            base_epoch + (i as i64) * 3600,
        );
    }
    (dir, repo)
}

/// Adds one file and commits it with the given message and epoch seconds.
pub fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str, epoch: i64) {
    let workdir = repo.workdir().expect("workdir");
    std::fs::write(workdir.join(name), contents).expect("write file");

    let mut index = repo.index().expect("index");
    index.add_path(Path::new(name)).expect("add path");
    index.write().expect("index write");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");

    let sig = Signature::new("Test Author", "test@example.com", &Time::new(epoch, 0))
        .expect("signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("commit");
}
