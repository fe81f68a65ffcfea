//! Commit extraction using libgit2
//!
//! Walks HEAD in time order and turns every commit into a [`Commit`] whose
//! diff holds only the added lines against the first parent.

use crate::git::{CommitSource, GitError, GitResult};
use crate::models::Commit;
use chrono::{DateTime, TimeZone, Utc};
use git2::{DiffOptions, Repository, Sort};
use std::path::Path;
use tracing::debug;

/// Git history reader using libgit2.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open the repository containing `path` (any subdirectory works).
    pub fn open(path: &Path) -> GitResult<Self> {
        let repo = Repository::discover(path).map_err(|source| GitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// Check if a path is inside a git repository.
    pub fn is_git_repo(path: &Path) -> bool {
        Repository::discover(path).is_ok()
    }

    /// Working directory root, if the repository has one.
    pub fn repo_root(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Up to `max_commits` commits reachable from HEAD, newest first.
    pub fn recent_commits(&self, max_commits: usize) -> GitResult<Vec<Commit>> {
        if max_commits == 0 || self.repo.is_empty()? {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;

        let mut commits = Vec::new();
        for oid in revwalk {
            if commits.len() >= max_commits {
                break;
            }
            let commit = self.repo.find_commit(oid?)?;
            commits.push(self.extract_commit(&commit)?);
        }

        debug!("Read {} commits from {:?}", commits.len(), self.repo.path());
        Ok(commits)
    }

    fn extract_commit(&self, commit: &git2::Commit) -> GitResult<Commit> {
        let author = commit.author();
        let name = author
            .name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown");
        let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();

        Ok(Commit::new(
            commit.id().to_string(),
            name,
            git_time(&commit.time()),
            message,
            self.added_lines(commit)?,
        ))
    }

    /// Added lines against the first parent. The root commit is diffed
    /// against the empty tree.
    fn added_lines(&self, commit: &git2::Commit) -> GitResult<String> {
        let parent = commit.parent(0).ok();
        let tree = commit.tree()?;
        let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

        let mut diff_opts = DiffOptions::new();
        diff_opts.context_lines(0);

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        let mut added: Vec<String> = Vec::new();
        diff.foreach(
            &mut |_, _| true,
            None,
            None,
            Some(&mut |delta, _hunk, line| {
                if line.origin() != '+' || delta.flags().is_binary() {
                    return true;
                }
                // Non-UTF-8 lines carry nothing the analyzers can read
                if let Ok(text) = std::str::from_utf8(line.content()) {
                    added.push(text.trim_end_matches(['\n', '\r']).to_string());
                }
                true
            }),
        )?;

        Ok(added.join("\n"))
    }
}

impl CommitSource for GitHistory {
    fn fetch_commits(&self, n: usize) -> GitResult<Vec<Commit>> {
        self.recent_commits(n)
    }
}

fn git_time(time: &git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str, secs: i64) {
        let root = repo.workdir().unwrap();
        fs::write(root.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = Signature::new("Ada", "ada@example.com", &git2::Time::new(secs, 0)).unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    #[test]
    fn test_open_outside_repo_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            GitHistory::open(dir.path()),
            Err(GitError::Open { .. })
        ));
        assert!(!GitHistory::is_git_repo(dir.path()));
    }

    #[test]
    fn test_empty_repo_has_no_commits() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        let history = GitHistory::open(dir.path()).unwrap();
        assert!(history.fetch_commits(10).unwrap().is_empty());
    }

    #[test]
    fn test_added_lines_only_newest_first() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_file(&repo, "a.py", "x = 1\ny = 2\n", "first", 1_700_000_000);
        commit_file(&repo, "a.py", "x = 1\nz = 3\n", "second", 1_700_000_600);

        let history = GitHistory::open(dir.path()).unwrap();
        let commits = history.fetch_commits(10).unwrap();
        assert_eq!(commits.len(), 2);

        assert_eq!(commits[0].message.trim(), "second");
        assert_eq!(commits[0].diff, "z = 3");
        assert_eq!(commits[0].author, "Ada");
        assert_eq!(commits[0].timestamp.timestamp(), 1_700_000_600);

        // Root commit diffs against the empty tree
        assert_eq!(commits[1].diff, "x = 1\ny = 2");
    }

    #[test]
    fn test_window_is_capped() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        for i in 0..4 {
            commit_file(&repo, "f.txt", &format!("line {i}\n"), "edit", 1_700_000_000 + i * 60);
        }
        let history = GitHistory::open(dir.path()).unwrap();
        assert_eq!(history.fetch_commits(3).unwrap().len(), 3);
        assert_eq!(history.fetch_extended_history(60).unwrap().len(), 4);
    }
}
