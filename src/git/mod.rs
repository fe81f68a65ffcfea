//! Commit backend
//!
//! The scan pipeline only ever sees [`Commit`] values through the
//! [`CommitSource`] trait. [`GitHistory`] implements it over libgit2; tests
//! substitute an in-memory source.
//!
//! # Example
//!
//! ```no_run
//! use sniff::git::{CommitSource, GitHistory};
//! use std::path::Path;
//!
//! let history = GitHistory::open(Path::new("/path/to/repo")).unwrap();
//! let recent = history.fetch_commits(20).unwrap();
//! ```

pub mod history;

pub use history::GitHistory;

use crate::models::Commit;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open git repository at {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read commit history: {0}")]
    Walk(#[from] git2::Error),
}

pub type GitResult<T> = Result<T, GitError>;

/// Where commits come from. Both calls return newest first.
pub trait CommitSource {
    /// The `n` most recent commits (the scan window).
    fn fetch_commits(&self, n: usize) -> GitResult<Vec<Commit>>;

    /// A larger sample used to build author baselines.
    fn fetch_extended_history(&self, n: usize) -> GitResult<Vec<Commit>> {
        self.fetch_commits(n)
    }
}

impl<T: CommitSource + ?Sized> CommitSource for &T {
    fn fetch_commits(&self, n: usize) -> GitResult<Vec<Commit>> {
        (**self).fetch_commits(n)
    }

    fn fetch_extended_history(&self, n: usize) -> GitResult<Vec<Commit>> {
        (**self).fetch_extended_history(n)
    }
}

/// Fixed list of commits, newest first.
impl CommitSource for Vec<Commit> {
    fn fetch_commits(&self, n: usize) -> GitResult<Vec<Commit>> {
        Ok(self.iter().take(n).cloned().collect())
    }
}
