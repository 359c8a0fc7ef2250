//! The crate's error taxonomy.
//!
//! Every fallible public operation returns [`Result<T>`], never panics on a
//! caller-reachable path. OS-level failures are wrapped in [`Error::Io`]
//! rather than leaking raw `io::Error`s through a dozen different call
//! sites; everything else is one of the named variants below, each of which
//! corresponds 1:1 to an `RC_*` return code from the original design.

use thiserror::Error;

use crate::common::config::PageNum;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("page file not found: {0}")]
    FileNotFound(String),

    #[error("file handle is not bound to an open file")]
    FileHandleNotInit,

    #[error("write failed for page {0}")]
    WriteFailed(PageNum),

    #[error("read of non-existing page {0}")]
    ReadNonExistingPage(PageNum),

    #[error("buffer pool does not exist or is already shut down")]
    BufferPoolNotExisting,

    #[error("no available frame: all frames are pinned")]
    NoAvailableFrame,

    #[error("unknown replacement strategy tag: {0}")]
    InvalidReplacementStrategy(String),

    #[error("buffer pool has pinned pages at strict shutdown")]
    PoolHasPinnedPages,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
