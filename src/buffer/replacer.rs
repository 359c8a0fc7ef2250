use std::str::FromStr;

use crate::buffer::frame::Frame;
use crate::common::config::FrameIndex;
use crate::common::error::{Error, Result};

/// The replacement strategy a buffer pool was configured with.
///
/// `LruK` is kept as a distinct tag from `Lru` purely so callers and
/// statistics can tell which one was requested; the two currently share one
/// implementation (see [`ReplacementPolicy`] below and §4.4 of the design
/// notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
    LruK,
}

impl FromStr for ReplacementStrategy {
    type Err = Error;

    /// Parses a strategy tag arriving as a string, e.g. from a
    /// configuration layer sitting above this crate. Unknown tags are the
    /// one place `INVALID_REPLACEMENT_STRATEGY` is actually reachable: the
    /// in-process `ReplacementStrategy` enum itself is exhaustive and can
    /// never hold an invalid variant.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(ReplacementStrategy::Fifo),
            "LRU" => Ok(ReplacementStrategy::Lru),
            "LRU_K" | "LRU-K" | "LRUK" => Ok(ReplacementStrategy::LruK),
            other => Err(Error::InvalidReplacementStrategy(other.to_string())),
        }
    }
}

/// The small trait-like interface a replacement policy must provide: how it
/// reacts to an access, and how it picks a victim among currently-unpinned
/// frames. Kept crate-private — callers only ever see the
/// [`ReplacementStrategy`] tag, never this trait.
pub(crate) trait ReplacementPolicy: std::fmt::Debug {
    /// Called on a cache hit: an already-resident frame was pinned again.
    fn on_access(&mut self, frames: &[Frame], accessed: FrameIndex);

    /// Called right after a victim frame has been (re)loaded with a new
    /// page. Distinct from [`Self::on_access`] because FIFO only moves its
    /// cursor here, never on a plain hit.
    fn on_install(&mut self, frames: &[Frame], installed: FrameIndex);

    /// Picks a victim among frames with `fix_count == 0`. Returns `None` if
    /// every frame is pinned.
    fn choose_victim(&self, frames: &[Frame]) -> Option<FrameIndex>;
}

pub(crate) fn new_policy(strategy: ReplacementStrategy, num_frames: usize) -> Box<dyn ReplacementPolicy> {
    match strategy {
        ReplacementStrategy::Fifo => Box::new(FifoReplacer::new(num_frames)),
        ReplacementStrategy::Lru | ReplacementStrategy::LruK => Box::new(LruReplacer::new()),
    }
}

/// Rotating-cursor FIFO: resumes scanning from just past the last-installed
/// frame. The cursor is only ever advanced on an install, never on a hit.
#[derive(Debug)]
struct FifoReplacer {
    queue_head: FrameIndex,
}

impl FifoReplacer {
    fn new(num_frames: usize) -> Self {
        // So the first scan starts at index 0: (queue_head + 1) % N == 0.
        let queue_head = num_frames.saturating_sub(1);
        FifoReplacer { queue_head }
    }
}

impl ReplacementPolicy for FifoReplacer {
    fn on_access(&mut self, _frames: &[Frame], _accessed: FrameIndex) {
        // Hits never move the FIFO cursor.
    }

    fn on_install(&mut self, _frames: &[Frame], installed: FrameIndex) {
        self.queue_head = installed;
    }

    /// `queue_head` itself is never a scan candidate. A pool of capacity 1
    /// degenerates as a result: `queue_head + 1 mod 1` always equals
    /// `queue_head`, so the sole frame is never selected, even as an empty
    /// slot on the very first pin. This matches the original scan's own
    /// literal behavior and is accepted rather than special-cased away.
    fn choose_victim(&self, frames: &[Frame]) -> Option<FrameIndex> {
        let n = frames.len();
        if n == 0 {
            return None;
        }
        let mut i = (self.queue_head + 1) % n;
        while i != self.queue_head {
            if frames[i].fix_count() == 0 {
                return Some(i);
            }
            i = (i + 1) % n;
        }
        None
    }
}

/// Single-timestamp LRU: every access stamps the frame with a strictly
/// increasing counter. Victim selection picks the smallest stamp among
/// unpinned frames, which also means never-accessed empty frames (stamp 0)
/// are evicted first.
#[derive(Debug)]
struct LruReplacer {
    clock: u64,
}

impl LruReplacer {
    fn new() -> Self {
        LruReplacer { clock: 0 }
    }
}

impl ReplacementPolicy for LruReplacer {
    fn on_access(&mut self, frames: &[Frame], accessed: FrameIndex) {
        self.clock += 1;
        frames[accessed].set_recent_access_count(self.clock);
    }

    fn on_install(&mut self, frames: &[Frame], installed: FrameIndex) {
        self.on_access(frames, installed);
    }

    fn choose_victim(&self, frames: &[Frame]) -> Option<FrameIndex> {
        let mut best: Option<(FrameIndex, u64)> = None;
        for (i, frame) in frames.iter().enumerate() {
            if frame.fix_count() != 0 {
                continue;
            }
            let stamp = frame.recent_access_count();
            match best {
                Some((_, best_stamp)) if stamp >= best_stamp => {}
                _ => best = Some((i, stamp)),
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tags_parse_case_insensitively() {
        assert_eq!("FIFO".parse::<ReplacementStrategy>().unwrap(), ReplacementStrategy::Fifo);
        assert_eq!("fifo".parse::<ReplacementStrategy>().unwrap(), ReplacementStrategy::Fifo);
        assert_eq!("LRU".parse::<ReplacementStrategy>().unwrap(), ReplacementStrategy::Lru);
        assert_eq!("lru_k".parse::<ReplacementStrategy>().unwrap(), ReplacementStrategy::LruK);
        assert_eq!("LRU-K".parse::<ReplacementStrategy>().unwrap(), ReplacementStrategy::LruK);
    }

    #[test]
    fn unknown_strategy_tag_is_rejected() {
        let err = "bogus".parse::<ReplacementStrategy>().unwrap_err();
        assert!(matches!(err, Error::InvalidReplacementStrategy(ref s) if s == "BOGUS"));
    }
}
