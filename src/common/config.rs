//! Crate-wide constants and the page/frame identifier types.

/// Size in bytes of every page on disk and every frame in the buffer pool.
pub const PAGE_SIZE: usize = 4096;

/// The byte layout shared by a disk page and a resident frame.
pub type PageBuffer = [u8; PAGE_SIZE];

/// A page's position within its page file. Always non-negative once a page
/// actually exists; negative values are only ever seen as argument-validation
/// errors (see [`crate::common::error::Error::ReadNonExistingPage`]).
pub type PageNum = i64;

/// Sentinel stored in an empty frame's `page_num` slot.
pub const NO_PAGE: PageNum = -1;

/// Index of a frame within the buffer pool's frame array. Stable for the
/// lifetime of the pool; frames are never reordered.
pub type FrameIndex = usize;
