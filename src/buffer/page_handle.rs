use std::cell::{Ref, RefMut};

use crate::buffer::frame::Frame;
use crate::common::config::{PageBuffer, PageNum};

/// The caller-facing descriptor returned by [`pin_page`](
/// crate::buffer::buffer_pool_manager::BufferPool::pin_page).
///
/// Valid until the matching `unpin_page` call; nothing enforces that at
/// compile time (the same relaxed-lifetime contract the reference storage
/// engine's page handles have), so treat it as a borrow the caller is
/// trusted not to outlive.
#[derive(Debug, Clone)]
pub struct PageHandle {
    page_num: PageNum,
    frame: Frame,
}

impl PageHandle {
    pub(crate) fn new(page_num: PageNum, frame: Frame) -> Self {
        PageHandle { page_num, frame }
    }

    pub fn page_num(&self) -> PageNum {
        self.page_num
    }

    /// Read-only view into the page's bytes.
    pub fn data(&self) -> Ref<'_, PageBuffer> {
        self.frame.data()
    }

    /// Mutable view into the page's bytes. Writing through this does not
    /// itself mark the page dirty — callers must still call
    /// [`BufferPool::mark_dirty`](
    /// crate::buffer::buffer_pool_manager::BufferPool::mark_dirty)
    /// explicitly, matching the reference interface's separate
    /// `markDirty` call.
    pub fn data_mut(&self) -> RefMut<'_, PageBuffer> {
        self.frame.data_mut()
    }
}
