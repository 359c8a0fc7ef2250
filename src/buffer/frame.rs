use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::common::config::{PageBuffer, PageNum, PAGE_SIZE};

/// The state a single buffer-pool slot carries across its lifetime.
///
/// Lives behind an [`Rc<RefCell<_>>`] rather than being owned outright by
/// the pool's frame vector: a [`crate::buffer::page_handle::PageHandle`]
/// handed back from `pin_page` needs to keep observing (and, through
/// `data_mut`, writing into) this same buffer while the pool's own methods
/// — `mark_dirty`, `unpin_page`, `force_page` — take further `&mut self`
/// calls on the pool itself. Everything here is single-threaded (the crate
/// is explicitly not `Send`/`Sync`); `Rc`/`RefCell` is the non-atomic,
/// single-owner-thread counterpart of the reference engine's
/// `Arc<RwLock<_>>`, not a concurrency mechanism.
#[derive(Debug)]
pub(crate) struct FrameInner {
    page_num: Option<PageNum>,
    data: Box<PageBuffer>,
    is_dirty: bool,
    fix_count: u32,
    recent_access_count: u64,
}

impl FrameInner {
    fn empty() -> Self {
        FrameInner {
            page_num: None,
            data: Box::new([0u8; PAGE_SIZE]),
            is_dirty: false,
            fix_count: 0,
            recent_access_count: 0,
        }
    }
}

/// One frame (a.k.a. buffer-pool slot). Its index within
/// [`crate::buffer::buffer_pool_manager::BufferPool::frames`] is its
/// identity for the pool's lifetime.
#[derive(Debug, Clone)]
pub(crate) struct Frame(Rc<RefCell<FrameInner>>);

impl Frame {
    pub(crate) fn empty() -> Self {
        Frame(Rc::new(RefCell::new(FrameInner::empty())))
    }

    pub(crate) fn page_num(&self) -> Option<PageNum> {
        self.0.borrow().page_num
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.borrow().page_num.is_none()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.0.borrow().is_dirty
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.0.borrow_mut().is_dirty = dirty;
    }

    pub(crate) fn fix_count(&self) -> u32 {
        self.0.borrow().fix_count
    }

    pub(crate) fn pin(&self) {
        self.0.borrow_mut().fix_count += 1;
    }

    /// Decrements the fix count, saturating at zero. Returns the new count.
    pub(crate) fn unpin(&self) -> u32 {
        let mut inner = self.0.borrow_mut();
        if inner.fix_count > 0 {
            inner.fix_count -= 1;
        }
        inner.fix_count
    }

    pub(crate) fn recent_access_count(&self) -> u64 {
        self.0.borrow().recent_access_count
    }

    pub(crate) fn set_recent_access_count(&self, stamp: u64) {
        self.0.borrow_mut().recent_access_count = stamp;
    }

    pub(crate) fn data(&self) -> Ref<'_, PageBuffer> {
        Ref::map(self.0.borrow(), |i| i.data.as_ref())
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, PageBuffer> {
        RefMut::map(self.0.borrow_mut(), |i| i.data.as_mut())
    }

    /// Installs a freshly-loaded page into this (already-evicted) frame.
    pub(crate) fn install(&self, page_num: PageNum, data: PageBuffer) {
        let mut inner = self.0.borrow_mut();
        inner.page_num = Some(page_num);
        *inner.data = data;
        inner.is_dirty = false;
        inner.fix_count = 1;
    }
}
