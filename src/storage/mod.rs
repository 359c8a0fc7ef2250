//! Block-addressed I/O against a flat page file. Narrow on purpose: the
//! buffer pool is the only caller that should ever touch this module.

pub mod disk;

pub use disk::{create_page_file, destroy_page_file, init, DiskManager};
