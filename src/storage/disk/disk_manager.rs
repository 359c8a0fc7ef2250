use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use log::{debug, warn};

use crate::common::config::{PageNum, PAGE_SIZE};
use crate::common::error::{Error, Result};

/// Block-addressed I/O over a single flat page file.
///
/// `DiskManager` owns the OS file handle for the duration of its own
/// lifetime (see the concurrency note in the crate root docs on why this is
/// preferable to opening/closing per call) and guarantees that the file on
/// disk is always an exact multiple of [`PAGE_SIZE`] bytes long.
#[derive(Debug)]
pub struct DiskManager {
    file_name: String,
    backing: File,
    total_num_pages: u32,
    cur_page_pos: i64,
}

/// Process-wide initialization hook. No required side effects beyond making
/// subsequent storage-manager calls legal; kept for parity with the
/// reference interface.
pub fn init() {
    debug!("storage manager initialized");
}

/// Creates a new page file containing exactly one zero-filled page.
pub fn create_page_file(name: &str) -> Result<()> {
    let mut file = File::create(name).map_err(|e| {
        warn!("failed to create page file {name}: {e}");
        Error::FileNotFound(name.to_string())
    })?;
    let zero_page = [0u8; PAGE_SIZE];
    let written = file.write(&zero_page)?;
    if written < PAGE_SIZE {
        warn!("short write creating page file {name}: wrote {written} of {PAGE_SIZE} bytes");
        return Err(Error::WriteFailed(0));
    }
    Ok(())
}

/// Unlinks an existing page file.
pub fn destroy_page_file(name: &str) -> Result<()> {
    fs::remove_file(name).map_err(|_| Error::FileNotFound(name.to_string()))
}

impl DiskManager {
    /// Opens an existing page file for read+write access.
    pub fn open(name: &str) -> Result<DiskManager> {
        let backing = OpenOptions::new()
            .read(true)
            .write(true)
            .open(name)
            .map_err(|_| Error::FileNotFound(name.to_string()))?;
        let file_len = backing.metadata()?.len();
        let total_num_pages = (file_len / PAGE_SIZE as u64) as u32;
        Ok(DiskManager {
            file_name: name.to_string(),
            backing,
            total_num_pages,
            cur_page_pos: 0,
        })
    }

    /// Releases the OS file handle. Further calls on this handle are
    /// invalid; dropping the value has the same effect.
    pub fn close(self) -> Result<()> {
        drop(self.backing);
        Ok(())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_num_pages(&self) -> u32 {
        self.total_num_pages
    }

    pub fn cur_page_pos(&self) -> i64 {
        self.cur_page_pos
    }

    fn validate_read(&self, page_num: PageNum) -> Result<()> {
        if page_num < 0 || page_num as u64 >= self.total_num_pages as u64 {
            return Err(Error::ReadNonExistingPage(page_num));
        }
        Ok(())
    }

    /// Reads exactly [`PAGE_SIZE`] bytes at `page_num * PAGE_SIZE` into
    /// `buf`. On failure `buf` is left untouched: bounds are validated
    /// before any byte is read.
    pub fn read_block(&mut self, page_num: PageNum, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.validate_read(page_num)?;
        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.backing.seek(SeekFrom::Start(offset))?;
        self.backing.read_exact(buf)?;
        self.cur_page_pos = (page_num + 1) * PAGE_SIZE as i64;
        debug!("read page {page_num} from {}", self.file_name);
        Ok(())
    }

    pub fn read_first_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(0, buf)
    }

    pub fn read_last_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.total_num_pages as PageNum - 1, buf)
    }

    /// Reads the page containing `cur_page_pos`, reinterpreting that cursor
    /// directly as a page number (matching the reference implementation's
    /// own current-block wrapper).
    pub fn read_current_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.cur_page_pos, buf)
    }

    pub fn read_previous_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.cur_page_pos - 1, buf)
    }

    pub fn read_next_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.cur_page_pos + 1, buf)
    }

    /// Writes exactly [`PAGE_SIZE`] bytes at `page_num * PAGE_SIZE`.
    pub fn write_block(&mut self, page_num: PageNum, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        if page_num < 0 || page_num as u64 > self.total_num_pages as u64 {
            return Err(Error::WriteFailed(page_num));
        }
        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.backing.seek(SeekFrom::Start(offset))?;
        self.backing.write_all(buf).map_err(|e| {
            warn!("short write for page {page_num} in {}: {e}", self.file_name);
            Error::WriteFailed(page_num)
        })?;
        self.backing.flush()?;
        self.cur_page_pos = page_num;
        debug!("wrote page {page_num} to {}", self.file_name);
        Ok(())
    }

    pub fn write_current_block(&mut self, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        self.write_block(self.cur_page_pos, buf)
    }

    /// Appends one zero-filled page to the file and grows `total_num_pages`
    /// by one.
    pub fn append_empty_block(&mut self) -> Result<()> {
        let offset = self.total_num_pages as u64 * PAGE_SIZE as u64;
        self.backing.seek(SeekFrom::Start(offset))?;
        let zero_page = [0u8; PAGE_SIZE];
        self.backing.write_all(&zero_page)?;
        self.backing.flush()?;
        self.total_num_pages += 1;
        Ok(())
    }

    /// Grows the file with zero-filled pages until it holds at least `n`
    /// pages.
    pub fn ensure_capacity(&mut self, n: u32) -> Result<()> {
        while self.total_num_pages < n {
            self.append_empty_block()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn open_fresh(dir: &TempDir, name: &str) -> DiskManager {
        let path = dir.path().join(name);
        create_page_file(path.to_str().unwrap()).unwrap();
        DiskManager::open(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn create_open_yields_one_page() {
        let dir = TempDir::new("pagebuf").unwrap();
        let dm = open_fresh(&dir, "test.db");
        assert_eq!(dm.total_num_pages(), 1);
    }

    #[test]
    fn round_trip_write_then_read() {
        let dir = TempDir::new("pagebuf").unwrap();
        let mut dm = open_fresh(&dir, "test.db");

        let mut data = [0u8; PAGE_SIZE];
        data[..5].copy_from_slice(b"hello");
        dm.write_block(0, &data).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        dm.read_block(0, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn read_out_of_range_fails_without_mutating_buffer() {
        let dir = TempDir::new("pagebuf").unwrap();
        let mut dm = open_fresh(&dir, "test.db");

        let mut buf = [7u8; PAGE_SIZE];
        let err = dm.read_block(5, &mut buf).unwrap_err();
        assert!(matches!(err, Error::ReadNonExistingPage(5)));
        assert_eq!(buf, [7u8; PAGE_SIZE]);
    }

    #[test]
    fn negative_page_number_is_rejected() {
        let dir = TempDir::new("pagebuf").unwrap();
        let mut dm = open_fresh(&dir, "test.db");
        let mut buf = [0u8; PAGE_SIZE];
        assert!(matches!(
            dm.read_block(-1, &mut buf),
            Err(Error::ReadNonExistingPage(-1))
        ));
    }

    #[test]
    fn append_empty_block_grows_capacity() {
        let dir = TempDir::new("pagebuf").unwrap();
        let mut dm = open_fresh(&dir, "test.db");
        dm.append_empty_block().unwrap();
        assert_eq!(dm.total_num_pages(), 2);
        let mut buf = [9u8; PAGE_SIZE];
        dm.read_block(1, &mut buf).unwrap();
        assert_eq!(buf, [0u8; PAGE_SIZE]);
    }

    #[test]
    fn ensure_capacity_appends_until_satisfied() {
        let dir = TempDir::new("pagebuf").unwrap();
        let mut dm = open_fresh(&dir, "test.db");

        let mut data = [3u8; PAGE_SIZE];
        dm.write_block(0, &mut data).unwrap();

        dm.ensure_capacity(4).unwrap();
        assert_eq!(dm.total_num_pages(), 4);

        let mut buf = [0u8; PAGE_SIZE];
        dm.read_block(0, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn destroy_removes_file() {
        let dir = TempDir::new("pagebuf").unwrap();
        let path = dir.path().join("test.db");
        create_page_file(path.to_str().unwrap()).unwrap();
        destroy_page_file(path.to_str().unwrap()).unwrap();
        assert!(DiskManager::open(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = TempDir::new("pagebuf").unwrap();
        let path = dir.path().join("missing.db");
        assert!(matches!(
            DiskManager::open(path.to_str().unwrap()),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn round_trip_survives_random_payloads_across_several_pages() {
        use rand::Rng;

        let dir = TempDir::new("pagebuf").unwrap();
        let mut dm = open_fresh(&dir, "test.db");
        dm.ensure_capacity(8).unwrap();

        let mut rng = rand::thread_rng();
        let mut written = Vec::new();
        for page in 0..8 {
            let mut buf = [0u8; PAGE_SIZE];
            rng.fill(&mut buf[..]);
            dm.write_block(page, &buf).unwrap();
            written.push(buf);
        }

        for page in 0..8 {
            let mut buf = [0u8; PAGE_SIZE];
            dm.read_block(page, &mut buf).unwrap();
            assert_eq!(buf, written[page as usize]);
        }
    }
}
