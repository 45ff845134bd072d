//! Record block providers: the byte buffers records live in.
//!
//! The engine never allocates the record it decodes; it borrows a buffer
//! the caller owns. These two providers cover the common cases: an owned
//! heap block (the in-process equivalent of the historical static
//! common-block allocation) and a file-backed memory-mapped block for
//! records shared with other processes or persisted between runs.

use crate::layout::RecordLayout;
use anyhow::{Context, Result};
use fs2::FileExt;
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Owned, heap-allocated record block.
///
/// Zero-filled at exactly [`RecordLayout::byte_size`] bytes, so a fresh
/// block decodes as an empty event under the same layout.
#[derive(Debug)]
pub struct RecordBlock {
    bytes: Vec<u8>,
}

impl RecordBlock {
    /// Allocates a zeroed block sized for `layout`.
    #[must_use]
    pub fn new(layout: &RecordLayout) -> Self {
        Self { bytes: vec![0; layout.byte_size()] }
    }

    /// Size of the block in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the block holds no bytes (capacity-0 layouts still hold the
    /// two scalars, so this is only true for a degenerate layout).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read-only view of the block.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable view of the block, for wrapping in an
    /// [`EventRecord`](crate::EventRecord).
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// File-backed record block.
///
/// The file is locked exclusively for the lifetime of the block and mapped
/// read-write. A file shorter than the layout's byte size is grown
/// (zero-extended) on open; the zero bytes decode as absent fields until
/// written. Mutations reach the kernel page cache immediately; call
/// [`commit`](Self::commit) for durability.
#[derive(Debug)]
pub struct FileBlock {
    /// File handle (owns the file lock)
    file: File,

    /// Memory-mapped view of the file
    mmap: MmapMut,
}

impl FileBlock {
    /// Opens or creates a record block file sized for `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or created
    /// - The file is already locked by another process
    /// - The file cannot be grown or mapped
    pub fn open<P: AsRef<Path>>(path: P, layout: &RecordLayout) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to open record block: {}", path.display()))?;

        // Exclusive file locking prevents concurrent-writer corruption;
        // the engine itself provides no locking.
        file.try_lock_exclusive()
            .context("record block is already open by another process")?;

        let size = layout.byte_size() as u64;
        let needs_grow = file.metadata().map(|m| m.len() < size).unwrap_or(true);
        if needs_grow {
            file.set_len(size)
                .with_context(|| format!("failed to size record block: {}", path.display()))?;
        }

        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self { file, mmap })
    }

    /// Size of the mapped block in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// True if the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Read-only view of the block.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Mutable view of the block, for wrapping in an
    /// [`EventRecord`](crate::EventRecord).
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    /// Commits all pending changes to disk.
    ///
    /// Flushes the memory map and then forces a physical write via fsync,
    /// so the record survives power loss.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or sync fails.
    pub fn commit(&mut self) -> Result<()> {
        self.mmap.flush()?;
        self.file.sync_data()?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl Drop for FileBlock {
    fn drop(&mut self) {
        // Explicitly unlock the file (happens automatically, but being explicit)
        let _ = self.file.unlock();
    }
}
