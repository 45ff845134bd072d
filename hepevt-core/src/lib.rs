//! hepevt - Runtime-configurable HEPEVT record engine
//!
//! This crate decodes and mutates the flat binary record of one high-energy-
//! physics collision event: the HEPEVT common-block image. The record is a
//! single byte buffer of parallel arrays whose primitive widths (2- or
//! 4-byte integers, 4- or 8-byte floats) and particle capacity are chosen at
//! run time, and whose byte layout is the interop contract with every other
//! producer and consumer of the format.
//!
//! # Features
//!
//! - Pure offset arithmetic over the struct-of-arrays layout
//!   ([`RecordLayout`])
//! - Width-correct, bounds-guarded scalar access with the historical
//!   zero-degradation semantics ([`EventRecord`])
//! - Structural validation of parent/child index ranges
//!   ([`check_consistency`])
//! - Owned event gather/scatter ([`Event`]), human-readable dumps
//!   ([`dump_record`]), and heap- or file-backed block providers
//!   ([`RecordBlock`], [`FileBlock`])
//!
//! # Example
//!
//! ```
//! use hepevt_core::{check_consistency, EventRecord, RecordBlock, RecordLayout};
//!
//! let layout = RecordLayout::default();
//! let mut block = RecordBlock::new(&layout);
//! let mut record = EventRecord::new(block.as_mut_slice(), layout);
//!
//! record.set_event_number(1);
//! record.set_entry_count(2);
//! record.set_status_code(1, 2);
//! record.set_children(1, 2, 2);
//! record.set_status_code(2, 1);
//! record.set_parents(2, 1, 1);
//!
//! assert_eq!(record.status_code(1), 2);
//! assert!(check_consistency(&record).is_consistent());
//! ```
//!
//! # Design Philosophy
//!
//! The engine is a decoding primitive, not a framework. It does not own the
//! record buffer, does not do event-loop or file I/O over streams of
//! records, and does not negotiate endianness or evolve the schema: the
//! record is the native byte image, reproduced bit for bit.
//!
//! Malformed structural data is a reportable finding, never a crash: reads
//! past the allocation degrade to zero (with a logged warning, or an
//! explicit error on the strict path), writes past it are dropped, and the
//! validator always completes with the full finding set.
//!
//! # Concurrency
//!
//! All operations are synchronous and bounded. One writer at a time;
//! configuration changes are a distinct phase before any decode, because
//! every offset depends on the active widths and capacity. Within a process
//! the borrow checker enforces this; across processes, callers serialize
//! (e.g. via [`FileBlock`]'s exclusive lock).

pub mod block;
pub mod consistency;
pub mod dump;
pub mod event;
pub mod layout;
pub mod record;
pub mod width;

pub use block::{FileBlock, RecordBlock};
pub use consistency::{ConsistencyReport, Finding, check_consistency};
pub use dump::{dump_particle, dump_record};
pub use event::{Event, Particle};
pub use layout::{DEFAULT_CAPACITY, RecordLayout};
pub use record::EventRecord;
pub use width::{FloatWidth, IntWidth};

use thiserror::Error;

/// Rejected configuration request.
///
/// Raised by the width setters; the prior configuration is always retained,
/// so a caller may ignore the error and keep decoding under the old layout.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Requested integer width is not 2 or 4 bytes.
    #[error("unsupported integer width: {0} bytes (supported: 2, 4)")]
    UnsupportedIntWidth(usize),

    /// Requested float width is not 4 or 8 bytes.
    #[error("unsupported float width: {0} bytes (supported: 4, 8)")]
    UnsupportedFloatWidth(usize),
}

/// Failed scalar access on a record buffer.
///
/// Raised by the strict `fetch_*`/`store_*` paths when a computed word does
/// not lie fully inside the buffer. The legacy accessors map this to the
/// field's zero value (reads) or a dropped write, with a logged warning.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The word at `offset` extends past the end of the buffer.
    #[error("record access exceeds allocation: {width} bytes at offset {offset} in a {len}-byte buffer")]
    OutOfAllocation {
        /// Byte offset of the attempted access.
        offset: usize,
        /// Width of the word in bytes.
        width: usize,
        /// Length of the backing buffer.
        len: usize,
    },
}
