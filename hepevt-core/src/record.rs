//! Width-correct, bounds-guarded scalar access over one record buffer.
//!
//! An [`EventRecord`] pairs a borrowed byte buffer with the [`RecordLayout`]
//! describing it. The buffer is owned by the caller (a heap block, a
//! memory-mapped file, an allocation handed over a C boundary) and the
//! record borrows it for the duration of each call. There is no process-wide
//! state: buffer and configuration travel together.
//!
//! Two access levels are exposed:
//!
//! - `fetch_*` / `store_*` address a scalar by byte offset and fail with
//!   [`AccessError::OutOfAllocation`] when the word does not fit inside the
//!   buffer. This is the strict path.
//! - The logical accessors (`status_code`, `first_parent`, `set_momentum`, …)
//!   reproduce the historical decode semantics: out-of-allocation reads
//!   degrade to 0 with a logged warning, out-of-allocation writes are
//!   dropped, and parent/child ranges are clamped against the entry count.
//!   Callers that stored 0 and callers whose buffer is short are
//!   indistinguishable on this path; that is the compatibility contract.

use crate::AccessError;
use crate::layout::RecordLayout;
use tracing::warn;

/// One event record: a borrowed flat byte buffer plus its layout.
///
/// Generic over the buffer storage so read-only views (`&[u8]`) and mutable
/// views (`&mut [u8]`, `Vec<u8>`) share one accessor surface. Reads need
/// `B: AsRef<[u8]>`; writes additionally need `B: AsMut<[u8]>`.
///
/// The type provides no locking. Within a process the borrow checker
/// enforces single-writer access; across processes the caller serializes
/// (see [`FileBlock`](crate::block::FileBlock)).
#[derive(Debug)]
pub struct EventRecord<B> {
    buf: B,
    layout: RecordLayout,
}

impl<B> EventRecord<B> {
    /// Wraps a buffer under the given layout.
    ///
    /// No validation happens here: a buffer shorter than
    /// [`RecordLayout::byte_size`] is legal and simply decodes as absent
    /// fields past its end.
    pub const fn new(buf: B, layout: RecordLayout) -> Self {
        Self { buf, layout }
    }

    /// The layout this record is addressed under.
    pub const fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Releases the buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }

    fn slot_in_range(&self, idx: usize) -> bool {
        idx >= 1 && idx <= self.layout.capacity()
    }
}

impl<B: AsRef<[u8]>> EventRecord<B> {
    /// Bytes currently backing the record.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Reads one integer word at `offset`, strictly.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfAllocation`] when the word is not fully
    /// inside the buffer.
    pub fn fetch_int(&self, offset: usize) -> Result<i32, AccessError> {
        let width = self.layout.int_width();
        let raw = self.guarded(offset, width.bytes())?;
        Ok(width.decode(raw))
    }

    /// Reads one float word at `offset`, strictly.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfAllocation`] when the word is not fully
    /// inside the buffer.
    pub fn fetch_float(&self, offset: usize) -> Result<f64, AccessError> {
        let width = self.layout.float_width();
        let raw = self.guarded(offset, width.bytes())?;
        Ok(width.decode(raw))
    }

    fn guarded(&self, offset: usize, width: usize) -> Result<&[u8], AccessError> {
        let buf = self.buf.as_ref();
        let err = AccessError::OutOfAllocation { offset, width, len: buf.len() };
        let end = offset.checked_add(width).ok_or(err)?;
        buf.get(offset..end).ok_or(err)
    }

    /// Legacy read: out-of-allocation degrades to 0 with a warning.
    fn read_int(&self, offset: usize) -> i32 {
        match self.fetch_int(offset) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "record read degraded to zero");
                0
            }
        }
    }

    /// Legacy read: out-of-allocation degrades to 0.0 with a warning.
    fn read_float(&self, offset: usize) -> f64 {
        match self.fetch_float(offset) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "record read degraded to zero");
                0.0
            }
        }
    }

    /// Event number.
    pub fn event_number(&self) -> i32 {
        self.read_int(self.layout.event_number_offset())
    }

    /// Count of valid particles in this record.
    ///
    /// A stored value above the configured capacity is silently clamped to
    /// the capacity; negative stored values pass through unchanged.
    pub fn entry_count(&self) -> i32 {
        let raw = self.read_int(self.layout.entry_count_offset());
        let cap = i32::try_from(self.layout.capacity()).unwrap_or(i32::MAX);
        if raw <= cap { raw } else { cap }
    }

    /// Status code of particle `idx`.
    pub fn status_code(&self, idx: usize) -> i32 {
        if !self.slot_in_range(idx) {
            return 0;
        }
        self.read_int(self.layout.status_offset(idx))
    }

    /// PDG particle id of particle `idx`.
    pub fn pdg_id(&self, idx: usize) -> i32 {
        if !self.slot_in_range(idx) {
            return 0;
        }
        self.read_int(self.layout.pdg_id_offset(idx))
    }

    /// Slot index of the first parent of particle `idx`, or 0 if none.
    ///
    /// A stored value outside `(0, entry_count]` decodes as 0: "no parent
    /// recorded", not an error.
    pub fn first_parent(&self, idx: usize) -> i32 {
        if !self.slot_in_range(idx) {
            return 0;
        }
        let parent = self.read_int(self.layout.first_parent_offset(idx));
        if parent > 0 && parent <= self.entry_count() { parent } else { 0 }
    }

    /// Slot index of the last parent of particle `idx`.
    ///
    /// With a single parent the last parent is forced equal to the first: a
    /// stored value at or below the first parent (or above the entry count)
    /// collapses to the first. `(0, 0)` means no parents recorded.
    pub fn last_parent(&self, idx: usize) -> i32 {
        if !self.slot_in_range(idx) {
            return 0;
        }
        let first = self.first_parent(idx);
        let parent = self.read_int(self.layout.last_parent_offset(idx));
        if parent > first && parent <= self.entry_count() { parent } else { first }
    }

    /// Number of parents of particle `idx`.
    pub fn number_parents(&self, idx: usize) -> i32 {
        let first = self.first_parent(idx);
        if first > 0 { 1 + self.last_parent(idx) - first } else { 0 }
    }

    /// Slot index of the first child of particle `idx`, or 0 if none.
    pub fn first_child(&self, idx: usize) -> i32 {
        if !self.slot_in_range(idx) {
            return 0;
        }
        let child = self.read_int(self.layout.first_child_offset(idx));
        if child > 0 && child <= self.entry_count() { child } else { 0 }
    }

    /// Slot index of the last child of particle `idx`.
    ///
    /// Same collapse rule as [`last_parent`](Self::last_parent).
    pub fn last_child(&self, idx: usize) -> i32 {
        if !self.slot_in_range(idx) {
            return 0;
        }
        let first = self.first_child(idx);
        let child = self.read_int(self.layout.last_child_offset(idx));
        if child > first && child <= self.entry_count() { child } else { first }
    }

    /// Number of children of particle `idx`.
    pub fn number_children(&self, idx: usize) -> i32 {
        let first = self.first_child(idx);
        if first > 0 { 1 + self.last_child(idx) - first } else { 0 }
    }

    /// X momentum of particle `idx`.
    pub fn px(&self, idx: usize) -> f64 {
        self.momentum_component(idx, 0)
    }

    /// Y momentum of particle `idx`.
    pub fn py(&self, idx: usize) -> f64 {
        self.momentum_component(idx, 1)
    }

    /// Z momentum of particle `idx`.
    pub fn pz(&self, idx: usize) -> f64 {
        self.momentum_component(idx, 2)
    }

    /// Energy of particle `idx`.
    pub fn e(&self, idx: usize) -> f64 {
        self.momentum_component(idx, 3)
    }

    /// Generated mass of particle `idx`.
    pub fn m(&self, idx: usize) -> f64 {
        self.momentum_component(idx, 4)
    }

    /// X production vertex of particle `idx`.
    pub fn x(&self, idx: usize) -> f64 {
        self.vertex_component(idx, 0)
    }

    /// Y production vertex of particle `idx`.
    pub fn y(&self, idx: usize) -> f64 {
        self.vertex_component(idx, 1)
    }

    /// Z production vertex of particle `idx`.
    pub fn z(&self, idx: usize) -> f64 {
        self.vertex_component(idx, 2)
    }

    /// Production time of particle `idx`.
    pub fn t(&self, idx: usize) -> f64 {
        self.vertex_component(idx, 3)
    }

    /// True if float words carry full double precision.
    pub fn is_double_precision(&self) -> bool {
        self.layout.float_width().is_double()
    }

    fn momentum_component(&self, idx: usize, comp: usize) -> f64 {
        if !self.slot_in_range(idx) {
            return 0.0;
        }
        self.read_float(self.layout.momentum_offset(idx, comp))
    }

    fn vertex_component(&self, idx: usize, comp: usize) -> f64 {
        if !self.slot_in_range(idx) {
            return 0.0;
        }
        self.read_float(self.layout.vertex_offset(idx, comp))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> EventRecord<B> {
    /// Writes one integer word at `offset`, strictly.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfAllocation`] when the word does not fit;
    /// nothing is written.
    pub fn store_int(&mut self, offset: usize, value: i32) -> Result<(), AccessError> {
        let width = self.layout.int_width();
        let raw = self.guarded_mut(offset, width.bytes())?;
        width.encode(value, raw);
        Ok(())
    }

    /// Writes one float word at `offset`, strictly.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfAllocation`] when the word does not fit;
    /// nothing is written.
    pub fn store_float(&mut self, offset: usize, value: f64) -> Result<(), AccessError> {
        let width = self.layout.float_width();
        let raw = self.guarded_mut(offset, width.bytes())?;
        width.encode(value, raw);
        Ok(())
    }

    fn guarded_mut(&mut self, offset: usize, width: usize) -> Result<&mut [u8], AccessError> {
        let buf = self.buf.as_mut();
        let err = AccessError::OutOfAllocation { offset, width, len: buf.len() };
        let end = offset.checked_add(width).ok_or(err)?;
        buf.get_mut(offset..end).ok_or(err)
    }

    /// Legacy write: out-of-allocation drops the value with a warning.
    fn write_int(&mut self, offset: usize, value: i32) {
        if let Err(err) = self.store_int(offset, value) {
            warn!(%err, "record write dropped");
        }
    }

    /// Legacy write: out-of-allocation drops the value with a warning.
    fn write_float(&mut self, offset: usize, value: f64) {
        if let Err(err) = self.store_float(offset, value) {
            warn!(%err, "record write dropped");
        }
    }

    /// Sets the event number.
    pub fn set_event_number(&mut self, event_number: i32) {
        self.write_int(self.layout.event_number_offset(), event_number);
    }

    /// Sets the entry count.
    ///
    /// The value is stored as given; the clamp against capacity happens on
    /// read (see [`entry_count`](Self::entry_count)).
    pub fn set_entry_count(&mut self, count: i32) {
        self.write_int(self.layout.entry_count_offset(), count);
    }

    /// Sets the status code of particle `idx`. No-op outside `1..=capacity`.
    pub fn set_status_code(&mut self, idx: usize, status: i32) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_int(self.layout.status_offset(idx), status);
    }

    /// Sets the PDG id of particle `idx`. No-op outside `1..=capacity`.
    pub fn set_pdg_id(&mut self, idx: usize, id: i32) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_int(self.layout.pdg_id_offset(idx), id);
    }

    /// Defines the parent range of particle `idx`. No-op outside
    /// `1..=capacity`.
    pub fn set_parents(&mut self, idx: usize, first: i32, last: i32) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_int(self.layout.first_parent_offset(idx), first);
        self.write_int(self.layout.last_parent_offset(idx), last);
    }

    /// Defines the child range of particle `idx`. No-op outside
    /// `1..=capacity`.
    pub fn set_children(&mut self, idx: usize, first: i32, last: i32) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_int(self.layout.first_child_offset(idx), first);
        self.write_int(self.layout.last_child_offset(idx), last);
    }

    /// Sets the momentum four-vector of particle `idx`. No-op outside
    /// `1..=capacity`.
    pub fn set_momentum(&mut self, idx: usize, px: f64, py: f64, pz: f64, e: f64) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_float(self.layout.momentum_offset(idx, 0), px);
        self.write_float(self.layout.momentum_offset(idx, 1), py);
        self.write_float(self.layout.momentum_offset(idx, 2), pz);
        self.write_float(self.layout.momentum_offset(idx, 3), e);
    }

    /// Sets the generated mass of particle `idx`. No-op outside
    /// `1..=capacity`.
    pub fn set_mass(&mut self, idx: usize, mass: f64) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_float(self.layout.momentum_offset(idx, 4), mass);
    }

    /// Sets the production vertex of particle `idx`. No-op outside
    /// `1..=capacity`.
    pub fn set_position(&mut self, idx: usize, x: f64, y: f64, z: f64, t: f64) {
        if !self.slot_in_range(idx) {
            return;
        }
        self.write_float(self.layout.vertex_offset(idx, 0), x);
        self.write_float(self.layout.vertex_offset(idx, 1), y);
        self.write_float(self.layout.vertex_offset(idx, 2), z);
        self.write_float(self.layout.vertex_offset(idx, 3), t);
    }

    /// Resets every logical field of every slot, plus both scalars, to zero.
    ///
    /// The layout is untouched.
    pub fn zero(&mut self) {
        self.set_event_number(0);
        self.set_entry_count(0);
        for idx in 1..=self.layout.capacity() {
            self.set_status_code(idx, 0);
            self.set_pdg_id(idx, 0);
            self.set_parents(idx, 0, 0);
            self.set_children(idx, 0, 0);
            self.set_momentum(idx, 0.0, 0.0, 0.0, 0.0);
            self.set_mass(idx, 0.0);
            self.set_position(idx, 0.0, 0.0, 0.0, 0.0);
        }
    }
}
