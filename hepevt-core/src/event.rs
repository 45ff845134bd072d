//! Owned event view: gather a record into plain structs, scatter it back.
//!
//! The record image is convenient for interop but awkward to build or
//! inspect field by field. [`Event`] is the ergonomic in-memory counterpart:
//! decode once with [`Event::from_record`], manipulate plain data, re-encode
//! with [`Event::write_to`].

use crate::record::EventRecord;

/// One fully decoded particle slot.
///
/// Parent/child ranges keep the record's conventions: inclusive 1-based slot
/// intervals, `(0, 0)` meaning "none recorded".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    /// Status code.
    pub status: i32,
    /// PDG particle id.
    pub pdg_id: i32,
    /// (first, last) parent slot range.
    pub parents: (i32, i32),
    /// (first, last) child slot range.
    pub children: (i32, i32),
    /// px, py, pz, e, m.
    pub momentum: [f64; 5],
    /// x, y, z, t.
    pub vertex: [f64; 4],
}

/// One fully decoded event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Event number.
    pub number: i32,
    /// Valid particles, in slot order: `particles[0]` is slot 1.
    pub particles: Vec<Particle>,
}

impl Event {
    /// Gathers the record into an owned event.
    ///
    /// Values pass through the decoded accessors, so clamping and tie-break
    /// rules have already been applied.
    #[must_use]
    pub fn from_record<B: AsRef<[u8]>>(record: &EventRecord<B>) -> Self {
        let count = record.entry_count().max(0) as usize;
        let mut particles = Vec::with_capacity(count);
        for idx in 1..=count {
            particles.push(Particle {
                status: record.status_code(idx),
                pdg_id: record.pdg_id(idx),
                parents: (record.first_parent(idx), record.last_parent(idx)),
                children: (record.first_child(idx), record.last_child(idx)),
                momentum: [
                    record.px(idx),
                    record.py(idx),
                    record.pz(idx),
                    record.e(idx),
                    record.m(idx),
                ],
                vertex: [record.x(idx), record.y(idx), record.z(idx), record.t(idx)],
            });
        }
        Self { number: record.event_number(), particles }
    }

    /// Scatters the event back into a record.
    ///
    /// Slots beyond the record's capacity are dropped by the setters'
    /// index guards; the stored entry count is the particle count as given
    /// and clamps on read.
    pub fn write_to<B: AsRef<[u8]> + AsMut<[u8]>>(&self, record: &mut EventRecord<B>) {
        record.set_event_number(self.number);
        record.set_entry_count(i32::try_from(self.particles.len()).unwrap_or(i32::MAX));
        for (slot, p) in self.particles.iter().enumerate() {
            let idx = slot + 1;
            record.set_status_code(idx, p.status);
            record.set_pdg_id(idx, p.pdg_id);
            record.set_parents(idx, p.parents.0, p.parents.1);
            record.set_children(idx, p.children.0, p.children.1);
            record.set_momentum(idx, p.momentum[0], p.momentum[1], p.momentum[2], p.momentum[3]);
            record.set_mass(idx, p.momentum[4]);
            record.set_position(idx, p.vertex[0], p.vertex[1], p.vertex[2], p.vertex[3]);
        }
    }
}
