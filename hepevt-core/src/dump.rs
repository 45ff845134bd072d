//! Human-readable rendering of a record to any [`io::Write`] sink.
//!
//! Values are rendered through the decoded accessors, so the dump shows what
//! consumers of the record will see, not the raw stored words.

use crate::record::EventRecord;
use std::io::{self, Write};

const RULE: &str =
    "________________________________________________________________________________";

/// Writes the whole record: banner, legend, one entry per valid particle.
///
/// # Errors
///
/// Propagates any error from the sink.
pub fn dump_record<B, W>(record: &EventRecord<B>, out: &mut W) -> io::Result<()>
where
    B: AsRef<[u8]>,
    W: Write,
{
    writeln!(out, "{RULE}")?;
    write!(
        out,
        "***** Event #{}: {} particles (max {}) *****",
        record.event_number(),
        record.entry_count(),
        record.layout().capacity(),
    )?;
    if record.is_double_precision() {
        writeln!(out, " double precision")?;
    } else {
        writeln!(out, " single precision")?;
    }
    writeln!(
        out,
        "{}-byte integers, {}-byte floating point numbers",
        record.layout().int_width().bytes(),
        record.layout().float_width().bytes(),
    )?;
    write_legend(out)?;
    writeln!(out, "{RULE}")?;
    for idx in 1..=record.entry_count().max(0) as usize {
        dump_particle(record, idx, out)?;
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Writes the two-line entry for particle `idx`.
///
/// # Errors
///
/// Propagates any error from the sink.
pub fn dump_particle<B, W>(record: &EventRecord<B>, idx: usize, out: &mut W) -> io::Result<()>
where
    B: AsRef<[u8]>,
    W: Write,
{
    writeln!(
        out,
        "{:4} {:+4} {:4} {:4}    ({:9.3e}, {:9.3e}, {:9.3e}, {:9.3e}, {:9.3e})",
        idx,
        record.status_code(idx),
        record.first_parent(idx),
        record.first_child(idx),
        record.px(idx),
        record.py(idx),
        record.pz(idx),
        record.e(idx),
        record.m(idx),
    )?;
    writeln!(
        out,
        "{:+9} {:4} {:4}    ({:9.3e}, {:9.3e}, {:9.3e}, {:9.3e})",
        record.pdg_id(idx),
        record.last_parent(idx),
        record.last_child(idx),
        record.x(idx),
        record.y(idx),
        record.z(idx),
        record.t(idx),
    )
}

fn write_legend<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{:4} {:4} {:4} {:5}   {:10}, {:9}, {:9}, {:9}, {:10}",
        "Indx", "Stat", "Par-", "chil-", "(  P_x", "P_y", "P_z", "Energy", "M ) "
    )?;
    writeln!(
        out,
        "{:9} {:4} {:4}    {:10}, {:9}, {:9}, {:9}) {:9}",
        "ID ", "ents", "dren", "Prod (   X", "Y", "Z", "cT", "[mm]"
    )
}
