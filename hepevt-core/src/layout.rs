//! Byte-offset arithmetic for the flat record image.
//!
//! # Layout
//!
//! With integer width `I`, float width `F` and capacity `N`, one record is a
//! single `I*(2 + 6N) + F*9N`-byte buffer holding parallel arrays:
//!
//! ```text
//! Offset              Size    Field
//! ------              ----    -----
//! 0                   I       event_number
//! I                   I       entry_count
//! I*2                 I*N     status[1..=N]
//! I*(2+N)             I*N     pdg_id[1..=N]
//! I*(2+2N)            I*2N    (first_parent, last_parent)[1..=N]
//! I*(2+4N)            I*2N    (first_child, last_child)[1..=N]
//! I*(2+6N)            F*5N    (px, py, pz, e, m)[1..=N]
//! I*(2+6N) + F*5N     F*4N    (x, y, z, t)[1..=N]
//! ```
//!
//! Every offset is a pure function of `(I, F, N, field, index)`; no two
//! logical fields share a byte range. Particle indices are 1-based; slot 0
//! is the "absent" sentinel and is never stored.
//!
//! # Layout Invariants
//!
//! - Changing a width or the capacity changes every per-particle offset;
//!   a buffer must only ever be read under the layout it was written with.
//! - The capacity is an arithmetic parameter, independent of how many bytes
//!   the caller actually allocated.

use crate::ConfigError;
use crate::width::{FloatWidth, IntWidth};
use tracing::warn;

/// Default capacity, matching the historical common-block allocation.
pub const DEFAULT_CAPACITY: usize = 4000;

/// Field addressing and configuration for one record image.
///
/// A layout is a plain value passed alongside the buffer it describes.
/// Reconfiguring between records is cheap; reconfiguring while a record is
/// being decoded reinterprets the same bytes under different arithmetic and
/// is always a caller bug (see the crate-level concurrency notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    int_width: IntWidth,
    float_width: FloatWidth,
    capacity: usize,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            int_width: IntWidth::Four,
            float_width: FloatWidth::Eight,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl RecordLayout {
    /// Creates a layout from explicit widths and capacity.
    #[must_use]
    pub const fn new(int_width: IntWidth, float_width: FloatWidth, capacity: usize) -> Self {
        Self { int_width, float_width, capacity }
    }

    /// Width of the record's integer words.
    #[must_use]
    pub const fn int_width(&self) -> IntWidth {
        self.int_width
    }

    /// Width of the record's floating-point words.
    #[must_use]
    pub const fn float_width(&self) -> FloatWidth {
        self.float_width
    }

    /// Maximum particle slots the offset arithmetic assumes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Requests a new integer width in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedIntWidth`] for widths other than
    /// 2 or 4; the prior configuration is retained.
    pub fn set_int_width(&mut self, bytes: usize) -> Result<(), ConfigError> {
        match IntWidth::from_bytes(bytes) {
            Ok(width) => {
                self.int_width = width;
                Ok(())
            }
            Err(err) => {
                warn!(
                    requested = bytes,
                    current = self.int_width.bytes(),
                    "rejected integer width, keeping current configuration"
                );
                Err(err)
            }
        }
    }

    /// Requests a new float width in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFloatWidth`] for widths other than
    /// 4 or 8; the prior configuration is retained.
    pub fn set_float_width(&mut self, bytes: usize) -> Result<(), ConfigError> {
        match FloatWidth::from_bytes(bytes) {
            Ok(width) => {
                self.float_width = width;
                Ok(())
            }
            Err(err) => {
                warn!(
                    requested = bytes,
                    current = self.float_width.bytes(),
                    "rejected float width, keeping current configuration"
                );
                Err(err)
            }
        }
    }

    /// Sets the capacity.
    ///
    /// Any value is accepted: the capacity only drives offset arithmetic.
    /// The caller owns the buffer and is responsible for sizing it to
    /// [`byte_size`](Self::byte_size) for the configured capacity.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Total byte size of the record image under this layout.
    #[must_use]
    pub const fn byte_size(&self) -> usize {
        self.int_width.bytes() * (2 + 6 * self.capacity)
            + self.float_width.bytes() * (9 * self.capacity)
    }

    /// Offset of the event number scalar.
    #[must_use]
    pub const fn event_number_offset(&self) -> usize {
        0
    }

    /// Offset of the entry count scalar.
    #[must_use]
    pub const fn entry_count_offset(&self) -> usize {
        self.int_width.bytes()
    }

    /// Offset of `status[idx]`, `idx` in `1..=capacity`.
    #[must_use]
    pub const fn status_offset(&self, idx: usize) -> usize {
        self.int_width.bytes() * (2 + (idx - 1))
    }

    /// Offset of `pdg_id[idx]`.
    #[must_use]
    pub const fn pdg_id_offset(&self, idx: usize) -> usize {
        self.int_width.bytes() * (2 + self.capacity + (idx - 1))
    }

    /// Offset of `first_parent[idx]`.
    #[must_use]
    pub const fn first_parent_offset(&self, idx: usize) -> usize {
        self.int_width.bytes() * (2 + 2 * self.capacity + 2 * (idx - 1))
    }

    /// Offset of `last_parent[idx]`.
    #[must_use]
    pub const fn last_parent_offset(&self, idx: usize) -> usize {
        self.int_width.bytes() * (2 + 2 * self.capacity + 2 * (idx - 1) + 1)
    }

    /// Offset of `first_child[idx]`.
    #[must_use]
    pub const fn first_child_offset(&self, idx: usize) -> usize {
        self.int_width.bytes() * (2 + 4 * self.capacity + 2 * (idx - 1))
    }

    /// Offset of `last_child[idx]`.
    #[must_use]
    pub const fn last_child_offset(&self, idx: usize) -> usize {
        self.int_width.bytes() * (2 + 4 * self.capacity + 2 * (idx - 1) + 1)
    }

    /// Offset of momentum component `comp` of particle `idx`.
    ///
    /// Components are `0..5`: px, py, pz, e, m.
    #[must_use]
    pub const fn momentum_offset(&self, idx: usize, comp: usize) -> usize {
        self.momentum_base() + self.float_width.bytes() * (5 * (idx - 1) + comp)
    }

    /// Offset of vertex component `comp` of particle `idx`.
    ///
    /// Components are `0..4`: x, y, z, t.
    #[must_use]
    pub const fn vertex_offset(&self, idx: usize, comp: usize) -> usize {
        self.momentum_base()
            + self.float_width.bytes() * (5 * self.capacity + 4 * (idx - 1) + comp)
    }

    /// First byte of the floating-point region.
    const fn momentum_base(&self) -> usize {
        self.int_width.bytes() * (2 + 6 * self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_configs() -> [RecordLayout; 4] {
        [
            RecordLayout::new(IntWidth::Two, FloatWidth::Four, 100),
            RecordLayout::new(IntWidth::Two, FloatWidth::Eight, 100),
            RecordLayout::new(IntWidth::Four, FloatWidth::Four, 100),
            RecordLayout::new(IntWidth::Four, FloatWidth::Eight, 100),
        ]
    }

    #[test]
    fn test_default_layout() {
        let layout = RecordLayout::default();
        assert_eq!(layout.int_width(), IntWidth::Four);
        assert_eq!(layout.float_width(), FloatWidth::Eight);
        assert_eq!(layout.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_byte_size_formula() {
        // The classic full-size block: 4-byte ints, doubles, 4000 slots.
        let layout = RecordLayout::default();
        assert_eq!(layout.byte_size(), 4 * (2 + 6 * 4000) + 8 * (9 * 4000));

        for layout in all_configs() {
            let i = layout.int_width().bytes();
            let f = layout.float_width().bytes();
            let n = layout.capacity();
            assert_eq!(layout.byte_size(), i * (2 + 6 * n) + f * (9 * n));
        }
    }

    #[test]
    fn test_scalar_offsets() {
        for layout in all_configs() {
            assert_eq!(layout.event_number_offset(), 0);
            assert_eq!(layout.entry_count_offset(), layout.int_width().bytes());
        }
    }

    #[test]
    fn test_integer_field_offsets() {
        for layout in all_configs() {
            let i = layout.int_width().bytes();
            let n = layout.capacity();

            assert_eq!(layout.status_offset(1), i * 2);
            assert_eq!(layout.status_offset(7), i * (2 + 6));
            assert_eq!(layout.pdg_id_offset(1), i * (2 + n));
            assert_eq!(layout.first_parent_offset(1), i * (2 + 2 * n));
            assert_eq!(layout.last_parent_offset(1), i * (2 + 2 * n + 1));
            assert_eq!(layout.first_parent_offset(3), i * (2 + 2 * n + 4));
            assert_eq!(layout.first_child_offset(1), i * (2 + 4 * n));
            assert_eq!(layout.last_child_offset(n), i * (2 + 4 * n + 2 * (n - 1) + 1));
        }
    }

    #[test]
    fn test_float_field_offsets() {
        for layout in all_configs() {
            let i = layout.int_width().bytes();
            let f = layout.float_width().bytes();
            let n = layout.capacity();
            let base = i * (2 + 6 * n);

            assert_eq!(layout.momentum_offset(1, 0), base);
            assert_eq!(layout.momentum_offset(1, 4), base + f * 4);
            assert_eq!(layout.momentum_offset(2, 0), base + f * 5);
            assert_eq!(layout.vertex_offset(1, 0), base + f * 5 * n);
            assert_eq!(layout.vertex_offset(2, 3), base + f * (5 * n + 7));
        }
    }

    #[test]
    fn test_field_regions_tile_the_buffer() {
        // Each region must end exactly where the next begins, and the last
        // must end exactly at byte_size: no gaps, no aliasing.
        for layout in all_configs() {
            let i = layout.int_width().bytes();
            let f = layout.float_width().bytes();
            let n = layout.capacity();

            assert_eq!(layout.entry_count_offset() + i, layout.status_offset(1));
            assert_eq!(layout.status_offset(n) + i, layout.pdg_id_offset(1));
            assert_eq!(layout.pdg_id_offset(n) + i, layout.first_parent_offset(1));
            assert_eq!(layout.last_parent_offset(n) + i, layout.first_child_offset(1));
            assert_eq!(layout.last_child_offset(n) + i, layout.momentum_offset(1, 0));
            assert_eq!(layout.momentum_offset(n, 4) + f, layout.vertex_offset(1, 0));
            assert_eq!(layout.vertex_offset(n, 3) + f, layout.byte_size());
        }
    }

    #[test]
    fn test_rejected_width_keeps_prior_configuration() {
        let mut layout = RecordLayout::default();

        assert!(layout.set_int_width(3).is_err());
        assert_eq!(layout.int_width(), IntWidth::Four);

        assert!(layout.set_float_width(10).is_err());
        assert_eq!(layout.float_width(), FloatWidth::Eight);

        assert!(layout.set_int_width(2).is_ok());
        assert_eq!(layout.int_width(), IntWidth::Two);
        assert!(layout.set_float_width(4).is_ok());
        assert_eq!(layout.float_width(), FloatWidth::Four);
    }

    #[test]
    fn test_capacity_accepts_any_value() {
        let mut layout = RecordLayout::default();

        layout.set_capacity(0);
        assert_eq!(layout.capacity(), 0);
        // Only the two scalars remain.
        assert_eq!(layout.byte_size(), 2 * layout.int_width().bytes());

        layout.set_capacity(1);
        assert_eq!(layout.byte_size(), 4 * 8 + 8 * 9);
    }

    #[test]
    fn test_offsets_depend_only_on_configuration() {
        let a = RecordLayout::new(IntWidth::Two, FloatWidth::Four, 50);
        let b = RecordLayout::new(IntWidth::Two, FloatWidth::Four, 50);
        for idx in [1, 2, 25, 50] {
            assert_eq!(a.status_offset(idx), b.status_offset(idx));
            assert_eq!(a.momentum_offset(idx, 3), b.momentum_offset(idx, 3));
            assert_eq!(a.vertex_offset(idx, 1), b.vertex_offset(idx, 1));
        }
    }
}
