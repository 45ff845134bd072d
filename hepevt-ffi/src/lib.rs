//! FFI bindings for the HEPEVT record engine
//!
//! This crate provides a C-compatible interface over an owned record block,
//! mirroring the classic `hepevt_*` C API surface: one handle per block,
//! 1-based particle indices, integer status returns.
//!
//! # Safety Guarantees
//!
//! - No panic may cross the FFI boundary (enforced by `ffi_guard`)
//! - Null pointer checks on all handle arguments
//! - ABI stability via `#[repr(C)]` and `extern "C"`
//!
//! # Error Handling
//!
//! Errors are reported through sentinel return values (`NULL`, `-1`) plus a
//! thread-local error message readable via `hepevt_last_error_message()`.
//! Out-of-allocation accesses inside a block follow the engine's own
//! degradation contract (reads return 0, writes are dropped) and are not
//! FFI errors.
//!
//! # Thread Safety
//!
//! A block handle requires external serialization: one writer at a time,
//! no readers during writes. Each thread has its own error message storage.

use hepevt_core::{EventRecord, RecordBlock, RecordLayout, check_consistency, dump_particle,
    dump_record};
use libc::{c_char, c_double, c_int, size_t};
use std::cell::RefCell;
use std::ffi::CString;
use std::ptr;

/// Internal state holder (not exposed to C)
struct HepevtState {
    layout: RecordLayout,
    block: RecordBlock,
}

impl HepevtState {
    fn record(&mut self) -> EventRecord<&mut [u8]> {
        EventRecord::new(self.block.as_mut_slice(), self.layout)
    }
}

/// Opaque handle to a record block (C-compatible)
///
/// C code only ever sees pointers to this type; the real data lives in the
/// Rust-internal `HepevtState`.
#[repr(C)]
pub struct HepevtBlock {
    _private: [u8; 0],
}

thread_local! {
    /// Thread-local storage for error messages
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message for the current thread.
///
/// Interior NULs are escaped so error reporting itself cannot panic.
fn set_last_error(err: impl std::fmt::Display) {
    LAST_ERROR.with(|cell| {
        let safe_msg = err.to_string().replace('\0', "\\0");
        let c_str = CString::new(safe_msg).unwrap_or_default();
        *cell.borrow_mut() = Some(c_str);
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Panic barrier: no Rust panic may ever unwind across the FFI boundary.
///
/// `AssertUnwindSafe` is permitted here because the operation is abandoned
/// on panic; no broken logic is resumed.
fn ffi_guard<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => Some(result),
        Err(e) => {
            let msg = if let Some(s) = e.downcast_ref::<&str>() {
                format!("Panic: {s}")
            } else if let Some(s) = e.downcast_ref::<String>() {
                format!("Panic: {s}")
            } else {
                "Unknown panic".to_string()
            };
            set_last_error(msg);
            None
        }
    }
}

/// Shared plumbing for every handle-taking entry point: guard panics, check
/// the handle, run `f` on the state.
///
/// # Safety
///
/// `ptr` must be null or a valid pointer obtained from `hepevt_new`, with
/// no other thread accessing it during the call.
unsafe fn with_block<R, F>(ptr: *mut HepevtBlock, fallback: R, f: F) -> R
where
    R: Copy,
    F: FnOnce(&mut HepevtState) -> R,
{
    ffi_guard(|| {
        // SAFETY: caller guarantees ptr is null or valid with exclusive access
        match unsafe { ptr.cast::<HepevtState>().as_mut() } {
            Some(state) => f(state),
            None => {
                set_last_error("null block pointer");
                fallback
            }
        }
    })
    .unwrap_or(fallback)
}

/// Converts a C particle index (1-based) to the engine's slot index.
///
/// Non-positive indices map to slot 0, the absent sentinel, which every
/// accessor treats as out of range.
fn slot(idx: c_int) -> usize {
    usize::try_from(idx).unwrap_or(0)
}

//
// === LIFECYCLE MANAGEMENT ===
//

/// Allocate a zeroed record block.
///
/// # Arguments
///
/// - `max_entries`: particle capacity of the block
/// - `int_bytes`: integer width, 2 or 4
/// - `float_bytes`: float width, 4 or 8
///
/// # Returns
///
/// - Non-NULL handle on success
/// - NULL on an unsupported width (check `hepevt_last_error_message()`)
///
/// # Safety
///
/// The returned handle must be released with `hepevt_free()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_new(
    max_entries: u32,
    int_bytes: u32,
    float_bytes: u32,
) -> *mut HepevtBlock {
    ffi_guard(|| {
        let mut layout = RecordLayout::default();
        layout.set_capacity(max_entries as usize);
        if let Err(err) = layout.set_int_width(int_bytes as usize) {
            set_last_error(err);
            return ptr::null_mut();
        }
        if let Err(err) = layout.set_float_width(float_bytes as usize) {
            set_last_error(err);
            return ptr::null_mut();
        }

        clear_last_error();
        let block = RecordBlock::new(&layout);
        let state = Box::new(HepevtState { layout, block });
        Box::into_raw(state).cast::<HepevtBlock>()
    })
    .unwrap_or(ptr::null_mut())
}

/// Free a record block and release its memory.
///
/// # Safety
///
/// - `ptr` must be NULL or a valid handle from `hepevt_new()`
/// - After this call the handle is invalid and must not be used
/// - Safe to call with NULL (no-op)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_free(ptr: *mut HepevtBlock) {
    if !ptr.is_null() {
        ffi_guard(|| {
            // SAFETY: caller guarantees ptr came from hepevt_new
            let _ = unsafe { Box::from_raw(ptr.cast::<HepevtState>()) };
        });
    }
}

//
// === BLOCK INTROSPECTION ===
//

/// Integer width of the block in bytes, or 0 for a NULL handle.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_sizeof_int(ptr: *mut HepevtBlock) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.layout.int_width().bytes() as c_int) }
}

/// Float width of the block in bytes, or 0 for a NULL handle.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_sizeof_real(ptr: *mut HepevtBlock) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.layout.float_width().bytes() as c_int) }
}

/// Particle capacity of the block, or 0 for a NULL handle.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_max_number_entries(ptr: *mut HepevtBlock) -> c_int {
    unsafe {
        with_block(ptr, 0, |state| {
            c_int::try_from(state.layout.capacity()).unwrap_or(c_int::MAX)
        })
    }
}

/// 1 if the block stores doubles, 0 for single precision or NULL.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_is_double_precision(ptr: *mut HepevtBlock) -> c_int {
    unsafe { with_block(ptr, 0, |state| c_int::from(state.layout.float_width().is_double())) }
}

/// Total byte size of the block, or 0 for a NULL handle.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_bytes(ptr: *mut HepevtBlock) -> size_t {
    unsafe { with_block(ptr, 0, |state| state.block.len()) }
}

//
// === SCALAR ACCESS ===
//

/// Event number.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_event_number(ptr: *mut HepevtBlock) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().event_number()) }
}

/// Set the event number.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_event_number(ptr: *mut HepevtBlock, evtno: c_int) {
    unsafe { with_block(ptr, (), |state| state.record().set_event_number(evtno)) }
}

/// Number of valid particles, clamped to the block's capacity.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_number_entries(ptr: *mut HepevtBlock) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().entry_count()) }
}

/// Set the number of valid particles.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_number_entries(ptr: *mut HepevtBlock, entries: c_int) {
    unsafe { with_block(ptr, (), |state| state.record().set_entry_count(entries)) }
}

//
// === PARTICLE ACCESS (1-based indices) ===
//

/// Status code of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_status_code(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().status_code(slot(idx))) }
}

/// PDG id of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_pdg_id(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().pdg_id(slot(idx))) }
}

/// First parent of particle `idx`, or 0 if none.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_first_parent(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().first_parent(slot(idx))) }
}

/// Last parent of particle `idx`; collapses to the first parent for
/// single-parent particles.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_last_parent(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().last_parent(slot(idx))) }
}

/// Number of parents of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_number_parents(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().number_parents(slot(idx))) }
}

/// First child of particle `idx`, or 0 if none.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_first_child(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().first_child(slot(idx))) }
}

/// Last child of particle `idx`; collapses to the first child for
/// single-child particles.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_last_child(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().last_child(slot(idx))) }
}

/// Number of children of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_number_children(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe { with_block(ptr, 0, |state| state.record().number_children(slot(idx))) }
}

/// X momentum of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_px(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().px(slot(idx))) }
}

/// Y momentum of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_py(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().py(slot(idx))) }
}

/// Z momentum of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_pz(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().pz(slot(idx))) }
}

/// Energy of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_e(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().e(slot(idx))) }
}

/// Generated mass of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_m(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().m(slot(idx))) }
}

/// X production vertex of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_x(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().x(slot(idx))) }
}

/// Y production vertex of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_y(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().y(slot(idx))) }
}

/// Z production vertex of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_z(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().z(slot(idx))) }
}

/// Production time of particle `idx`.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_t(ptr: *mut HepevtBlock, idx: c_int) -> c_double {
    unsafe { with_block(ptr, 0.0, |state| state.record().t(slot(idx))) }
}

/// Set the status code of particle `idx`. No-op for out-of-range indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_status_code(ptr: *mut HepevtBlock, idx: c_int, status: c_int) {
    unsafe { with_block(ptr, (), |state| state.record().set_status_code(slot(idx), status)) }
}

/// Set the PDG id of particle `idx`. No-op for out-of-range indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_pdg_id(ptr: *mut HepevtBlock, idx: c_int, id: c_int) {
    unsafe { with_block(ptr, (), |state| state.record().set_pdg_id(slot(idx), id)) }
}

/// Define the parent range of particle `idx`. No-op for out-of-range
/// indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_parents(
    ptr: *mut HepevtBlock,
    idx: c_int,
    first_parent: c_int,
    last_parent: c_int,
) {
    unsafe {
        with_block(ptr, (), |state| {
            state.record().set_parents(slot(idx), first_parent, last_parent);
        });
    }
}

/// Define the child range of particle `idx`. No-op for out-of-range
/// indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_children(
    ptr: *mut HepevtBlock,
    idx: c_int,
    first_child: c_int,
    last_child: c_int,
) {
    unsafe {
        with_block(ptr, (), |state| {
            state.record().set_children(slot(idx), first_child, last_child);
        });
    }
}

/// Set the momentum four-vector of particle `idx`. No-op for out-of-range
/// indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_momentum(
    ptr: *mut HepevtBlock,
    idx: c_int,
    px: c_double,
    py: c_double,
    pz: c_double,
    e: c_double,
) {
    unsafe { with_block(ptr, (), |state| state.record().set_momentum(slot(idx), px, py, pz, e)) }
}

/// Set the generated mass of particle `idx`. No-op for out-of-range
/// indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_mass(ptr: *mut HepevtBlock, idx: c_int, mass: c_double) {
    unsafe { with_block(ptr, (), |state| state.record().set_mass(slot(idx), mass)) }
}

/// Set the production vertex of particle `idx`. No-op for out-of-range
/// indices.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_set_position(
    ptr: *mut HepevtBlock,
    idx: c_int,
    x: c_double,
    y: c_double,
    z: c_double,
    t: c_double,
) {
    unsafe { with_block(ptr, (), |state| state.record().set_position(slot(idx), x, y, z, t)) }
}

//
// === MAINTENANCE ===
//

/// Reset every field of the block to zero.
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_zero(ptr: *mut HepevtBlock) {
    unsafe { with_block(ptr, (), |state| state.record().zero()) }
}

/// Check parent/child consistency over the whole block.
///
/// # Returns
///
/// - 1 if consistent
/// - 0 if violations were found (rendered into
///   `hepevt_last_error_message()`)
/// - -1 for a NULL handle
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_check_consistency(ptr: *mut HepevtBlock) -> c_int {
    unsafe {
        with_block(ptr, -1, |state| {
            let record = state.record();
            let report = check_consistency(&record);
            if report.is_consistent() {
                clear_last_error();
                1
            } else {
                let rendered: Vec<String> =
                    report.findings().iter().map(ToString::to_string).collect();
                set_last_error(rendered.join("\n"));
                0
            }
        })
    }
}

/// Write a human-readable dump of the block to stdout.
///
/// # Returns
///
/// - 0 on success
/// - -1 on a NULL handle or write failure
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_print(ptr: *mut HepevtBlock) -> c_int {
    unsafe {
        with_block(ptr, -1, |state| {
            let record = state.record();
            match dump_record(&record, &mut std::io::stdout()) {
                Ok(()) => 0,
                Err(err) => {
                    set_last_error(err);
                    -1
                }
            }
        })
    }
}

/// Write the two-line entry for particle `idx` to stdout.
///
/// # Returns
///
/// - 0 on success
/// - -1 on a NULL handle or write failure
///
/// # Safety
///
/// `ptr` must be NULL or a valid handle from `hepevt_new()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hepevt_print_particle(ptr: *mut HepevtBlock, idx: c_int) -> c_int {
    unsafe {
        with_block(ptr, -1, |state| {
            let record = state.record();
            match dump_particle(&record, slot(idx), &mut std::io::stdout()) {
                Ok(()) => 0,
                Err(err) => {
                    set_last_error(err);
                    -1
                }
            }
        })
    }
}

//
// === ERROR HANDLING ===
//

/// Get the last error message for the current thread.
///
/// # Returns
///
/// - Pointer to a NULL-terminated string, or NULL if no error occurred
///
/// # Lifetime
///
/// Valid until the next FFI call on this thread. Do NOT free the returned
/// pointer.
#[unsafe(no_mangle)]
pub extern "C" fn hepevt_last_error_message() -> *const c_char {
    LAST_ERROR.with(|cell| cell.borrow().as_ref().map(|s| s.as_ptr()).unwrap_or(ptr::null()))
}

//
// === VERSIONING ===
//

/// Get the library version.
///
/// # Lifetime
///
/// Valid for the lifetime of the program. Do NOT free the returned pointer.
#[unsafe(no_mangle)]
pub extern "C" fn hepevt_version() -> *const c_char {
    // concat! appends the null terminator required by C.
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

    VERSION.as_ptr() as *const c_char
}

//
// === TESTS ===
//
