use hepevt_core::{EventRecord, FileBlock, FloatWidth, IntWidth, RecordBlock, RecordLayout};
use tempfile::NamedTempFile;

#[test]
fn test_record_block_is_sized_and_zeroed() {
    let layout = RecordLayout::new(IntWidth::Two, FloatWidth::Four, 10);
    let block = RecordBlock::new(&layout);

    assert_eq!(block.len(), layout.byte_size());
    assert!(block.as_slice().iter().all(|&b| b == 0));

    let record = EventRecord::new(block.as_slice(), layout);
    assert_eq!(record.event_number(), 0);
    assert_eq!(record.entry_count(), 0);
}

#[test]
fn test_file_block_create_write_reopen() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();
    let layout = RecordLayout::new(IntWidth::Four, FloatWidth::Eight, 16);

    {
        let mut block = FileBlock::open(path, &layout).unwrap();
        assert_eq!(block.len(), layout.byte_size());

        let mut record = EventRecord::new(block.as_mut_slice(), layout);
        record.set_event_number(12);
        record.set_entry_count(1);
        record.set_status_code(1, 1);
        record.set_pdg_id(1, 2212);
        record.set_momentum(1, 0.5, -0.5, 7.0, 7.1);
        drop(record);

        block.commit().unwrap();
    }

    // Reopen and verify the record persisted.
    let block = FileBlock::open(path, &layout).unwrap();
    let record = EventRecord::new(block.as_slice(), layout);
    assert_eq!(record.event_number(), 12);
    assert_eq!(record.entry_count(), 1);
    assert_eq!(record.pdg_id(1), 2212);
    assert_eq!(record.pz(1), 7.0);
}

#[test]
fn test_file_block_exclusive_locking() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();
    let layout = RecordLayout::new(IntWidth::Four, FloatWidth::Eight, 4);

    let _first = FileBlock::open(path, &layout).unwrap();

    let second = FileBlock::open(path, &layout);
    assert!(second.is_err());
    assert!(second.unwrap_err().to_string().contains("already open"));
}

#[test]
fn test_file_block_lock_released_on_drop() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();
    let layout = RecordLayout::new(IntWidth::Four, FloatWidth::Eight, 4);

    {
        let _block = FileBlock::open(path, &layout).unwrap();
    }

    assert!(FileBlock::open(path, &layout).is_ok());
}

#[test]
fn test_short_file_is_zero_extended() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();
    std::fs::write(path, [0xFFu8; 3]).unwrap();

    let layout = RecordLayout::new(IntWidth::Two, FloatWidth::Four, 4);
    let block = FileBlock::open(path, &layout).unwrap();

    assert_eq!(block.len(), layout.byte_size());
    // Grown region reads as zero, so per-particle fields decode as absent.
    let record = EventRecord::new(block.as_slice(), layout);
    assert_eq!(record.status_code(4), 0);
    assert_eq!(record.first_parent(1), 0);
}

#[test]
fn test_larger_file_is_left_alone() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let layout = RecordLayout::new(IntWidth::Two, FloatWidth::Four, 4);
    let oversized = layout.byte_size() + 100;
    std::fs::write(path, vec![0u8; oversized]).unwrap();

    let block = FileBlock::open(path, &layout).unwrap();
    assert_eq!(block.len(), oversized);
}

#[test]
fn test_mapped_block_survives_width_reconfiguration_between_records() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    // Write under one layout, zero, reconfigure, write under another: the
    // same allocation serves both, as long as it is large enough.
    let mut layout = RecordLayout::new(IntWidth::Four, FloatWidth::Eight, 8);
    let mut block = FileBlock::open(path, &layout).unwrap();

    let mut record = EventRecord::new(block.as_mut_slice(), layout);
    record.set_entry_count(1);
    record.set_pdg_id(1, 443);
    assert_eq!(record.pdg_id(1), 443);
    record.zero();
    drop(record);

    layout.set_int_width(2).unwrap();
    layout.set_float_width(4).unwrap();
    assert!(layout.byte_size() <= block.len());

    let mut record = EventRecord::new(block.as_mut_slice(), layout);
    record.set_entry_count(1);
    record.set_pdg_id(1, 443);
    assert_eq!(record.pdg_id(1), 443);
}
