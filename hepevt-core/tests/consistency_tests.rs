use hepevt_core::{
    EventRecord, Finding, FloatWidth, IntWidth, RecordBlock, RecordLayout, check_consistency,
};

fn record_with_capacity(capacity: usize) -> (RecordBlock, RecordLayout) {
    let layout = RecordLayout::new(IntWidth::Four, FloatWidth::Eight, capacity);
    (RecordBlock::new(&layout), layout)
}

#[test]
fn test_three_particle_decay_is_consistent() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    // Particle 1 decays into particle 2; particle 3 is unrelated.
    record.set_entry_count(3);
    record.set_children(1, 2, 2);
    record.set_parents(2, 1, 1);

    let report = check_consistency(&record);
    assert!(report.is_consistent());
    assert!(report.findings().is_empty());
}

#[test]
fn test_mismatched_child_range_is_flagged_once() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    // Particle 2 claims particle 1 as parent, but particle 1's child range
    // only covers particle 3.
    record.set_entry_count(3);
    record.set_children(1, 3, 3);
    record.set_parents(2, 1, 1);
    record.set_parents(3, 1, 1);

    let report = check_consistency(&record);
    assert!(!report.is_consistent());
    assert_eq!(
        report.findings(),
        [Finding::ParentChildMismatch { particle: 2, parent: 1 }]
    );
}

#[test]
fn test_parent_with_empty_child_listing_is_tolerated() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    // Particle 1 never filled in its child pointers: not a violation.
    record.set_entry_count(2);
    record.set_parents(2, 1, 1);

    assert!(check_consistency(&record).is_consistent());
}

#[test]
fn test_child_with_empty_parent_listing_is_tolerated() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    record.set_entry_count(2);
    record.set_children(1, 2, 2);

    assert!(check_consistency(&record).is_consistent());
}

#[test]
fn test_child_pass_flags_unreciprocated_parent_range() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    // Particle 1 declares child 2, but particle 2 says its parent is 3.
    record.set_entry_count(3);
    record.set_children(1, 2, 2);
    record.set_parents(2, 3, 3);

    let report = check_consistency(&record);
    assert_eq!(
        report.findings(),
        [Finding::ChildParentMismatch { particle: 1, child: 2 }]
    );
}

#[test]
fn test_every_violation_is_enumerated() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    // Two independent violations; the walk must report both.
    record.set_entry_count(3);
    record.set_parents(2, 1, 1);
    record.set_children(1, 3, 3); // disagrees with particle 2's claim
    record.set_parents(3, 2, 2); // particle 2 lists no children

    // particle 2 has no child range, so particle 3's claim is checked
    // against an explicit, disjoint range instead
    record.set_children(2, 1, 1);

    let report = check_consistency(&record);
    assert!(!report.is_consistent());
    assert_eq!(report.findings().len(), 3);
    assert!(
        report
            .findings()
            .contains(&Finding::ParentChildMismatch { particle: 2, parent: 1 })
    );
    assert!(
        report
            .findings()
            .contains(&Finding::ParentChildMismatch { particle: 3, parent: 2 })
    );
}

#[test]
fn test_empty_record_is_consistent() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);
    record.set_entry_count(0);

    assert!(check_consistency(&record).is_consistent());
}

#[test]
fn test_whole_cascade_is_walked() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    // 1 -> (2, 3), 2 -> (4, 5); all reciprocal ranges filled in.
    record.set_entry_count(5);
    record.set_children(1, 2, 3);
    record.set_parents(2, 1, 1);
    record.set_parents(3, 1, 1);
    record.set_children(2, 4, 5);
    record.set_parents(4, 2, 2);
    record.set_parents(5, 2, 2);

    assert!(check_consistency(&record).is_consistent());
}

#[test]
fn test_report_findings_render_messages() {
    let (mut block, layout) = record_with_capacity(8);
    let mut record = EventRecord::new(block.as_mut_slice(), layout);

    record.set_entry_count(3);
    record.set_children(1, 3, 3);
    record.set_parents(2, 1, 1);
    record.set_parents(3, 1, 1);

    let report = check_consistency(&record);
    let rendered: Vec<String> = report.findings().iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["inconsistent parent-child relationship between 2 and 1"]);
}
