//! Fuzz target for LineFramer
//!
//! Ensure reassembly is independent of how the input was chunked (HIGH
//! priority)
//!
//! # Strategy
//!
//! - Arbitrary bytes: terminators, CR, spaces, invalid UTF-8
//! - Arbitrary split points: the same stream delivered in random chunks
//! - Small capacities: force overflow resets
//!
//! # Invariants
//!
//! - Buffer never exceeds capacity
//! - No terminator is left buffered after a call
//! - No emitted line is empty or contains a terminator
//! - Without overflow, lines are identical however the input was split
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stationmon_core::LineFramer;

#[derive(Debug, Clone, Arbitrary)]
struct FramerInput {
    capacity: u16,
    data: Vec<u8>,
    splits: Vec<u16>,
}

fuzz_target!(|input: FramerInput| {
    let capacity = usize::from(input.capacity % 512) + 1;

    let mut whole = LineFramer::new(capacity);
    let whole_lines = whole.ingest(&input.data);
    check_framer(&whole);

    let mut split = LineFramer::new(capacity);
    let mut split_lines = Vec::new();
    let mut rest = &input.data[..];
    for &at in &input.splits {
        if rest.is_empty() {
            break;
        }
        let at = usize::from(at) % (rest.len() + 1);
        let (chunk, tail) = rest.split_at(at);
        split_lines.extend(split.ingest(chunk));
        check_framer(&split);
        rest = tail;
    }
    split_lines.extend(split.ingest(rest));
    check_framer(&split);

    for line in whole_lines.iter().chain(&split_lines) {
        assert!(!line.is_empty(), "empty line emitted");
        assert!(!line.contains('\n'), "terminator inside line {line:?}");
    }

    if whole.overflow_resets() == 0 && split.overflow_resets() == 0 {
        assert_eq!(whole_lines, split_lines, "framing depends on chunking");
        assert_eq!(whole.pending(), split.pending());
    }
});

fn check_framer(framer: &LineFramer) {
    assert!(framer.len() <= framer.capacity());
    assert!(!framer.pending().contains(&b'\n'));
}
