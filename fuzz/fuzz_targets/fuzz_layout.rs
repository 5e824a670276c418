#![no_main]

//! Layout parser fuzzer.
//!
//! Any text either fails with a `LayoutError` or yields a world that passes
//! the invariant checks and survives a few ticks.

use isosim::game::check_invariants;
use isosim::skirmish::parse_layout;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut state) = parse_layout(text, 0) else {
        return;
    };

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "Invariants violated at start: {violations:?}");

    for _ in 0..20 {
        state.step();
    }
    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "Invariants violated after ticks: {violations:?}");
});
