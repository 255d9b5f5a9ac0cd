//! Fuzz target for the source frontend.
//!
//! Feeds arbitrary text through parsing, scanning and a full generation
//! pass. Any input may be rejected, none may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use listen_core::{parse_file, Generator, GeneratorConfig, MemorySink};

fuzz_target!(|data: &str| {
    let Ok(scanned) = parse_file(data) else {
        return;
    };

    let mut sink = MemorySink::new();
    let _ = Generator::new(GeneratorConfig::default()).run(
        &scanned.graph,
        &scanned.directives,
        &mut sink,
    );
});
