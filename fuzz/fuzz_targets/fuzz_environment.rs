#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the conda environment parser, including its nested pip section.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = dep_ledger::parsers::parse_environment(s);
    }
});
