#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the pip requirements parser.
///
/// Covers comment stripping, editable and VCS lines, and the shared
/// `name[op]version` grammar.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut out = dep_ledger::parsers::ParseOutput::default();
        let _ = dep_ledger::parsers::parse_requirements("requirements.txt", s, &mut out);
    }
});
