#![no_main]
use dep_ledger::parsers::{ManifestInput, ManifestKind, ParserRegistry};
use libfuzzer_sys::fuzz_target;

/// Fuzz every declared-dependency parser through the registry.
///
/// The first byte picks the manifest kind; the rest is the file content.
fuzz_target!(|data: &[u8]| {
    let Some((selector, rest)) = data.split_first() else {
        return;
    };
    let kind = ManifestKind::ALL[usize::from(*selector) % ManifestKind::ALL.len()];
    if let Ok(s) = std::str::from_utf8(rest) {
        let registry = ParserRegistry::declared_only();
        let _ = registry.parse(kind, &ManifestInput::new(kind.file_name(), s), true);
    }
});
