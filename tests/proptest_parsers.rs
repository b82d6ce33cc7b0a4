//! Property-based tests for manifest parsers.
//!
//! Ensures parsers don't panic on arbitrary input, and that the requirement grammar
//! splits well-formed specs the way the Python-family parsers expect.

use dep_ledger::parsers::{
    parse_environment, parse_requirements, split_requirement, ManifestInput, ManifestKind,
    ParseOutput, ParserRegistry,
};
use proptest::prelude::*;

fn registry() -> ParserRegistry {
    ParserRegistry::declared_only()
}

proptest! {
    // Parser tests only assert no-panic; random input is expected to produce Err
    // in most cases.
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn requirements_doesnt_panic(s in "\\PC{0,2000}") {
        let mut out = ParseOutput::default();
        let _ = parse_requirements("requirements.txt", &s, &mut out);
    }

    #[test]
    fn requirements_lines_doesnt_panic(
        lines in prop::collection::vec("[a-zA-Z0-9_.\\-]{0,20}( ?(==|>=|<=|~=|!=|<|>)? ?[0-9.]{0,10})?( #\\PC{0,20})?", 0..30)
    ) {
        let mut out = ParseOutput::default();
        let _ = parse_requirements("requirements.txt", &lines.join("\n"), &mut out);
    }

    #[test]
    fn environment_doesnt_panic(s in "\\PC{0,2000}") {
        let _ = parse_environment(&s);
    }

    #[test]
    fn environment_like_input_doesnt_panic(
        entries in prop::collection::vec("[a-z\\-]{1,15}(=|==| )?[0-9.]{0,8}", 0..20)
    ) {
        let body: String = entries.iter().map(|e| format!("  - {e}\n")).collect();
        let input = format!("name: env\ndependencies:\n{body}");
        let _ = parse_environment(&input);
    }

    #[test]
    fn package_json_like_doesnt_panic(
        s in prop::string::string_regex(r#"\{[^\}]{0,500}\}"#).unwrap()
    ) {
        let _ = registry().parse(ManifestKind::NpmPackage, &ManifestInput::new("package.json", &s), true);
    }

    #[test]
    fn glide_doesnt_panic(s in "\\PC{0,1000}") {
        let _ = registry().parse(ManifestKind::Glide, &ManifestInput::new("glide.yaml", &s), true);
    }

    #[test]
    fn recipe_doesnt_panic(s in "\\PC{0,1000}") {
        let _ = registry().parse(ManifestKind::CondaRecipe, &ManifestInput::new("meta.yaml", &s), true);
    }

    #[test]
    fn pom_like_input_doesnt_panic(
        s in prop::string::string_regex(r#"<[a-z]{1,20}>[^<]{0,200}</[a-z]{1,20}>"#).unwrap()
    ) {
        let _ = registry().parse(ManifestKind::MavenPom, &ManifestInput::new("pom.xml", &s), true);
    }

    #[test]
    fn split_requirement_doesnt_panic(s in "\\PC{0,200}") {
        let _ = split_requirement(&s);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn split_requirement_reads_name_operator_version(
        name in "[a-z][a-z0-9_\\-]{0,15}",
        op in prop::sample::select(vec!["==", ">=", "<=", "~=", "!=", "<", ">", "="]),
        version in "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}",
        space in prop::bool::ANY,
    ) {
        let spec = if space { format!("{name} {op} {version}") } else { format!("{name}{op}{version}") };
        let req = split_requirement(&spec).expect("well-formed requirement");
        prop_assert_eq!(req.name, name.as_str());
        prop_assert_eq!(req.operator, op);
        prop_assert_eq!(req.version, version.as_str());
    }

    #[test]
    fn only_double_equals_pins_pip_requirements(
        name in "[a-z][a-z0-9]{0,10}",
        op in prop::sample::select(vec!["==", ">=", "<=", "~=", "<", ">"]),
        version in "[0-9]{1,2}\\.[0-9]{1,2}",
    ) {
        let mut out = ParseOutput::default();
        parse_requirements("requirements.txt", &format!("{name}{op}{version}\n"), &mut out).unwrap();
        prop_assert_eq!(out.dependencies.len(), 1);
        prop_assert_eq!(out.issues.is_empty(), op == "==");
    }
}
