//! Property-based tests for notation parsing and query rendering
//!
//! Positions roundtrip through their display form, breakpoint
//! representations are slices of the input, and rendered statements carry
//! exactly one parameter per placeholder.

use ferro_kb::notation::{parse, parse_position, Arm, Position};
use ferro_kb::query::{QueryOptions, SelectionQuery};
use ferro_kb::schema::Schema;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use serde_json::{json, Value};

// =============================================================================
// Base strategies
// =============================================================================

/// Generate positive positions
fn position() -> impl Strategy<Value = u64> {
    1..100_000u64
}

/// Generate non-zero intronic offsets
fn offset() -> impl Strategy<Value = i64> {
    prop_oneof![-500..=-1i64, 1..=500i64]
}

/// Generate reference residues
fn residue() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('A', 'Z'),
        Just('*'),
        Just('?'),
    ]
}

/// Generate nucleotide sequence (1-8 bases)
fn sequence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')], 1..=8)
        .prop_map(|v| v.into_iter().collect())
}

/// Generate cytoband positions
fn cytoband() -> impl Strategy<Value = Position> {
    (
        prop_oneof![Just(Arm::P), Just(Arm::Q)],
        prop::option::of((1..40u32, prop::option::of(1..10u32))),
    )
        .prop_map(|(arm, bands)| match bands {
            Some((major, minor)) => Position::cytoband(arm, Some(major), minor),
            None => Position::cytoband(arm, None, None),
        })
}

/// Generate continuous range notation with its breakpoint text
fn range_notation() -> impl Strategy<Value = (String, String, String)> {
    (
        prop_oneof![Just('g'), Just('c'), Just('e')],
        position(),
        position(),
        prop_oneof![Just("del"), Just("dup"), Just("inv")],
        prop::option::of(sequence()),
    )
        .prop_map(|(prefix, start, end, kind, seq)| {
            let break1 = format!("{}.{}", prefix, start);
            let break2 = format!("{}.{}", prefix, end);
            let notation = format!(
                "{}_{}{}{}",
                break1,
                end,
                kind,
                seq.unwrap_or_default()
            );
            (notation, break1, break2)
        })
}

/// Generate filter values for the `name` property
fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..=15)
}

fn render(filter: &Value) -> ferro_kb::QueryStatement {
    let schema = Schema::with_test_data();
    SelectionQuery::parse(&schema, "Person", filter, &QueryOptions::default())
        .unwrap()
        .to_statement()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // -------------------------------------------------------------------------
    // Position roundtrips
    // -------------------------------------------------------------------------

    /// Genomic and exonic positions roundtrip through display
    #[test]
    fn test_genomic_position_roundtrip(pos in position(), exonic in any::<bool>()) {
        let prefix = if exonic { 'e' } else { 'g' };
        let parsed = parse_position(prefix, &pos.to_string()).unwrap();
        prop_assert_eq!(parsed.pos(), Some(pos));
        prop_assert_eq!(parsed.prefix(), prefix);
        prop_assert_eq!(parsed.to_string(), pos.to_string());
    }

    /// CDS positions with offsets roundtrip through display
    #[test]
    fn test_cds_position_roundtrip(pos in position(), offset in offset()) {
        let expected = Position::cds(pos, offset);
        let displayed = expected.to_string();
        prop_assert_eq!(parse_position('c', &displayed).unwrap(), expected);
    }

    /// Protein positions roundtrip through display
    #[test]
    fn test_protein_position_roundtrip(pos in position(), aa in residue()) {
        let expected = Position::protein(pos, aa);
        prop_assert_eq!(parse_position('p', &expected.to_string()).unwrap(), expected);
    }

    /// Cytoband positions roundtrip through display
    #[test]
    fn test_cytoband_position_roundtrip(expected in cytoband()) {
        prop_assert_eq!(parse_position('y', &expected.to_string()).unwrap(), expected);
    }

    // -------------------------------------------------------------------------
    // Notation parsing
    // -------------------------------------------------------------------------

    /// Breakpoint representations are the input text of each breakpoint
    #[test]
    fn test_range_repr_matches_input((notation, break1, break2) in range_notation()) {
        let variant = parse(&notation).unwrap();
        prop_assert_eq!(variant.break1_repr.as_deref(), Some(break1.as_str()));
        prop_assert_eq!(variant.break2_repr.as_deref(), Some(break2.as_str()));
        prop_assert!(variant.has_two_breakpoints());
    }

    /// Explicit deleted sequence sets the reference sequence
    #[test]
    fn test_deleted_sequence_kept(pos in position(), seq in sequence()) {
        let variant = parse(&format!("g.{}del{}", pos, seq)).unwrap();
        prop_assert_eq!(variant.ref_seq.as_deref(), Some(seq.as_str()));
        prop_assert_eq!(variant.break2_repr, None);
    }

    /// The parser never panics on arbitrary input
    #[test]
    fn test_parse_never_panics(input in "\\PC{0,40}") {
        let _ = parse(&input);
    }

    /// Arbitrary input behind a valid prefix never panics either
    #[test]
    fn test_prefixed_never_panics(prefix in "[gcepy]", rest in "[0-9A-Za-z_()+\\-*?>.,]{0,30}") {
        let _ = parse(&format!("{}.{}", prefix, rest));
    }

    // -------------------------------------------------------------------------
    // Query rendering
    // -------------------------------------------------------------------------

    /// Every placeholder has exactly one parameter
    #[test]
    fn test_params_match_placeholders(values in names(), year in 1900..2020i64) {
        let statement = render(&json!({"name": values, "birthYear": year}));
        let placeholders = statement.query.matches(":param").count();
        prop_assert_eq!(placeholders, statement.params.len());
        prop_assert_eq!(statement.params.len(), values.len() + 1);
        for name in statement.params.keys() {
            let placeholder = format!(":{}", name);
            prop_assert!(statement.query.contains(&placeholder));
        }
    }

    /// Rendering the same filter twice gives the same statement
    #[test]
    fn test_rendering_is_deterministic(values in names(), fuzzy in 0..5u32) {
        let filter = json!({"name": {"OR": values}, "fuzzyMatch": fuzzy});
        prop_assert_eq!(render(&filter), render(&filter));
    }

    /// Empty clauses never leave a dangling AND or a bare WHERE
    #[test]
    fn test_conditions_joined_cleanly(values in names(), and in any::<bool>(), year in prop::option::of(1900..2020i64)) {
        let op = if and { "AND" } else { "OR" };
        let mut filter = json!({"name": {op: values}});
        if let Some(year) = year {
            filter["birthYear"] = json!(year);
        }
        let query = render(&filter).query;
        prop_assert!(!query.ends_with(" AND") && !query.ends_with(" WHERE"), "{}", query);
        prop_assert!(!query.contains("AND  AND") && !query.contains("WHERE  AND"), "{}", query);
        prop_assert!(!query.contains("()"), "{}", query);
    }

    /// Substituted display never leaves a placeholder behind
    #[test]
    fn test_display_substitutes_everything(values in names()) {
        let statement = render(&json!({"name": values}));
        prop_assert!(!statement.display_string().contains(":param"));
    }
}
