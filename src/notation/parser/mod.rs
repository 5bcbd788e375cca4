//! Variant notation parser
//!
//! Two grammar forms are accepted after the `<prefix>.` header:
//!
//! - continuous: `<breakpoint>[_<breakpoint>]<tail>` where a breakpoint is a
//!   position or an uncertain range `(<pos>_<pos>)`, e.g. `g.3_5delTAA`
//! - discontinuous: `<type>(<slot>,<slot>)[<untemplated>]`, e.g. `g.t(1,20)`
//!
//! The discontinuous form is only attempted when continuous parsing fails and
//! the input contains a `)`.

mod discontinuous;
pub mod position;
pub mod tail;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Diagnostic, ErrorCode, FerroError, SourceSpan};
use crate::notation::position::PREFIXES;
use crate::notation::subtype::EventSubtype;
use crate::notation::variant::{Breakpoint, VariantDescription};

pub use position::parse_position;
pub use tail::{Alternate, SimpleEvent, Tail};

const CONTINUOUS_FORM: &str = "<prefix>.<breakpoint>[_<breakpoint>]<type>";
const DISCONTINUOUS_FORM: &str = "<prefix>.<type>(<position>,<position>)[<untemplated>]";
const MULTI_FEATURE_FORM: &str = "<type>(<prefix>.<position>,<prefix>.<position>)[<untemplated>]";

/// Minimum length of any notation string
pub const MIN_LENGTH: usize = 3;

static CONTINUOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let p = r"(?:[A-Z0-9*?+\-]*[0-9?]|[pq][0-9.?]*)";
    Regex::new(&format!(
        r"^(?P<break1>{p}|\({p}_{p}\))(?:_(?P<break2>{p}|\({p}_{p}\)))?(?P<tail>[^_()]+)$"
    ))
    .expect("valid regex")
});

fn check_length(text: &str) -> Result<(), FerroError> {
    if text.chars().count() < MIN_LENGTH {
        return Err(FerroError::parse_expected(
            text,
            format!(
                "Too short. Must be a minimum of three characters: {}",
                text
            ),
            ErrorCode::TooShort,
            CONTINUOUS_FORM,
        ));
    }
    Ok(())
}

/// Validate the `<prefix>.` header and split it from the body
fn split_prefix(text: &str) -> Result<(char, &str), FerroError> {
    check_length(text)?;
    let mut chars = text.chars();
    let prefix = chars.next().unwrap_or_default();
    if !PREFIXES.contains(&prefix) {
        let diagnostic = Diagnostic::new()
            .with_code(ErrorCode::UnknownPrefix)
            .with_source(text)
            .with_span(SourceSpan::new(0, prefix.len_utf8()))
            .with_hint("one of g, c, e, y, p");
        return Err(FerroError::parse_with_diagnostic(
            text,
            format!(
                "'{}' is not an accepted prefix. Expected one of: g, c, e, y, p",
                prefix
            ),
            diagnostic,
        ));
    }
    if chars.next() != Some('.') {
        let diagnostic = Diagnostic::new()
            .with_code(ErrorCode::MissingSeparator)
            .with_source(text)
            .with_span(SourceSpan::new(1, 2))
            .with_hint(CONTINUOUS_FORM)
            .with_suggestion(format!("{}.{}", prefix, &text[1..]));
        return Err(FerroError::parse_with_diagnostic(
            text,
            format!("Missing '.' separator after prefix: {}", text),
            diagnostic,
        ));
    }
    Ok((prefix, &text[2..]))
}

/// Parse variant notation in either grammar form
///
/// # Examples
///
/// ```
/// use ferro_kb::notation::{parse, EventSubtype, Position};
///
/// let variant = parse("g.3_5delTAA").unwrap();
/// assert_eq!(variant.subtype, EventSubtype::Deletion);
/// assert_eq!(variant.break1_start, Some(Position::genomic(3)));
/// assert_eq!(variant.break2_repr.as_deref(), Some("g.5"));
/// assert_eq!(variant.ref_seq.as_deref(), Some("TAA"));
/// ```
pub fn parse(text: &str) -> Result<VariantDescription, FerroError> {
    let (prefix, body) = split_prefix(text)?;
    match continuous(prefix, body, text) {
        Ok(variant) => Ok(variant),
        Err(continuous_err) if body.contains(')') => {
            log::debug!(
                "continuous notation failed for {}, trying discontinuous form",
                text
            );
            discontinuous::parse_two_slot(Some(prefix), body, DISCONTINUOUS_FORM).map_err(
                |err| match err {
                    FerroError::Parse {
                        msg, diagnostic, ..
                    } => FerroError::Parse {
                        input: text.to_string(),
                        msg: format!("{}; as continuous notation: {}", msg, continuous_err.message()),
                        diagnostic,
                    },
                    other => other,
                },
            )
        }
        Err(err) => Err(err),
    }
}

/// Parse continuous notation only
pub fn parse_continuous(text: &str) -> Result<VariantDescription, FerroError> {
    let (prefix, body) = split_prefix(text)?;
    continuous(prefix, body, text)
}

/// Parse discontinuous notation only
pub fn parse_discontinuous(text: &str) -> Result<VariantDescription, FerroError> {
    let (prefix, body) = split_prefix(text)?;
    discontinuous::parse_two_slot(Some(prefix), body, DISCONTINUOUS_FORM)
}

/// Parse two-slot notation whose slots carry their own prefixes
///
/// ```
/// use ferro_kb::notation::{parse_multi_feature, EventSubtype};
///
/// let variant = parse_multi_feature("trans(g.1,g.2)").unwrap();
/// assert_eq!(variant.subtype, EventSubtype::Translocation);
/// assert_eq!(variant.break2_repr.as_deref(), Some("g.2"));
/// ```
pub fn parse_multi_feature(text: &str) -> Result<VariantDescription, FerroError> {
    check_length(text)?;
    discontinuous::parse_two_slot(None, text, MULTI_FEATURE_FORM)
}

fn parse_breakpoint(prefix: char, text: &str) -> Result<Breakpoint, FerroError> {
    let range = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .and_then(|t| t.split_once('_'));
    match range {
        Some((start, end)) => Ok(Breakpoint::range(
            parse_position(prefix, start)?,
            parse_position(prefix, end)?,
        )),
        None => Ok(Breakpoint::exact(parse_position(prefix, text)?)),
    }
}

fn tail_error(input: &str, tail: &str, msg: String, code: ErrorCode) -> FerroError {
    let diagnostic = Diagnostic::new()
        .with_code(code)
        .with_source(input)
        .with_span(SourceSpan::locate(input, tail))
        .with_hint(CONTINUOUS_FORM);
    FerroError::parse_with_diagnostic(input, msg, diagnostic)
}

fn continuous(prefix: char, body: &str, input: &str) -> Result<VariantDescription, FerroError> {
    let caps = CONTINUOUS_PATTERN.captures(body).ok_or_else(|| {
        FerroError::parse_expected(
            input,
            format!("Input string did not match the expected pattern: {}", body),
            ErrorCode::PatternMismatch,
            CONTINUOUS_FORM,
        )
    })?;
    let break1_text = caps.name("break1").map_or("", |m| m.as_str());
    let break2_text = caps.name("break2").map(|m| m.as_str());
    let tail_text = caps.name("tail").map_or("", |m| m.as_str());

    let break1 = parse_breakpoint(prefix, break1_text)?;
    let break2 = break2_text
        .map(|text| parse_breakpoint(prefix, text))
        .transpose()?;

    let tail = Tail::parse(prefix, tail_text)
        .map_err(|msg| tail_error(input, tail_text, msg, ErrorCode::UnrecognizedType))?;
    let subtype = EventSubtype::from_notation(tail.notation()).ok_or_else(|| {
        tail_error(
            input,
            tail_text,
            format!("unsupported event type: {}", tail.notation()),
            ErrorCode::UnrecognizedType,
        )
    })?;
    subtype
        .validate_for_prefix(prefix, true)
        .map_err(|msg| tail_error(input, tail_text, msg, ErrorCode::InvalidSubtype))?;

    let mut variant = VariantDescription::new(subtype);
    variant.set_break1(break1, format!("{}.{}", prefix, break1_text));
    if let (Some(breakpoint), Some(text)) = (break2, break2_text) {
        variant.set_break2(breakpoint, format!("{}.{}", prefix, text));
    }
    apply_tail(&mut variant, tail)
        .map_err(|msg| tail_error(input, tail_text, msg, ErrorCode::InvalidSubtype))?;
    Ok(variant)
}

/// Copy tail fields onto the variant
fn apply_tail(variant: &mut VariantDescription, tail: Tail) -> Result<(), String> {
    let single_point = matches!(
        tail,
        Tail::ProteinSubstitution { .. }
            | Tail::Substitution { .. }
            | Tail::Frameshift { .. }
            | Tail::Splice
    );
    if single_point && variant.break2_start.is_some() {
        return Err(format!(
            "a second breakpoint is inappropriate for {} variants",
            variant.subtype
        ));
    }
    // reference residue of a single, exact protein breakpoint
    let protein_ref = match variant.break1() {
        Some(Breakpoint { start, end: None }) => start.known_ref_aa(),
        _ => None,
    };

    match tail {
        Tail::Delins { ref_seq, alt } => {
            variant.ref_seq = ref_seq;
            match alt {
                Some(Alternate::Sequence(seq)) => {
                    if seq != "?" {
                        variant.untemplated_seq_size = Some(seq.len() as u64);
                    }
                    variant.untemplated_seq = Some(seq);
                }
                Some(Alternate::Size(size)) => variant.untemplated_seq_size = Some(size),
                None => {}
            }
        }
        Tail::Simple { ref_seq, size, .. } => {
            variant.ref_seq = ref_seq;
            variant.untemplated_seq_size = size;
        }
        Tail::ProteinSubstitution { alt } => {
            variant.ref_seq = protein_ref.map(String::from);
            set_single_alt(variant, alt);
        }
        Tail::Substitution { ref_base, alt_base } => {
            variant.ref_seq = Some(ref_base.to_string());
            set_single_alt(variant, alt_base);
        }
        Tail::Frameshift { alt, truncation } => {
            variant.ref_seq = protein_ref.map(String::from);
            match alt {
                Some('*') => {
                    if let Some(position) = truncation {
                        return Err(format!(
                            "truncation conflict: immediate stop (*) and a stop at {}",
                            position
                        ));
                    }
                    set_single_alt(variant, '*');
                    variant.truncation = Some(1);
                }
                Some('?') | None => variant.truncation = truncation,
                Some(residue) => {
                    set_single_alt(variant, residue);
                    variant.truncation = truncation;
                }
            }
        }
        Tail::Splice => {}
    }
    Ok(())
}

fn set_single_alt(variant: &mut VariantDescription, alt: char) {
    if alt != '?' {
        variant.untemplated_seq_size = Some(1);
    }
    variant.untemplated_seq = Some(alt.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::position::{Arm, Position};

    #[test]
    fn test_header_errors() {
        let err = parse("g.").unwrap_err();
        assert!(err.message().starts_with("Too short"));
        assert_eq!(err.code(), Some(ErrorCode::TooShort));

        let err = parse("f.G12D").unwrap_err();
        assert!(err.message().contains("'f' is not an accepted prefix"));
        assert_eq!(err.code(), Some(ErrorCode::UnknownPrefix));

        let err = parse("pG12D").unwrap_err();
        assert!(err.message().starts_with("Missing '.' separator"));
        assert_eq!(err.code(), Some(ErrorCode::MissingSeparator));
    }

    #[test]
    fn test_repr_is_sliced_from_input() {
        let variant = parse("c.(3+1_4-1)_10dup").unwrap();
        assert_eq!(variant.break1_repr.as_deref(), Some("c.(3+1_4-1)"));
        assert_eq!(variant.break2_repr.as_deref(), Some("c.10"));
        assert_eq!(variant.break1_start, Some(Position::cds(3, 1)));
        assert_eq!(variant.break1_end, Some(Position::cds(4, -1)));
    }

    #[test]
    fn test_cytoband_arm_only() {
        let variant = parse("y.pdup").unwrap();
        assert_eq!(
            variant.break1_start,
            Some(Position::cytoband(Arm::P, None, None))
        );
        assert_eq!(variant.break1_repr.as_deref(), Some("y.p"));
    }

    #[test]
    fn test_no_match() {
        let err = parse("g.3_5").unwrap_err();
        assert!(err
            .message()
            .starts_with("Input string did not match the expected pattern"));
        assert_eq!(err.code(), Some(ErrorCode::PatternMismatch));
    }

    #[test]
    fn test_tail_error_span() {
        let err = parse("g.3blah").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnrecognizedType));
        assert!(err.detailed_message().contains("g.3blah\n   ^~~~"));
    }

    #[test]
    fn test_discontinuous_fallback() {
        let variant = parse("g.t(10,20)").unwrap();
        assert_eq!(variant.subtype, EventSubtype::Translocation);
        assert_eq!(variant.break1_repr.as_deref(), Some("g.10"));
        assert_eq!(variant.break2_repr.as_deref(), Some("g.20"));
    }

    #[test]
    fn test_no_fallback_without_paren() {
        let err = parse("g.t10,20").unwrap_err();
        assert!(err
            .message()
            .starts_with("Input string did not match the expected pattern"));
    }

    #[test]
    fn test_fallback_reports_both_failures() {
        let err = parse("g.(3_5)blah").unwrap_err();
        let msg = err.message();
        assert!(msg.starts_with("Variant type was not specified"));
        assert!(msg.contains("as continuous notation: Did not recognize type"));
        assert_eq!(err.input(), Some("g.(3_5)blah"));
    }

    #[test]
    fn test_parse_continuous_only() {
        assert!(parse_continuous("g.t(10,20)").is_err());
        assert!(parse_continuous("g.3del").is_ok());
    }

    #[test]
    fn test_parse_discontinuous_only() {
        let variant = parse_discontinuous("e.fusion(1,3)").unwrap();
        assert_eq!(variant.subtype, EventSubtype::Fusion);
        assert!(parse_discontinuous("e.fusion").is_err());
    }

    #[test]
    fn test_multi_feature_too_short() {
        let err = parse_multi_feature("").unwrap_err();
        assert!(err.message().starts_with("Too short."));
    }

    #[test]
    fn test_second_breakpoint_inappropriate() {
        let err = parse("g.4_5A>T").unwrap_err();
        assert!(err.message().contains("second breakpoint is inappropriate"));
        assert!(parse("p.W288_K290spl").is_err());
    }
}
