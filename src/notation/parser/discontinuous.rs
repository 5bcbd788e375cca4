//! Discontinuous (two-slot) notation
//!
//! `<type>(<slot1>,<slot2>)[<untemplated>]`, used for events whose
//! breakpoints are described independently, such as fusions and
//! translocations. A slot is a position, a range `a_b`, or `na`/`?` when the
//! breakpoint is not applicable; omitted slots are left out of the result.

use crate::error::{Diagnostic, ErrorCode, FerroError, SourceSpan};
use crate::notation::subtype::EventSubtype;
use crate::notation::variant::{Breakpoint, VariantDescription};

use super::position::parse_position;

/// Types that must use continuous notation instead
const CONTINUOUS_ONLY: &[&str] = &["del", "dup", "inv", "ins", "delins"];

/// Types accepted in two-slot form
const TWO_SLOT_TYPES: &[&str] = &["fusion", "t", "trans", "itrans"];

fn error(input: &str, msg: impl Into<String>, code: ErrorCode, form: &str) -> FerroError {
    FerroError::parse_expected(input, msg, code, form)
}

/// Parse the two-slot form
///
/// With `prefix` set, slots are bare positions in that coordinate system;
/// otherwise each slot carries its own `<prefix>.`.
pub(crate) fn parse_two_slot(
    prefix: Option<char>,
    body: &str,
    form: &str,
) -> Result<VariantDescription, FerroError> {
    let open = body.find('(').ok_or_else(|| {
        error(
            body,
            format!("Missing opening parenthesis: {}", body),
            ErrorCode::PatternMismatch,
            form,
        )
    })?;
    let close = body
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| {
            error(
                body,
                format!("Missing closing parenthesis: {}", body),
                ErrorCode::PatternMismatch,
                form,
            )
        })?;

    let token = &body[..open];
    if token.is_empty() {
        return Err(error(
            body,
            "Variant type was not specified",
            ErrorCode::UnrecognizedType,
            form,
        ));
    }
    if CONTINUOUS_ONLY.contains(&token) {
        return Err(error(
            body,
            format!(
                "Continuous notation is preferred for {} variants: {}",
                token, body
            ),
            ErrorCode::UnrecognizedType,
            form,
        ));
    }
    let subtype = EventSubtype::from_notation(token)
        .filter(|_| TWO_SLOT_TYPES.contains(&token))
        .ok_or_else(|| {
            let diagnostic = Diagnostic::new()
                .with_code(ErrorCode::UnrecognizedType)
                .with_source(body)
                .with_span(SourceSpan::new(0, open))
                .with_hint(format!("one of {}", TWO_SLOT_TYPES.join(", ")));
            FerroError::parse_with_diagnostic(
                body,
                format!("Variant type not recognized: {}", token),
                diagnostic,
            )
        })?;

    let inner = &body[open + 1..close];
    let (first, second) = match inner.matches(',').count() {
        0 => {
            return Err(error(
                body,
                format!("Missing comma between breakpoints: {}", inner),
                ErrorCode::PatternMismatch,
                form,
            ))
        }
        1 => inner.split_once(',').unwrap_or((inner, "")),
        _ => {
            return Err(error(
                body,
                format!("Single comma expected between breakpoints: {}", inner),
                ErrorCode::PatternMismatch,
                form,
            ))
        }
    };

    let break1 = parse_slot(prefix, first, subtype).map_err(|e| {
        error(
            body,
            format!("Error in parsing the first breakpoint: {}", e.message()),
            ErrorCode::InvalidPosition,
            form,
        )
    })?;
    let break2 = parse_slot(prefix, second, subtype).map_err(|e| {
        error(
            body,
            format!("Error in parsing the second breakpoint: {}", e.message()),
            ErrorCode::InvalidPosition,
            form,
        )
    })?;
    if break1.is_none() && break2.is_none() {
        return Err(error(
            body,
            "At least one breakpoint must be specified",
            ErrorCode::PatternMismatch,
            form,
        ));
    }

    let mut variant = VariantDescription::new(subtype);
    if let Some((breakpoint, repr)) = break1 {
        variant.set_break1(breakpoint, repr);
    }
    if let Some((breakpoint, repr)) = break2 {
        variant.set_break2(breakpoint, repr);
    }
    apply_untemplated(&mut variant, &body[close + 1..]).map_err(|msg| {
        error(body, msg, ErrorCode::PatternMismatch, form)
    })?;
    Ok(variant)
}

/// Parse one slot into a breakpoint and its repr
fn parse_slot(
    prefix: Option<char>,
    slot: &str,
    subtype: EventSubtype,
) -> Result<Option<(Breakpoint, String)>, FerroError> {
    if slot == "na" || slot == "?" {
        return Ok(None);
    }
    let (prefix, text) = match prefix {
        Some(prefix) => (prefix, slot),
        None => {
            let mut chars = slot.chars();
            match (chars.next(), chars.next()) {
                (Some(p), Some('.')) => (p, &slot[p.len_utf8() + 1..]),
                _ => {
                    return Err(FerroError::parse(
                        slot,
                        format!("Missing '<prefix>.' before position: {}", slot),
                    ))
                }
            }
        }
    };
    subtype
        .validate_for_prefix(prefix, false)
        .map_err(|msg| FerroError::parse(slot, msg))?;

    match text.split_once('_') {
        Some((start, end)) => {
            let breakpoint =
                Breakpoint::range(parse_position(prefix, start)?, parse_position(prefix, end)?);
            Ok(Some((breakpoint, format!("{}.({})", prefix, text))))
        }
        None => {
            let breakpoint = Breakpoint::exact(parse_position(prefix, text)?);
            Ok(Some((breakpoint, format!("{}.{}", prefix, text))))
        }
    }
}

fn is_residue(c: char) -> bool {
    c.is_ascii_uppercase() || c == '?' || c == '*'
}

/// Trailing untemplated sequence: literal residues or a length
fn apply_untemplated(variant: &mut VariantDescription, tail: &str) -> Result<(), String> {
    if tail.is_empty() {
        return Ok(());
    }
    if tail.chars().all(|c| c.is_ascii_digit()) {
        let size = tail
            .parse::<u64>()
            .map_err(|_| format!("number out of range: {}", tail))?;
        variant.untemplated_seq_size = Some(size);
    } else if tail.chars().all(is_residue) {
        if tail != "?" {
            variant.untemplated_seq_size = Some(tail.len() as u64);
        }
        variant.untemplated_seq = Some(tail.to_string());
    } else {
        return Err(format!("Did not recognize untemplated sequence: {}", tail));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::position::Position;

    const FORM: &str = "<type>(<position>,<position>)";

    #[test]
    fn test_prefixed_slots() {
        let variant = parse_two_slot(Some('e'), "fusion(1,3)", FORM).unwrap();
        assert_eq!(variant.subtype, EventSubtype::Fusion);
        assert_eq!(variant.break1_start, Some(Position::exonic(1)));
        assert_eq!(variant.break2_start, Some(Position::exonic(3)));
        assert_eq!(variant.break1_repr.as_deref(), Some("e.1"));
        assert_eq!(variant.break2_repr.as_deref(), Some("e.3"));
    }

    #[test]
    fn test_not_applicable_slot_is_omitted() {
        let variant = parse_two_slot(Some('g'), "t(na,20)", FORM).unwrap();
        assert_eq!(variant.break1_start, None);
        assert_eq!(variant.break1_repr, None);
        assert_eq!(variant.break2_start, Some(Position::genomic(20)));

        let variant = parse_two_slot(Some('g'), "t(10,?)", FORM).unwrap();
        assert_eq!(variant.break2_start, None);
    }

    #[test]
    fn test_both_slots_missing() {
        let err = parse_two_slot(Some('g'), "t(na,?)", FORM).unwrap_err();
        assert!(err.message().contains("At least one breakpoint"));
    }

    #[test]
    fn test_slot_range() {
        let variant = parse_two_slot(None, "fusion(e.1_17,e.20_28)", FORM).unwrap();
        assert_eq!(variant.break1_repr.as_deref(), Some("e.(1_17)"));
        assert_eq!(variant.break1_end, Some(Position::exonic(17)));
        assert_eq!(variant.break2_repr.as_deref(), Some("e.(20_28)"));
        assert_eq!(variant.break2_end, Some(Position::exonic(28)));
    }

    #[test]
    fn test_untemplated() {
        let variant = parse_two_slot(None, "fusion(e.1,e.2)ATGC", FORM).unwrap();
        assert_eq!(variant.untemplated_seq.as_deref(), Some("ATGC"));
        assert_eq!(variant.untemplated_seq_size, Some(4));

        let variant = parse_two_slot(None, "fusion(e.1,e.2)5", FORM).unwrap();
        assert_eq!(variant.untemplated_seq, None);
        assert_eq!(variant.untemplated_seq_size, Some(5));

        let variant = parse_two_slot(None, "fusion(e.1,e.2)?", FORM).unwrap();
        assert_eq!(variant.untemplated_seq.as_deref(), Some("?"));
        assert_eq!(variant.untemplated_seq_size, None);

        assert!(parse_two_slot(None, "fusion(e.1,e.2)atg", FORM).is_err());
    }

    #[test]
    fn test_structural_errors() {
        let cases = [
            ("transe.1,e.2)", "Missing opening"),
            ("trans(e.1,e.2", "Missing closing"),
            ("(e.1,e.2)", "Variant type was not specified"),
            ("blargh(e.1,e.2)", "Variant type not recognized"),
            ("trans(e.1,e.2,e.3)", "Single comma expected"),
            ("trans(e.123)", "Missing comma"),
            ("trans(1,2)", "Error in parsing the first breakpoint"),
            ("trans(k.1,e.2)", "Error in parsing the first breakpoint"),
            ("trans(e.123k,e.1234)", "Error in parsing the first breakpoint"),
            ("fusion(e.123,e.123k)", "Error in parsing the second breakpoint"),
        ];
        for (input, expected) in cases {
            let err = parse_two_slot(None, input, FORM).unwrap_err();
            assert!(
                err.message().contains(expected),
                "{} gave '{}'",
                input,
                err.message()
            );
        }
    }

    #[test]
    fn test_continuous_only_types() {
        for token in ["ins", "delins", "inv", "del", "dup"] {
            let input = format!("{}(e.123,e.124)", token);
            let err = parse_two_slot(None, &input, FORM).unwrap_err();
            assert!(err.message().contains("Continuous notation is preferred"));
        }
    }

    #[test]
    fn test_subtype_not_allowed_in_two_slot_form() {
        let err = parse_two_slot(Some('p'), "fs(1,2)", FORM).unwrap_err();
        assert!(err.message().contains("Variant type not recognized"));
    }
}
