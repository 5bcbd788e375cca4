//! Position parsing
//!
//! Parses one breakpoint coordinate given its coordinate-system prefix.
//! Every grammar must consume the whole input; trailing text or whitespace
//! is an error.

use nom::{
    bytes::complete::tag,
    character::complete::{digit1, one_of, satisfy},
    combinator::{all_consuming, opt},
    sequence::preceded,
    IResult, Parser,
};

use crate::error::{ErrorCode, FerroError};
use crate::notation::position::{Arm, Position, UNKNOWN_AA};

fn number_error(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Digit,
    ))
}

/// Parse an unsigned decimal integer
pub fn unsigned(input: &str) -> IResult<&str, u64> {
    let (remaining, digits) = digit1.parse(input)?;
    let value = digits.parse::<u64>().map_err(|_| number_error(input))?;
    Ok((remaining, value))
}

/// Parse a band number
fn band(input: &str) -> IResult<&str, u32> {
    let (remaining, digits) = digit1.parse(input)?;
    let value = digits.parse::<u32>().map_err(|_| number_error(input))?;
    Ok((remaining, value))
}

/// Parse a signed intronic offset (`+3`, `-12`)
fn offset(input: &str) -> IResult<&str, i64> {
    let (remaining, (sign, magnitude)) = (one_of("+-"), unsigned).parse(input)?;
    let magnitude = i64::try_from(magnitude).map_err(|_| number_error(input))?;
    Ok((remaining, if sign == '-' { -magnitude } else { magnitude }))
}

/// Reference residues: uppercase single-letter code, `?` or `*`
fn is_residue(c: char) -> bool {
    c.is_ascii_uppercase() || c == '?' || c == '*'
}

/// `<pos>[+|-<offset>]`
pub fn cds_pos(input: &str) -> IResult<&str, (u64, i64)> {
    let (remaining, pos) = unsigned(input)?;
    let (remaining, offset) = opt(offset).parse(remaining)?;
    Ok((remaining, (pos, offset.unwrap_or(0))))
}

/// `[<AA>]<pos>`
pub fn protein_pos(input: &str) -> IResult<&str, (char, u64)> {
    let (remaining, ref_aa) = opt(satisfy(is_residue)).parse(input)?;
    let (remaining, pos) = unsigned(remaining)?;
    Ok((remaining, (ref_aa.unwrap_or(UNKNOWN_AA), pos)))
}

/// `<p|q>[<major>[.<minor>]]`
pub fn cytoband_pos(input: &str) -> IResult<&str, (Arm, Option<u32>, Option<u32>)> {
    let (remaining, arm) = one_of("pq").parse(input)?;
    let arm = if arm == 'p' { Arm::P } else { Arm::Q };
    let (remaining, bands) = opt((band, opt(preceded(tag("."), band)))).parse(remaining)?;
    let (major, minor) = match bands {
        Some((major, minor)) => (Some(major), minor),
        None => (None, None),
    };
    Ok((remaining, (arm, major, minor)))
}

fn mismatch(prefix: char, text: &str, message: String) -> FerroError {
    let expected = match prefix {
        'g' | 'e' => "<integer>",
        'c' => "<pos>[+|-<offset>]",
        'p' => "[<AA>]<pos>",
        _ => "<p|q>[<major>[.<minor>]]",
    };
    FerroError::parse_expected(text, message, ErrorCode::InvalidPosition, expected)
}

/// Parse a position in the coordinate system named by `prefix`
///
/// # Examples
///
/// ```
/// use ferro_kb::notation::{parse_position, Position};
///
/// assert_eq!(parse_position('c', "100+2").unwrap(), Position::cds(100, 2));
/// assert_eq!(parse_position('p', "12").unwrap(), Position::protein(12, '?'));
/// ```
pub fn parse_position(prefix: char, text: &str) -> Result<Position, FerroError> {
    match prefix {
        'g' | 'e' => {
            let (_, pos) = all_consuming(unsigned).parse(text).map_err(|_| {
                mismatch(prefix, text, format!("expected integer but found: {}", text))
            })?;
            Ok(if prefix == 'g' {
                Position::genomic(pos)
            } else {
                Position::exonic(pos)
            })
        }
        'c' => all_consuming(cds_pos)
            .parse(text)
            .map(|(_, (pos, offset))| Position::cds(pos, offset))
            .map_err(|_| pattern_error(prefix, text)),
        'p' => all_consuming(protein_pos)
            .parse(text)
            .map(|(_, (ref_aa, pos))| Position::protein(pos, ref_aa))
            .map_err(|_| pattern_error(prefix, text)),
        'y' => all_consuming(cytoband_pos)
            .parse(text)
            .map(|(_, (arm, major, minor))| Position::cytoband(arm, major, minor))
            .map_err(|_| pattern_error(prefix, text)),
        other => Err(FerroError::parse_expected(
            text,
            format!("Prefix not recognized: {} from {}", other, text),
            ErrorCode::UnknownPrefix,
            "one of g, c, e, y, p",
        )),
    }
}

fn pattern_error(prefix: char, text: &str) -> FerroError {
    mismatch(
        prefix,
        text,
        format!("failed to match expected pattern: {}", text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genomic() {
        assert_eq!(parse_position('g', "3").unwrap(), Position::genomic(3));
        assert_eq!(parse_position('e', "12").unwrap(), Position::exonic(12));
    }

    #[test]
    fn test_genomic_rejects_non_digits() {
        let err = parse_position('g', "3a").unwrap_err();
        assert_eq!(err.message(), "expected integer but found: 3a");
        assert_eq!(err.code(), Some(ErrorCode::InvalidPosition));
        assert!(parse_position('e', " 3").is_err());
        assert!(parse_position('g', "").is_err());
        assert!(parse_position('g', "-3").is_err());
    }

    #[test]
    fn test_genomic_overflow() {
        assert!(parse_position('g', "99999999999999999999999").is_err());
    }

    #[test]
    fn test_cds_offsets() {
        assert_eq!(parse_position('c', "1+3").unwrap(), Position::cds(1, 3));
        assert_eq!(parse_position('c', "1-3").unwrap(), Position::cds(1, -3));
        assert_eq!(parse_position('c', "1").unwrap(), Position::cds(1, 0));
    }

    #[test]
    fn test_cds_errors() {
        let err = parse_position('c', "-124").unwrap_err();
        assert_eq!(err.message(), "failed to match expected pattern: -124");
        assert!(parse_position('c', "1+").is_err());
        assert!(parse_position('c', "1 +3").is_err());
        assert!(parse_position('c', "1+3+4").is_err());
    }

    #[test]
    fn test_protein() {
        assert_eq!(parse_position('p', "R10").unwrap(), Position::protein(10, 'R'));
        assert_eq!(parse_position('p', "1").unwrap(), Position::protein(1, '?'));
        assert_eq!(parse_position('p', "*5").unwrap(), Position::protein(5, '*'));
        assert_eq!(parse_position('p', "?5").unwrap(), Position::protein(5, '?'));
    }

    #[test]
    fn test_protein_is_case_sensitive() {
        assert!(parse_position('p', "r10").is_err());
        assert!(parse_position('p', "Arg10").is_err());
        assert!(parse_position('p', "R").is_err());
    }

    #[test]
    fn test_cytoband() {
        assert_eq!(
            parse_position('y', "p11.1").unwrap(),
            Position::cytoband(Arm::P, Some(11), Some(1))
        );
        assert_eq!(
            parse_position('y', "q1").unwrap(),
            Position::cytoband(Arm::Q, Some(1), None)
        );
        assert_eq!(
            parse_position('y', "q").unwrap(),
            Position::cytoband(Arm::Q, None, None)
        );
    }

    #[test]
    fn test_cytoband_minor_requires_major() {
        assert!(parse_position('y', "p.1").is_err());
        assert!(parse_position('y', "p11.").is_err());
        assert!(parse_position('y', "11").is_err());
    }

    #[test]
    fn test_unknown_prefix() {
        let err = parse_position('k', "1").unwrap_err();
        assert_eq!(err.message(), "Prefix not recognized: k from 1");
        assert_eq!(err.code(), Some(ErrorCode::UnknownPrefix));
    }

    #[test]
    fn test_expected_hint() {
        let err = parse_position('y', "x").unwrap_err();
        assert_eq!(err.expected(), Some("<p|q>[<major>[.<minor>]]"));
    }
}
