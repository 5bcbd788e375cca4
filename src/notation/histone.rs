//! Histone modification notation (`H3K27me3`, `H2A.ZK4ac`)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FerroError};
use crate::notation::position::Position;
use crate::notation::subtype::EventSubtype;

const HISTONE_FORM: &str = "H<name>[.<subtype>]<K|R|S><pos><me|ac|ub>[<count>|?]";

static HISTONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<histone>H[0-9A-Z-]+)(?:\.(?P<subtype>[A-Z0-9]))?(?P<aa>K|Lys|Arg|R|Ser|S)(?P<pos>[0-9]+)(?P<modification>me|ac|ub)(?P<count>[1-9][0-9]*|\?)?$",
    )
    .expect("valid regex")
});

/// Post-translational modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationType {
    #[serde(rename = "me")]
    Methylation,
    #[serde(rename = "ac")]
    Acetylation,
    #[serde(rename = "ub")]
    Ubiquitination,
}

impl ModificationType {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "me" => Some(ModificationType::Methylation),
            "ac" => Some(ModificationType::Acetylation),
            "ub" => Some(ModificationType::Ubiquitination),
            _ => None,
        }
    }

    pub fn subtype(&self) -> EventSubtype {
        match self {
            ModificationType::Methylation => EventSubtype::Methylation,
            ModificationType::Acetylation => EventSubtype::Acetylation,
            ModificationType::Ubiquitination => EventSubtype::Ubiquitination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoneModification {
    #[serde(rename = "type")]
    pub kind: ModificationType,
    /// Number of marks; absent when not given or written as `?`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoneVariant {
    pub histone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub protein_position: Position,
    pub modification: HistoneModification,
}

impl HistoneVariant {
    /// Event subtype of the modification
    pub fn event_subtype(&self) -> EventSubtype {
        self.modification.kind.subtype()
    }
}

fn residue_code(aa: &str) -> char {
    match aa {
        "Lys" | "K" => 'K',
        "Arg" | "R" => 'R',
        _ => 'S',
    }
}

/// Parse histone modification notation
///
/// ```
/// use ferro_kb::notation::{parse_histone, EventSubtype, Position};
///
/// let variant = parse_histone("H3K27me3").unwrap();
/// assert_eq!(variant.histone, "H3");
/// assert_eq!(variant.protein_position, Position::protein(27, 'K'));
/// assert_eq!(variant.modification.count, Some(3));
/// assert_eq!(variant.event_subtype(), EventSubtype::Methylation);
/// ```
pub fn parse_histone(text: &str) -> Result<HistoneVariant, FerroError> {
    let mismatch = || {
        FerroError::parse_expected(
            text,
            format!("input string did not match expected pattern: {}", text),
            ErrorCode::InvalidHistone,
            HISTONE_FORM,
        )
    };
    let caps = HISTONE_PATTERN.captures(text).ok_or_else(mismatch)?;

    let pos = caps
        .name("pos")
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(mismatch)?;
    let kind = caps
        .name("modification")
        .and_then(|m| ModificationType::from_token(m.as_str()))
        .ok_or_else(mismatch)?;
    let count = match caps.name("count").map(|m| m.as_str()) {
        None | Some("?") => None,
        Some(digits) => Some(digits.parse::<u32>().map_err(|_| mismatch())?),
    };

    Ok(HistoneVariant {
        histone: caps["histone"].to_string(),
        subtype: caps.name("subtype").map(|m| m.as_str().to_string()),
        protein_position: Position::protein(pos, residue_code(&caps["aa"])),
        modification: HistoneModification { kind, count },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimethylation() {
        let variant = parse_histone("H3K27me3").unwrap();
        assert_eq!(variant.histone, "H3");
        assert_eq!(variant.subtype, None);
        assert_eq!(variant.modification.kind, ModificationType::Methylation);
        assert_eq!(variant.modification.count, Some(3));
    }

    #[test]
    fn test_subtype_and_three_letter_code() {
        let variant = parse_histone("H2A.ZLys4ac").unwrap();
        assert_eq!(variant.histone, "H2A");
        assert_eq!(variant.subtype.as_deref(), Some("Z"));
        assert_eq!(variant.protein_position, Position::protein(4, 'K'));
        assert_eq!(variant.event_subtype(), EventSubtype::Acetylation);
    }

    #[test]
    fn test_unknown_count() {
        let variant = parse_histone("H4Arg3me?").unwrap();
        assert_eq!(variant.protein_position, Position::protein(3, 'R'));
        assert_eq!(variant.modification.count, None);

        let variant = parse_histone("H2BS14ub").unwrap();
        assert_eq!(variant.protein_position, Position::protein(14, 'S'));
        assert_eq!(variant.modification.count, None);
    }

    #[test]
    fn test_rejects() {
        for bad in ["H3K27me0", "H3T27me3", "h3K27me3", "H3K27", "H3K27me3x", "H3.zK4ac"] {
            let err = parse_histone(bad).unwrap_err();
            assert_eq!(err.code(), Some(ErrorCode::InvalidHistone), "{}", bad);
        }
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(parse_histone("H3K4me1").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "histone": "H3",
                "protein_position": {"prefix": "p", "pos": 4, "ref_aa": "K"},
                "modification": {"type": "me", "count": 1}
            })
        );
    }
}
