//! Canonical event subtypes and the notation token table
//!
//! Variant notation uses short tokens (`del`, `>`, `fs`, ...) that map onto a
//! closed vocabulary of event subtypes. Which subtypes are legal depends on
//! the coordinate system the variant is described in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical event subtype of a positional variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSubtype {
    #[serde(rename = "insertion")]
    Insertion,
    #[serde(rename = "deletion")]
    Deletion,
    #[serde(rename = "substitution")]
    Substitution,
    #[serde(rename = "inversion")]
    Inversion,
    #[serde(rename = "indel")]
    Indel,
    #[serde(rename = "gain")]
    Gain,
    #[serde(rename = "loss")]
    Loss,
    #[serde(rename = "translocation")]
    Translocation,
    #[serde(rename = "inverted translocation")]
    InvertedTranslocation,
    #[serde(rename = "extension")]
    Extension,
    #[serde(rename = "frameshift")]
    Frameshift,
    #[serde(rename = "fusion")]
    Fusion,
    #[serde(rename = "duplication")]
    Duplication,
    #[serde(rename = "methylation")]
    Methylation,
    #[serde(rename = "acetylation")]
    Acetylation,
    #[serde(rename = "ubiquitination")]
    Ubiquitination,
    #[serde(rename = "splice-site")]
    SpliceSite,
}

/// Notation token to subtype
const NOTATION_TABLE: &[(&str, EventSubtype)] = &[
    ("ub", EventSubtype::Ubiquitination),
    ("me", EventSubtype::Methylation),
    ("ac", EventSubtype::Acetylation),
    ("fs", EventSubtype::Frameshift),
    (">", EventSubtype::Substitution),
    ("delins", EventSubtype::Indel),
    ("inv", EventSubtype::Inversion),
    ("ext", EventSubtype::Extension),
    ("del", EventSubtype::Deletion),
    ("dup", EventSubtype::Duplication),
    ("ins", EventSubtype::Insertion),
    ("copygain", EventSubtype::Gain),
    ("copyloss", EventSubtype::Loss),
    ("t", EventSubtype::Translocation),
    ("trans", EventSubtype::Translocation),
    ("itrans", EventSubtype::InvertedTranslocation),
    ("spl", EventSubtype::SpliceSite),
    ("fusion", EventSubtype::Fusion),
];

const ALL: &[EventSubtype] = &[
    EventSubtype::Insertion,
    EventSubtype::Deletion,
    EventSubtype::Substitution,
    EventSubtype::Inversion,
    EventSubtype::Indel,
    EventSubtype::Gain,
    EventSubtype::Loss,
    EventSubtype::Translocation,
    EventSubtype::InvertedTranslocation,
    EventSubtype::Extension,
    EventSubtype::Frameshift,
    EventSubtype::Fusion,
    EventSubtype::Duplication,
    EventSubtype::Methylation,
    EventSubtype::Acetylation,
    EventSubtype::Ubiquitination,
    EventSubtype::SpliceSite,
];

impl EventSubtype {
    /// Look up the subtype for a notation token
    pub fn from_notation(token: &str) -> Option<Self> {
        NOTATION_TABLE
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, subtype)| *subtype)
    }

    /// Canonical name, as stored on the record
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSubtype::Insertion => "insertion",
            EventSubtype::Deletion => "deletion",
            EventSubtype::Substitution => "substitution",
            EventSubtype::Inversion => "inversion",
            EventSubtype::Indel => "indel",
            EventSubtype::Gain => "gain",
            EventSubtype::Loss => "loss",
            EventSubtype::Translocation => "translocation",
            EventSubtype::InvertedTranslocation => "inverted translocation",
            EventSubtype::Extension => "extension",
            EventSubtype::Frameshift => "frameshift",
            EventSubtype::Fusion => "fusion",
            EventSubtype::Duplication => "duplication",
            EventSubtype::Methylation => "methylation",
            EventSubtype::Acetylation => "acetylation",
            EventSubtype::Ubiquitination => "ubiquitination",
            EventSubtype::SpliceSite => "splice-site",
        }
    }

    /// Subtypes every coordinate system accepts, and the only ones a
    /// discontinuous (two-slot) description may use
    pub fn is_common(&self) -> bool {
        matches!(
            self,
            EventSubtype::Deletion
                | EventSubtype::Duplication
                | EventSubtype::Fusion
                | EventSubtype::Translocation
                | EventSubtype::InvertedTranslocation
                | EventSubtype::Inversion
        )
    }

    /// Whether this subtype may be described with the given coordinate prefix
    pub fn allowed_for(&self, prefix: char, continuous: bool) -> bool {
        if self.is_common() {
            return true;
        }
        if !continuous {
            return false;
        }
        let cytoband = matches!(self, EventSubtype::Loss | EventSubtype::Gain);
        let sequence = cytoband
            || matches!(
                self,
                EventSubtype::Insertion | EventSubtype::Substitution | EventSubtype::Indel
            );
        let protein = sequence
            || matches!(
                self,
                EventSubtype::Frameshift
                    | EventSubtype::Extension
                    | EventSubtype::Methylation
                    | EventSubtype::Acetylation
                    | EventSubtype::Ubiquitination
                    | EventSubtype::SpliceSite
            );
        match prefix {
            'p' => protein,
            'g' | 'c' => sequence,
            'y' => cytoband,
            _ => false,
        }
    }

    /// Check prefix legality, producing the parse error message on failure
    pub fn validate_for_prefix(&self, prefix: char, continuous: bool) -> Result<(), String> {
        if self.allowed_for(prefix, continuous) {
            Ok(())
        } else {
            Err(format!(
                "invalid type '{}' for the given prefix notation '{}'",
                self, prefix
            ))
        }
    }
}

impl fmt::Display for EventSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventSubtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .find(|subtype| subtype.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown event subtype: {}", s))
    }
}
