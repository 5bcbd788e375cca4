//! Breakpoint positions
//!
//! A [`Position`] is keyed by its coordinate-system prefix:
//!
//! | Prefix | Coordinate system | Fields |
//! |--------|-------------------|--------|
//! | `g` | genomic | `pos` |
//! | `e` | exonic | `pos` |
//! | `c` | coding sequence | `pos`, `offset` |
//! | `p` | protein | `pos`, `ref_aa` |
//! | `y` | cytoband | `arm`, `major_band`, `minor_band` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefixes accepted by the notation parser
pub const PREFIXES: [char; 5] = ['g', 'c', 'e', 'y', 'p'];

/// Unknown reference residue
pub const UNKNOWN_AA: char = '?';

/// Chromosome arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    P,
    Q,
}

impl Arm {
    pub fn as_char(&self) -> char {
        match self {
            Arm::P => 'p',
            Arm::Q => 'q',
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single breakpoint coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "prefix")]
pub enum Position {
    #[serde(rename = "g")]
    Genomic { pos: u64 },
    #[serde(rename = "e")]
    Exonic { pos: u64 },
    /// Intronic distance is carried in `offset` (e.g. `3+1`, `5-2`)
    #[serde(rename = "c")]
    Cds { pos: u64, offset: i64 },
    #[serde(rename = "p")]
    Protein { pos: u64, ref_aa: char },
    /// A minor band never appears without a major band
    #[serde(rename = "y")]
    Cytoband {
        arm: Arm,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        major_band: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minor_band: Option<u32>,
    },
}

impl Position {
    pub fn genomic(pos: u64) -> Self {
        Position::Genomic { pos }
    }

    pub fn exonic(pos: u64) -> Self {
        Position::Exonic { pos }
    }

    pub fn cds(pos: u64, offset: i64) -> Self {
        Position::Cds { pos, offset }
    }

    pub fn protein(pos: u64, ref_aa: char) -> Self {
        Position::Protein { pos, ref_aa }
    }

    pub fn cytoband(arm: Arm, major_band: Option<u32>, minor_band: Option<u32>) -> Self {
        Position::Cytoband {
            arm,
            major_band,
            minor_band,
        }
    }

    /// Coordinate-system prefix of this position
    pub fn prefix(&self) -> char {
        match self {
            Position::Genomic { .. } => 'g',
            Position::Exonic { .. } => 'e',
            Position::Cds { .. } => 'c',
            Position::Protein { .. } => 'p',
            Position::Cytoband { .. } => 'y',
        }
    }

    /// Numeric position, if the coordinate system has one
    pub fn pos(&self) -> Option<u64> {
        match self {
            Position::Genomic { pos }
            | Position::Exonic { pos }
            | Position::Cds { pos, .. }
            | Position::Protein { pos, .. } => Some(*pos),
            Position::Cytoband { .. } => None,
        }
    }

    /// Known reference residue of a protein position
    pub fn known_ref_aa(&self) -> Option<char> {
        match self {
            Position::Protein { ref_aa, .. } if *ref_aa != UNKNOWN_AA => Some(*ref_aa),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Genomic { pos } | Position::Exonic { pos } => write!(f, "{}", pos),
            Position::Cds { pos, offset } => match offset {
                0 => write!(f, "{}", pos),
                o if *o > 0 => write!(f, "{}+{}", pos, o),
                o => write!(f, "{}{}", pos, o),
            },
            Position::Protein { pos, ref_aa } => write!(f, "{}{}", ref_aa, pos),
            Position::Cytoband {
                arm,
                major_band,
                minor_band,
            } => {
                write!(f, "{}", arm)?;
                if let Some(major) = major_band {
                    write!(f, "{}", major)?;
                    if let Some(minor) = minor_band {
                        write!(f, ".{}", minor)?;
                    }
                }
                Ok(())
            }
        }
    }
}
