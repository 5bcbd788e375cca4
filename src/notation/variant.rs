//! Structured variant descriptions
//!
//! A [`VariantDescription`] is the output of the notation parser. Breakpoint
//! representations are sliced from the input rather than rebuilt from the
//! parsed positions, so they match what was typed byte for byte.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Position;
use super::subtype::EventSubtype;

/// One breakpoint, either exact or an uncertain `(start_end)` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub start: Position,
    pub end: Option<Position>,
}

impl Breakpoint {
    pub fn exact(start: Position) -> Self {
        Self { start, end: None }
    }

    pub fn range(start: Position, end: Position) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn is_range(&self) -> bool {
        self.end.is_some()
    }
}

/// A parsed variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDescription {
    #[serde(rename = "type")]
    pub subtype: EventSubtype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break1_start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break1_end: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break1_repr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break2_start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break2_end: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break2_repr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_seq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untemplated_seq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untemplated_seq_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<u64>,
}

impl VariantDescription {
    /// An empty description of the given subtype
    pub fn new(subtype: EventSubtype) -> Self {
        Self {
            subtype,
            break1_start: None,
            break1_end: None,
            break1_repr: None,
            break2_start: None,
            break2_end: None,
            break2_repr: None,
            ref_seq: None,
            untemplated_seq: None,
            untemplated_seq_size: None,
            truncation: None,
        }
    }

    pub fn set_break1(&mut self, breakpoint: Breakpoint, repr: impl Into<String>) {
        self.break1_start = Some(breakpoint.start);
        self.break1_end = breakpoint.end;
        self.break1_repr = Some(repr.into());
    }

    pub fn set_break2(&mut self, breakpoint: Breakpoint, repr: impl Into<String>) {
        self.break2_start = Some(breakpoint.start);
        self.break2_end = breakpoint.end;
        self.break2_repr = Some(repr.into());
    }

    pub fn break1(&self) -> Option<Breakpoint> {
        self.break1_start.map(|start| Breakpoint {
            start,
            end: self.break1_end,
        })
    }

    pub fn break2(&self) -> Option<Breakpoint> {
        self.break2_start.map(|start| Breakpoint {
            start,
            end: self.break2_end,
        })
    }

    /// True when the variant was described with two breakpoints
    pub fn has_two_breakpoints(&self) -> bool {
        self.break1_start.is_some() && self.break2_start.is_some()
    }

    /// Coordinate prefix of the first available breakpoint
    pub fn prefix(&self) -> Option<char> {
        self.break1_start
            .or(self.break2_start)
            .map(|position| position.prefix())
    }
}

impl fmt::Display for VariantDescription {
    /// `<subtype> <break1Repr>[ <break2Repr>]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subtype)?;
        for repr in [&self.break1_repr, &self.break2_repr].into_iter().flatten() {
            write!(f, " {}", repr)?;
        }
        Ok(())
    }
}
