//! Variant notation
//!
//! Compact variant notation (`p.G12D`, `c.3+1_5-2del`, `y.p11.1_p13.3dup`)
//! parsed into structured [`VariantDescription`] records.
//!
//! # Example
//!
//! ```
//! use ferro_kb::notation::{parse, EventSubtype};
//!
//! let variant = parse("p.R10Kfs*10").unwrap();
//! assert_eq!(variant.subtype, EventSubtype::Frameshift);
//! assert_eq!(variant.ref_seq.as_deref(), Some("R"));
//! assert_eq!(variant.untemplated_seq.as_deref(), Some("K"));
//! assert_eq!(variant.truncation, Some(10));
//! ```

pub mod histone;
pub mod parser;
pub mod position;
pub mod subtype;
pub mod variant;

pub use histone::{parse_histone, HistoneModification, HistoneVariant, ModificationType};
pub use parser::{
    parse, parse_continuous, parse_discontinuous, parse_multi_feature, parse_position,
};
pub use position::{Arm, Position};
pub use subtype::EventSubtype;
pub use variant::{Breakpoint, VariantDescription};
