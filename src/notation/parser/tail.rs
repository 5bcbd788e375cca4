//! Tail (event suffix) dispatch for continuous notation
//!
//! Several tail productions are prefixes of one another, so they are tried
//! in a fixed priority order and the first match wins.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Inserted material described by an alternate allele
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternate {
    /// Literal residues or bases; `?` means the length is unknown
    Sequence(String),
    /// Only the length is known
    Size(u64),
}

/// `del`, `inv`, `ins` or `dup`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleEvent {
    Del,
    Inv,
    Ins,
    Dup,
}

impl SimpleEvent {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "del" => Some(SimpleEvent::Del),
            "inv" => Some(SimpleEvent::Inv),
            "ins" => Some(SimpleEvent::Ins),
            "dup" => Some(SimpleEvent::Dup),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            SimpleEvent::Del => "del",
            SimpleEvent::Inv => "inv",
            SimpleEvent::Ins => "ins",
            SimpleEvent::Dup => "dup",
        }
    }
}

/// One tail production
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tail {
    /// `del[ref]ins[alt|size]`
    Delins {
        ref_seq: Option<String>,
        alt: Option<Alternate>,
    },
    /// `(del|inv|ins|dup)[ref|size]`
    Simple {
        event: SimpleEvent,
        ref_seq: Option<String>,
        size: Option<u64>,
    },
    /// Protein shorthand: a bare alternate residue
    ProteinSubstitution { alt: char },
    /// `<ref>><alt>`
    Substitution { ref_base: char, alt_base: char },
    /// `[alt]fs[*truncation]`
    Frameshift {
        alt: Option<char>,
        truncation: Option<u64>,
    },
    /// `spl`
    Splice,
}

impl Tail {
    /// Raw notation token, before mapping to an event subtype
    pub fn notation(&self) -> &'static str {
        match self {
            Tail::Delins { .. } => "delins",
            Tail::Simple { event, .. } => event.token(),
            Tail::ProteinSubstitution { .. } | Tail::Substitution { .. } => ">",
            Tail::Frameshift { .. } => "fs",
            Tail::Splice => "spl",
        }
    }

    /// Dispatch a tail for the given prefix
    ///
    /// Returns the error message on failure; the caller attaches context.
    pub fn parse(prefix: char, tail: &str) -> Result<Tail, String> {
        for (pattern, build) in PRODUCTIONS.iter() {
            if let Some(caps) = pattern.captures(tail) {
                return build(prefix, &caps);
            }
        }
        Err(format!("Did not recognize type: {}", tail))
    }
}

type Production = fn(char, &Captures) -> Result<Tail, String>;

static PRODUCTIONS: Lazy<Vec<(Regex, Production)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^del([A-Z?*]+)?ins(?:([A-Z?*]+)|(\d+))?$").expect("valid regex"),
            delins as Production,
        ),
        (
            Regex::new(r"^(del|inv|ins|dup)(?:([A-Z?*]+)|(\d+))?$").expect("valid regex"),
            simple as Production,
        ),
        (
            Regex::new(r"^[A-Z?*]$").expect("valid regex"),
            protein_substitution as Production,
        ),
        (
            Regex::new(r"^([A-Z?])>([A-Z?])$").expect("valid regex"),
            substitution as Production,
        ),
        (
            Regex::new(r"^([A-Z?*])?fs(?:\*(\d+))?$").expect("valid regex"),
            frameshift as Production,
        ),
        (
            Regex::new(r"^spl$").expect("valid regex"),
            splice as Production,
        ),
    ]
});

fn group(caps: &Captures, index: usize) -> Option<String> {
    caps.get(index).map(|m| m.as_str().to_string())
}

fn number(caps: &Captures, index: usize) -> Result<Option<u64>, String> {
    caps.get(index)
        .map(|m| {
            m.as_str()
                .parse::<u64>()
                .map_err(|_| format!("number out of range: {}", m.as_str()))
        })
        .transpose()
}

fn first_char(caps: &Captures, index: usize) -> Option<char> {
    caps.get(index).and_then(|m| m.as_str().chars().next())
}

fn delins(_prefix: char, caps: &Captures) -> Result<Tail, String> {
    let alt = match (group(caps, 2), number(caps, 3)?) {
        (Some(seq), _) => Some(Alternate::Sequence(seq)),
        (None, Some(size)) => Some(Alternate::Size(size)),
        (None, None) => None,
    };
    Ok(Tail::Delins {
        ref_seq: group(caps, 1),
        alt,
    })
}

fn simple(_prefix: char, caps: &Captures) -> Result<Tail, String> {
    let token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let event =
        SimpleEvent::from_token(token).ok_or_else(|| format!("Did not recognize type: {}", token))?;
    Ok(Tail::Simple {
        event,
        ref_seq: group(caps, 2),
        size: number(caps, 3)?,
    })
}

fn protein_substitution(prefix: char, caps: &Captures) -> Result<Tail, String> {
    if prefix != 'p' {
        return Err("only protein notation does not use \">\" for a substitution".to_string());
    }
    let alt = first_char(caps, 0).unwrap_or('?');
    Ok(Tail::ProteinSubstitution { alt })
}

fn substitution(prefix: char, caps: &Captures) -> Result<Tail, String> {
    if prefix == 'p' {
        return Err("protein notation does not use \">\" for a substitution".to_string());
    }
    Ok(Tail::Substitution {
        ref_base: first_char(caps, 1).unwrap_or('?'),
        alt_base: first_char(caps, 2).unwrap_or('?'),
    })
}

fn frameshift(prefix: char, caps: &Captures) -> Result<Tail, String> {
    if prefix != 'p' {
        return Err("only protein notation can notate frameshift variants".to_string());
    }
    Ok(Tail::Frameshift {
        alt: first_char(caps, 1),
        truncation: number(caps, 2)?,
    })
}

fn splice(_prefix: char, _caps: &Captures) -> Result<Tail, String> {
    Ok(Tail::Splice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delins_before_del() {
        assert_eq!(
            Tail::parse('g', "delTAAinsACG").unwrap(),
            Tail::Delins {
                ref_seq: Some("TAA".to_string()),
                alt: Some(Alternate::Sequence("ACG".to_string())),
            }
        );
        assert_eq!(
            Tail::parse('g', "delins").unwrap(),
            Tail::Delins {
                ref_seq: None,
                alt: None
            }
        );
        assert_eq!(
            Tail::parse('g', "delins12").unwrap(),
            Tail::Delins {
                ref_seq: None,
                alt: Some(Alternate::Size(12)),
            }
        );
    }

    #[test]
    fn test_simple_events() {
        assert_eq!(
            Tail::parse('g', "delTAA").unwrap(),
            Tail::Simple {
                event: SimpleEvent::Del,
                ref_seq: Some("TAA".to_string()),
                size: None,
            }
        );
        assert_eq!(
            Tail::parse('g', "dup10").unwrap(),
            Tail::Simple {
                event: SimpleEvent::Dup,
                ref_seq: None,
                size: Some(10),
            }
        );
        assert_eq!(Tail::parse('y', "inv").unwrap().notation(), "inv");
        assert_eq!(Tail::parse('e', "ins").unwrap().notation(), "ins");
    }

    #[test]
    fn test_zero_size_is_numeric() {
        assert_eq!(
            Tail::parse('g', "ins0").unwrap(),
            Tail::Simple {
                event: SimpleEvent::Ins,
                ref_seq: None,
                size: Some(0),
            }
        );
    }

    #[test]
    fn test_protein_shorthand() {
        assert_eq!(
            Tail::parse('p', "D").unwrap(),
            Tail::ProteinSubstitution { alt: 'D' }
        );
        let err = Tail::parse('g', "T").unwrap_err();
        assert_eq!(err, "only protein notation does not use \">\" for a substitution");
    }

    #[test]
    fn test_substitution() {
        assert_eq!(
            Tail::parse('c', "A>T").unwrap(),
            Tail::Substitution {
                ref_base: 'A',
                alt_base: 'T'
            }
        );
        let err = Tail::parse('p', "T>A").unwrap_err();
        assert_eq!(err, "protein notation does not use \">\" for a substitution");
    }

    #[test]
    fn test_frameshift() {
        assert_eq!(
            Tail::parse('p', "Kfs*10").unwrap(),
            Tail::Frameshift {
                alt: Some('K'),
                truncation: Some(10)
            }
        );
        assert_eq!(
            Tail::parse('p', "fs").unwrap(),
            Tail::Frameshift {
                alt: None,
                truncation: None
            }
        );
        assert!(Tail::parse('p', "Kfs*").is_err());
        assert_eq!(
            Tail::parse('g', "fs").unwrap_err(),
            "only protein notation can notate frameshift variants"
        );
    }

    #[test]
    fn test_splice_and_unknown() {
        assert_eq!(Tail::parse('p', "spl").unwrap(), Tail::Splice);
        assert_eq!(
            Tail::parse('g', "blargh").unwrap_err(),
            "Did not recognize type: blargh"
        );
    }
}
