//! CLI utilities for ferro-kb
//!
//! This module provides testable functions used by the CLI binary.
//! Input handling and output formatting live here so they can be unit tested
//! without spawning the binary.

pub mod format;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

pub use format::{
    output_error, output_parsed, output_statement, summarize_histone, summarize_variant,
    OutputFormat,
};

/// UTF-8 BOM (Byte Order Mark) constant
const UTF8_BOM: &str = "\u{feff}";

/// Strip UTF-8 BOM from the beginning of a string if present.
///
/// # Examples
///
/// ```
/// use ferro_kb::cli::strip_bom;
///
/// assert_eq!(strip_bom("\u{feff}p.G12D"), "p.G12D");
/// assert_eq!(strip_bom("p.G12D"), "p.G12D");
/// ```
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(UTF8_BOM).unwrap_or(s)
}

/// Process an input line: trim whitespace and strip the BOM on the first line.
///
/// Returns None for blank lines and lines starting with `#`. Comments are
/// whole-line only since record IDs such as `#12:0` appear inside queries.
///
/// # Examples
///
/// ```
/// use ferro_kb::cli::process_input_line;
///
/// assert_eq!(process_input_line("  p.G12D ", false), Some("p.G12D"));
/// assert_eq!(process_input_line("\u{feff}p.G12D", true), Some("p.G12D"));
/// assert_eq!(process_input_line("# comment", false), None);
/// assert_eq!(process_input_line(r##"{"v": ["#12:0"]}"##, false), Some(r##"{"v": ["#12:0"]}"##));
/// ```
pub fn process_input_line(line: &str, is_first_line: bool) -> Option<&str> {
    let line = if is_first_line { strip_bom(line) } else { line };
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        None
    } else {
        Some(line)
    }
}

/// Wrap a reader, decompressing when it starts with the gzip magic bytes
pub fn maybe_gzip<R: Read + 'static>(reader: R) -> io::Result<Box<dyn BufRead>> {
    let mut reader = BufReader::with_capacity(1024 * 1024, reader);
    let is_gzip = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open an input file (gzip-aware), or stdin for `-`
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return maybe_gzip(io::stdin());
    }
    maybe_gzip(File::open(path)?)
}

/// Non-blank, non-comment lines paired with their 1-based line numbers
pub fn numbered_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<(usize, String)>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Err(e) => Some(Err(e)),
            Ok(line) => process_input_line(&line, index == 0)
                .map(|content| Ok((index + 1, content.to_string()))),
        })
}
