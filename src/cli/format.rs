//! Output formatting utilities for CLI operations

use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

pub use crate::config::OutputFormat;
use crate::error::FerroError;
use crate::notation::{HistoneVariant, VariantDescription};
use crate::query::QueryStatement;

/// One-line text summary: `subtype break1Repr[ break2Repr]`
///
/// # Examples
///
/// ```
/// use ferro_kb::cli::summarize_variant;
/// use ferro_kb::notation::parse;
///
/// let variant = parse("g.3_5delTAA").unwrap();
/// assert_eq!(summarize_variant(&variant), "deletion g.3 g.5");
/// ```
pub fn summarize_variant(variant: &VariantDescription) -> String {
    let mut summary = variant.subtype.to_string();
    for repr in [&variant.break1_repr, &variant.break2_repr].into_iter().flatten() {
        summary.push(' ');
        summary.push_str(repr);
    }
    summary
}

/// One-line text summary of a histone modification
pub fn summarize_histone(variant: &HistoneVariant) -> String {
    let mut summary = format!("{} {}", variant.event_subtype(), variant.histone);
    if let Some(subtype) = &variant.subtype {
        summary.push('.');
        summary.push_str(subtype);
    }
    summary.push(' ');
    summary.push_str(&variant.protein_position.to_string());
    if let Some(count) = variant.modification.count {
        summary.push_str(&format!(" x{}", count));
    }
    summary
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)
}

/// Write a parsed record
///
/// Text output is `input -> summary`; JSON output is the serialised record
/// wrapped with the input.
pub fn output_parsed<W: Write, T: Serialize>(
    writer: &mut W,
    input: &str,
    summary: &str,
    record: &T,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json(
            writer,
            &json!({"input": input, "result": record, "status": "ok"}),
        ),
        OutputFormat::Text => writeln!(writer, "{} -> {}", input, summary),
    }
}

/// Write a rendered statement, or its substituted display form
///
/// # Examples
///
/// ```
/// use ferro_kb::cli::{output_statement, OutputFormat};
/// use ferro_kb::query::{Params, QueryStatement};
/// use std::io::Cursor;
///
/// let mut params = Params::new();
/// params.insert("param0".to_string(), "bob".into());
/// let statement = QueryStatement { query: "SELECT * FROM V WHERE name = :param0".into(), params };
///
/// let mut buffer = Cursor::new(Vec::new());
/// output_statement(&mut buffer, &statement, true, OutputFormat::Text).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert_eq!(result, "SELECT * FROM V WHERE name = 'bob'\n");
/// ```
pub fn output_statement<W: Write>(
    writer: &mut W,
    statement: &QueryStatement,
    display: bool,
    format: OutputFormat,
) -> io::Result<()> {
    match (format, display) {
        (OutputFormat::Json, true) => {
            write_json(writer, &json!({"query": statement.display_string()}))
        }
        (OutputFormat::Json, false) => write_json(writer, statement),
        (OutputFormat::Text, true) => writeln!(writer, "{}", statement.display_string()),
        (OutputFormat::Text, false) => {
            writeln!(writer, "{}", statement.query)?;
            for (name, value) in &statement.params {
                writeln!(writer, "  :{} = {}", name, value)?;
            }
            Ok(())
        }
    }
}

/// Write an error with optional line number context
///
/// # Examples
///
/// ```
/// use ferro_kb::cli::{output_error, OutputFormat};
/// use ferro_kb::FerroError;
/// use std::io::Cursor;
///
/// let mut buffer = Cursor::new(Vec::new());
/// let error = FerroError::usage("bad input");
/// output_error(&mut buffer, "input", &error, OutputFormat::Text, Some(42)).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert!(result.contains("line 42"));
/// ```
pub fn output_error<W: Write>(
    writer: &mut W,
    input: &str,
    error: &FerroError,
    format: OutputFormat,
    line_number: Option<usize>,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let mut record = json!({
                "input": input,
                "error": error.to_string(),
                "status": "error",
            });
            if let Some(code) = error.code() {
                record["code"] = json!(code.as_str());
            }
            if let Some(line) = line_number {
                record["line"] = json!(line);
            }
            write_json(writer, &record)
        }
        OutputFormat::Text => match line_number {
            Some(line) => writeln!(
                writer,
                "ERROR (line {}): {} - {}",
                line,
                input,
                error.detailed_message()
            ),
            None => writeln!(writer, "ERROR: {} - {}", input, error.detailed_message()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::{parse, parse_histone};
    use crate::query::Params;
    use std::io::Cursor;

    fn written<F: FnOnce(&mut Cursor<Vec<u8>>) -> io::Result<()>>(f: F) -> String {
        let mut buffer = Cursor::new(Vec::new());
        f(&mut buffer).unwrap();
        String::from_utf8(buffer.into_inner()).unwrap()
    }

    #[test]
    fn test_summarize_variant() {
        let variant = parse("p.G12D").unwrap();
        assert_eq!(summarize_variant(&variant), "substitution p.G12");
    }

    #[test]
    fn test_summarize_histone() {
        let variant = parse_histone("H3K27me3").unwrap();
        let summary = summarize_histone(&variant);
        assert!(summary.starts_with("methylation H3 "));
        assert!(summary.ends_with(" x3"));
    }

    #[test]
    fn test_output_parsed() {
        let variant = parse("g.3_5delTAA").unwrap();
        let text = written(|w| {
            output_parsed(w, "g.3_5delTAA", &summarize_variant(&variant), &variant, OutputFormat::Text)
        });
        assert_eq!(text, "g.3_5delTAA -> deletion g.3 g.5\n");

        let text = written(|w| output_parsed(w, "g.3_5delTAA", "", &variant, OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["result"]["type"], "deletion");
        assert_eq!(value["result"]["refSeq"], "TAA");
    }

    #[test]
    fn test_output_statement() {
        let mut params = Params::new();
        params.insert("param0".to_string(), json!(3));
        let statement = QueryStatement {
            query: "SELECT * FROM V WHERE rank = :param0".to_string(),
            params,
        };
        let text = written(|w| output_statement(w, &statement, false, OutputFormat::Text));
        assert_eq!(text, "SELECT * FROM V WHERE rank = :param0\n  :param0 = 3\n");

        let text = written(|w| output_statement(w, &statement, false, OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["params"]["param0"], 3);

        let text = written(|w| output_statement(w, &statement, true, OutputFormat::Json));
        assert!(text.contains("rank = 3"));
    }

    #[test]
    fn test_output_error_json() {
        let error = FerroError::usage("bad");
        let text = written(|w| output_error(w, "x", &error, OutputFormat::Json, Some(3)));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["line"], 3);
        assert_eq!(value["code"], "E3001");

        let text = written(|w| output_error(w, "x", &error, OutputFormat::Text, None));
        assert!(text.starts_with("ERROR: x - "));
    }
}
