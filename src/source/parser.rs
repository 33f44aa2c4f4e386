use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{SourceHeader, SourceParser};
use crate::error::{CuegraphError, Result};

static PACKAGE_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^package\s+([A-Za-z_$#][A-Za-z0-9_$]*)").expect("valid regex"));

static IMPORT_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:([A-Za-z_$#][A-Za-z0-9_$]*)\s+)?"((?:[^"\\\n]|\\.)*)""#).expect("valid regex")
});

/// Reads the preamble of a CUE file: attributes, the `package` clause and
/// `import` declarations. Parsing stops at the first declaration that is none
/// of these, so the body of the file is never interpreted.
pub struct CueHeaderParser;

impl SourceParser for CueHeaderParser {
    fn parse_source(&self, path: &Path, source: &str) -> Result<SourceHeader> {
        let text = strip_line_comments(source);
        let mut header = SourceHeader::default();
        let mut rest = text.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if rest.starts_with('@') {
                rest = rest.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
                continue;
            }

            if starts_with_keyword(rest, "package") {
                let caps = PACKAGE_CLAUSE
                    .captures(rest)
                    .ok_or_else(|| parse_error(path, "malformed package clause"))?;
                if header.package.is_some() {
                    return Err(parse_error(path, "duplicate package clause"));
                }
                header.package = Some(caps[1].to_string());
                rest = &rest[caps[0].len()..];
                continue;
            }

            if starts_with_keyword(rest, "import") {
                rest = rest["import".len()..].trim_start();
                if let Some(block) = rest.strip_prefix('(') {
                    rest = parse_import_block(path, block, &mut header.imports)?;
                } else {
                    let (import, tail) = parse_import_spec(path, rest)?;
                    header.imports.push(import);
                    rest = tail;
                }
                continue;
            }

            break;
        }

        Ok(header)
    }
}

fn parse_import_block<'a>(
    path: &Path,
    mut rest: &'a str,
    out: &mut Vec<String>,
) -> Result<&'a str> {
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return Err(parse_error(path, "unterminated import block"));
        }
        if let Some(tail) = rest.strip_prefix(')') {
            return Ok(tail);
        }
        let (import, tail) = parse_import_spec(path, rest)?;
        out.push(import);
        rest = tail;
    }
}

fn parse_import_spec<'a>(path: &Path, rest: &'a str) -> Result<(String, &'a str)> {
    let caps = IMPORT_SPEC
        .captures(rest)
        .ok_or_else(|| parse_error(path, "malformed import spec"))?;
    let import = caps[2].to_string();
    if import.is_empty() {
        return Err(parse_error(path, "empty import path"));
    }
    Ok((import, &rest[caps[0].len()..]))
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .and_then(|tail| tail.chars().next())
        .map(|c| c.is_whitespace() || c == '(' || c == '"')
        .unwrap_or(false)
}

/// Drops `//` comments while leaving string literals intact.
fn strip_line_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' | '\n' => in_string = false,
                _ => {}
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'/') {
            for skipped in chars.by_ref() {
                if skipped == '\n' {
                    out.push('\n');
                    break;
                }
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

fn parse_error(path: &Path, msg: &str) -> CuegraphError {
    CuegraphError::Parse(format!("{}: {}", path.display(), msg))
}
