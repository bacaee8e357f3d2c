//! Quoting helpers for diagnostic messages and source rendering.
//!
//! Diagnostics quote the offending character or name (`'x'`) and escape
//! control characters so that messages stay on one line. Source rendering
//! produces text the scanner would accept again.

use std::fmt::Write as _;

use crate::lexer::is_name_char;

/// Escape one character for a message inside single quotes.
fn escape_char(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\0' => out.push_str("\\0"),
        '\n' => out.push_str("\\n"),
        '\'' => out.push_str("\\'"),
        c if !c.is_control() => out.push(c),
        c => {
            let mut buf = [0; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                // Writing into a String cannot fail
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
}

/// A single character as it appears in messages: `'x'`.
pub fn char_word(c: char) -> String {
    let mut out = String::new();
    escape_char(&mut out, c);
    format!("'{out}'")
}

/// A name as it appears in messages: `'name'`.
pub fn name_word(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        escape_char(&mut out, c);
    }
    format!("'{out}'")
}

/// A name preceded by a marker such as `%` or `$`: `'%name'`.
pub fn prefix_word(name: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + name.len());
    out.push_str(prefix);
    for c in name.chars() {
        escape_char(&mut out, c);
    }
    format!("'{out}'")
}

/// Render literal text so that scanning it yields the same text again.
///
/// Text made only of bare name characters is returned unchanged. Anything
/// else is double-quoted with escapes.
pub fn source_text(text: &str) -> String {
    if !text.is_empty() && text.chars().all(is_name_char) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
