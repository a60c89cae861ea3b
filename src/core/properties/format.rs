/*!
Textual `key=value` property streams.

The format is line based and byte oriented (ISO-8859-1):

- lines whose first non-blank character is `#` or `!` are comments
- the key ends at the first unescaped `=`, `:` or blank; one separator and the
  blanks around it are skipped
- a line ending in an odd number of backslashes continues on the next line,
  whose leading blanks are dropped
- escapes: `\t`, `\n`, `\r`, `\f`, `\uXXXX`; any other escaped character
  stands for itself
*/

use crate::core::error::{Error, Result};
use crate::core::properties::bag::PropertyBag;

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn is_separator(c: char) -> bool {
    c == '=' || c == ':' || is_blank(c)
}

/// Decode raw bytes as ISO-8859-1
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

/// Parse a property stream into entries, in stream order
pub fn parse(raw: &[u8]) -> Result<Vec<(String, String)>> {
    Ok(parse_numbered(raw)?
        .into_iter()
        .map(|(_, key, value)| (key, value))
        .collect())
}

/// Parse a property stream, tagging each entry with the line it starts on
pub fn parse_numbered(raw: &[u8]) -> Result<Vec<(usize, String, String)>> {
    let text = decode_latin1(raw).replace("\r\n", "\n").replace('\r', "\n");

    let mut entries = Vec::new();
    let mut logical = String::new();
    let mut start_line = 0;
    let mut continuing = false;

    for (index, natural) in text.split('\n').enumerate() {
        let line = natural.trim_start_matches(is_blank);
        if !continuing {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            start_line = index + 1;
        }

        let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            continuing = true;
            continue;
        }

        logical.push_str(line);
        continuing = false;
        entries.push(numbered(&logical, start_line)?);
        logical.clear();
    }

    if continuing {
        entries.push(numbered(&logical, start_line)?);
    }

    Ok(entries)
}

/// Parse a property stream directly into a [`PropertyBag`]
pub fn parse_bag(raw: &[u8]) -> Result<PropertyBag> {
    Ok(parse(raw)?.into_iter().collect())
}

fn numbered(logical: &str, line: usize) -> Result<(usize, String, String)> {
    let (key, value) = split_entry(logical, line)?;
    Ok((line, key, value))
}

fn split_entry(logical: &str, line: usize) -> Result<(String, String)> {
    let chars: Vec<char> = logical.chars().collect();

    let mut key_end = chars.len();
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if is_separator(c) {
            key_end = i;
            break;
        }
    }

    let mut value_start = key_end;
    let mut has_separator = false;
    while value_start < chars.len() {
        let c = chars[value_start];
        if is_blank(c) {
            value_start += 1;
        } else if !has_separator && (c == '=' || c == ':') {
            has_separator = true;
            value_start += 1;
        } else {
            break;
        }
    }

    let key: String = chars[..key_end].iter().collect();
    let value: String = chars[value_start..].iter().collect();
    Ok((unescape(&key, line)?, unescape(&value, line)?))
}

fn unescape(input: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    let mut pending_high: Option<u16> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err(Error::InvalidFormat {
                        line,
                        reason: format!("truncated \\u escape: \\u{}", hex),
                    });
                }
                let unit = u16::from_str_radix(&hex, 16).map_err(|_| Error::InvalidFormat {
                    line,
                    reason: format!("malformed \\u escape: \\u{}", hex),
                })?;
                push_utf16_unit(&mut out, &mut pending_high, unit);
            }
            other => {
                flush_surrogate(&mut out, &mut pending_high);
                out.push(match other {
                    't' => '\t',
                    'n' => '\n',
                    'r' => '\r',
                    'f' => '\x0c',
                    c => c,
                });
            }
        }
    }
    flush_surrogate(&mut out, &mut pending_high);
    Ok(out)
}

fn push_utf16_unit(out: &mut String, pending_high: &mut Option<u16>, unit: u16) {
    match (pending_high.take(), unit) {
        (Some(high), 0xDC00..=0xDFFF) => {
            let decoded = char::decode_utf16([high, unit])
                .next()
                .and_then(|r| r.ok())
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            out.push(decoded);
        }
        (previous, 0xD800..=0xDBFF) => {
            if previous.is_some() {
                out.push(char::REPLACEMENT_CHARACTER);
            }
            *pending_high = Some(unit);
        }
        (previous, unit) => {
            if previous.is_some() {
                out.push(char::REPLACEMENT_CHARACTER);
            }
            out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u16>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

fn escape(input: &str, is_key: bool, out: &mut String) {
    for (i, c) in input.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if (' '..='~').contains(&c) => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
}

/// Render entries as a property stream that [`parse`] reads back unchanged.
///
/// Non-ASCII characters are written as `\uXXXX` escapes so the output is
/// plain ASCII.
pub fn store<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>, header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        for line in header.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
    for (key, value) in entries {
        escape(key, true, &mut out);
        out.push('=');
        escape(value, false, &mut out);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_separators() {
        let raw = b"a=1\nb: 2\nc 3\nd\t=\t4\ne\n";
        let entries = parse(raw).unwrap();
        assert_eq!(
            entries,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
                ("d".to_string(), "4".to_string()),
                ("e".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let raw = b"# comment\n   ! also a comment\n\n   \nkey=value\n";
        let entries = parse(raw).unwrap();
        assert_eq!(entries, vec![("key".to_string(), "value".to_string())]);
    }

    #[test]
    fn test_attribute_key_needs_escaped_space() {
        let raw = b"Cipher.AES\\ KeySize=256\n";
        let entries = parse(raw).unwrap();
        assert_eq!(entries, vec![("Cipher.AES KeySize".to_string(), "256".to_string())]);
    }

    #[test]
    fn test_line_continuation() {
        let raw = b"MessageDigest.SHA-256=org.example.\\\n    Sha256Impl\nnext=1";
        let entries = parse(raw).unwrap();
        assert_eq!(entries[0].1, "org.example.Sha256Impl");
        assert_eq!(entries[1], ("next".to_string(), "1".to_string()));
    }

    #[test]
    fn test_numbered_entries_report_start_line() {
        let raw = b"# header\na=1\nb=x\\\n  y\n\nc=3\n";
        let lines: Vec<usize> = parse_numbered(raw).unwrap().into_iter().map(|(line, _, _)| line).collect();
        assert_eq!(lines, vec![2, 3, 6]);
    }

    #[test]
    fn test_escaped_backslash_is_not_continuation() {
        let raw = b"path=C:\\\\\nnext=1\n";
        let entries = parse(raw).unwrap();
        assert_eq!(entries[0].1, "C:\\");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_unicode_escapes() {
        let raw = b"greeting=caf\\u00E9\nemoji=\\uD83D\\uDE00\n";
        let entries = parse(raw).unwrap();
        assert_eq!(entries[0].1, "caf\u{e9}");
        assert_eq!(entries[1].1, "\u{1F600}");
    }

    #[test]
    fn test_latin1_bytes() {
        let raw = [b'k', b'=', 0xE9];
        let entries = parse(&raw).unwrap();
        assert_eq!(entries[0].1, "\u{e9}");
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let raw = b"ok=1\nbad=\\u12G4\n";
        match parse(raw) {
            Err(Error::InvalidFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_store_then_parse() {
        let entries = vec![
            ("Cipher.AES KeySize", "256"),
            ("Alg.Alias.MessageDigest.SHA", "SHA-1"),
            ("odd key=:#!", " leading space, tab\t, caf\u{e9}, \u{1F600}"),
        ];
        let text = store(entries.iter().copied(), Some("provider PQC"));
        assert!(text.starts_with("# provider PQC\n"));
        assert!(text.is_ascii());

        let parsed = parse(text.as_bytes()).unwrap();
        let expected: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(parsed, expected);
    }
}
