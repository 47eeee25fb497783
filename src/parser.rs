//! The environment-definition file format.
//!
//! The format is line-based: one `KEY=VALUE` binding per line, with
//! blank lines, `#` comments, an optional `export ` prefix, single- and
//! double-quoted values, and `${NAME}` references resolved at load
//! time. A malformed line is skipped with a warning; it never aborts
//! the parse of the rest of the file.

/// One `KEY=VALUE` binding, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// Whether `${NAME}` references in the value are resolved during
    /// [`expand`]. Single-quoted values are literal and never expanded.
    pub expand: bool,
}

/// Outcome of parsing one file.
#[derive(Debug, Default)]
pub struct ParseOutput {
    /// Bindings in file order. Duplicate keys are preserved here and
    /// collapsed by [`expand`].
    pub entries: Vec<Entry>,
    /// Count of lines skipped as malformed.
    pub malformed: usize,
}

/// Parse the contents of an environment-definition file.
///
/// Accepts Unix and CRLF line endings and strips a leading UTF-8 byte
/// order mark. Blank lines and lines whose first non-whitespace
/// character is `#` are ignored. Each malformed line is counted and
/// logged by position; line contents may hold secrets and are never
/// logged.
pub fn parse(input: &str) -> ParseOutput {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut out = ParseOutput::default();
    for (idx, line) in input.lines().enumerate() {
        match parse_line(line) {
            Line::Binding(entry) => out.entries.push(entry),
            Line::Skip => {}
            Line::Malformed => {
                out.malformed += 1;
                tracing::warn!(line = idx + 1, "Skipping malformed environment file line");
            }
        }
    }
    out
}

/// Resolve `${NAME}` and `${NAME:-fallback}` references and collapse
/// duplicates into the final ordered mapping.
///
/// Lookup order for a reference: the host environment (`env`) first,
/// then bindings that appeared earlier in the same file. A reference
/// that resolves nowhere expands to its fallback, or to the empty
/// string without one. A variable set to the empty string counts as
/// resolved; the fallback applies only when the name is unset.
///
/// A duplicate key keeps its first-seen position and takes its
/// last-seen value.
pub fn expand<F>(entries: &[Entry], env: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved: Vec<(String, String)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let value = if entry.expand {
            substitute(&entry.value, |name| {
                env(name).or_else(|| {
                    resolved
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                })
            })
        } else {
            entry.value.clone()
        };

        match resolved.iter_mut().find(|(k, _)| k == &entry.key) {
            Some(slot) => slot.1 = value,
            None => resolved.push((entry.key.clone(), value)),
        }
    }
    resolved
}

enum Line {
    Binding(Entry),
    Skip,
    Malformed,
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Skip;
    }

    // `export KEY=VALUE` is the shell-compatible spelling; the prefix
    // only counts when whitespace follows it.
    let rest = match trimmed.strip_prefix("export") {
        Some(after) if after.starts_with(char::is_whitespace) => after.trim_start(),
        _ => trimmed,
    };

    let Some((raw_key, raw_value)) = rest.split_once('=') else {
        return Line::Malformed;
    };

    let key = raw_key.trim_end();
    if key.is_empty() || key.contains(char::is_whitespace) || key.contains('#') {
        return Line::Malformed;
    }

    let value = raw_value.trim_start();
    if let Some(after_quote) = value.strip_prefix('\'') {
        match parse_quoted(after_quote, '\'') {
            Some((value, rest)) if trailing_ok(rest) => Line::Binding(Entry {
                key: key.to_string(),
                value,
                expand: false,
            }),
            _ => Line::Malformed,
        }
    } else if let Some(after_quote) = value.strip_prefix('"') {
        match parse_quoted(after_quote, '"') {
            Some((value, rest)) if trailing_ok(rest) => Line::Binding(Entry {
                key: key.to_string(),
                value,
                expand: true,
            }),
            _ => Line::Malformed,
        }
    } else {
        Line::Binding(Entry {
            key: key.to_string(),
            value: strip_inline_comment(value).trim_end().to_string(),
            expand: true,
        })
    }
}

/// Decode a quoted value, starting just after the opening quote.
///
/// Returns the decoded value and the text after the closing quote, or
/// `None` when the quote is never closed. Both quote styles understand
/// `\\` and an escaped quote; double quotes additionally decode `\n`,
/// `\r`, `\t`, `\"` and `\'`. An unrecognized escape is kept verbatim.
fn parse_quoted(input: &str, quote: char) -> Option<(String, &str)> {
    let double = quote == '"';
    let mut value = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Some((value, &input[i + c.len_utf8()..]));
        }
        if c != '\\' {
            value.push(c);
            continue;
        }
        let (_, escaped) = chars.next()?;
        match escaped {
            '\\' => value.push('\\'),
            'n' if double => value.push('\n'),
            'r' if double => value.push('\r'),
            't' if double => value.push('\t'),
            '\'' | '"' if double => value.push(escaped),
            _ if escaped == quote => value.push(quote),
            _ => {
                value.push('\\');
                value.push(escaped);
            }
        }
    }
    None
}

/// Only whitespace or a comment may follow a closing quote.
fn trailing_ok(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

/// Cut an unquoted value at its inline comment, if any.
///
/// A `#` begins a comment when it is the first character of the value
/// or is preceded by whitespace; otherwise it is part of the value.
fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &value[..i];
        }
    }
    value
}

/// Replace `${NAME}` and `${NAME:-fallback}` using `lookup`.
///
/// A `$` not followed by `{` is literal, and an unclosed `${` is kept
/// as written.
fn substitute<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("${") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        match after.find('}') {
            Some(end) => {
                let reference = &after[..end];
                let (name, fallback) = match reference.split_once(":-") {
                    Some((name, fallback)) => (name, Some(fallback)),
                    None => (reference, None),
                };
                match lookup(name) {
                    Some(resolved) => out.push_str(&resolved),
                    None => out.push_str(fallback.unwrap_or("")),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[pos..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
