//! Content lines: unfolding and `NAME;PARAM=VALUE:value` splitting.

/// Join folded continuation lines into logical lines.
///
/// Accepts `\r\n`, `\n` and bare `\r` endings. A line starting with a space
/// or tab continues the previous one; that single whitespace is dropped.
pub fn unfold(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();

    for raw in normalized.split('\n') {
        if let Some(rest) = raw.strip_prefix([' ', '\t']) {
            if let Some(previous) = lines.last_mut() {
                previous.push_str(rest);
                continue;
            }
        }
        lines.push(raw.to_string());
    }

    lines
}

/// One logical `NAME[;PARAM=VALUE...]:value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine<'a> {
    /// Upper-cased property name
    pub name: String,
    /// Upper-cased parameter names with unquoted values
    pub params: Vec<(String, String)>,
    /// Raw value, not yet trimmed or unescaped
    pub value: &'a str,
}

impl<'a> ContentLine<'a> {
    /// Split a logical line. Returns `None` when there is no name/value separator.
    pub fn parse(line: &'a str) -> Option<Self> {
        let colon = find_unquoted(line, ':')?;
        let head = &line[..colon];
        let value = &line[colon + 1..];

        let mut parts = split_unquoted(head, ';').into_iter();
        let name = parts.next()?.trim().to_ascii_uppercase();
        if name.is_empty() {
            return None;
        }

        let params = parts
            .filter_map(|part| {
                let (key, val) = part.split_once('=')?;
                Some((
                    key.trim().to_ascii_uppercase(),
                    val.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();

        Some(ContentLine {
            name,
            params,
            value,
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == needle && !in_quotes {
            return Some(i);
        }
    }
    None
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unquoted(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}
