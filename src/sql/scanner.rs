//! Recognition of SQL regions that placeholder rewriting must not touch.
//!
//! Placeholders are only rewritten outside quoted strings, quoted identifiers,
//! comments and PostgreSQL dollar-quoted bodies. All delimiters are ASCII, so
//! byte offsets returned here always fall on UTF-8 boundaries.

/// If a literal, quoted identifier or comment starts at byte `i`, return the
/// offset one past its end. Unterminated regions run to the end of `sql`.
pub(crate) fn literal_end(sql: &str, i: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    match bytes[i] {
        b'\'' => Some(quoted_end(bytes, i, b'\'')),
        b'"' => Some(quoted_end(bytes, i, b'"')),
        b'`' => Some(quoted_end(bytes, i, b'`')),
        b'-' if bytes.get(i + 1) == Some(&b'-') => Some(
            bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p + 1),
        ),
        b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
            find(&bytes[i + 2..], b"*/").map_or(bytes.len(), |p| i + 2 + p + 2),
        ),
        b'$' => dollar_quote_end(bytes, i),
        _ => None,
    }
}

/// End of a region opened by `quote`; a doubled quote is an escaped quote.
fn quoted_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// `$$ ... $$` or `$tag$ ... $tag$`. `$1` is a placeholder, not a tag.
fn dollar_quote_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
        if j == start + 1 && bytes[j].is_ascii_digit() {
            return None;
        }
        j += 1;
    }
    if bytes.get(j) != Some(&b'$') {
        return None;
    }
    let tag = &bytes[start..=j];
    let body = j + 1;
    Some(find(&bytes[body..], tag).map_or(bytes.len(), |p| body + p + tag.len()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
