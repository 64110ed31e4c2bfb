use super::scanner::literal_end;
use crate::models::BindStyle;

/// Rewrite `?` placeholders into the bind syntax of `style`.
///
/// Question-mark dialects get the text back unchanged. For `$N` dialects each
/// `?` outside literals and comments becomes the next `$N`, so text that
/// already uses `$N` placeholders is returned as is.
pub fn rebind(style: BindStyle, sql: &str) -> String {
    if style == BindStyle::Question {
        return sql.to_string();
    }

    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut copied = 0;
    let mut n = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = literal_end(sql, i) {
            i = end;
            continue;
        }
        if bytes[i] == b'?' {
            out.push_str(&sql[copied..i]);
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
            copied = i + 1;
        }
        i += 1;
    }
    out.push_str(&sql[copied..]);
    out
}
