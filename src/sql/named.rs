use super::scanner::literal_end;
use crate::error::{DbError, DbResult};
use crate::models::{BindStyle, QueryParam};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A named query rewritten to positional placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledNamed {
    pub sql: String,
    /// Parameter names in placeholder order; repeated names appear each time.
    pub names: Vec<String>,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Rewrite `:name` placeholders into positional ones for `style`.
///
/// `::` (a PostgreSQL cast) and `:=` are copied through, as is a colon not
/// followed by a name character. Literals and comments are never scanned.
pub fn compile_named(style: BindStyle, sql: &str) -> CompiledNamed {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = literal_end(sql, i) {
            i = end;
            continue;
        }
        if bytes[i] != b':' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b':') {
            i += 2;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && is_name_byte(bytes[end]) {
            end += 1;
        }
        // a trailing '.' ends the sentence, not the name
        while end > start && bytes[end - 1] == b'.' {
            end -= 1;
        }
        if end == start {
            i += 1;
            continue;
        }

        out.push_str(&sql[copied..i]);
        names.push(sql[start..end].to_string());
        match style {
            BindStyle::Question => out.push('?'),
            BindStyle::Dollar => {
                out.push('$');
                out.push_str(&names.len().to_string());
            }
        }
        copied = end;
        i = end;
    }
    out.push_str(&sql[copied..]);

    CompiledNamed { sql: out, names }
}

/// Resolve `names` against a serializable struct or map.
///
/// Dotted names descend into nested objects. Lookup is exact first, then
/// ASCII case-insensitive.
pub fn bind_named<A: Serialize + ?Sized>(names: &[String], arg: &A) -> DbResult<Vec<QueryParam>> {
    let value = serde_json::to_value(arg)?;
    let JsonValue::Object(_) = value else {
        return Err(DbError::mapping(
            "named arguments must serialize to a struct or map",
        ));
    };

    names
        .iter()
        .map(|name| {
            lookup(&value, name)
                .cloned()
                .map(QueryParam::from_json)
                .ok_or_else(|| {
                    DbError::mapping(format!("could not find name {} in named argument", name))
                })
        })
        .collect()
}

fn lookup<'v>(value: &'v JsonValue, path: &str) -> Option<&'v JsonValue> {
    path.split('.').try_fold(value, |current, key| {
        let map = current.as_object()?;
        map.get(key).or_else(|| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    })
}
