use regex::Regex;

/// Pulls a SQL statement out of free-form model output.
///
/// A fenced ```sql code block wins if present, otherwise the text
/// from the first `select`/`with` occurrence to the end is taken.
/// This is a best-effort heuristic over prose, not a parser, so
/// there's no guarantee the result is syntactically valid.
pub fn extract_sql(output: &str) -> String {
    let fenced = Regex::new(r"(?is)```sql(.*?)```").unwrap();
    if let Some(caps) = fenced.captures(output) {
        return cleanup(caps[1].trim());
    }

    let bare = Regex::new(r"(?is)(select|with).*").unwrap();
    match bare.find(output) {
        Some(m) => cleanup(m.as_str().trim()),
        None => String::new(),
    }
}

// Strip formatting leftovers: backticks, a single trailing semicolon,
// surrounding whitespace
fn cleanup(sql: &str) -> String {
    let sql = sql.replace('`', "");
    let sql = sql.strip_suffix(';').unwrap_or(&sql);
    sql.trim().to_string()
}
