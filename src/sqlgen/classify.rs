use std::fmt;

/// Coarse classification of a SQL statement by its leading keyword.
///
/// Only the start of the lowercased, trimmed statement is inspected.
/// Semicolon-chained statements or data-modifying sub-clauses hiding
/// inside a nominally read statement are not detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    With,
    Insert,
    Update,
    Delete,
    Unknown,
}

impl QueryKind {
    pub fn classify(sql: &str) -> Self {
        let sql = sql.trim().to_lowercase();
        let kinds = [
            ("select", QueryKind::Select),
            ("with", QueryKind::With),
            ("insert", QueryKind::Insert),
            ("update", QueryKind::Update),
            ("delete", QueryKind::Delete),
        ];
        for (keyword, kind) in kinds {
            if sql.starts_with(keyword) {
                return kind;
            }
        }
        QueryKind::Unknown
    }

    /// Read statements are the only kind ever executed
    pub fn is_read(&self) -> bool {
        matches!(self, QueryKind::Select | QueryKind::With)
    }

    pub fn is_write(&self) -> bool {
        matches!(self, QueryKind::Insert | QueryKind::Update | QueryKind::Delete)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Select => "select",
            QueryKind::With => "with",
            QueryKind::Insert => "insert",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
            QueryKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}
