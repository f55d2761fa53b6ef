//! Statement text helpers: identifier quoting, placeholder lists and backend placeholder translation.

/// Backend family behind the pool. Decides placeholder syntax and limit rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Range limit clause binding `(offset, count)` in that order.
    pub fn range_limit_clause(&self) -> &'static str {
        match self {
            Dialect::Postgres => "offset ? limit ?",
            Dialect::Sqlite => "limit ?, ?",
        }
    }
}

/// Quote identifier so reserved words (e.g. `user`, `order`) are accepted as table or column names.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// `?, ?, ?` for `n` arguments.
pub fn args_string(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Rewrite universal `?` markers into the backend's native placeholders, left to right.
/// Markers inside single-quoted literals or double-quoted identifiers are left alone.
pub fn translate_placeholders(sql: &str, dialect: Dialect) -> String {
    if dialect == Dialect::Sqlite {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0u32;
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            (Some(_), c) => out.push(c),
            (None, '\'') | (None, '"') => {
                quote = Some(c);
                out.push(c);
            }
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            (None, c) => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_escapes_embedded_quotes() {
        assert_eq!(quoted("users"), "\"users\"");
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn args_string_counts() {
        assert_eq!(args_string(0), "");
        assert_eq!(args_string(3), "?, ?, ?");
    }

    #[test]
    fn postgres_placeholders_are_numbered_in_order() {
        let sql = "update \"users\" set \"name\"=?, \"email\"=? where \"id\"=?";
        assert_eq!(
            translate_placeholders(sql, Dialect::Postgres),
            "update \"users\" set \"name\"=$1, \"email\"=$2 where \"id\"=$3"
        );
    }

    #[test]
    fn quoted_question_marks_are_not_placeholders() {
        let sql = "select * from \"a?\" where note = 'why?' and id = ?";
        assert_eq!(
            translate_placeholders(sql, Dialect::Postgres),
            "select * from \"a?\" where note = 'why?' and id = $1"
        );
    }

    #[test]
    fn sqlite_keeps_question_marks() {
        let sql = "select * from t where id = ?";
        assert_eq!(translate_placeholders(sql, Dialect::Sqlite), sql);
    }

    #[test]
    fn dialect_from_url_scheme() {
        assert_eq!(Dialect::from_url("postgres://u@h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("postgresql://u@h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("mysql://h/db"), None);
    }
}
