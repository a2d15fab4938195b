//! Assembles parameterized SQL statements from text fragments and positional parameters.
//!
//! Every parameter is written into the text as a Postgres placeholder (`$1`, `$2`, ...) at the
//! moment it is pushed, numbered by how many parameters came before it. So the Nth placeholder in
//! the finished text always binds the Nth parameter.
//!
//! WHERE predicates are built separately, as a [`WhereClause`] of unrendered [`Condition`]s, so the
//! same predicate can be spliced into several statements (e.g. a page and its count) and be
//! numbered correctly in each.

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Integer(i32),
    BigInt(i64),
    Text(String),
    IntegerArray(Vec<i32>),
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<i32>> for SqlParam {
    fn from(v: Vec<i32>) -> Self {
        Self::IntegerArray(v)
    }
}

/// A statement under construction.
#[derive(Debug, Default, Clone)]
pub struct Query {
    sql: String,
    fragments: Vec<String>,
    params: Vec<SqlParam>,
}

impl Query {
    pub fn new(base: &str) -> Self {
        let mut query = Self::default();
        query.push_sql(base);
        query
    }

    /// Append raw SQL text.
    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self.fragments.push(sql.to_owned());
        self
    }

    /// Append a placeholder for `param`.
    pub fn push_param(&mut self, param: impl Into<SqlParam>) -> &mut Self {
        self.params.push(param.into());
        let placeholder = format!("${}", self.params.len());
        self.sql.push_str(&placeholder);
        self.fragments.push(placeholder);
        self
    }

    /// Append ` WHERE a AND b ...`, or nothing at all if the clause has no conditions.
    pub fn push_where(&mut self, clause: &WhereClause) -> &mut Self {
        for (i, condition) in clause.conditions.iter().enumerate() {
            self.push_sql(if i == 0 { " WHERE " } else { " AND " });
            for part in &condition.parts {
                match part {
                    Part::Sql(sql) => self.push_sql(sql),
                    Part::Param(param) => self.push_param(param.clone()),
                };
            }
        }
        self
    }

    /// Append ` LIMIT $n OFFSET $m`. These are always the last two parameters of a page.
    pub fn push_page(&mut self, page: Page) -> &mut Self {
        self.push_sql(" LIMIT ")
            .push_param(page.limit)
            .push_sql(" OFFSET ")
            .push_param(page.offset)
    }

    pub fn build(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            fragments: self.fragments,
            params: self.params,
        }
    }
}

/// SQL text paired with the values for its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    /// Every piece of text that was appended, placeholders included, in order. For logging.
    pub fragments: Vec<String>,
    pub params: Vec<SqlParam>,
}

/// LIMIT/OFFSET of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum Part {
    Sql(String),
    Param(SqlParam),
}

/// One predicate of a WHERE clause. Its parameters are numbered only when it's pushed into a
/// [`Query`].
#[derive(Debug, Clone)]
pub struct Condition {
    parts: Vec<Part>,
}

impl Condition {
    pub fn new(sql: &str) -> Self {
        Self {
            parts: vec![Part::Sql(sql.to_owned())],
        }
    }

    pub fn sql(mut self, sql: &str) -> Self {
        self.parts.push(Part::Sql(sql.to_owned()));
        self
    }

    pub fn param(mut self, param: impl Into<SqlParam>) -> Self {
        self.parts.push(Part::Param(param.into()));
        self
    }
}

/// Conditions joined with AND.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    pub fn and(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }
}

/// Wrap user input for a substring LIKE match, escaping LIKE's own wildcards.
pub fn like_substring(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every `$n` in the text, in order of appearance.
    pub(crate) fn placeholders(sql: &str) -> Vec<usize> {
        let mut found = Vec::new();
        let mut chars = sql.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != '$' {
                continue;
            }
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            if let Ok(n) = digits.parse() {
                found.push(n);
            }
        }
        found
    }

    #[test]
    fn test_placeholders_are_sequential() {
        let mut q = Query::new("SELECT * FROM t WHERE a = ");
        q.push_param(1).push_sql(" AND b = ").push_param("x");
        q.push_page(Page { limit: 5, offset: 0 });
        let built = q.build();
        assert_eq!(
            built.sql,
            "SELECT * FROM t WHERE a = $1 AND b = $2 LIMIT $3 OFFSET $4"
        );
        assert_eq!(placeholders(&built.sql), vec![1, 2, 3, 4]);
        assert_eq!(
            built.params,
            vec![
                SqlParam::Integer(1),
                SqlParam::Text("x".to_owned()),
                SqlParam::BigInt(5),
                SqlParam::BigInt(0),
            ]
        );
    }

    #[test]
    fn test_fragments_record_each_append() {
        let mut q = Query::new("SELECT 1");
        q.push_sql(" WHERE x = ").push_param(3);
        let built = q.build();
        assert_eq!(built.fragments, vec!["SELECT 1", " WHERE x = ", "$1"]);
        assert_eq!(built.fragments.concat(), built.sql);
    }

    #[test]
    fn test_empty_where_clause_adds_nothing() {
        let mut q = Query::new("SELECT * FROM posts p");
        q.push_where(&WhereClause::default());
        let built = q.build();
        assert_eq!(built.sql, "SELECT * FROM posts p");
        assert!(built.params.is_empty());
    }

    #[test]
    fn test_single_condition_has_no_leading_and() {
        let mut clause = WhereClause::default();
        clause.and(Condition::new("p.html LIKE ").param("%hi%"));
        let mut q = Query::new("SELECT * FROM posts p");
        q.push_where(&clause);
        assert_eq!(q.build().sql, "SELECT * FROM posts p WHERE p.html LIKE $1");
    }

    #[test]
    fn test_where_clause_numbers_params_per_statement() {
        let mut clause = WhereClause::default();
        clause
            .and(Condition::new("a = ").param(1))
            .and(Condition::new("(b = ").param(2).sql(" OR c = ").param(3).sql(")"));

        let mut first = Query::new("SELECT x FROM t");
        first.push_where(&clause);
        let mut second = Query::new("SELECT y FROM t WHERE z = ");
        second.push_param(0).push_sql(" AND EXISTS (SELECT 1 FROM t");
        second.push_where(&clause).push_sql(")");

        assert_eq!(
            first.build().sql,
            "SELECT x FROM t WHERE a = $1 AND (b = $2 OR c = $3)"
        );
        let second = second.build();
        assert_eq!(placeholders(&second.sql), vec![1, 2, 3, 4]);
        assert_eq!(second.params.len(), 4);
        assert_eq!(second.params[3], SqlParam::Integer(3));
    }

    #[test]
    fn test_like_substring_escapes_wildcards() {
        assert_eq!(like_substring("hi"), "%hi%");
        assert_eq!(like_substring("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
