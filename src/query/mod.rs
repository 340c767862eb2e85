use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("cannot order by '{0}'; allowed fields: name, birth_year")]
    UnknownOrderingField(String),
}

/// Query-string parameters accepted by the cat list endpoint: exact-match
/// filters on color and birth_year, a substring search over cat name,
/// owner username and achievement names, and a comma-separated ordering
/// list with `-` for descending (default: birth_year ascending).
#[derive(Debug, Default, Clone)]
pub struct CatQuery {
    pub color: Option<String>,
    pub birth_year: Option<i32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// WHERE/ORDER BY fragments with positional `$n` params, ready to splice
/// into the cat list SELECT. Conditions reference the aliases used there:
/// `c` for cats, `u` for the joined owner.
#[derive(Debug, Clone)]
pub struct SqlParts {
    pub where_clause: String,
    pub order_by: String,
    pub params: Vec<Value>,
}

impl CatQuery {
    pub fn to_sql(&self) -> Result<SqlParts, QueryError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(color) = &self.color {
            params.push(json!(color));
            conditions.push(format!("c.color = ${}", params.len()));
        }

        if let Some(year) = self.birth_year {
            params.push(json!(year));
            conditions.push(format!("c.birth_year = ${}", params.len()));
        }

        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            params.push(json!(pattern));
            let n = params.len();
            conditions.push(format!(
                "(c.name ILIKE ${n} OR u.username ILIKE ${n} OR EXISTS (\
                 SELECT 1 FROM cat_achievements ca \
                 JOIN achievements a ON a.id = ca.achievement_id \
                 WHERE ca.cat_id = c.id AND a.name ILIKE ${n}))",
                n = n
            ));
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let order_by = order_by_sql(self.ordering.as_deref())?;

        Ok(SqlParts { where_clause, order_by, params })
    }
}

/// Whitelisted ordering columns only; anything else is a client error, not
/// a string passed into SQL.
fn order_by_sql(ordering: Option<&str>) -> Result<String, QueryError> {
    let fields = ordering.unwrap_or("birth_year");
    let mut parts: Vec<String> = Vec::new();

    for token in fields.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (column, direction) = match token.strip_prefix('-') {
            Some(column) => (column, "DESC"),
            None => (token, "ASC"),
        };
        let column_sql = match column {
            "name" => "c.name",
            "birth_year" => "c.birth_year",
            other => return Err(QueryError::UnknownOrderingField(other.to_string())),
        };
        parts.push(format!("{} {}", column_sql, direction));
    }

    if parts.is_empty() {
        parts.push("c.birth_year ASC".to_string());
    }

    Ok(parts.join(", "))
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
