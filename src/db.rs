//! Store plumbing shared by the feature repositories: the tagged outcome of a
//! single-row statement and the partial-update statement builder.

use sqlx::{Encode, Postgres, QueryBuilder, Type};
use uuid::Uuid;

/// Result of a statement that touches at most one row. Callers match every
/// variant instead of bubbling raw `sqlx::Error`s.
#[derive(Debug)]
pub enum StoreOutcome<T> {
    Found(T),
    NotFound,
    Conflict { constraint: Option<String> },
    Failure(sqlx::Error),
}

impl<T> StoreOutcome<T> {
    pub fn from_result(res: Result<Option<T>, sqlx::Error>) -> Self {
        match res {
            Ok(Some(row)) => Self::Found(row),
            Ok(None) => Self::NotFound,
            Err(e) => Self::from_error(e),
        }
    }

    pub fn from_error(e: sqlx::Error) -> Self {
        let conflict = e
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.constraint().map(str::to_owned));
        match conflict {
            Some(constraint) => Self::Conflict { constraint },
            None => Self::Failure(e),
        }
    }
}

/// `UPDATE <table> SET ...` covering only the columns that were supplied.
///
/// Columns are emitted in the order `set` is called, so callers keep a fixed
/// field list and the generated SQL is deterministic. A `Some("")` value is
/// written; a `None` leaves the column alone.
pub struct PartialUpdate<'a> {
    qb: QueryBuilder<'a, Postgres>,
    columns: Vec<&'static str>,
}

impl<'a> PartialUpdate<'a> {
    pub fn new(table: &'static str) -> Self {
        Self {
            qb: QueryBuilder::new(format!("UPDATE {table} SET ")),
            columns: Vec::new(),
        }
    }

    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            if !self.columns.is_empty() {
                self.qb.push(", ");
            }
            self.qb.push(column).push(" = ").push_bind(value);
            self.columns.push(column);
        }
        self
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Appends `updated_at`, the key predicate and the `RETURNING` list.
    pub fn finish(
        mut self,
        key_column: &'static str,
        key: Uuid,
        returning: &'static str,
    ) -> QueryBuilder<'a, Postgres> {
        if !self.columns.is_empty() {
            self.qb.push(", ");
        }
        self.qb
            .push("updated_at = NOW() WHERE ")
            .push(key_column)
            .push(" = ")
            .push_bind(key)
            .push(" RETURNING ")
            .push(returning);
        self.qb
    }
}

/// `%term%` for ILIKE with the wildcard characters of `term` escaped.
/// Blank input means no filter.
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    Some(out)
}
