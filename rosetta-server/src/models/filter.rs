//! Listing filters
//!
//! A [`Filter`] is a sparse set of column constraints plus keyset cursor
//! state. Absent columns are unconstrained. Column names are checked
//! against the entity's [`TableSchema`] before any SQL is composed, so only
//! schema-declared identifiers ever reach a query string.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::schema::TableSchema;
use crate::db::value::{ColumnType, SqlValue};

/// Default page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 1;

/// Largest page a single listing may return
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Why a filter was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("{resource} cannot be filtered by '{column}'")]
    UnknownColumn {
        resource: &'static str,
        column: String,
    },

    #[error("'{column}' expects a {expected} value, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("range on '{column}' has neither a lower nor an upper bound")]
    EmptyRange { column: String },

    #[error("range on '{column}' has its lower bound after its upper bound")]
    InvertedRange { column: String },

    #[error("page_size must be between 1 and {max}, got {size}")]
    PageSize { size: u32, max: u32 },

    #[error("cannot order by '{field}'")]
    UnsortableField { field: String },

    #[error("malformed query: {0}")]
    Malformed(String),
}

/// Constraint on one column
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Equality; a null value matches `IS NULL`
    Eq(SqlValue),
    /// Inclusive range, either end optional
    Range {
        from: Option<SqlValue>,
        to: Option<SqlValue>,
    },
}

/// Query parameters for a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    constraints: BTreeMap<String, Constraint>,
    /// Sort fields, `-` prefix for descending
    pub order_by: Vec<String>,
    /// Extra restriction on sortable fields; empty means the schema's list
    pub order_by_safelist: Vec<String>,
    /// Keyset cursor, nil starts from the beginning
    pub last_seen: Uuid,
    pub page_size: u32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            constraints: BTreeMap::new(),
            order_by: Vec::new(),
            order_by_safelist: Vec::new(),
            last_seen: Uuid::nil(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `column` to equal `value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.constraints
            .insert(column.into(), Constraint::Eq(value.into()));
        self
    }

    /// Constrain `column` to the inclusive range `from..=to`.
    pub fn range(
        mut self,
        column: impl Into<String>,
        from: Option<SqlValue>,
        to: Option<SqlValue>,
    ) -> Self {
        self.constraints
            .insert(column.into(), Constraint::Range { from, to });
        self
    }

    pub fn order_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn safelist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by_safelist = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Continue after `cursor` (the previous page's `last_seen`).
    pub fn after(mut self, cursor: Uuid) -> Self {
        self.last_seen = cursor;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.constraints.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Check every constraint and sort field against `schema`.
    pub fn validate(&self, schema: &TableSchema) -> Result<(), FilterError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(FilterError::PageSize {
                size: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        for (column, constraint) in &self.constraints {
            let declared = schema
                .column(column)
                .ok_or_else(|| FilterError::UnknownColumn {
                    resource: schema.resource,
                    column: column.clone(),
                })?;

            match constraint {
                Constraint::Eq(value) => check_type(column, declared.ty, value)?,
                Constraint::Range { from, to } => {
                    if from.is_none() && to.is_none() {
                        return Err(FilterError::EmptyRange {
                            column: column.clone(),
                        });
                    }
                    for bound in [from, to].into_iter().flatten() {
                        check_type(column, declared.ty, bound)?;
                    }
                    if let (Some(from), Some(to)) = (from, to) {
                        if from > to {
                            return Err(FilterError::InvertedRange {
                                column: column.clone(),
                            });
                        }
                    }
                }
            }
        }

        order_by_clause(&self.order_by, &self.safelist_for(schema)).map(|_| ())
    }

    /// Sortable columns of `schema`, narrowed by `order_by_safelist` when set.
    pub fn safelist_for(&self, schema: &TableSchema) -> Vec<&'static str> {
        schema
            .sortable
            .iter()
            .copied()
            .filter(|f| {
                self.order_by_safelist.is_empty()
                    || self.order_by_safelist.iter().any(|s| s.as_str() == *f)
            })
            .collect()
    }

    /// ORDER BY clause for this filter against `schema`.
    pub fn order_by_clause(&self, schema: &TableSchema) -> Result<String, FilterError> {
        order_by_clause(&self.order_by, &self.safelist_for(schema))
    }
}

fn check_type(column: &str, expected: ColumnType, value: &SqlValue) -> Result<(), FilterError> {
    let found = value.column_type();
    if found != expected {
        return Err(FilterError::TypeMismatch {
            column: column.to_owned(),
            expected: expected.as_str(),
            found: found.as_str(),
        });
    }
    Ok(())
}

fn parse_order_by<'a>(
    order_by: &'a [String],
    safelist: &[&str],
) -> Result<Vec<(&'a str, bool)>, FilterError> {
    order_by
        .iter()
        .map(|raw| {
            let field = raw.trim();
            let (name, descending) = match field.strip_prefix('-') {
                Some(name) => (name, true),
                None => (field, false),
            };
            if name.is_empty() || !safelist.contains(&name) {
                return Err(FilterError::UnsortableField {
                    field: raw.clone(),
                });
            }
            Ok((name, descending))
        })
        .collect()
}

/// Build the ORDER BY clause for `order_by`.
///
/// Empty input orders by `id`. Otherwise every field is emitted in order and
/// `id ASC` is appended as the tie-break. Fields outside `safelist` fail.
pub fn order_by_clause(order_by: &[String], safelist: &[&str]) -> Result<String, FilterError> {
    let fields = parse_order_by(order_by, safelist)?;
    if fields.is_empty() {
        return Ok("ORDER BY id".to_owned());
    }

    let mut parts: Vec<String> = fields
        .into_iter()
        .map(|(name, descending)| {
            format!("{} {}", name, if descending { "DESC" } else { "ASC" })
        })
        .collect();
    parts.push("id ASC".to_owned());
    Ok(format!("ORDER BY {}", parts.join(", ")))
}

/// Query-string form of a [`Filter`]
///
/// `*_from`/`*_to` pairs become one range constraint per column and
/// `order_by` is a comma separated list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub thread_id: Option<Uuid>,
    pub forum_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub reply_to: Option<Uuid>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub created_at_from: Option<DateTime<Utc>>,
    pub created_at_to: Option<DateTime<Utc>>,
    pub updated_at_from: Option<DateTime<Utc>>,
    pub updated_at_to: Option<DateTime<Utc>>,
    pub deleted_at_from: Option<DateTime<Utc>>,
    pub deleted_at_to: Option<DateTime<Utc>>,
    pub deleted: Option<bool>,
    pub is_locked: Option<bool>,
    pub order_by: Option<String>,
    pub last_seen: Option<Uuid>,
    pub page_size: Option<u32>,
    /// Include related rows in each listed entity; not a filter
    pub include: Option<bool>,
}

impl From<FilterParams> for Filter {
    fn from(p: FilterParams) -> Self {
        let mut filter = Filter::new();

        let uuids = [
            ("id", p.id),
            ("owner_id", p.owner_id),
            ("user_id", p.user_id),
            ("post_id", p.post_id),
            ("thread_id", p.thread_id),
            ("forum_id", p.forum_id),
            ("author_id", p.author_id),
            ("reply_to", p.reply_to),
        ];
        for (column, value) in uuids {
            if let Some(v) = value {
                filter = filter.eq(column, v);
            }
        }

        let texts = [
            ("name", p.name),
            ("title", p.title),
            ("username", p.username),
            ("email", p.email),
        ];
        for (column, value) in texts {
            if let Some(v) = value {
                filter = filter.eq(column, v);
            }
        }

        let flags = [("deleted", p.deleted), ("is_locked", p.is_locked)];
        for (column, value) in flags {
            if let Some(v) = value {
                filter = filter.eq(column, v);
            }
        }

        let ranges = [
            ("created_at", p.created_at_from, p.created_at_to),
            ("updated_at", p.updated_at_from, p.updated_at_to),
            ("deleted_at", p.deleted_at_from, p.deleted_at_to),
        ];
        for (column, from, to) in ranges {
            if from.is_some() || to.is_some() {
                filter = filter.range(column, from.map(Into::into), to.map(Into::into));
            }
        }

        if let Some(order_by) = p.order_by {
            filter = filter.order_by(
                order_by
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty()),
            );
        }

        filter
            .after(p.last_seen.unwrap_or_else(Uuid::nil))
            .page_size(p.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::Column;
    use chrono::Duration;

    const WIDGETS: TableSchema = TableSchema {
        table: "forum.widgets",
        alias: "widgets",
        resource: "widget",
        select: "id, name, created_at",
        filterable: &[
            Column::new("id", ColumnType::Uuid),
            Column::new("name", ColumnType::Text),
            Column::new("created_at", ColumnType::Timestamp),
        ],
        sortable: &["id", "name", "created_at"],
    };

    fn fields(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let f = Filter::new();
        assert_eq!(f.last_seen, Uuid::nil());
        assert_eq!(f.page_size, 1);
        assert!(f.is_unconstrained());
        assert!(f.validate(&WIDGETS).is_ok());
    }

    #[test]
    fn order_by_defaults_to_id() {
        assert_eq!(order_by_clause(&[], &["name"]).unwrap(), "ORDER BY id");
    }

    #[test]
    fn order_by_appends_id_tiebreak() {
        let clause = order_by_clause(&fields(&["-created_at", "name"]), &["name", "created_at"])
            .unwrap();
        assert_eq!(clause, "ORDER BY created_at DESC, name ASC, id ASC");
    }

    #[test]
    fn order_by_rejects_unlisted_field() {
        let err = order_by_clause(&fields(&["name; DROP TABLE x"]), &["name"]).unwrap_err();
        assert!(matches!(err, FilterError::UnsortableField { .. }));

        let err = order_by_clause(&fields(&["-"]), &["name"]).unwrap_err();
        assert!(matches!(err, FilterError::UnsortableField { .. }));
    }

    #[test]
    fn caller_safelist_narrows_schema_safelist() {
        let f = Filter::new().order_by(["name"]).safelist(["created_at"]);
        assert!(matches!(
            f.validate(&WIDGETS),
            Err(FilterError::UnsortableField { .. })
        ));

        let f = Filter::new().order_by(["-created_at"]).safelist(["created_at"]);
        assert_eq!(f.safelist_for(&WIDGETS), vec!["created_at"]);
        assert_eq!(
            f.order_by_clause(&WIDGETS).unwrap(),
            "ORDER BY created_at DESC, id ASC"
        );
    }

    #[test]
    fn caller_safelist_cannot_widen_schema() {
        let f = Filter::new().order_by(["email"]).safelist(["email"]);
        assert!(f.validate(&WIDGETS).is_err());
    }

    #[test]
    fn unknown_column_rejected() {
        let err = Filter::new().eq("title", "x").validate(&WIDGETS).unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownColumn {
                resource: "widget",
                column: "title".into()
            }
        );
    }

    #[test]
    fn mistyped_value_rejected() {
        let err = Filter::new().eq("id", "not-a-uuid").validate(&WIDGETS).unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch { .. }));
    }

    #[test]
    fn ranges_validated() {
        let now = Utc::now();
        let earlier = now - Duration::days(1);

        let ok = Filter::new().range("created_at", Some(earlier.into()), Some(now.into()));
        assert!(ok.validate(&WIDGETS).is_ok());

        let open = Filter::new().range("created_at", None, Some(now.into()));
        assert!(open.validate(&WIDGETS).is_ok());

        let inverted = Filter::new().range("created_at", Some(now.into()), Some(earlier.into()));
        assert!(matches!(
            inverted.validate(&WIDGETS),
            Err(FilterError::InvertedRange { .. })
        ));

        let empty = Filter::new().range("created_at", None, None);
        assert!(matches!(
            empty.validate(&WIDGETS),
            Err(FilterError::EmptyRange { .. })
        ));
    }

    #[test]
    fn page_size_bounds() {
        assert!(Filter::new().page_size(0).validate(&WIDGETS).is_err());
        assert!(Filter::new().page_size(MAX_PAGE_SIZE).validate(&WIDGETS).is_ok());
        assert!(Filter::new()
            .page_size(MAX_PAGE_SIZE + 1)
            .validate(&WIDGETS)
            .is_err());
    }

    #[test]
    fn params_convert_to_filter() {
        let cursor = Uuid::now_v7();
        let now = Utc::now();
        let params = FilterParams {
            name: Some("general".into()),
            deleted: Some(false),
            created_at_to: Some(now),
            order_by: Some("-created_at, name,".into()),
            last_seen: Some(cursor),
            page_size: Some(25),
            ..Default::default()
        };

        let filter = Filter::from(params);
        let constraints: Vec<_> = filter.constraints().collect();
        assert_eq!(constraints.len(), 3);
        assert!(constraints.contains(&(
            "created_at",
            &Constraint::Range {
                from: None,
                to: Some(now.into())
            }
        )));
        assert!(constraints.contains(&("deleted", &Constraint::Eq(false.into()))));
        assert_eq!(filter.order_by, fields(&["-created_at", "name"]));
        assert_eq!(filter.last_seen, cursor);
        assert_eq!(filter.page_size, 25);
    }

    #[test]
    fn empty_params_match_default_filter() {
        assert_eq!(Filter::from(FilterParams::default()), Filter::new());
    }
}
