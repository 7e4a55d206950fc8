//! SQL composition for the repository engine
//!
//! Builders here never touch a connection so the generated SQL can be
//! checked in unit tests. Identifiers come from [`TableSchema`] constants and
//! validated filters; every value goes through `push_bind`.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::schema::{from_clause, TableSchema, VoteSchema};
use super::value::SqlValue;
use crate::models::{Constraint, Filter, FilterError};

pub(crate) type Query = QueryBuilder<'static, Postgres>;

/// `SELECT .. WHERE id = $1`
pub(crate) fn select_by_id(schema: &TableSchema, id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "SELECT {} WHERE {}.id = ",
        from_clause(schema),
        schema.alias
    ));
    qb.push_bind(id);
    qb
}

/// One look-ahead page: `page_size + 1` rows after `filter.last_seen`.
pub(crate) fn select_page(schema: &TableSchema, filter: &Filter) -> Result<Query, FilterError> {
    let order_by = filter.order_by_clause(schema)?;

    let mut qb = Query::new(format!(
        "SELECT {} WHERE {}.id > ",
        from_clause(schema),
        schema.alias
    ));
    qb.push_bind(filter.last_seen);
    push_predicates(&mut qb, schema, filter);
    qb.push(" ");
    qb.push(order_by);
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(filter.page_size) + 1);
    Ok(qb)
}

/// `COUNT(*)` over the filter's predicates, ignoring cursor and page size.
pub(crate) fn count(schema: &TableSchema, filter: &Filter) -> Query {
    let mut qb = Query::new(format!(
        "SELECT COUNT(*) FROM {} AS {} WHERE TRUE",
        schema.table, schema.alias
    ));
    push_predicates(&mut qb, schema, filter);
    qb
}

fn push_predicates(qb: &mut Query, schema: &TableSchema, filter: &Filter) {
    for (column, constraint) in filter.constraints() {
        match constraint {
            Constraint::Eq(value) if value.is_null() => {
                qb.push(format!(" AND {}.{} IS NULL", schema.alias, column));
            }
            Constraint::Eq(value) => {
                qb.push(format!(" AND {}.{} = ", schema.alias, column));
                value.push_bind(qb);
            }
            Constraint::Range { from, to } => {
                if let Some(from) = from {
                    qb.push(format!(" AND {}.{} >= ", schema.alias, column));
                    from.push_bind(qb);
                }
                if let Some(to) = to {
                    qb.push(format!(" AND {}.{} <= ", schema.alias, column));
                    to.push_bind(qb);
                }
            }
        }
    }
}

/// `INSERT .. RETURNING` with a caller-generated id.
pub(crate) fn insert(
    schema: &TableSchema,
    id: Uuid,
    values: &[(&'static str, SqlValue)],
) -> Query {
    let mut qb = Query::new(format!("INSERT INTO {} AS {} (id", schema.table, schema.alias));
    for (column, _) in values {
        qb.push(", ");
        qb.push(*column);
    }
    qb.push(") VALUES (");
    qb.push_bind(id);
    for (_, value) in values {
        qb.push(", ");
        value.push_bind(&mut qb);
    }
    qb.push(") RETURNING ");
    qb.push(schema.select);
    qb
}

/// Assign only the supplied columns; `updated_at` is always refreshed.
pub(crate) fn update(
    schema: &TableSchema,
    id: Uuid,
    assignments: &[(&'static str, SqlValue)],
) -> Query {
    let mut qb = Query::new(format!("UPDATE {} AS {} SET ", schema.table, schema.alias));
    for (column, value) in assignments {
        qb.push(*column);
        qb.push(" = ");
        value.push_bind(&mut qb);
        qb.push(", ");
    }
    qb.push("updated_at = NOW()");
    push_returning_by_id(&mut qb, schema, id);
    qb
}

pub(crate) fn soft_delete(schema: &TableSchema, id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "UPDATE {} AS {} SET deleted = TRUE, deleted_at = NOW(), updated_at = NOW()",
        schema.table, schema.alias
    ));
    push_returning_by_id(&mut qb, schema, id);
    qb
}

pub(crate) fn restore(schema: &TableSchema, id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "UPDATE {} AS {} SET deleted = FALSE, deleted_at = NULL, updated_at = NOW()",
        schema.table, schema.alias
    ));
    push_returning_by_id(&mut qb, schema, id);
    qb
}

pub(crate) fn hard_delete(schema: &TableSchema, id: Uuid) -> Query {
    let mut qb = Query::new(format!("DELETE FROM {} AS {}", schema.table, schema.alias));
    push_returning_by_id(&mut qb, schema, id);
    qb
}

fn push_returning_by_id(qb: &mut Query, schema: &TableSchema, id: Uuid) {
    qb.push(format!(" WHERE {}.id = ", schema.alias));
    qb.push_bind(id);
    qb.push(" RETURNING ");
    qb.push(schema.select);
}

/// Upsert a vote, or delete it when the value is zero, in one statement.
///
/// Returns the stored row, or no row when the vote was removed.
pub(crate) fn cast_vote(schema: &VoteSchema, target_id: Uuid, user_id: Uuid, vote: i16) -> Query {
    let mut qb = Query::new("WITH input_data AS (SELECT ");
    qb.push_bind(target_id);
    qb.push("::UUID AS target_id, ");
    qb.push_bind(user_id);
    qb.push("::UUID AS user_id, ");
    qb.push_bind(vote);
    qb.push("::SMALLINT AS vote), ");
    qb.push(format!(
        "delete_if_zero AS (\
         DELETE FROM {table} \
         WHERE {target} = (SELECT target_id FROM input_data) \
         AND user_id = (SELECT user_id FROM input_data) \
         AND (SELECT vote FROM input_data) = 0) \
         INSERT INTO {table} ({target}, user_id, vote) \
         SELECT target_id, user_id, vote FROM input_data WHERE vote <> 0 \
         ON CONFLICT ({target}, user_id) DO UPDATE SET vote = EXCLUDED.vote \
         RETURNING {target}, user_id, vote",
        table = schema.table,
        target = schema.target_column,
    ));
    qb
}

/// Sum of all votes on a target, 0 when there are none.
pub(crate) fn sum_votes(schema: &VoteSchema, target_id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "SELECT COALESCE(SUM(vote), 0)::BIGINT FROM {} WHERE {} = ",
        schema.table, schema.target_column
    ));
    qb.push_bind(target_id);
    qb
}

pub(crate) fn count_votes(schema: &VoteSchema, target_id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ",
        schema.table, schema.target_column
    ));
    qb.push_bind(target_id);
    qb
}

/// Score and vote count from one snapshot.
pub(crate) fn vote_summary(schema: &VoteSchema, target_id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "SELECT COALESCE(SUM(vote), 0)::BIGINT, COUNT(*) FROM {} WHERE {} = ",
        schema.table, schema.target_column
    ));
    qb.push_bind(target_id);
    qb
}

pub(crate) fn get_vote(schema: &VoteSchema, target_id: Uuid, user_id: Uuid) -> Query {
    let mut qb = Query::new(format!(
        "SELECT {target}, user_id, vote FROM {table} WHERE {target} = ",
        table = schema.table,
        target = schema.target_column,
    ));
    qb.push_bind(target_id);
    qb.push(" AND user_id = ");
    qb.push_bind(user_id);
    qb
}
