//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resource model.
//! Rows come back as a single `jsonb` column so callers never need the record shape;
//! write values go through `jsonb_populate_record` so PostgreSQL coerces them to column types.

use crate::config::ResourceModel;

const ROW_ALIAS: &str = "r";
const PARAM_ALIAS: &str = "p";

/// Quote identifier for PostgreSQL (safe: only from descriptors and validated names).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(model: &ResourceModel) -> String {
    match &model.schema_name {
        Some(schema) => format!("{}.{}", quoted(schema), quoted(&model.table_name)),
        None => quoted(&model.table_name),
    }
}

/// `(SELECT p."col" FROM jsonb_populate_record(NULL::table, $n) p)` style column list.
fn populated_columns(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{}.{}", PARAM_ALIAS, quoted(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn populate_record(model: &ResourceModel, param: u32) -> String {
    format!(
        "jsonb_populate_record(NULL::{}, ${}) {}",
        qualified_table(model),
        param,
        PARAM_ALIAS
    )
}

/// SELECT one row by key. Key is `$1`.
pub fn select_by_key(model: &ResourceModel) -> String {
    format!(
        "SELECT to_jsonb({a}) FROM {t} {a} WHERE {a}.{k} = $1",
        a = ROW_ALIAS,
        t = qualified_table(model),
        k = quoted(&model.key_column)
    )
}

/// SELECT list with exact-match filters, ORDER BY key, LIMIT/OFFSET.
/// Filter values travel as one jsonb object in `$1` (omitted when there are no filters).
pub fn select_list(model: &ResourceModel, filter_columns: &[&str], limit: u32, offset: u32) -> String {
    let where_clause = if filter_columns.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = filter_columns
            .iter()
            .map(|c| {
                format!(
                    "{a}.{c} = (SELECT {p}.{c} FROM {rec})",
                    a = ROW_ALIAS,
                    p = PARAM_ALIAS,
                    c = quoted(c),
                    rec = populate_record(model, 1)
                )
            })
            .collect();
        format!(" WHERE {}", parts.join(" AND "))
    };
    format!(
        "SELECT to_jsonb({a}) FROM {t} {a}{w} ORDER BY {a}.{k} LIMIT {l} OFFSET {o}",
        a = ROW_ALIAS,
        t = qualified_table(model),
        w = where_clause,
        k = quoted(&model.key_column),
        l = limit,
        o = offset
    )
}

/// INSERT the given columns from the jsonb body in `$1`. No columns means DEFAULT VALUES.
pub fn insert(model: &ResourceModel, columns: &[&str]) -> String {
    let table = qualified_table(model);
    if columns.is_empty() {
        return format!(
            "INSERT INTO {t} AS {a} DEFAULT VALUES RETURNING to_jsonb({a})",
            t = table,
            a = ROW_ALIAS
        );
    }
    let cols = columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    format!(
        "INSERT INTO {t} AS {a} ({cols}) SELECT {vals} FROM {rec} RETURNING to_jsonb({a})",
        t = table,
        a = ROW_ALIAS,
        cols = cols,
        vals = populated_columns(&columns),
        rec = populate_record(model, 1)
    )
}

/// UPDATE by key: SET the given columns from the jsonb body in `$1`; key is `$2`.
/// With no columns this degrades to a read of the current row (key in `$1`).
/// Columns an UPDATE may set: the body keys minus the key column.
pub fn update_columns<'a>(model: &ResourceModel, columns: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    columns.into_iter().filter(|c| *c != model.key_column).collect()
}

pub fn update(model: &ResourceModel, columns: &[&str]) -> String {
    let columns = update_columns(model, columns.iter().copied());
    if columns.is_empty() {
        return select_by_key(model);
    }
    let cols = columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    format!(
        "UPDATE {t} AS {a} SET ({cols}) = (SELECT {vals} FROM {rec}) WHERE {a}.{k} = $2 RETURNING to_jsonb({a})",
        t = qualified_table(model),
        a = ROW_ALIAS,
        cols = cols,
        vals = populated_columns(&columns),
        rec = populate_record(model, 1),
        k = quoted(&model.key_column)
    )
}

/// DELETE by key. Key is `$1`; callers read the affected row count.
pub fn delete(model: &ResourceModel) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        qualified_table(model),
        quoted(&model.key_column)
    )
}
