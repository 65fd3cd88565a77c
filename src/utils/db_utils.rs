use actix_web::error::ErrorBadRequest;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed_columns` may be updated; anything else in
/// the payload is a bad request (keys are interpolated into the SQL).
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed_columns: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    for key in obj.keys() {
        if !allowed_columns.contains(&key.as_str()) {
            return Err(ErrorBadRequest(format!("Unknown field '{}'", key)));
        }
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values -> SqlValue
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_set_clause_from_allowed_keys() {
        let update = build_update_sql(
            "staffs",
            &json!({"status": "Resigned"}),
            &["status", "department"],
            "id",
            7,
        )
        .unwrap();
        assert_eq!(update.sql, "UPDATE staffs SET status = ? WHERE id = ?");
        assert_eq!(update.values.len(), 2);
    }

    #[test]
    fn rejects_keys_outside_the_whitelist() {
        let result = build_update_sql(
            "staffs",
            &json!({"password": "x"}),
            &["status"],
            "id",
            7,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("staffs", &json!({}), &["status"], "id", 1).is_err());
        assert!(build_update_sql("staffs", &json!([1, 2]), &["status"], "id", 1).is_err());
    }

    #[test]
    fn date_strings_bind_as_dates() {
        let update = build_update_sql(
            "staffs",
            &json!({"date_of_joining": "2020-06-01"}),
            &["date_of_joining"],
            "id",
            1,
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::Date(_)));
    }
}
