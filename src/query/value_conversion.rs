//! Value conversion between compiled binds and `may_postgres`.
//!
//! Binding goes through a target-type-aware [`ToSql`] impl on [`BindValue`]:
//! the compiler only knows four scalar shapes (null, integer, float, text), so
//! the conversion to the column's wire type happens here, once PostgreSQL has
//! told us the parameter type. Rows come back as [`Record`]s decoded by column
//! type.

use crate::executor::DriverError;
use crate::query::bind::{BindMap, BindValue};
use crate::query::placeholder::{to_positional, PlaceholderStyle};
use crate::value::{Record, Value};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use may_postgres::Row;
use postgres_types::{to_sql_checked, IsNull, ToSql, Type};
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// Text layouts accepted for TIMESTAMP parameters.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn parse_datetime(raw: &str) -> Result<NaiveDateTime, BoxError> {
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    Err(format!("'{raw}' is not a recognised timestamp").into())
}

impl ToSql for BindValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            BindValue::Null => Ok(IsNull::Yes),
            BindValue::Int(v) => match *ty {
                Type::BOOL => (*v != 0).to_sql(ty, out),
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    v.to_string().to_sql(ty, out)
                }
                _ => v.to_sql(ty, out),
            },
            BindValue::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    v.to_string().to_sql(ty, out)
                }
                _ => v.to_sql(ty, out),
            },
            BindValue::Text(s) => match *ty {
                Type::BOOL => matches!(s.as_str(), "1" | "t" | "true" | "TRUE").to_sql(ty, out),
                Type::INT2 => s.parse::<i16>()?.to_sql(ty, out),
                Type::INT4 => s.parse::<i32>()?.to_sql(ty, out),
                Type::INT8 => s.parse::<i64>()?.to_sql(ty, out),
                Type::FLOAT4 => s.parse::<f32>()?.to_sql(ty, out),
                Type::FLOAT8 => s.parse::<f64>()?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from_str(s)?.to_sql(ty, out),
                Type::TIMESTAMP => parse_datetime(s)?.to_sql(ty, out),
                Type::TIMESTAMPTZ => match DateTime::parse_from_rfc3339(s) {
                    Ok(dt) => dt.with_timezone(&Utc).to_sql(ty, out),
                    Err(_) => parse_datetime(s)?.and_utc().to_sql(ty, out),
                },
                Type::DATE => NaiveDate::parse_from_str(s, "%Y-%m-%d")?.to_sql(ty, out),
                Type::UUID => Uuid::parse_str(s)?.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                _ => s.as_str().to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Rewrite `:name` placeholders to `$n` and run `f` with the matching parameters.
///
/// A placeholder without a bind entry is reported before anything is sent.
pub(crate) fn with_bound_params<F, R>(sql: &str, binds: &BindMap, f: F) -> Result<R, DriverError>
where
    F: FnOnce(&str, &[&dyn ToSql]) -> Result<R, DriverError>,
{
    let positional = to_positional(sql, PlaceholderStyle::Dollar);
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(positional.names.len());
    for name in &positional.names {
        let value = binds
            .get(name)
            .ok_or_else(|| DriverError::new(format!("no value bound for placeholder :{name}")))?;
        params.push(value as &dyn ToSql);
    }
    f(&positional.sql, &params)
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> Result<Value, may_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.into(),
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(idx)?
            .map(|d| d.to_string())
            .into(),
        Type::TIMESTAMP => row.try_get::<_, Option<NaiveDateTime>>(idx)?.into(),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(idx)?.into(),
        Type::DATE => row.try_get::<_, Option<NaiveDate>>(idx)?.into(),
        Type::UUID => row.try_get::<_, Option<Uuid>>(idx)?.into(),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<serde_json::Value>>(idx)?.into(),
        _ => row.try_get::<_, Option<String>>(idx)?.into(),
    };
    Ok(value)
}

/// Decode one row into a column-ordered [`Record`].
pub(crate) fn decode_row(row: &Row) -> Result<Record, DriverError> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.type_()).map_err(|e| {
            DriverError::new(format!(
                "cannot decode column '{}' of type {}: {e}",
                column.name(),
                column.type_()
            ))
        })?;
        record.insert(column.name(), value);
    }
    Ok(record)
}
