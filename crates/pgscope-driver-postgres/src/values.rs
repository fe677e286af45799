//! Conversions between pgscope values and the tokio-postgres wire types

use bytes::BytesMut;
use pgscope_core::{Result, Value};
use tokio_postgres::Row as PgRow;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// Owned parameter value that tokio-postgres can bind.
#[derive(Debug)]
pub(crate) enum PgValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Oid(u32),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl PgValue {
    /// Convert a value so it matches the parameter type the server inferred
    /// while preparing, so the binary width is right (INT4 vs INT8, OID).
    pub(crate) fn for_type(value: &Value, target_type: &Type) -> Self {
        match value {
            Value::Null => PgValue::Null,
            Value::Bool(v) => PgValue::Bool(*v),
            Value::Int16(v) => Self::coerce_int(*v as i64, target_type),
            Value::Int32(v) => Self::coerce_int(*v as i64, target_type),
            Value::Int64(v) => Self::coerce_int(*v, target_type),
            Value::Float64(v) => match *target_type {
                Type::FLOAT4 => PgValue::Float32(*v as f32),
                _ => PgValue::Float64(*v),
            },
            Value::Decimal(v) => PgValue::String(v.clone()),
            Value::String(v) => match *target_type {
                Type::JSON | Type::JSONB => serde_json::from_str(v)
                    .map(PgValue::Json)
                    .unwrap_or_else(|_| PgValue::String(v.clone())),
                Type::OID => v
                    .parse()
                    .map(PgValue::Oid)
                    .unwrap_or_else(|_| PgValue::String(v.clone())),
                _ => PgValue::String(v.clone()),
            },
            Value::Bytes(v) => PgValue::Bytes(v.clone()),
            Value::Json(v) => PgValue::Json(v.clone()),
            Value::Array(_) => PgValue::String(value.to_string()),
        }
    }

    /// Narrow to the target width when the value fits. Out-of-range values
    /// stay `Int64` and fail the type check at bind time.
    fn coerce_int(value: i64, target_type: &Type) -> Self {
        let narrowed = match *target_type {
            Type::INT2 => i16::try_from(value).ok().map(PgValue::Int16),
            Type::INT4 => i32::try_from(value).ok().map(PgValue::Int32),
            Type::OID => u32::try_from(value).ok().map(PgValue::Oid),
            _ => None,
        };
        narrowed.unwrap_or(PgValue::Int64(value))
    }
}

impl ToSql for PgValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self {
            PgValue::Null => Ok(IsNull::Yes),
            PgValue::Bool(v) => v.to_sql(ty, out),
            PgValue::Int16(v) => v.to_sql(ty, out),
            PgValue::Int32(v) => v.to_sql(ty, out),
            PgValue::Int64(v) => v.to_sql_checked(ty, out),
            PgValue::Oid(v) => v.to_sql(ty, out),
            PgValue::Float32(v) => v.to_sql(ty, out),
            PgValue::Float64(v) => v.to_sql(ty, out),
            PgValue::String(v) => v.to_sql(ty, out),
            PgValue::Bytes(v) => v.to_sql(ty, out),
            PgValue::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    postgres_types::to_sql_checked!();
}

/// NUMERIC decoded into its exact decimal text.
#[derive(Debug)]
struct PgNumericString(String);

impl PgNumericString {
    fn parse(raw: &[u8]) -> std::result::Result<String, BoxError> {
        if raw.len() < 8 {
            return Err("invalid NUMERIC payload: too short".into());
        }

        let ndigits = i16::from_be_bytes([raw[0], raw[1]]) as usize;
        let weight = i16::from_be_bytes([raw[2], raw[3]]);
        let sign = u16::from_be_bytes([raw[4], raw[5]]);
        let dscale = i16::from_be_bytes([raw[6], raw[7]]) as usize;

        if raw.len() < 8 + ndigits * 2 {
            return Err("invalid NUMERIC payload: truncated digits".into());
        }
        if sign == 0xC000 {
            return Ok("NaN".to_string());
        }

        let digits: Vec<u16> = raw[8..8 + ndigits * 2]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if digits.is_empty() {
            return Ok("0".to_string());
        }

        let integer_groups = if weight >= 0 { weight as usize + 1 } else { 0 };

        let mut integer = String::new();
        if integer_groups == 0 {
            integer.push('0');
        }
        for index in 0..integer_groups {
            let group = digits.get(index).copied().unwrap_or(0);
            if index == 0 {
                integer.push_str(&group.to_string());
            } else {
                integer.push_str(&format!("{group:04}"));
            }
        }

        let mut fraction = String::new();
        if dscale > 0 {
            for group in digits.iter().skip(integer_groups.min(digits.len())) {
                fraction.push_str(&format!("{group:04}"));
            }
            if weight < -1 {
                let leading = "0000".repeat((-weight - 1) as usize);
                fraction.insert_str(0, &leading);
            }
            if fraction.len() < dscale {
                fraction.push_str(&"0".repeat(dscale - fraction.len()));
            } else {
                fraction.truncate(dscale);
            }
        }

        let mut output = String::new();
        if sign == 0x4000 {
            output.push('-');
        }
        output.push_str(&integer);
        if !fraction.is_empty() {
            output.push('.');
            output.push_str(&fraction);
        }
        Ok(output)
    }
}

impl<'a> FromSql<'a> for PgNumericString {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(Self(Self::parse(raw)?))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Raw payload for types without a dedicated decoder (enums, domains over
/// text, and so on).
#[derive(Debug)]
struct PgRawValue(Vec<u8>);

impl<'a> FromSql<'a> for PgRawValue {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(Self(raw.to_vec()))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize) -> Option<T> {
    row.try_get::<_, Option<T>>(idx).ok().flatten()
}

/// Convert a PostgreSQL row value to our Value type
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Result<Value> {
    let type_name = row.columns()[idx].type_().name();

    let value = match type_name {
        "bool" => get::<bool>(row, idx).map(Value::Bool),
        "int2" => get::<i16>(row, idx).map(Value::Int16),
        "int4" => get::<i32>(row, idx).map(Value::Int32),
        "int8" => get::<i64>(row, idx).map(Value::Int64),
        "oid" => get::<u32>(row, idx).map(|v| Value::Int64(v as i64)),
        "float4" => get::<f32>(row, idx).map(|v| Value::Float64(v as f64)),
        "float8" => get::<f64>(row, idx).map(Value::Float64),
        // The single-byte internal type used by catalog columns like contype
        "char" => get::<i8>(row, idx).map(|v| Value::String(((v as u8) as char).to_string())),
        "text" | "varchar" | "bpchar" | "name" => get::<String>(row, idx).map(Value::String),
        "bytea" => get::<Vec<u8>>(row, idx).map(Value::Bytes),
        "json" | "jsonb" => get::<serde_json::Value>(row, idx).map(Value::Json),
        "numeric" => get::<PgNumericString>(row, idx).map(|v| Value::Decimal(v.0)),
        "_text" | "_varchar" | "_bpchar" | "_name" => get::<Vec<String>>(row, idx)
            .map(|arr| Value::Array(arr.into_iter().map(Value::String).collect())),
        "_int2" => get::<Vec<i16>>(row, idx)
            .map(|arr| Value::Array(arr.into_iter().map(Value::Int16).collect())),
        "_int4" => get::<Vec<i32>>(row, idx)
            .map(|arr| Value::Array(arr.into_iter().map(Value::Int32).collect())),
        _ => get::<PgRawValue>(row, idx).map(|raw| match String::from_utf8(raw.0) {
            Ok(text) => Value::String(text),
            Err(e) => Value::Bytes(e.into_bytes()),
        }),
    };

    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: i16, weight: i16, sign: u16, dscale: i16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&ndigits.to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for digit in digits {
            raw.extend_from_slice(&digit.to_be_bytes());
        }
        raw
    }

    #[test]
    fn numeric_with_fraction() {
        // 12345.67 = [1, 2345, 6700], weight 1, scale 2
        let raw = numeric(3, 1, 0, 2, &[1, 2345, 6700]);
        assert_eq!(PgNumericString::parse(&raw).unwrap(), "12345.67");
    }

    #[test]
    fn small_negative_numeric() {
        // -0.00005 = [5000], weight -2, scale 5
        let raw = numeric(1, -2, 0x4000, 5, &[5000]);
        assert_eq!(PgNumericString::parse(&raw).unwrap(), "-0.00005");
    }

    #[test]
    fn oid_parameters_bind_as_oid() {
        assert!(matches!(
            PgValue::for_type(&Value::Int64(16384), &Type::OID),
            PgValue::Oid(16384)
        ));
        assert!(matches!(
            PgValue::for_type(&Value::Null, &Type::OID),
            PgValue::Null
        ));
    }

    #[test]
    fn out_of_range_integers_are_not_truncated() {
        assert!(matches!(
            PgValue::for_type(&Value::Int64(70_000), &Type::INT2),
            PgValue::Int64(70_000)
        ));
        assert!(matches!(
            PgValue::for_type(&Value::Int64(-1), &Type::OID),
            PgValue::Int64(-1)
        ));
        assert!(matches!(
            PgValue::for_type(&Value::Int64(42), &Type::INT4),
            PgValue::Int32(42)
        ));

        let mut out = BytesMut::new();
        let oversized = PgValue::for_type(&Value::Int64(i64::from(i32::MAX) + 1), &Type::INT4);
        assert!(oversized.to_sql(&Type::INT4, &mut out).is_err());
        assert!(out.is_empty());
    }
}
