//! Kind conversion tables for the two operation strategies.
//!
//! [`convert_lenient`] backs the type-unsafe strategy and converts between
//! every pair of kinds that has a sensible mapping. [`convert_strict`] backs
//! the type-safe strategy and only performs lossless widening.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ordered_float::OrderedFloat;

use crate::error::EvaluationError;
use crate::variant::{Variant, VariantKind};

fn failed(value: &Variant, to: VariantKind, detail: impl Into<String>) -> EvaluationError {
    EvaluationError::ConversionFailed {
        from: value.kind(),
        to,
        detail: detail.into(),
    }
}

fn unsupported(value: &Variant, to: VariantKind) -> EvaluationError {
    failed(value, to, "no conversion between these kinds")
}

/// Lossless widening only: Integer to Long/Float/Double, Long to Float/Double,
/// Float to Double. Null converts to Null for every kind.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn convert_strict(value: &Variant, kind: VariantKind) -> Result<Variant, EvaluationError> {
    if value.kind() == kind || value.is_null() || kind == VariantKind::Null {
        return Ok(if kind == VariantKind::Null {
            Variant::Null
        } else {
            value.clone()
        });
    }

    match (value, kind) {
        (Variant::Integer(v), VariantKind::Long) => Ok(Variant::Long(i64::from(*v))),
        (Variant::Integer(v), VariantKind::Float) => Ok(Variant::Float(OrderedFloat(*v as f32))),
        (Variant::Integer(v), VariantKind::Double) => {
            Ok(Variant::Double(OrderedFloat(f64::from(*v))))
        }
        (Variant::Long(v), VariantKind::Float) => Ok(Variant::Float(OrderedFloat(*v as f32))),
        (Variant::Long(v), VariantKind::Double) => Ok(Variant::Double(OrderedFloat(*v as f64))),
        (Variant::Float(v), VariantKind::Double) => {
            Ok(Variant::Double(OrderedFloat(f64::from(v.0))))
        }
        _ => Err(unsupported(value, kind)),
    }
}

/// Converts between any pair of kinds with a sensible mapping.
///
/// Null stays Null for nullable targets (String, DateTime, Duration, Object,
/// Array), becomes `false` for Boolean, and fails for numeric targets.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn convert_lenient(value: &Variant, kind: VariantKind) -> Result<Variant, EvaluationError> {
    if value.kind() == kind {
        return Ok(value.clone());
    }

    match kind {
        VariantKind::Null => Ok(Variant::Null),
        VariantKind::Integer => to_integer(value),
        VariantKind::Long => to_long(value),
        VariantKind::Float => to_double(value).map(|v| Variant::Float(OrderedFloat(v as f32))),
        VariantKind::Double => to_double(value).map(|v| Variant::Double(OrderedFloat(v))),
        VariantKind::Boolean => to_boolean(value),
        VariantKind::String => match value {
            Variant::Null => Ok(Variant::Null),
            other => Ok(Variant::String(other.to_string())),
        },
        VariantKind::DateTime => to_datetime(value),
        VariantKind::Duration => to_duration(value),
        VariantKind::Object | VariantKind::Array => match value {
            Variant::Null => Ok(Variant::Null),
            _ => Err(unsupported(value, kind)),
        },
    }
}

fn to_long(value: &Variant) -> Result<Variant, EvaluationError> {
    let to = VariantKind::Long;
    match value {
        Variant::Integer(v) => Ok(Variant::Long(i64::from(*v))),
        Variant::Float(v) => float_to_i64(f64::from(v.0))
            .ok_or_else(|| failed(value, to, "out of range"))
            .map(Variant::Long),
        Variant::Double(v) => {
            float_to_i64(v.0).ok_or_else(|| failed(value, to, "out of range")).map(Variant::Long)
        }
        Variant::Boolean(v) => Ok(Variant::Long(i64::from(*v))),
        Variant::String(s) => parse_long(s)
            .map(Variant::Long)
            .ok_or_else(|| failed(value, to, format!("'{}' is not an integer", s))),
        Variant::DateTime(v) => Ok(Variant::Long(v.timestamp_millis())),
        Variant::Duration(v) => Ok(Variant::Long(v.num_milliseconds())),
        _ => Err(unsupported(value, to)),
    }
}

fn to_integer(value: &Variant) -> Result<Variant, EvaluationError> {
    let to = VariantKind::Integer;
    match to_long(value) {
        Ok(Variant::Long(wide)) => i32::try_from(wide)
            .map(Variant::Integer)
            .map_err(|_| failed(value, to, "out of range")),
        Ok(_) => Err(unsupported(value, to)),
        Err(EvaluationError::ConversionFailed { detail, .. }) => Err(failed(value, to, detail)),
        Err(err) => Err(err),
    }
}

fn to_double(value: &Variant) -> Result<f64, EvaluationError> {
    match value {
        Variant::Integer(v) => Ok(f64::from(*v)),
        Variant::Long(v) => Ok(*v as f64),
        Variant::Float(v) => Ok(f64::from(v.0)),
        Variant::Double(v) => Ok(v.0),
        Variant::Boolean(v) => Ok(if *v { 1.0 } else { 0.0 }),
        Variant::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| failed(value, VariantKind::Double, format!("'{}' is not a number", s))),
        _ => Err(unsupported(value, VariantKind::Double)),
    }
}

fn to_boolean(value: &Variant) -> Result<Variant, EvaluationError> {
    match value {
        Variant::Null => Ok(Variant::Boolean(false)),
        Variant::Integer(v) => Ok(Variant::Boolean(*v != 0)),
        Variant::Long(v) => Ok(Variant::Boolean(*v != 0)),
        Variant::Float(v) => Ok(Variant::Boolean(v.0 != 0.0)),
        Variant::Double(v) => Ok(Variant::Boolean(v.0 != 0.0)),
        Variant::String(s) => parse_boolean(s)
            .map(Variant::Boolean)
            .ok_or_else(|| {
                failed(value, VariantKind::Boolean, format!("'{}' is not a boolean", s))
            }),
        _ => Err(unsupported(value, VariantKind::Boolean)),
    }
}

fn to_datetime(value: &Variant) -> Result<Variant, EvaluationError> {
    let to = VariantKind::DateTime;
    match value {
        Variant::Null => Ok(Variant::Null),
        Variant::Integer(_) | Variant::Long(_) => {
            let millis = value.as_i64().unwrap_or_default();
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Variant::DateTime)
                .ok_or_else(|| failed(value, to, "out of range"))
        }
        Variant::String(s) => parse_datetime(s)
            .map(Variant::DateTime)
            .ok_or_else(|| failed(value, to, format!("'{}' is not a date", s))),
        _ => Err(unsupported(value, to)),
    }
}

fn to_duration(value: &Variant) -> Result<Variant, EvaluationError> {
    let to = VariantKind::Duration;
    match value {
        Variant::Null => Ok(Variant::Null),
        Variant::Integer(_) | Variant::Long(_) => {
            Duration::try_milliseconds(value.as_i64().unwrap_or_default())
                .map(Variant::Duration)
                .ok_or_else(|| failed(value, to, "out of range"))
        }
        Variant::String(s) => {
            let ms = parse_long(s)
                .ok_or_else(|| failed(value, to, format!("'{}' is not a duration", s)))?;
            Duration::try_milliseconds(ms)
                .map(Variant::Duration)
                .ok_or_else(|| failed(value, to, "out of range"))
        }
        _ => Err(unsupported(value, to)),
    }
}

fn float_to_i64(value: f64) -> Option<i64> {
    if value.is_finite() && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

fn parse_long(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Parses `true/false/yes/no/1/0`, ignoring case and surrounding spaces.
pub fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if ["true", "yes", "1"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if ["false", "no", "0"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&value));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| Utc.from_utc_datetime(&value))
}

/// Interprets numeric-looking text as the narrowest of Integer, Long or Double.
pub fn parse_number(text: &str) -> Option<Variant> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i32>() {
        return Some(Variant::Integer(v));
    }
    if let Ok(v) = text.parse::<i64>() {
        return Some(Variant::Long(v));
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Variant::Double(OrderedFloat(v))),
        _ => None,
    }
}
