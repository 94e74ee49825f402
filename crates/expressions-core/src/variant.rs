//! The dynamically typed value used by expressions and templates.
//!
//! [`Variant`] is a closed sum type; exactly one representation is active at
//! a time and the only sanctioned way to change kind is
//! [`VariantOperations::convert`](crate::VariantOperations::convert).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ordered_float::OrderedFloat;

/// The kind tag of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariantKind {
    Null,
    Integer,
    Long,
    Float,
    Double,
    String,
    Boolean,
    DateTime,
    Duration,
    Object,
    Array,
}

impl VariantKind {
    /// Whether values of this kind are numbers.
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            VariantKind::Integer | VariantKind::Long | VariantKind::Float | VariantKind::Double
        )
    }

    /// Rank used for numeric promotion; `None` for non-numeric kinds.
    ///
    /// Mixed numeric operands are widened to the higher rank.
    #[inline]
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            VariantKind::Integer => Some(0),
            VariantKind::Long => Some(1),
            VariantKind::Float => Some(2),
            VariantKind::Double => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariantKind::Null => "Null",
            VariantKind::Integer => "Integer",
            VariantKind::Long => "Long",
            VariantKind::Float => "Float",
            VariantKind::Double => "Double",
            VariantKind::String => "String",
            VariantKind::Boolean => "Boolean",
            VariantKind::DateTime => "DateTime",
            VariantKind::Duration => "Duration",
            VariantKind::Object => "Object",
            VariantKind::Array => "Array",
        };
        write!(f, "{}", s)
    }
}

/// A runtime value.
///
/// Floating point payloads are wrapped in [`OrderedFloat`] so values can be
/// compared, hashed and used as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Null,
    Integer(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Duration(Duration),
    Object(BTreeMap<String, Variant>),
    Array(Vec<Variant>),
}

impl Variant {
    /// The kind of the active representation.
    pub fn kind(&self) -> VariantKind {
        match self {
            Variant::Null => VariantKind::Null,
            Variant::Integer(_) => VariantKind::Integer,
            Variant::Long(_) => VariantKind::Long,
            Variant::Float(_) => VariantKind::Float,
            Variant::Double(_) => VariantKind::Double,
            Variant::String(_) => VariantKind::String,
            Variant::Boolean(_) => VariantKind::Boolean,
            Variant::DateTime(_) => VariantKind::DateTime,
            Variant::Duration(_) => VariantKind::Duration,
            Variant::Object(_) => VariantKind::Object,
            Variant::Array(_) => VariantKind::Array,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// Template-style truthiness: non-null, non-false, non-zero and non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Variant::Null => false,
            Variant::Integer(v) => *v != 0,
            Variant::Long(v) => *v != 0,
            Variant::Float(v) => v.0 != 0.0,
            Variant::Double(v) => v.0 != 0.0,
            Variant::String(v) => !v.is_empty(),
            Variant::Boolean(v) => *v,
            Variant::DateTime(_) => true,
            Variant::Duration(v) => *v != Duration::zero(),
            Variant::Object(v) => !v.is_empty(),
            Variant::Array(v) => !v.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Variant::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer or Long payload widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Integer(v) => Some(i64::from(*v)),
            Variant::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric payload widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Integer(v) => Some(f64::from(*v)),
            Variant::Long(v) => Some(*v as f64),
            Variant::Float(v) => Some(f64::from(v.0)),
            Variant::Double(v) => Some(v.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Variant::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Variant::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Variant]> {
        match self {
            Variant::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Variant>> {
        match self {
            Variant::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Look up an object field by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&Variant> {
        let fields = self.as_object()?;
        fields
            .get(name)
            .or_else(|| {
                fields
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
    }
}

impl fmt::Display for Variant {
    /// Canonical string form. Null renders as an empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Null => Ok(()),
            Variant::Integer(v) => write!(f, "{}", v),
            Variant::Long(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v.0),
            Variant::Double(v) => write!(f, "{}", v.0),
            Variant::String(v) => f.write_str(v),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::DateTime(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Variant::Duration(v) => write!(f, "{}", v.num_milliseconds()),
            Variant::Object(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("}")
            }
            Variant::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Integer(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Long(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Variant::Float(OrderedFloat(value))
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Double(OrderedFloat(value))
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Boolean(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<DateTime<Utc>> for Variant {
    fn from(value: DateTime<Utc>) -> Self {
        Variant::DateTime(value)
    }
}

impl From<Duration> for Variant {
    fn from(value: Duration) -> Self {
        Variant::Duration(value)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(value: Vec<Variant>) -> Self {
        Variant::Array(value)
    }
}

impl From<BTreeMap<String, Variant>> for Variant {
    fn from(value: BTreeMap<String, Variant>) -> Self {
        Variant::Object(value)
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(value: Option<T>) -> Self {
        value.map_or(Variant::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kind_of_each_representation() {
        assert_eq!(Variant::Null.kind(), VariantKind::Null);
        assert_eq!(Variant::from(1).kind(), VariantKind::Integer);
        assert_eq!(Variant::from(1i64).kind(), VariantKind::Long);
        assert_eq!(Variant::from(1.5f32).kind(), VariantKind::Float);
        assert_eq!(Variant::from(1.5).kind(), VariantKind::Double);
        assert_eq!(Variant::from("x").kind(), VariantKind::String);
        assert_eq!(Variant::from(true).kind(), VariantKind::Boolean);
        assert_eq!(Variant::from(vec![Variant::Null]).kind(), VariantKind::Array);
        assert_eq!(Variant::from(None::<i32>).kind(), VariantKind::Null);
    }

    #[test]
    fn canonical_strings() {
        assert_eq!(Variant::Null.to_string(), "");
        assert_eq!(Variant::from(-12).to_string(), "-12");
        assert_eq!(Variant::from(2.5).to_string(), "2.5");
        assert_eq!(Variant::from(true).to_string(), "true");
        assert_eq!(
            Variant::from(vec![Variant::from(1), Variant::from("a")]).to_string(),
            "1,a"
        );
        assert_eq!(Variant::from(Duration::seconds(2)).to_string(), "2000");

        let date = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(Variant::from(date).to_string(), "2024-03-01T10:30:00.000Z");
    }

    #[test]
    fn truthiness() {
        assert!(!Variant::Null.is_truthy());
        assert!(!Variant::from(false).is_truthy());
        assert!(!Variant::from(0).is_truthy());
        assert!(!Variant::from("").is_truthy());
        assert!(!Variant::Array(Vec::new()).is_truthy());
        assert!(Variant::from("1").is_truthy());
        assert!(Variant::from(0.5).is_truthy());
        assert!(Variant::from(vec![Variant::Null]).is_truthy());
    }

    #[test]
    fn field_lookup_ignores_case() {
        let mut fields = BTreeMap::new();
        fields.insert("Name".to_string(), Variant::from("Alex"));
        let object = Variant::from(fields);

        assert_eq!(object.field("Name"), Some(&Variant::from("Alex")));
        assert_eq!(object.field("NAME"), Some(&Variant::from("Alex")));
        assert_eq!(object.field("other"), None);
        assert_eq!(Variant::from(1).field("Name"), None);
    }

    #[test]
    fn numeric_rank_orders_kinds() {
        assert!(VariantKind::Integer.numeric_rank() < VariantKind::Double.numeric_rank());
        assert_eq!(VariantKind::String.numeric_rank(), None);
        assert!(VariantKind::Long.is_numeric());
        assert!(!VariantKind::Boolean.is_numeric());
    }
}
