//! The default function library.

use chrono::{Datelike, Duration, TimeZone, Utc};
use expressions_core::{EvaluationError, Variant, VariantKind, VariantOperations};

use super::functions::FunctionCollection;

type Result<T> = std::result::Result<T, EvaluationError>;

/// Register every default function into `functions`.
pub(crate) fn register(functions: &mut FunctionCollection) {
    functions.add_fn("Ticks", |args, _| {
        check_count("Ticks", args, 0)?;
        Ok(Variant::Long(Utc::now().timestamp_millis()))
    });
    functions.add_fn("TimeSpan", time_span);
    functions.add_fn("Now", |args, _| {
        check_count("Now", args, 0)?;
        Ok(Variant::DateTime(Utc::now()))
    });
    functions.add_fn("Date", date);
    functions.add_fn("DayOfWeek", |args, ops| {
        check_count("DayOfWeek", args, 1)?;
        match ops.convert(&args[0], VariantKind::DateTime)? {
            Variant::DateTime(date) => {
                Ok(Variant::Integer(date.weekday().number_from_monday() as i32))
            }
            _ => Ok(Variant::Null),
        }
    });

    functions.add_fn("Min", |args, ops| extreme("Min", args, ops, |ops, a, b| ops.less(a, b)));
    functions.add_fn("Max", |args, ops| extreme("Max", args, ops, |ops, a, b| ops.more(a, b)));
    functions.add_fn("Sum", |args, ops| {
        check_min("Sum", args, 2)?;
        args[1..].iter().try_fold(args[0].clone(), |acc, value| ops.add(&acc, value))
    });
    functions.add_fn("If", |args, ops| {
        check_count("If", args, 3)?;
        let condition = ops.convert(&args[0], VariantKind::Boolean)?;
        Ok(if condition.as_bool().unwrap_or(false) {
            args[1].clone()
        } else {
            args[2].clone()
        })
    });
    functions.add_fn("Choose", choose);

    functions.add_fn("E", |args, _| {
        check_count("E", args, 0)?;
        Ok(Variant::from(std::f64::consts::E))
    });
    functions.add_fn("Pi", |args, _| {
        check_count("Pi", args, 0)?;
        Ok(Variant::from(std::f64::consts::PI))
    });
    for name in ["Rnd", "Random"] {
        functions.add_fn(name, move |args, _| {
            check_count(name, args, 0)?;
            Ok(Variant::from(rand::random::<f64>()))
        });
    }

    functions.add_fn("Abs", abs);
    math(functions, &["Acos"], f64::acos);
    math(functions, &["Asin"], f64::asin);
    math(functions, &["Atan"], f64::atan);
    math(functions, &["Exp"], f64::exp);
    math(functions, &["Log", "Ln"], f64::ln);
    math(functions, &["Log10"], f64::log10);
    math(functions, &["Ceil", "Ceiling"], f64::ceil);
    math(functions, &["Floor"], f64::floor);
    math(functions, &["Cos"], f64::cos);
    math(functions, &["Sin"], f64::sin);
    math(functions, &["Tan"], f64::tan);
    math(functions, &["Sqr", "Sqrt"], f64::sqrt);
    functions.add_fn("Round", round);
    for name in ["Trunc", "Truncate"] {
        functions.add_fn(name, move |args, ops| {
            check_count(name, args, 1)?;
            match number(ops, &args[0])? {
                Some(value) => integral(name, value.trunc()),
                None => Ok(Variant::Null),
            }
        });
    }

    functions.add_fn("Empty", |args, _| {
        check_count("Empty", args, 1)?;
        Ok(Variant::Boolean(is_empty(&args[0])))
    });
    functions.add_fn("Null", |args, _| {
        check_count("Null", args, 0)?;
        Ok(Variant::Null)
    });
    functions.add_fn("Contains", |args, ops| {
        check_count("Contains", args, 2)?;
        if args[0].is_null() || args[1].is_null() {
            return Ok(Variant::Boolean(false));
        }
        let text = ops.convert(&args[0], VariantKind::String)?;
        let part = ops.convert(&args[1], VariantKind::String)?;
        Ok(Variant::Boolean(
            text.as_str().unwrap_or_default().contains(part.as_str().unwrap_or_default()),
        ))
    });
    functions.add_fn("Array", |args, _| Ok(Variant::Array(args.to_vec())));
}

fn check_count(function: &str, args: &[Variant], expected: usize) -> Result<()> {
    if args.len() == expected {
        return Ok(());
    }
    Err(EvaluationError::WrongParamCount {
        function: function.to_string(),
        expected: expected.to_string(),
        found: args.len(),
    })
}

fn check_min(function: &str, args: &[Variant], min: usize) -> Result<()> {
    if args.len() >= min {
        return Ok(());
    }
    Err(EvaluationError::WrongParamCount {
        function: function.to_string(),
        expected: format!("at least {}", min),
        found: args.len(),
    })
}

fn invalid(function: &str, detail: impl Into<String>) -> EvaluationError {
    EvaluationError::InvalidArgument {
        function: function.to_string(),
        detail: detail.into(),
    }
}

/// The argument as f64, or `None` for Null.
fn number(ops: &dyn VariantOperations, value: &Variant) -> Result<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(ops.convert(value, VariantKind::Double)?.as_f64())
}

/// An integral Double as Integer, or Long when it does not fit.
fn integral(function: &str, value: f64) -> Result<Variant> {
    if !value.is_finite() {
        return Err(invalid(function, format!("{} is not finite", value)));
    }
    if (i32::MIN as f64..=i32::MAX as f64).contains(&value) {
        Ok(Variant::Integer(value as i32))
    } else if (i64::MIN as f64..i64::MAX as f64).contains(&value) {
        Ok(Variant::Long(value as i64))
    } else {
        Err(invalid(function, format!("{} is out of range", value)))
    }
}

fn long_arg(ops: &dyn VariantOperations, args: &[Variant], i: usize, default: i64) -> Result<i64> {
    match args.get(i) {
        Some(value) => Ok(ops.convert(value, VariantKind::Long)?.as_i64().unwrap_or(default)),
        None => Ok(default),
    }
}

/// Register a one-argument Double function under each name.
fn math(functions: &mut FunctionCollection, names: &[&'static str], apply: fn(f64) -> f64) {
    for &name in names {
        functions.add_fn(name, move |args, ops| {
            check_count(name, args, 1)?;
            Ok(number(ops, &args[0])?.map_or(Variant::Null, |v| Variant::from(apply(v))))
        });
    }
}

/// `TimeSpan(ms)`, `TimeSpan(d, h, m)`, `TimeSpan(d, h, m, s)`, `TimeSpan(d, h, m, s, ms)`.
fn time_span(args: &[Variant], ops: &dyn VariantOperations) -> Result<Variant> {
    if !matches!(args.len(), 1 | 3 | 4 | 5) {
        return Err(EvaluationError::WrongParamCount {
            function: "TimeSpan".to_string(),
            expected: "1, 3, 4 or 5".to_string(),
            found: args.len(),
        });
    }

    let millis = if args.len() == 1 {
        long_arg(ops, args, 0, 0)?
    } else {
        let parts = [
            long_arg(ops, args, 0, 0)?,
            long_arg(ops, args, 1, 0)?,
            long_arg(ops, args, 2, 0)?,
            long_arg(ops, args, 3, 0)?,
        ];
        let extra = long_arg(ops, args, 4, 0)?;
        [24, 60, 60]
            .iter()
            .zip(&parts[1..])
            .try_fold(parts[0], |acc, (scale, part)| acc.checked_mul(*scale)?.checked_add(*part))
            .and_then(|seconds| seconds.checked_mul(1000)?.checked_add(extra))
            .ok_or_else(|| invalid("TimeSpan", "duration is out of range"))?
    };

    Duration::try_milliseconds(millis)
        .map(Variant::Duration)
        .ok_or_else(|| invalid("TimeSpan", "duration is out of range"))
}

/// `Date(ms)` or `Date(year[, month, day, hour, minute, second, ms])`, in UTC.
fn date(args: &[Variant], ops: &dyn VariantOperations) -> Result<Variant> {
    if args.is_empty() || args.len() > 7 {
        return Err(EvaluationError::WrongParamCount {
            function: "Date".to_string(),
            expected: "1 to 7".to_string(),
            found: args.len(),
        });
    }
    if args.len() == 1 {
        return ops.convert(&args[0], VariantKind::DateTime);
    }

    let part = |i: usize, default: i64| -> Result<u32> {
        let value = long_arg(ops, args, i, default)?;
        u32::try_from(value).map_err(|_| invalid("Date", format!("{} is out of range", value)))
    };
    let year = long_arg(ops, args, 0, 0)?;
    let year = i32::try_from(year)
        .map_err(|_| invalid("Date", format!("year {} is out of range", year)))?;

    let millis = Duration::milliseconds(part(6, 0)?.into());

    Utc.with_ymd_and_hms(year, part(1, 1)?, part(2, 1)?, part(3, 0)?, part(4, 0)?, part(5, 0)?)
        .single()
        .and_then(|date| date.checked_add_signed(millis))
        .map(Variant::DateTime)
        .ok_or_else(|| invalid("Date", "not a valid date"))
}

/// Shared body of `Min` and `Max`: keep the value `better` prefers.
fn extreme(
    function: &str,
    args: &[Variant],
    ops: &dyn VariantOperations,
    better: fn(&dyn VariantOperations, &Variant, &Variant) -> Result<Variant>,
) -> Result<Variant> {
    check_min(function, args, 2)?;
    let mut result = args[0].clone();
    for value in &args[1..] {
        if better(ops, value, &result)?.as_bool().unwrap_or(false) {
            result = value.clone();
        }
    }
    Ok(result)
}

/// `Choose(i, a, b, ...)` picks the i-th value, counting from 1.
fn choose(args: &[Variant], ops: &dyn VariantOperations) -> Result<Variant> {
    check_min("Choose", args, 3)?;
    let index = long_arg(ops, args, 0, 0)?;
    usize::try_from(index)
        .ok()
        .filter(|&i| i >= 1)
        .and_then(|i| args.get(i))
        .cloned()
        .ok_or_else(|| {
            let detail = format!("index {} is out of range 1..={}", index, args.len() - 1);
            invalid("Choose", detail)
        })
}

fn abs(args: &[Variant], ops: &dyn VariantOperations) -> Result<Variant> {
    check_count("Abs", args, 1)?;
    let overflow = || invalid("Abs", "overflow");
    match &args[0] {
        Variant::Null => Ok(Variant::Null),
        Variant::Integer(v) => v.checked_abs().map(Variant::Integer).ok_or_else(overflow),
        Variant::Long(v) => v.checked_abs().map(Variant::Long).ok_or_else(overflow),
        Variant::Float(v) => Ok(Variant::from(v.0.abs())),
        Variant::Double(v) => Ok(Variant::from(v.0.abs())),
        other => Ok(number(ops, other)?.map_or(Variant::Null, |v| Variant::from(v.abs()))),
    }
}

/// `Round(x)` gives an integer; `Round(x, digits)` a Double.
fn round(args: &[Variant], ops: &dyn VariantOperations) -> Result<Variant> {
    if !matches!(args.len(), 1 | 2) {
        return Err(EvaluationError::WrongParamCount {
            function: "Round".to_string(),
            expected: "1 or 2".to_string(),
            found: args.len(),
        });
    }
    let Some(value) = number(ops, &args[0])? else {
        return Ok(Variant::Null);
    };
    if args.len() == 1 {
        return integral("Round", value.round());
    }

    let digits = long_arg(ops, args, 1, 0)?.clamp(-15, 15) as i32;
    let scale = 10f64.powi(digits);
    Ok(Variant::from((value * scale).round() / scale))
}

fn is_empty(value: &Variant) -> bool {
    match value {
        Variant::Null => true,
        Variant::String(s) => s.is_empty(),
        Variant::Array(items) => items.is_empty(),
        Variant::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expressions_core::TypeUnsafeOperations;

    fn call(name: &str, args: &[Variant]) -> Result<Variant> {
        let functions = FunctionCollection::with_defaults();
        let ops = TypeUnsafeOperations::new();
        functions.find_by_name(name).unwrap().calculate(args, &ops)
    }

    fn ints(values: &[i32]) -> Vec<Variant> {
        values.iter().map(|&v| Variant::from(v)).collect()
    }

    #[test]
    fn min_max_sum() {
        assert_eq!(call("Min", &ints(&[3, 1, 2])).unwrap(), Variant::Integer(1));
        assert_eq!(call("Max", &ints(&[-123, 1])).unwrap(), Variant::Integer(1));
        assert_eq!(call("Sum", &ints(&[1, 2, 3])).unwrap(), Variant::Integer(6));
        assert!(matches!(
            call("Max", &ints(&[1])),
            Err(EvaluationError::WrongParamCount { found: 1, .. })
        ));
    }

    #[test]
    fn conditionals() {
        let args = [Variant::from(true), Variant::from("a"), Variant::from("b")];
        assert_eq!(call("If", &args).unwrap(), Variant::from("a"));
        assert_eq!(call("Choose", &ints(&[2, 10, 20, 30])).unwrap(), Variant::Integer(20));
        assert!(call("Choose", &ints(&[4, 10, 20])).is_err());
        assert!(call("If", &ints(&[1, 2])).is_err());
    }

    #[test]
    fn math_functions() {
        assert_eq!(call("Abs", &ints(&[-5])).unwrap(), Variant::Integer(5));
        assert_eq!(call("Sqrt", &ints(&[16])).unwrap(), Variant::from(4.0));
        assert_eq!(call("Floor", &[Variant::from(2.7)]).unwrap(), Variant::from(2.0));
        assert_eq!(call("Ceiling", &[Variant::from(2.1)]).unwrap(), Variant::from(3.0));
        assert_eq!(call("Round", &[Variant::from(2.5)]).unwrap(), Variant::Integer(3));
        assert_eq!(
            call("Round", &[Variant::from(3.14159), Variant::from(2)]).unwrap(),
            Variant::from(3.14)
        );
        assert_eq!(call("Trunc", &[Variant::from(-2.7)]).unwrap(), Variant::Integer(-2));
        assert_eq!(call("Sin", &[Variant::Null]).unwrap(), Variant::Null);
    }

    #[test]
    fn random_is_a_fraction() {
        let value = call("Rnd", &[]).unwrap().as_f64().unwrap();
        assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn dates_and_spans() {
        let date = call("Date", &ints(&[2024, 3, 15, 10, 30])).unwrap();
        assert_eq!(date.to_string(), "2024-03-15T10:30:00.000Z");
        assert_eq!(call("DayOfWeek", &[date]).unwrap(), Variant::Integer(5));

        assert_eq!(
            call("TimeSpan", &ints(&[1, 2, 3, 4, 5])).unwrap(),
            Variant::Duration(Duration::milliseconds(
                ((24 + 2) * 60 + 3) * 60 * 1000 + 4 * 1000 + 5
            ))
        );
        assert_eq!(
            call("TimeSpan", &ints(&[1500])).unwrap(),
            Variant::Duration(Duration::milliseconds(1500))
        );
        assert!(call("TimeSpan", &ints(&[1, 2])).is_err());
        assert!(call("Date", &ints(&[2024, 2, 30])).is_err());
    }

    #[test]
    fn strings_and_collections() {
        let args = [Variant::from("abcdef"), Variant::from("cd")];
        assert_eq!(call("Contains", &args).unwrap(), Variant::Boolean(true));
        assert_eq!(call("Empty", &[Variant::from("")]).unwrap(), Variant::Boolean(true));
        assert_eq!(call("Empty", &[Variant::from(0)]).unwrap(), Variant::Boolean(false));
        assert_eq!(call("Null", &[]).unwrap(), Variant::Null);
        assert_eq!(
            call("Array", &ints(&[1, 2])).unwrap(),
            Variant::Array(ints(&[1, 2]))
        );
    }
}
