//! Built-in implementation under test.
//!
//! A small numeric subject used by the CLI and the integration tests. It
//! exposes rational-to-float conversion (including ratios far past i64
//! range, declared as decimal strings), integer helpers, and the
//! inline-storage capability query. The engine only ever reaches it through
//! the [`Subject`] trait.

use serde_json::{Value, json};
use specrun_core::{Subject, SubjectError};

/// Reference subject for smoke runs.
#[derive(Debug, Default)]
pub struct ReferenceSubject;

impl ReferenceSubject {
    /// Create the subject.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subject for ReferenceSubject {
    fn invoke(&self, operation: &str, inputs: &Value) -> Result<Value, SubjectError> {
        match operation {
            "rational_to_f" => rational_to_f(inputs),
            "int_add" => int_add(inputs),
            "echo" => Ok(inputs.get("value").cloned().unwrap_or(Value::Null)),
            "always_raise" => {
                let message = inputs
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("operation raised");
                Err(SubjectError::raised(message))
            }
            "sleep_ms" => {
                let ms = inputs
                    .get("duration")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| invalid(operation, "`duration` must be a non-negative integer"))?;
                std::thread::sleep(std::time::Duration::from_millis(ms));
                Ok(json!(ms))
            }
            "integer_storage" => {
                let value = inputs
                    .get("value")
                    .ok_or_else(|| invalid(operation, "`value` is required"))?;
                match self.uses_inline_storage(value) {
                    Some(true) => Ok(json!("inline")),
                    Some(false) => Ok(json!("heap")),
                    None => Err(SubjectError::raised(
                        "storage classification not supported for this value",
                    )),
                }
            }
            other => Err(SubjectError::UnknownOperation(other.to_string())),
        }
    }

    /// Integers representable as `i64` use the inline tier; wider decimal
    /// magnitudes live on the heap tier. Non-integers have no storage class.
    fn uses_inline_storage(&self, value: &Value) -> Option<bool> {
        match value {
            Value::Number(n) if n.is_i64() => Some(true),
            Value::Number(n) if n.is_u64() => Some(false),
            Value::String(s) => {
                let digits = s.strip_prefix('-').unwrap_or(s);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                Some(s.parse::<i64>().is_ok())
            }
            _ => None,
        }
    }
}

/// A decimal integer reduced to `coefficient * 10^shift`, precise to the
/// first 19 significant digits. Enough for tolerance comparison of ratios
/// whose operands are far past any machine integer.
struct Magnitude {
    negative: bool,
    coefficient: f64,
    shift: i32,
}

fn rational_to_f(inputs: &Value) -> Result<Value, SubjectError> {
    let numerator = magnitude_of(inputs, "numerator")?;
    let denominator = magnitude_of(inputs, "denominator")?;
    if denominator.coefficient == 0.0 {
        return Err(SubjectError::raised("denominator must not be zero"));
    }

    let ratio = (numerator.coefficient / denominator.coefficient)
        * 10f64.powi(numerator.shift - denominator.shift);
    let signed = if numerator.negative == denominator.negative {
        ratio
    } else {
        -ratio
    };
    serde_json::Number::from_f64(signed)
        .map(Value::Number)
        .ok_or_else(|| SubjectError::raised("result is not representable as a finite float"))
}

fn int_add(inputs: &Value) -> Result<Value, SubjectError> {
    let lhs = require_i64(inputs, "lhs", "int_add")?;
    let rhs = require_i64(inputs, "rhs", "int_add")?;
    lhs.checked_add(rhs)
        .map(|sum| json!(sum))
        .ok_or_else(|| SubjectError::raised("integer overflow in int_add"))
}

fn magnitude_of(inputs: &Value, field: &str) -> Result<Magnitude, SubjectError> {
    match inputs.get(field) {
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                Ok(Magnitude {
                    negative: v < 0,
                    coefficient: i128::from(v).unsigned_abs() as f64,
                    shift: 0,
                })
            } else if let Some(v) = n.as_u64() {
                Ok(Magnitude {
                    negative: false,
                    coefficient: v as f64,
                    shift: 0,
                })
            } else {
                Err(invalid(
                    "rational_to_f",
                    &format!("`{field}` must be an integer or decimal string"),
                ))
            }
        }
        Some(Value::String(s)) => magnitude_from_digits(s, field),
        _ => Err(invalid("rational_to_f", &format!("`{field}` is required"))),
    }
}

fn magnitude_from_digits(raw: &str, field: &str) -> Result<Magnitude, SubjectError> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(
            "rational_to_f",
            &format!("`{field}` must be a decimal integer string"),
        ));
    }

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(Magnitude {
            negative,
            coefficient: 0.0,
            shift: 0,
        });
    }

    // First 19 significant digits fit u64 exactly; the rest only shift the
    // decimal point.
    let head_len = significant.len().min(19);
    let head: u64 = significant[..head_len]
        .parse()
        .map_err(|_| invalid("rational_to_f", &format!("`{field}` is not parseable")))?;
    let shift = i32::try_from(significant.len() - head_len)
        .map_err(|_| invalid("rational_to_f", &format!("`{field}` has too many digits")))?;
    Ok(Magnitude {
        negative,
        coefficient: head as f64,
        shift,
    })
}

fn require_i64(inputs: &Value, field: &str, operation: &str) -> Result<i64, SubjectError> {
    inputs
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(operation, &format!("`{field}` must be an integer")))
}

fn invalid(operation: &str, detail: &str) -> SubjectError {
    SubjectError::InvalidInputs {
        operation: operation.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoke(operation: &str, inputs: Value) -> Result<Value, SubjectError> {
        ReferenceSubject::new().invoke(operation, &inputs)
    }

    #[test]
    fn converts_simple_ratios_with_sign_handling() {
        let cases = [
            (json!({"numerator": 3, "denominator": 4}), 0.75),
            (json!({"numerator": 3, "denominator": -4}), -0.75),
            (json!({"numerator": -1, "denominator": 4}), -0.25),
            (json!({"numerator": -1, "denominator": -4}), 0.25),
        ];
        for (inputs, expected) in cases {
            let actual = invoke("rational_to_f", inputs).unwrap();
            assert_eq!(actual.as_f64().unwrap(), expected);
        }
    }

    #[test]
    fn converts_ratios_past_machine_integer_range() {
        // 10^21 / (2 * 10^18) = 500.0, both operands as decimal strings.
        let inputs = json!({
            "numerator": "1000000000000000000000",
            "denominator": "2000000000000000000",
        });
        let actual = invoke("rational_to_f", inputs).unwrap().as_f64().unwrap();
        assert!((actual - 500.0).abs() < 1e-9);
    }

    #[test]
    fn zero_denominator_raises() {
        let err = invoke(
            "rational_to_f",
            json!({"numerator": 1, "denominator": 0}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("denominator"));
    }

    #[test]
    fn overflowing_ratio_is_not_representable() {
        let huge = format!("1{}", "0".repeat(400));
        let err = invoke(
            "rational_to_f",
            json!({"numerator": huge, "denominator": 1}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not representable"));
    }

    #[test]
    fn int_add_reports_overflow_as_raise() {
        let ok = invoke("int_add", json!({"lhs": 40, "rhs": 2})).unwrap();
        assert_eq!(ok, json!(42));

        let err = invoke("int_add", json!({"lhs": i64::MAX, "rhs": 1})).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn storage_probe_distinguishes_tiers() {
        let subject = ReferenceSubject::new();
        assert_eq!(subject.uses_inline_storage(&json!(42)), Some(true));
        assert_eq!(subject.uses_inline_storage(&json!(u64::MAX)), Some(false));
        assert_eq!(
            subject.uses_inline_storage(&json!("123456789012345678901234567890")),
            Some(false)
        );
        assert_eq!(subject.uses_inline_storage(&json!("17")), Some(true));
        assert_eq!(subject.uses_inline_storage(&json!("not a number")), None);
        assert_eq!(subject.uses_inline_storage(&json!(0.5)), None);
    }

    #[test]
    fn integer_storage_operation_uses_the_capability() {
        assert_eq!(
            invoke("integer_storage", json!({"value": 42})).unwrap(),
            json!("inline")
        );
        assert_eq!(
            invoke("integer_storage", json!({"value": "123456789012345678901234567890"})).unwrap(),
            json!("heap")
        );
        assert!(invoke("integer_storage", json!({"value": 0.5})).is_err());
    }

    #[test]
    fn unknown_operation_is_named_in_the_error() {
        let err = invoke("no_such_op", json!({})).unwrap_err();
        assert_eq!(
            err,
            SubjectError::UnknownOperation(String::from("no_such_op"))
        );
    }
}
