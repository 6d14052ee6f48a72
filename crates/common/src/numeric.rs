use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNumberError {
    #[error("value is missing")]
    Missing,
    #[error("not a number: {0:?}")]
    NotNumeric(String),
    #[error("non-finite number: {0}")]
    NonFinite(String),
    #[error("unsupported JSON type: {0}")]
    UnsupportedType(&'static str),
}

/// Coerce a loosely typed JSON value into an `f64`.
///
/// Accepts JSON integers, floats and numeric strings (surrounding whitespace
/// is ignored). Booleans, arrays, objects and `null` are failures, as are
/// strings that parse to NaN or infinity.
pub fn try_parse_number(value: &Value) -> Result<f64, ParseNumberError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseNumberError::NotNumeric(n.to_string()))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| ParseNumberError::NotNumeric(format!("{s} ({e})")))?,
        Value::Null => return Err(ParseNumberError::Missing),
        Value::Bool(_) => return Err(ParseNumberError::UnsupportedType("bool")),
        Value::Array(_) => return Err(ParseNumberError::UnsupportedType("array")),
        Value::Object(_) => return Err(ParseNumberError::UnsupportedType("object")),
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ParseNumberError::NonFinite(parsed.to_string()))
    }
}

/// Same as [`try_parse_number`] but for an optional field: absent is `Missing`.
pub fn try_parse_opt(value: Option<&Value>) -> Result<f64, ParseNumberError> {
    value.map_or(Err(ParseNumberError::Missing), try_parse_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_numbers_and_numeric_strings() {
        assert_eq!(try_parse_number(&json!(100)), Ok(100.0));
        assert_eq!(try_parse_number(&json!(12.5)), Ok(12.5));
        assert_eq!(try_parse_number(&json!("50")), Ok(50.0));
        assert_eq!(try_parse_number(&json!(" 7.25 ")), Ok(7.25));
        assert_eq!(try_parse_number(&json!("1e3")), Ok(1000.0));
        assert_eq!(try_parse_number(&json!(-3)), Ok(-3.0));
    }

    #[test]
    fn test_rejects_non_numeric_values() {
        assert!(matches!(
            try_parse_number(&json!("abc")),
            Err(ParseNumberError::NotNumeric(_))
        ));
        assert!(matches!(
            try_parse_number(&json!("")),
            Err(ParseNumberError::NotNumeric(_))
        ));
        assert_eq!(
            try_parse_number(&json!(true)),
            Err(ParseNumberError::UnsupportedType("bool"))
        );
        assert_eq!(
            try_parse_number(&json!([1])),
            Err(ParseNumberError::UnsupportedType("array"))
        );
        assert_eq!(try_parse_number(&Value::Null), Err(ParseNumberError::Missing));
    }

    #[test]
    fn test_rejects_non_finite_strings() {
        assert!(matches!(
            try_parse_number(&json!("NaN")),
            Err(ParseNumberError::NonFinite(_))
        ));
        assert!(matches!(
            try_parse_number(&json!("inf")),
            Err(ParseNumberError::NonFinite(_))
        ));
    }

    #[test]
    fn test_missing_optional_field() {
        assert_eq!(try_parse_opt(None), Err(ParseNumberError::Missing));
        assert_eq!(try_parse_opt(Some(&json!("4"))), Ok(4.0));
    }
}
