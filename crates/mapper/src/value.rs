use chrono::{DateTime, NaiveDate, NaiveDateTime};
use smol_str::SmolStr;

/// One cell of a result row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(v) = self { Some(*v) } else { None }
    }

    pub fn as_int(&self) -> Option<i64> {
        if let Self::Int(v) = self { Some(*v) } else { None }
    }

    pub fn as_float(&self) -> Option<f64> {
        if let Self::Float(v) = self { Some(*v) } else { None }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Self::Str(v) = self { Some(v) } else { None }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        if let Self::Date(v) = self { Some(*v) } else { None }
    }

    /// A stable text form used as an identity-cache key. Distinct
    /// values of different types stay distinct.
    pub(crate) fn key_repr(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Bool(v) => format!("b:{v}"),
            CellValue::Int(v) => format!("i:{v}"),
            CellValue::Float(v) => format!("f:{v}"),
            CellValue::Str(v) => format!("s:{v}"),
            CellValue::Date(v) => format!("d:{v}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Str(SmolStr::new(value))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Driver-friendly coercion for string cells: integral and decimal
/// strings become numbers, `"true"`/`"false"` become booleans, and
/// strict ISO 8601 strings become dates. Anything else, and every
/// non-string cell, passes through unchanged.
pub fn coerce(value: CellValue) -> CellValue {
    let CellValue::Str(text) = &value else {
        return value;
    };
    let text = text.as_str();

    match text {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }

    if let Ok(int) = text.parse::<i64>() {
        return CellValue::Int(int);
    }
    if looks_numeric(text)
        && let Ok(float) = text.parse::<f64>()
    {
        return CellValue::Float(float);
    }

    if let Some(date) = parse_iso_8601(text) {
        return CellValue::Date(date);
    }

    value
}

/// `f64::parse` accepts far more than SQL drivers mean by "numeric
/// string" (inf, nan, 1e5); constrain to plain decimal shapes.
fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    !body.is_empty()
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.matches('.').count() <= 1
        && !body.starts_with('.')
        && !body.ends_with('.')
}

fn parse_iso_8601(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn numeric_strings_coerce() {
        assert_eq!(coerce(CellValue::from("42")), CellValue::Int(42));
        assert_eq!(coerce(CellValue::from("-3.5")), CellValue::Float(-3.5));
        assert_eq!(coerce(CellValue::from("1e5")), CellValue::from("1e5"));
        assert_eq!(coerce(CellValue::from("1.2.3")), CellValue::from("1.2.3"));
    }

    #[test]
    fn boolean_strings_coerce() {
        assert_eq!(coerce(CellValue::from("true")), CellValue::Bool(true));
        assert_eq!(coerce(CellValue::from("false")), CellValue::Bool(false));
        assert_eq!(coerce(CellValue::from("True")), CellValue::from("True"));
    }

    #[test]
    fn strict_iso_dates_coerce() {
        assert!(matches!(
            coerce(CellValue::from("2024-02-29T12:30:00Z")),
            CellValue::Date(_)
        ));
        assert!(matches!(
            coerce(CellValue::from("2024-02-29")),
            CellValue::Date(_)
        ));
        // Loose date-ish strings stay strings.
        assert_eq!(
            coerce(CellValue::from("Feb 29 2024")),
            CellValue::from("Feb 29 2024")
        );
    }

    #[test]
    fn non_strings_pass_through() {
        assert_eq!(coerce(CellValue::Int(5)), CellValue::Int(5));
        assert_eq!(coerce(CellValue::Null), CellValue::Null);
    }
}
