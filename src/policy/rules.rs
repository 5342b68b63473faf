//! Declarative field rules and the validator that applies them.
//!
//! A resource declares one [`FieldRule`] per client-writable column. The
//! validator merges a JSON payload over the existing values (update) or the
//! rule fallbacks (create), coerces each value to its declared kind and
//! reports every failing field at once.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use time::{macros::format_description, Date};

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Field name -> messages, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { max_len: Option<usize> },
    Email,
    Number,
    Integer,
    Decimal { max_digits: u32, decimal_places: u32 },
    Date,
    Choice(&'static [&'static str]),
}

/// Numeric invariant, carrying the message reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Any,
    Positive(&'static str),
    NonNegative(&'static str),
    AtLeast(i64, &'static str),
}

/// Value used when a create payload omits a non-required field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Null,
    Zero,
    Text(&'static str),
}

impl Fallback {
    fn value(self) -> Value {
        match self {
            Fallback::Null => Value::Null,
            Fallback::Zero => Value::from(0),
            Fallback::Text(s) => Value::String(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
    pub allow_blank: bool,
    pub bound: Bound,
    pub fallback: Fallback,
}

impl FieldRule {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            nullable: false,
            allow_blank: false,
            bound: Bound::Any,
            fallback: Fallback::Null,
        }
    }

    pub const fn text(name: &'static str, max_len: usize) -> Self {
        Self::new(name, FieldKind::Text { max_len: Some(max_len) })
    }

    pub const fn long_text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text { max_len: None })
    }

    pub const fn email(name: &'static str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn decimal(name: &'static str, max_digits: u32, decimal_places: u32) -> Self {
        Self::new(
            name,
            FieldKind::Decimal {
                max_digits,
                decimal_places,
            },
        )
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub const fn choice(name: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Choice(options))
    }

    /// May be omitted or null; defaults to null.
    pub const fn optional(self) -> Self {
        Self {
            required: false,
            nullable: true,
            fallback: Fallback::Null,
            ..self
        }
    }

    /// May be omitted or empty; defaults to "".
    pub const fn blank(self) -> Self {
        Self {
            required: false,
            allow_blank: true,
            fallback: Fallback::Text(""),
            ..self
        }
    }

    pub const fn or(self, fallback: Fallback) -> Self {
        Self {
            required: false,
            fallback,
            ..self
        }
    }

    pub const fn positive(self, message: &'static str) -> Self {
        Self {
            bound: Bound::Positive(message),
            ..self
        }
    }

    pub const fn non_negative(self, message: &'static str) -> Self {
        Self {
            bound: Bound::NonNegative(message),
            ..self
        }
    }

    pub const fn at_least(self, min: i64, message: &'static str) -> Self {
        Self {
            bound: Bound::AtLeast(min, message),
            ..self
        }
    }

    /// Resolve the value this field ends up with, or the message explaining why
    /// it cannot be stored.
    fn check(&self, candidate: Option<Value>) -> Result<Value, String> {
        let value = match candidate {
            None if self.required => return Err(REQUIRED.into()),
            None => return Ok(self.fallback.value()),
            Some(Value::Null) if self.nullable => return Ok(Value::Null),
            Some(Value::Null) => return Err(NOT_NULL.into()),
            Some(v) => v,
        };
        let value = self.coerce(value)?;
        self.check_bound(&value)?;
        Ok(value)
    }

    fn coerce(&self, value: Value) -> Result<Value, String> {
        match self.kind {
            FieldKind::Text { max_len } => self.coerce_text(value, max_len),
            FieldKind::Email => {
                let text = self.coerce_text(value, Some(254))?;
                match text.as_str() {
                    Some(s) if !s.is_empty() && !is_valid_email(s) => Err(INVALID_EMAIL.into()),
                    _ => Ok(text),
                }
            }
            FieldKind::Number => as_number(&value)
                .map(Value::from)
                .ok_or_else(|| INVALID_NUMBER.into()),
            FieldKind::Integer => {
                let n = as_integer(&value).ok_or_else(|| INVALID_INTEGER.to_string())?;
                if n > i64::from(i32::MAX) {
                    return Err(format!(
                        "Ensure this value is less than or equal to {}.",
                        i32::MAX
                    ));
                }
                if n < i64::from(i32::MIN) {
                    return Err(format!(
                        "Ensure this value is greater than or equal to {}.",
                        i32::MIN
                    ));
                }
                Ok(Value::from(n))
            }
            FieldKind::Decimal {
                max_digits,
                decimal_places,
            } => {
                let n = as_number(&value).ok_or_else(|| INVALID_NUMBER.to_string())?;
                let scale = 10f64.powi(decimal_places as i32);
                let scaled = n * scale;
                if (scaled - scaled.round()).abs() > 1e-6 {
                    return Err(format!(
                        "Ensure that there are no more than {decimal_places} decimal places."
                    ));
                }
                if n.abs() >= 10f64.powi((max_digits - decimal_places) as i32) {
                    return Err(format!(
                        "Ensure that there are no more than {max_digits} digits in total."
                    ));
                }
                Ok(Value::from(scaled.round() / scale))
            }
            FieldKind::Date => value
                .as_str()
                .and_then(parse_date)
                .map(|d| Value::String(format_date(d)))
                .ok_or_else(|| INVALID_DATE.into()),
            FieldKind::Choice(options) => match value.as_str() {
                Some(s) if options.contains(&s) => Ok(value),
                Some(s) => Err(format!("\"{s}\" is not a valid choice.")),
                None => Err(format!("\"{value}\" is not a valid choice.")),
            },
        }
    }

    fn coerce_text(&self, value: Value, max_len: Option<usize>) -> Result<Value, String> {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Err("Not a valid string.".into()),
        };
        if text.is_empty() && !self.allow_blank {
            return Err(NOT_BLANK.into());
        }
        if let Some(max) = max_len {
            if text.chars().count() > max {
                return Err(format!(
                    "Ensure this field has no more than {max} characters."
                ));
            }
        }
        Ok(Value::String(text))
    }

    fn check_bound(&self, value: &Value) -> Result<(), String> {
        let Some(n) = value.as_f64() else {
            return Ok(());
        };
        match self.bound {
            Bound::Any => Ok(()),
            Bound::Positive(msg) if n <= 0.0 => Err(msg.into()),
            Bound::NonNegative(msg) if n < 0.0 => Err(msg.into()),
            Bound::AtLeast(min, msg) if n < min as f64 => Err(msg.into()),
            _ => Ok(()),
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    if let Some(s) = value.as_str() {
        if let Ok(i) = s.trim().parse::<i64>() {
            return Some(i);
        }
    }
    let n = as_number(value)?;
    (n.fract() == 0.0 && n.abs() < 9.0e15).then_some(n as i64)
}

/// Validate `payload` against `rules`.
///
/// With `base` present (update), omitted fields keep their stored values;
/// without it (create), omitted fields take the rule fallback or fail as
/// required. Keys that are not declared by a rule are dropped, so owner or
/// id fields in the payload never reach the store.
pub fn validate(
    rules: &[FieldRule],
    base: Option<&Map<String, Value>>,
    payload: &Map<String, Value>,
) -> Result<Map<String, Value>, FieldErrors> {
    let mut errors = FieldErrors::default();
    let mut merged = Map::new();

    for rule in rules {
        let candidate = match payload.get(rule.name) {
            Some(v) => Some(v.clone()),
            None => base.and_then(|b| b.get(rule.name).cloned()),
        };
        match rule.check(candidate) {
            Ok(v) => {
                merged.insert(rule.name.to_string(), v);
            }
            Err(msg) => errors.add(rule.name, msg),
        }
    }

    errors.into_result(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: &[FieldRule] = &[
        FieldRule::text("title", 10),
        FieldRule::long_text("description").blank(),
        FieldRule::number("target").positive("Target value must be greater than 0"),
        FieldRule::number("current")
            .non_negative("Current value cannot be negative")
            .or(Fallback::Zero),
        FieldRule::integer("sets").at_least(1, "Ensure this value is greater than or equal to 1."),
        FieldRule::decimal("weight", 6, 2).optional(),
        FieldRule::date("day"),
        FieldRule::choice("status", &["open", "closed"]).or(Fallback::Text("open")),
    ];

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    fn valid_payload() -> Map<String, Value> {
        obj(json!({
            "title": "Run",
            "target": 5,
            "sets": 3,
            "day": "2024-03-01"
        }))
    }

    #[test]
    fn applies_fallbacks_on_create() {
        let out = validate(RULES, None, &valid_payload()).expect("valid");
        assert_eq!(out["description"], json!(""));
        assert_eq!(out["current"], json!(0));
        assert_eq!(out["weight"], Value::Null);
        assert_eq!(out["status"], json!("open"));
    }

    #[test]
    fn reports_every_failing_field() {
        let payload = obj(json!({
            "title": "",
            "target": 0,
            "current": -1,
            "sets": 0,
            "day": "01/03/2024",
            "status": "archived"
        }));
        let errors = validate(RULES, None, &payload).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["current", "day", "sets", "status", "target", "title"]
        );
        assert_eq!(
            errors.get("target").unwrap(),
            &["Target value must be greater than 0".to_string()]
        );
        assert_eq!(
            errors.get("status").unwrap(),
            &["\"archived\" is not a valid choice.".to_string()]
        );
    }

    #[test]
    fn missing_required_fields_on_create() {
        let errors = validate(RULES, None, &Map::new()).unwrap_err();
        for field in ["title", "target", "sets", "day"] {
            assert_eq!(errors.get(field).unwrap(), &[REQUIRED.to_string()]);
        }
        assert!(errors.get("description").is_none());
    }

    #[test]
    fn positive_bound_is_strict() {
        let mut payload = valid_payload();
        payload.insert("target".into(), json!(-3));
        assert!(validate(RULES, None, &payload).is_err());
        payload.insert("target".into(), json!(0.0001));
        assert!(validate(RULES, None, &payload).is_ok());
    }

    #[test]
    fn coerces_numeric_strings() {
        let mut payload = valid_payload();
        payload.insert("target".into(), json!("12.5"));
        payload.insert("sets".into(), json!("4"));
        payload.insert("weight".into(), json!(3.0));
        let out = validate(RULES, None, &payload).expect("valid");
        assert_eq!(out["target"], json!(12.5));
        assert_eq!(out["sets"], json!(4));
        assert_eq!(out["weight"], json!(3.0));
    }

    #[test]
    fn rejects_non_integral_integer() {
        let mut payload = valid_payload();
        payload.insert("sets".into(), json!(2.5));
        let errors = validate(RULES, None, &payload).unwrap_err();
        assert_eq!(errors.get("sets").unwrap(), &[INVALID_INTEGER.to_string()]);
    }

    #[test]
    fn decimal_precision_limits() {
        let mut payload = valid_payload();
        payload.insert("weight".into(), json!(10.125));
        let errors = validate(RULES, None, &payload).unwrap_err();
        assert!(errors.get("weight").unwrap()[0].contains("decimal places"));

        payload.insert("weight".into(), json!(10000));
        let errors = validate(RULES, None, &payload).unwrap_err();
        assert!(errors.get("weight").unwrap()[0].contains("6 digits"));

        payload.insert("weight".into(), json!(9999.99));
        assert!(validate(RULES, None, &payload).is_ok());
    }

    #[test]
    fn text_is_trimmed_and_length_checked() {
        let mut payload = valid_payload();
        payload.insert("title".into(), json!("  Run  "));
        let out = validate(RULES, None, &payload).expect("valid");
        assert_eq!(out["title"], json!("Run"));

        payload.insert("title".into(), json!("a".repeat(11)));
        let errors = validate(RULES, None, &payload).unwrap_err();
        assert_eq!(
            errors.get("title").unwrap(),
            &["Ensure this field has no more than 10 characters.".to_string()]
        );
    }

    #[test]
    fn booleans_are_not_text() {
        let mut payload = valid_payload();
        payload.insert("title".into(), json!(true));
        let errors = validate(RULES, None, &payload).unwrap_err();
        assert_eq!(
            errors.get("title").unwrap(),
            &["Not a valid string.".to_string()]
        );

        payload.insert("title".into(), json!(42));
        let out = validate(RULES, None, &payload).expect("valid");
        assert_eq!(out["title"], json!("42"));
    }

    #[test]
    fn null_rejected_unless_nullable() {
        let mut payload = valid_payload();
        payload.insert("title".into(), Value::Null);
        payload.insert("weight".into(), Value::Null);
        let errors = validate(RULES, None, &payload).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), &[NOT_NULL.to_string()]);
        assert!(errors.get("weight").is_none());
    }

    #[test]
    fn update_merges_over_base_and_drops_unknown_keys() {
        let base = validate(RULES, None, &valid_payload()).expect("valid");
        let patch = obj(json!({ "current": 2, "user": "someone-else", "id": 7 }));
        let out = validate(RULES, Some(&base), &patch).expect("valid");
        assert_eq!(out["title"], json!("Run"));
        assert_eq!(out["target"], json!(5.0));
        assert_eq!(out["current"], json!(2.0));
        assert!(!out.contains_key("user"));
        assert!(!out.contains_key("id"));
    }

    #[test]
    fn update_does_not_reapply_fallbacks() {
        let mut payload = valid_payload();
        payload.insert("status".into(), json!("closed"));
        let base = validate(RULES, None, &payload).expect("valid");
        let out = validate(RULES, Some(&base), &Map::new()).expect("valid");
        assert_eq!(out["status"], json!("closed"));
    }

    #[test]
    fn date_round_trips_through_helpers() {
        let d = parse_date("2024-02-29").expect("leap day");
        assert_eq!(format_date(d), "2024-02-29");
        assert!(parse_date("2023-02-29").is_none());
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("not-an-email"));
        let rules = [FieldRule::email("email").blank()];
        let errors = validate(&rules, None, &obj(json!({ "email": "nope" }))).unwrap_err();
        assert_eq!(errors.get("email").unwrap(), &[INVALID_EMAIL.to_string()]);
        assert!(validate(&rules, None, &Map::new()).is_ok());
    }
}
