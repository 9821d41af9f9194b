//! Parameter schemas and argument coercion
//!
//! The Dialogue Driver is steered by natural language, so arguments arrive
//! loosely typed: numbers as strings, booleans as "yes", optional fields
//! omitted, unknown fields added. Validation turns that raw JSON into an
//! immutable [`ActionArgs`] record before any handler runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{Error, Result};

/// Placeholder written in place of secret argument values
pub const REDACTED: &str = "[redacted]";

/// Longest string value kept verbatim in log records
const MAX_LOGGED_CHARS: usize = 200;

/// Parameter names treated as secret even when not flagged
const SECRET_NAME_HINTS: &[&str] = &["password", "secret", "token", "api_key", "apikey"];

/// Declared type of an action parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ParamType {
    /// JSON Schema type name
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Phrase used in validation messages
    const fn expectation(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "a whole number",
            Self::Float => "a number",
            Self::Boolean => "true or false",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// A validated, typed argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ArgValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.clone()),
            Self::Int(i) => json!(i),
            Self::Float(f) => json!(f),
            Self::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Declaration of one action parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<ArgValue>,
    pub description: String,
    /// Value is redacted from logs and failure messages
    pub secret: bool,
}

impl ParamSpec {
    fn new(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: true,
            default: None,
            description: description.to_string(),
            secret: false,
        }
    }

    /// Required string parameter
    #[must_use]
    pub fn string(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::String, description)
    }

    /// Required integer parameter
    #[must_use]
    pub fn integer(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Integer, description)
    }

    /// Required float parameter
    #[must_use]
    pub fn float(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Float, description)
    }

    /// Required boolean parameter
    #[must_use]
    pub fn boolean(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Boolean, description)
    }

    /// Mark the parameter optional
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional parameter with a value used when the caller omits it
    #[must_use]
    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Mark the parameter as carrying a secret
    #[must_use]
    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Whether values of this parameter must never be logged
    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.secret
            || SECRET_NAME_HINTS
                .iter()
                .any(|hint| self.name.to_ascii_lowercase().contains(hint))
    }

    /// Coerce one raw JSON value to this parameter's type
    fn coerce(&self, raw: &Value) -> Result<ArgValue> {
        let coerced = match self.param_type {
            ParamType::String => coerce_string(raw),
            ParamType::Integer => coerce_integer(raw),
            ParamType::Float => coerce_float(raw),
            ParamType::Boolean => coerce_boolean(raw),
        };

        coerced.ok_or_else(|| {
            let shown = if self.is_secret() {
                REDACTED.to_string()
            } else {
                raw.to_string()
            };
            Error::invalid(
                &self.name,
                format!("expected {}, got {shown}", self.param_type.expectation()),
            )
        })
    }
}

fn coerce_string(raw: &Value) -> Option<ArgValue> {
    match raw {
        Value::String(s) => Some(ArgValue::Str(s.clone())),
        Value::Number(n) => Some(ArgValue::Str(n.to_string())),
        Value::Bool(b) => Some(ArgValue::Str(b.to_string())),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; stay strictly inside the range
    let in_range = f > -9.223_372_036_854_775e18 && f < 9.223_372_036_854_775e18;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn coerce_integer(raw: &Value) -> Option<ArgValue> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .map(ArgValue::Int),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .map(ArgValue::Int)
        }
        _ => None,
    }
}

fn coerce_float(raw: &Value) -> Option<ArgValue> {
    match raw {
        Value::Number(n) => n.as_f64().map(ArgValue::Float),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(ArgValue::Float),
        _ => None,
    }
}

fn coerce_boolean(raw: &Value) -> Option<ArgValue> {
    match raw {
        Value::Bool(b) => Some(ArgValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(ArgValue::Bool(false)),
            Some(1) => Some(ArgValue::Bool(true)),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Some(ArgValue::Bool(true)),
            "false" | "no" | "n" | "off" | "0" => Some(ArgValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Validated, immutable arguments for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArgs {
    values: BTreeMap<String, ArgValue>,
}

impl ActionArgs {
    /// Validate raw JSON arguments against a parameter list
    ///
    /// `null` is treated as an empty object. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` naming the first offending parameter
    pub fn validate(params: &[ParamSpec], raw: &Value) -> Result<Self> {
        let empty = Map::new();
        let object = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(Error::invalid(
                    "arguments",
                    format!("expected a JSON object, got {}", json_kind(other)),
                ));
            }
        };

        let mut values = BTreeMap::new();
        for spec in params {
            match object.get(&spec.name) {
                Some(value) if !value.is_null() => {
                    values.insert(spec.name.clone(), spec.coerce(value)?);
                }
                _ if spec.required => {
                    return Err(Error::invalid(&spec.name, "is required"));
                }
                _ => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(Self { values })
    }

    /// Build arguments directly, bypassing validation
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = (String, ArgValue)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Raw value lookup
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// String argument, if present
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// String argument that validation guarantees to be present
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the argument is absent
    pub fn required_str(&self, name: &str) -> Result<&str> {
        self.str(name)
            .ok_or_else(|| Error::invalid(name, "is required"))
    }

    /// Optional string argument with surrounding whitespace removed;
    /// blank strings count as absent
    #[must_use]
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.str(name).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Integer argument, if present
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Float argument, if present
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Float(f)) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Some(ArgValue::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Boolean argument, if present
    #[must_use]
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Values of secret parameters, for scrubbing free text
    #[must_use]
    pub fn secret_values(&self, params: &[ParamSpec]) -> Vec<String> {
        params
            .iter()
            .filter(|spec| spec.is_secret())
            .filter_map(|spec| match self.values.get(&spec.name) {
                Some(ArgValue::Str(s)) if !s.is_empty() => Some(s.clone()),
                Some(ArgValue::Str(_)) | None => None,
                Some(other) => Some(other.to_json().to_string()),
            })
            .collect()
    }

    /// JSON view for log records: secrets replaced, long strings truncated
    #[must_use]
    pub fn redacted(&self, params: &[ParamSpec]) -> Value {
        let mut out = Map::new();
        for (name, value) in &self.values {
            let secret = params
                .iter()
                .find(|spec| &spec.name == name)
                .is_some_and(ParamSpec::is_secret);
            let shown = if secret {
                Value::String(REDACTED.to_string())
            } else {
                match value {
                    ArgValue::Str(s) => Value::String(truncate_for_log(s)),
                    other => other.to_json(),
                }
            };
            out.insert(name.clone(), shown);
        }
        Value::Object(out)
    }
}

/// Redact the raw (unvalidated) argument object for log records
#[must_use]
pub fn redact_raw(params: &[ParamSpec], raw: &Value) -> Value {
    let Value::Object(map) = raw else {
        return Value::String(truncate_for_log(&raw.to_string()));
    };

    let mut out = Map::new();
    for (name, value) in map {
        let secret = params
            .iter()
            .find(|spec| &spec.name == name)
            .map_or_else(
                || SECRET_NAME_HINTS.iter().any(|h| name.to_ascii_lowercase().contains(h)),
                ParamSpec::is_secret,
            );
        let shown = if secret {
            Value::String(REDACTED.to_string())
        } else if let Value::String(s) = value {
            Value::String(truncate_for_log(s))
        } else {
            value.clone()
        };
        out.insert(name.clone(), shown);
    }
    Value::Object(out)
}

/// Replace every occurrence of each secret in `text`
#[must_use]
pub fn scrub(text: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
}

/// JSON Schema object describing a parameter list
#[must_use]
pub fn json_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for spec in params {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(spec.param_type.json_type()));
        prop.insert("description".into(), json!(spec.description));
        if let Some(default) = &spec.default {
            prop.insert("default".into(), default.to_json());
        }
        properties.insert(spec.name.clone(), Value::Object(prop));
        if spec.required {
            required.push(json!(spec.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn truncate_for_log(s: &str) -> String {
    if s.chars().count() <= MAX_LOGGED_CHARS {
        return s.to_string();
    }
    let head: String = s.chars().take(MAX_LOGGED_CHARS).collect();
    format!("{head}...[truncated]")
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("city", "City name"),
            ParamSpec::integer("count", "How many").with_default(3_i64),
            ParamSpec::boolean("verbose", "Detail").optional(),
        ]
    }

    #[test]
    fn coerces_numeric_string_to_integer() {
        let args = ActionArgs::validate(&params(), &json!({"city": "Paris", "count": "42"})).unwrap();
        assert_eq!(args.integer("count"), Some(42));
    }

    #[test]
    fn coerces_whole_float_to_integer() {
        let args = ActionArgs::validate(&params(), &json!({"city": "Paris", "count": 7.0})).unwrap();
        assert_eq!(args.integer("count"), Some(7));
    }

    #[test]
    fn rejects_fractional_integer_naming_param() {
        let err = ActionArgs::validate(&params(), &json!({"city": "Paris", "count": "4.5"})).unwrap_err();
        match err {
            Error::Validation { param, reason } => {
                assert_eq!(param, "count");
                assert!(reason.contains("whole number"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_required_param_fails() {
        let err = ActionArgs::validate(&params(), &json!({})).unwrap_err();
        assert!(matches!(err, Error::Validation { ref param, .. } if param == "city"));
    }

    #[test]
    fn explicit_null_counts_as_missing() {
        let err = ActionArgs::validate(&params(), &json!({"city": null})).unwrap_err();
        assert!(matches!(err, Error::Validation { ref param, .. } if param == "city"));
    }

    #[test]
    fn defaults_fill_omitted_optionals() {
        let args = ActionArgs::validate(&params(), &json!({"city": "Oslo"})).unwrap();
        assert_eq!(args.integer("count"), Some(3));
        assert_eq!(args.boolean("verbose"), None);
    }

    #[test]
    fn unknown_arguments_are_ignored() {
        let args =
            ActionArgs::validate(&params(), &json!({"city": "Oslo", "mood": "sunny"})).unwrap();
        assert!(args.get("mood").is_none());
    }

    #[test]
    fn null_arguments_mean_empty_object() {
        let args = ActionArgs::validate(&[], &Value::Null).unwrap();
        assert_eq!(args, ActionArgs::default());
    }

    #[test]
    fn non_object_arguments_fail() {
        let err = ActionArgs::validate(&params(), &json!(["Oslo"])).unwrap_err();
        assert!(matches!(err, Error::Validation { ref param, .. } if param == "arguments"));
    }

    #[test]
    fn boolean_accepts_spoken_forms() {
        let args = ActionArgs::validate(&params(), &json!({"city": "x", "verbose": " Yes "})).unwrap();
        assert_eq!(args.boolean("verbose"), Some(true));
        let args = ActionArgs::validate(&params(), &json!({"city": "x", "verbose": 0})).unwrap();
        assert_eq!(args.boolean("verbose"), Some(false));
    }

    #[test]
    fn numbers_coerce_to_strings() {
        let args = ActionArgs::validate(&params(), &json!({"city": 1984})).unwrap();
        assert_eq!(args.str("city"), Some("1984"));
    }

    #[test]
    fn redacted_hides_secret_params() {
        let specs = vec![
            ParamSpec::string("user", "login"),
            ParamSpec::string("pin", "PIN code").secret(),
            ParamSpec::string("api_key", "key"),
        ];
        let args = ActionArgs::validate(
            &specs,
            &json!({"user": "ana", "pin": "4321", "api_key": "sk-1"}),
        )
        .unwrap();
        let shown = args.redacted(&specs);
        assert_eq!(shown["user"], "ana");
        assert_eq!(shown["pin"], REDACTED);
        assert_eq!(shown["api_key"], REDACTED);

        let secrets = args.secret_values(&specs);
        assert_eq!(scrub("pin 4321 rejected for sk-1", &secrets), "pin [redacted] rejected for [redacted]");
    }

    #[test]
    fn redacted_truncates_long_strings() {
        let specs = vec![ParamSpec::string("message", "body")];
        let long = "a".repeat(500);
        let args = ActionArgs::validate(&specs, &json!({"message": long})).unwrap();
        let shown = args.redacted(&specs);
        assert!(shown["message"].as_str().unwrap().ends_with("...[truncated]"));
    }

    #[test]
    fn json_schema_lists_required_and_defaults() {
        let schema = json_schema(&params());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["city"]));
        assert_eq!(schema["properties"]["count"]["type"], "integer");
        assert_eq!(schema["properties"]["count"]["default"], 3);
    }
}
