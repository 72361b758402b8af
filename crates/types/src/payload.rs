use serde_json::{Map, Value};

/// Open, untyped mapping carried by an envelope
pub type Payload = Map<String, Value>;

/// Clamp a score into `[0, 1]`. Non-finite input collapses to `0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Convert any JSON value into a payload
///
/// Objects are used as-is; anything else is wrapped as `{"value": ...}`.
pub fn to_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        Value::Null => Payload::new(),
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Permissive field accessors
///
/// Every accessor takes an explicit default and never fails: absent or
/// malformed fields silently resolve to the default.
pub trait PayloadExt {
    /// Raw field lookup
    fn field(&self, key: &str) -> Option<&Value>;

    /// Non-empty string field, if present
    fn text(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// String field or default
    fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// Finite numeric field, if present. Numeric strings are accepted.
    fn number(&self, key: &str) -> Option<f64> {
        let n = match self.field(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Numeric field or default
    fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    /// Score field clamped into `[0, 1]`
    fn unit_or(&self, key: &str, default: f64) -> f64 {
        clamp_unit(self.number_or(key, default))
    }

    /// Non-negative integer field or default. Fractions are truncated.
    fn count_or(&self, key: &str, default: u64) -> u64 {
        self.number(key)
            .filter(|n| *n >= 0.0)
            .map(|n| n.trunc() as u64)
            .unwrap_or(default)
    }

    /// Boolean field or default. Accepts `"true"`/`"false"` and numbers.
    fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.field(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                _ => default,
            },
            Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(default),
            _ => default,
        }
    }

    /// List of strings. A comma-separated string is split; non-string
    /// array elements are skipped.
    fn text_list(&self, key: &str) -> Vec<String> {
        match self.field(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nested object field, or an empty map
    fn object_or_empty(&self, key: &str) -> Payload {
        match self.field(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => Payload::new(),
        }
    }

    /// Array of nested objects. Non-object elements are skipped.
    fn object_list(&self, key: &str) -> Vec<Payload> {
        match self.field(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl PayloadExt for Payload {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}
