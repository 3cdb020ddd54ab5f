/*!
Generic JSON-equivalent values produced by the tokenizer.

This is the bridge between raw JSON syntax and the [`crate::mapper`] layer:
every scalar, list or map the tokenizer reads that isn't consumed lazily by
the streaming engine ends up as one of these variants, a `Kind`-style enum
(`Str`/`Num`/`Bool`/`Null`/`Map`/`Arr`) one level up from raw byte offsets.
*/

use std::collections::BTreeMap;

/// A JSON number, parsed into the narrowest lossless representation.
///
/// `read_number` in [`crate::tokenizer`] produces `I32` when the value is
/// mathematically an integer within `i32::MIN..=i32::MAX`, `I64` for wider
/// integers, and `F64` otherwise (fraction or exponent present, or the
/// integer doesn't fit in 64 bits).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::I32(n) => n as f64,
            Number::I64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::I32(n) => Some(n as i64),
            Number::I64(n) => Some(n),
            Number::F64(n) if n.fract() == 0.0 && n.is_finite() => Some(n as i64),
            Number::F64(_) => None,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::I32(n) => write!(f, "{n}"),
            Number::I64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

/// A generic, JSON-equivalent value: the output of the tokenizer before the
/// value mapper converts it to a user's target type.
///
/// Maps are insertion-ordered (a `Vec` of pairs, like the input), since JSON
/// doesn't require keys to be sorted or unique and member order matters for
/// the engine's ordering constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Element count for `List`/`Map`, used to enforce a member's
    /// `max_size`. `None` for scalars, which `max_size` doesn't apply to.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Render a short, human-readable form for error messages. Truncated so
    /// a multi-megabyte string doesn't blow up an error message.
    pub fn render_short(&self) -> String {
        const MAX: usize = 80;
        let rendered = match self {
            Value::String(s) => format!("{s:?}"),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::List(items) => format!("[{} item(s)]", items.len()),
            Value::Map(entries) => format!("{{{} member(s)}}", entries.len()),
        };
        if rendered.len() > MAX {
            format!("{}…", &rendered[..MAX])
        } else {
            rendered
        }
    }

    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => match n {
                Number::I32(n) => serde_json::Value::from(*n),
                Number::I64(n) => serde_json::Value::from(*n),
                Number::F64(n) => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => {
                let mut map = serde_json::Map::with_capacity(entries.len());
                for (k, v) in entries {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

/// A reusable ordered-map view used by a few places that want `BTreeMap`
/// ergonomics without committing `Value::Map` itself to sorted order.
pub fn to_sorted_map(entries: &[(String, Value)]) -> BTreeMap<&str, &Value> {
    entries.iter().map(|(k, v)| (k.as_str(), v)).collect()
}
