// attribute values are kept as JSON values so they round-trip through the document unchanged
use serde_json::{Number, Value};

// used to print out readable forms of a data type
use std::fmt;

/// How untyped external input is turned into the in-memory type of a
/// declared field. Every declared field has exactly one coercion, and the
/// coercion also determines the field's default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    Text,
    Integer,
    Float,
    List,
}

impl Coercion {
    pub fn data_type(&self) -> &'static str {
        match self {
            Coercion::Text => "str",
            Coercion::Integer => "int",
            Coercion::Float => "float",
            Coercion::List => "list",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            Coercion::Text => Value::String(String::new()),
            Coercion::Integer => Value::from(0_i64),
            Coercion::Float => float(0.0).unwrap_or(Value::Null),
            Coercion::List => Value::Array(Vec::new()),
        }
    }

    /// Coerces an already typed value. `None` means the value cannot be cast.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            Coercion::Text => Some(Value::String(match value {
                Value::String(s) => s.clone(),
                other => Repr(other).to_string(),
            })),
            Coercion::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
                Value::Number(n) => n.as_f64().and_then(truncate),
                Value::String(s) => integer(s.trim()),
                Value::Bool(b) => Some(Value::from(*b as i64)),
                _ => None,
            },
            Coercion::Float => match value {
                Value::Number(n) => n.as_f64().and_then(float),
                Value::String(s) => s.trim().parse::<f64>().ok().and_then(float),
                Value::Bool(b) => float(if *b { 1.0 } else { 0.0 }),
                _ => None,
            },
            Coercion::List => match value {
                Value::Array(_) => Some(value.clone()),
                Value::String(s) => match serde_json::from_str::<Value>(&s.replace('\'', "\"")) {
                    Ok(list @ Value::Array(_)) => Some(list),
                    _ => None,
                },
                _ => None,
            },
        }
    }

    pub fn coerce_text(&self, text: &str) -> Option<Value> {
        self.coerce(&Value::String(text.to_string()))
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.data_type())
    }
}

fn float(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

// integers past i64::MAX still fit a u64
fn integer(text: &str) -> Option<Value> {
    match text.parse::<i64>() {
        Ok(i) => Some(Value::from(i)),
        Err(_) => text.parse::<u64>().ok().map(Value::from),
    }
}

fn truncate(f: f64) -> Option<Value> {
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(Value::from(f.trunc() as i64))
    } else {
        None
    }
}

/// Fallback typing for unquoted input on attributes without a declared
/// coercion: a decimal point means float, otherwise integer, and text that
/// does not parse stays text.
pub fn infer(text: &str) -> Value {
    let inferred = if text.contains('.') {
        text.parse::<f64>().ok().and_then(float)
    } else {
        integer(text)
    };
    inferred.unwrap_or_else(|| Value::String(text.to_string()))
}

/// Dict-style rendering of a value, as used in the string form of entities.
pub struct Repr<'v>(pub &'v Value);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() => write!(f, "{:?}", x),
                _ => write!(f, "{}", n),
            },
            Value::String(s) => write!(f, "{}", quote(s)),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Repr(item))?;
                }
                write!(f, "]")
            }
            Value::Object(map) => write_map(f, map.iter()),
        }
    }
}

fn write_map<'a, I>(f: &mut fmt::Formatter, entries: I) -> fmt::Result
where
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    write!(f, "{{")?;
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", quote(key), Repr(value))?;
    }
    write!(f, "}}")
}

/// Quotes text with single quotes, switching to double quotes when the text
/// holds a single quote but no double quote.
pub fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}

/// Renders a sequence of texts as a bracketed list of quoted strings.
pub fn quote_list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let quoted: Vec<String> = items.into_iter().map(|item| quote(item.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inference_prefers_float_on_decimal_point() {
        assert_eq!(infer("3.5"), json!(3.5));
        assert_eq!(infer("42"), json!(42));
        assert_eq!(infer("-7"), json!(-7));
        assert_eq!(infer("1.2.3"), json!("1.2.3"));
        assert_eq!(infer("abc"), json!("abc"));
        assert_eq!(infer("12345678901234567890"), json!(12345678901234567890_u64));
        assert_eq!(infer("123456789012345678901234"), json!("123456789012345678901234"));
    }

    #[test]
    fn declared_coercions() {
        assert_eq!(Coercion::Integer.coerce_text(" 12 "), Some(json!(12)));
        assert_eq!(Coercion::Integer.coerce_text("1.5"), None);
        assert_eq!(Coercion::Integer.coerce(&json!(3.9)), Some(json!(3)));
        assert_eq!(Coercion::Float.coerce_text("2"), Some(json!(2.0)));
        assert_eq!(Coercion::Text.coerce(&json!(5)), Some(json!("5")));
        assert_eq!(Coercion::List.coerce_text("['a', 'b']"), Some(json!(["a", "b"])));
        assert_eq!(Coercion::List.coerce_text("a"), None);
    }

    #[test]
    fn defaults_follow_coercion() {
        assert_eq!(Coercion::Text.default_value(), json!(""));
        assert_eq!(Coercion::Integer.default_value(), json!(0));
        assert_eq!(Coercion::Float.default_value(), json!(0.0));
        assert_eq!(Coercion::List.default_value(), json!([]));
    }

    #[test]
    fn repr_rendering() {
        assert_eq!(Repr(&json!("")).to_string(), "''");
        assert_eq!(Repr(&json!(0.0)).to_string(), "0.0");
        assert_eq!(Repr(&json!(7)).to_string(), "7");
        assert_eq!(Repr(&json!(["x", 1])).to_string(), "['x', 1]");
        assert_eq!(Repr(&json!({"a": true, "b": null})).to_string(), "{'a': True, 'b': None}");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote("say \"it's\""), "'say \"it\\'s\"'");
        assert_eq!(quote_list(Vec::<String>::new()), "[]");
    }
}
