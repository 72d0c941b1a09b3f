use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped caller input, usually decoded from a URL query string.
///
/// Values are strings, numbers, booleans, arrays of strings or nested
/// objects (from bracket keys such as `price[gt]=10`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuery(Map<String, Value>);

enum KeySegment {
    Field(String),
    Push,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `a=1&a=2&b[gt]=3&c[]=x` into
    /// `{a: ["1", "2"], b: {gt: "3"}, c: ["x"]}`.
    pub fn from_query_string(query: &str) -> Self {
        let mut raw = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            let (head, segments) = split_key(&key);
            assign(&mut raw.0, head, &segments, value.into_owned());
        }
        raw
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for RawQuery {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RawQuery {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Split `a[b][]` into `a` and `[Field(b), Push]`. Keys with unbalanced
/// brackets are kept whole.
fn split_key(key: &str) -> (&str, Vec<KeySegment>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 {
        return (key, Vec::new());
    }

    let head = &key[..open];
    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        let name = &inner[..close];
        if name.is_empty() || name.bytes().all(|b| b.is_ascii_digit()) {
            segments.push(KeySegment::Push);
        } else {
            segments.push(KeySegment::Field(name.to_string()));
        }
        rest = &inner[close + 1..];
    }

    if !rest.is_empty() {
        return (key, Vec::new());
    }
    (head, segments)
}

fn assign(target: &mut Map<String, Value>, key: &str, rest: &[KeySegment], value: String) {
    match rest.split_first() {
        None => match target.get_mut(key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, Value::String(value)]);
            }
            None => {
                target.insert(key.to_string(), Value::String(value));
            }
        },
        Some((KeySegment::Push, tail)) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !slot.is_array() {
                let previous = slot.take();
                *slot = Value::Array(vec![previous]);
            }
            let Value::Array(items) = slot else {
                return;
            };
            if tail.is_empty() {
                items.push(Value::String(value));
            } else {
                let mut nested = Map::new();
                if let Some((KeySegment::Field(name), deeper)) = tail.split_first() {
                    assign(&mut nested, name, deeper, value);
                }
                items.push(Value::Object(nested));
            }
        }
        Some((KeySegment::Field(name), tail)) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(nested) = slot {
                assign(nested, name, tail, value);
            }
        }
    }
}
