use {
    serde::{Deserialize, Deserializer, Serialize},
    serde_json::{Map, Value},
};

/// One message segment, `{ "type": ..., "data": { ... } }`.
///
/// Attributes are kept as a loose JSON map: platforms disagree on whether
/// ids are numbers or strings, and unknown segment kinds must survive a
/// parse so the codec can decide what to do with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,
}

impl Segment {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new("text").with("text", text.into())
    }

    pub fn image(file: impl Into<String>) -> Self {
        Self::new("image").with("file", file.into())
    }

    pub fn at(qq: impl Into<String>) -> Self {
        Self::new("at").with("qq", qq.into())
    }

    pub fn reply(id: impl Into<String>) -> Self {
        Self::new("reply").with("id", id.into())
    }

    pub fn record(file: impl Into<String>) -> Self {
        Self::new("record").with("file", file.into())
    }

    /// A forward-message node wrapping already-built segments.
    pub fn node(user_id: &str, nickname: &str, content: Vec<Segment>) -> Self {
        let content = content
            .into_iter()
            .map(|seg| serde_json::json!({ "type": seg.kind, "data": seg.data }))
            .collect::<Vec<_>>();
        Self::new("node")
            .with("user_id", user_id)
            .with("nickname", nickname)
            .with("content", content)
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// Attribute as a string slice (strings only).
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    /// Attribute stringified: strings as-is, numbers via `to_string`.
    pub fn attr_string(&self, key: &str) -> Option<String> {
        match self.attr(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
