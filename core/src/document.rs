//! Decoded response bodies.
//!
//! # Design
//! A body whose top-level object carries `"_type": "document"` becomes a
//! `Document`. Nested `document` and `link` markers inside it are decoded
//! recursively into `Element`s. Any other body is returned untouched as plain
//! data. Relative URLs are resolved against the document's own URL, which
//! falls back to the response's effective URL.

use serde_json::{Map, Value};
use url::Url;

use crate::error::DecodeError;
use crate::link::{Action, Field, Link, Location};

const TYPE_KEY: &str = "_type";
const META_KEY: &str = "_meta";

/// The result of a transition with a non-empty body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Document(Document),
    Data(Value),
}

impl Decoded {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Decoded::Document(doc) => Some(doc),
            Decoded::Data(_) => None,
        }
    }

    /// Marker-free JSON view of the result.
    pub fn to_value(&self) -> Value {
        match self {
            Decoded::Document(doc) => doc.to_value(),
            Decoded::Data(value) => value.clone(),
        }
    }
}

/// A hypermedia document root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub content: Vec<(String, Element)>,
}

impl Document {
    pub fn get(&self, key: &str) -> Option<&Element> {
        self.content
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, element)| element)
    }

    /// Links directly contained in this document.
    pub fn links(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.content.iter().filter_map(|(name, element)| match element {
            Element::Link(link) => Some((name.as_str(), link)),
            _ => None,
        })
    }

    /// The content as a JSON object, without document metadata.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.content
                .iter()
                .map(|(name, element)| (name.clone(), element.to_value()))
                .collect(),
        )
    }
}

/// A node inside a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Document(Document),
    Link(Link),
    Object(Vec<(String, Element)>),
    Array(Vec<Element>),
    /// A string, number, boolean or null.
    Value(Value),
}

impl Element {
    pub fn to_value(&self) -> Value {
        match self {
            Element::Document(doc) => doc.to_value(),
            Element::Link(link) => serde_json::to_value(link).unwrap_or(Value::Null),
            Element::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(name, element)| (name.clone(), element.to_value()))
                    .collect(),
            ),
            Element::Array(items) => Value::Array(items.iter().map(Element::to_value).collect()),
            Element::Value(value) => value.clone(),
        }
    }
}

/// Decode a parsed body. `base_url` is the response's effective URL.
pub fn decode(value: Value, base_url: &str) -> Result<Decoded, DecodeError> {
    match value {
        Value::Object(map) if marker(&map) == Some("document") => {
            log::trace!("decoding document body");
            Ok(Decoded::Document(decode_document(map, base_url)?))
        }
        other => {
            log::trace!("decoding plain data body");
            Ok(Decoded::Data(other))
        }
    }
}

fn marker(map: &Map<String, Value>) -> Option<&str> {
    map.get(TYPE_KEY).and_then(Value::as_str)
}

fn decode_document(mut map: Map<String, Value>, base_url: &str) -> Result<Document, DecodeError> {
    map.remove(TYPE_KEY);
    let meta = match map.remove(META_KEY) {
        Some(Value::Object(meta)) => meta,
        _ => Map::new(),
    };
    let url = match meta.get("url").and_then(Value::as_str) {
        Some(url) => resolve_url(base_url, url),
        None => base_url.to_string(),
    };
    let title = meta
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let content = decode_entries(map, &url)?;
    Ok(Document {
        url,
        title,
        content,
    })
}

fn decode_entries(
    map: Map<String, Value>,
    base_url: &str,
) -> Result<Vec<(String, Element)>, DecodeError> {
    map.into_iter()
        .map(|(key, value)| Ok((unescape_key(key), decode_element(value, base_url)?)))
        .collect()
}

fn decode_element(value: Value, base_url: &str) -> Result<Element, DecodeError> {
    match value {
        Value::Object(map) => match marker(&map) {
            Some("document") => Ok(Element::Document(decode_document(map, base_url)?)),
            Some("link") => Ok(Element::Link(decode_link(map, base_url)?)),
            _ => Ok(Element::Object(decode_entries(map, base_url)?)),
        },
        Value::Array(items) => Ok(Element::Array(
            items
                .into_iter()
                .map(|item| decode_element(item, base_url))
                .collect::<Result<_, _>>()?,
        )),
        primitive => Ok(Element::Value(primitive)),
    }
}

fn decode_link(map: Map<String, Value>, base_url: &str) -> Result<Link, DecodeError> {
    let url = map
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::InvalidLink("missing url".to_string()))?;
    let action: Action = map
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(DecodeError::InvalidLink)?;

    let fields = match map.get("fields") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| decode_field(item, action))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(DecodeError::InvalidLink("fields must be an array".to_string())),
    };

    Ok(Link::with_fields(&resolve_url(base_url, url), action, fields))
}

fn decode_field(item: &Value, action: Action) -> Result<Field, DecodeError> {
    // A bare string is shorthand for an optional field at the default location.
    if let Some(name) = item.as_str() {
        return Ok(Field::new(name, action.default_location()));
    }
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::InvalidLink("field without a name".to_string()))?;
    let location = match item.get("location").and_then(Value::as_str) {
        None | Some("") => action.default_location(),
        Some(raw) => serde_json::from_value::<Location>(Value::String(raw.to_string()))
            .map_err(|_| DecodeError::InvalidLink(format!("unknown field location {raw:?}")))?,
    };
    let required = item.get("required").and_then(Value::as_bool).unwrap_or(false);
    Ok(Field {
        name: name.to_string(),
        required,
        location,
    })
}

/// Keys that start with an underscore are escaped with a second one so they
/// cannot collide with markers.
fn unescape_key(key: String) -> String {
    match key.strip_prefix("__") {
        Some(rest) => format!("_{rest}"),
        None => key,
    }
}

/// Joins `url` onto `base`. Literal template placeholders such as `{id}`
/// survive the join unescaped; braces the server percent-encoded stay encoded.
fn resolve_url(base: &str, url: &str) -> String {
    let template = Template::mask(url, base);
    match Url::parse(base).and_then(|base| base.join(&template.masked)) {
        Ok(joined) => template.unmask(joined.as_str()),
        Err(_) => url.to_string(),
    }
}

/// A URL with each `{name}` placeholder swapped for a token that `Url::join`
/// leaves untouched.
struct Template<'a> {
    masked: String,
    marker: String,
    placeholders: Vec<&'a str>,
}

impl<'a> Template<'a> {
    fn mask(url: &'a str, base: &str) -> Self {
        let mut marker = String::from("tpl");
        while url.contains(&marker) || base.contains(&marker) {
            marker.push('x');
        }

        let mut masked = String::with_capacity(url.len());
        let mut placeholders = Vec::new();
        let mut rest = url;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            masked.push_str(&rest[..start]);
            masked.push_str(&format!("{marker}{}{marker}", placeholders.len()));
            placeholders.push(&rest[start..=start + len]);
            rest = &rest[start + len + 1..];
        }
        masked.push_str(rest);

        Self {
            masked,
            marker,
            placeholders,
        }
    }

    fn unmask(&self, joined: &str) -> String {
        let mut out = joined.to_string();
        for (i, placeholder) in self.placeholders.iter().enumerate() {
            let token = format!("{marker}{i}{marker}", marker = self.marker);
            out = out.replace(&token, placeholder);
        }
        out
    }
}
