//! Links: the transitions a hypermedia document offers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::http::HttpMethod;

/// The verb a link is followed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Action {
    pub fn method(&self) -> HttpMethod {
        match self {
            Action::Get => HttpMethod::Get,
            Action::Post => HttpMethod::Post,
            Action::Put => HttpMethod::Put,
            Action::Patch => HttpMethod::Patch,
            Action::Delete => HttpMethod::Delete,
        }
    }

    /// Where a parameter goes when no field declares its location.
    pub fn default_location(&self) -> Location {
        match self {
            Action::Get | Action::Delete => Location::Query,
            Action::Post | Action::Put | Action::Patch => Location::Form,
        }
    }
}

/// Parses an action name case-insensitively; the empty string means `get`.
impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "get" => Ok(Action::Get),
            "post" => Ok(Action::Post),
            "put" => Ok(Action::Put),
            "patch" => Ok(Action::Patch),
            "delete" => Ok(Action::Delete),
            other => Err(format!("unknown action {other:?}")),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method().as_str().to_ascii_lowercase())
    }
}

/// How a parameter value is encoded into the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Query,
    Form,
    Path,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    pub location: Location,
}

impl Field {
    pub fn new(name: &str, location: Location) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            location,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// One possible state transition. Immutable once built.
///
/// The URL may carry `{name}` placeholders that `path` fields fill in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLink")]
pub struct Link {
    url: String,
    action: Action,
    fields: Vec<Field>,
}

/// Serialized link whose fields may omit their location.
#[derive(Deserialize)]
struct RawLink {
    url: String,
    #[serde(default)]
    action: Action,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    location: Option<Location>,
}

impl From<RawLink> for Link {
    fn from(raw: RawLink) -> Self {
        let action = raw.action;
        let fields = raw
            .fields
            .into_iter()
            .map(|field| Field {
                name: field.name,
                required: field.required,
                location: field.location.unwrap_or_else(|| action.default_location()),
            })
            .collect();
        Self {
            url: raw.url,
            action,
            fields,
        }
    }
}

impl Link {
    pub fn new(url: &str, action: Action) -> Self {
        Self {
            url: url.to_string(),
            action,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(url: &str, action: Action, fields: Vec<Field>) -> Self {
        Self {
            url: url.to_string(),
            action,
            fields,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The declared location of `name`, or the action's default for
    /// undeclared parameters.
    pub fn location_of(&self, name: &str) -> Location {
        self.field(name)
            .map(|field| field.location)
            .unwrap_or_else(|| self.action.default_location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("POST".parse::<Action>().unwrap(), Action::Post);
        assert_eq!("Patch".parse::<Action>().unwrap(), Action::Patch);
        assert_eq!("".parse::<Action>().unwrap(), Action::Get);
        assert!("head".parse::<Action>().is_err());
    }

    #[test]
    fn action_maps_to_http_method() {
        assert_eq!(Action::Get.method(), HttpMethod::Get);
        assert_eq!(Action::Delete.method(), HttpMethod::Delete);
        assert_eq!(Action::Put.to_string(), "put");
    }

    #[test]
    fn undeclared_parameters_follow_the_action() {
        let get = Link::new("http://example.org/", Action::Get);
        assert_eq!(get.location_of("q"), Location::Query);

        let post = Link::new("http://example.org/", Action::Post);
        assert_eq!(post.location_of("title"), Location::Form);
    }

    #[test]
    fn declared_fields_keep_their_location() {
        let link = Link::with_fields(
            "http://example.org/users/{id}/",
            Action::Put,
            vec![Field::new("id", Location::Path).required()],
        );
        assert_eq!(link.location_of("id"), Location::Path);
        assert!(link.field("id").unwrap().required);
        assert!(link.field("missing").is_none());
    }

    #[test]
    fn deserialized_fields_infer_missing_location() {
        let link: Link = serde_json::from_str(
            r#"{"url":"http://example.org/","action":"post","fields":[{"name":"text"},{"name":"id","location":"path"}]}"#,
        )
        .unwrap();
        assert_eq!(link.location_of("text"), Location::Form);
        assert_eq!(link.location_of("id"), Location::Path);

        let link: Link =
            serde_json::from_str(r#"{"url":"http://example.org/","fields":[{"name":"q","required":true}]}"#)
                .unwrap();
        assert_eq!(link.location_of("q"), Location::Query);
        assert!(link.field("q").unwrap().required);
    }

    #[test]
    fn link_deserializes_with_defaults() {
        let link: Link = serde_json::from_str(r#"{"url":"http://example.org/"}"#).unwrap();
        assert_eq!(link.action(), Action::Get);
        assert!(link.fields().is_empty());
    }
}
