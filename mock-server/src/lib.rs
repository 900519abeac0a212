use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

/// Hypermedia echo service used to exercise a client transport end to end.
pub fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/echo",
            get(echo_query)
                .post(echo_body)
                .put(echo_body)
                .patch(echo_body)
                .delete(no_content),
        )
        .route("/echo/form", post(echo_form))
        .route("/headers", get(echo_headers))
        .route("/users/{id}", get(get_user))
        .route("/plain", get(plain))
        .route("/broken", get(broken))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn document(content: Map<String, Value>) -> Json<Value> {
    let mut doc = Map::new();
    doc.insert("_type".to_string(), json!("document"));
    doc.extend(content);
    Json(Value::Object(doc))
}

async fn root() -> Json<Value> {
    Json(json!({
        "_type": "document",
        "_meta": {"url": "/", "title": "Mock API"},
        "search": {
            "_type": "link",
            "url": "/echo",
            "action": "get",
            "fields": [{"name": "q", "location": "query"}]
        },
        "create": {
            "_type": "link",
            "url": "/echo",
            "action": "post",
            "fields": [{"name": "text", "required": true, "location": "form"}]
        },
        "user": {
            "_type": "link",
            "url": "/users/{id}",
            "fields": [{"name": "id", "required": true, "location": "path"}]
        },
        "remove": {"_type": "link", "url": "/echo", "action": "delete"}
    }))
}

async fn echo_query(Query(params): Query<BTreeMap<String, String>>) -> Json<Value> {
    document(params.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}

async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
    document(Map::from_iter([("data".to_string(), body)]))
}

async fn echo_form(Form(form): Form<BTreeMap<String, String>>) -> Json<Value> {
    let data = form.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
    document(Map::from_iter([("data".to_string(), Value::Object(data))]))
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null)
    };
    document(Map::from_iter([
        ("accept".to_string(), value(header::ACCEPT)),
        ("authorization".to_string(), value(header::AUTHORIZATION)),
        ("user_agent".to_string(), value(header::USER_AGENT)),
    ]))
}

async fn get_user(Path(id): Path<String>) -> Json<Value> {
    document(Map::from_iter([("id".to_string(), Value::String(id))]))
}

async fn plain() -> Json<Value> {
    Json(json!([1, 2, 3]))
}

async fn broken() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{\"_type\": \"document\",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_adds_marker() {
        let Json(doc) = document(Map::from_iter([("example".to_string(), json!(123))]));
        assert_eq!(doc, json!({"_type": "document", "example": 123}));
    }

    #[test]
    fn document_content_may_be_empty() {
        let Json(doc) = document(Map::new());
        assert_eq!(doc, json!({"_type": "document"}));
    }
}
