//! In-process mock of the content API used by the integration tests.
//!
//! Serves the documented endpoints under `/api` from in-memory post and tag
//! lists, records every request it sees and can be scripted to answer a
//! specific request with a canned status, or to answer slowly.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Form, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use blog_content::{AuthSession, BlogContent, ClientConfig};
use serde_json::{json, Value};

pub const VALID_TOKEN: &str = "token-123";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "secret";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    pub fn is(&self, method: Method, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

struct Scripted {
    method: Method,
    path: String,
    status: StatusCode,
    body: Value,
}

#[derive(Default)]
pub struct MockState {
    posts: Mutex<Vec<Value>>,
    tags: Mutex<Vec<Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    scripted: Mutex<Vec<Scripted>>,
    delays: Mutex<Vec<(String, Duration)>>,
    next_id: AtomicUsize,
}

impl MockState {
    pub fn add_tag(&self, id: &str, name: &str) {
        self.tags.lock().unwrap().push(json!({
            "id": id,
            "name": name,
            "description": null,
            "color_code": "#123456"
        }));
    }

    pub fn add_post(&self, post: Value) {
        self.posts.lock().unwrap().push(post);
    }

    pub fn tags(&self) -> Vec<Value> {
        self.tags.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<Value> {
        self.posts.lock().unwrap().clone()
    }

    /// Answer the next `method path` request with `status` and `body`.
    pub fn script(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.scripted.lock().unwrap().push(Scripted {
            method,
            path: path.to_string(),
            status,
            body,
        });
    }

    /// Delay every request whose `METHOD path?query` contains `pattern`.
    pub fn delay(&self, pattern: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .push((pattern.to_string(), delay));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn take_scripted(&self, method: &Method, path: &str) -> Option<Response> {
        let mut scripted = self.scripted.lock().unwrap();
        let index = scripted
            .iter()
            .position(|s| s.method == *method && s.path == path)?;
        let s = scripted.remove(index);
        Some(reply(s.status, s.body))
    }

    fn delay_for(&self, signature: &str) -> Option<Duration> {
        self.delays
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| signature.contains(pattern.as_str()))
            .map(|(_, delay)| *delay)
    }

    fn record(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: String,
    ) -> (String, HashMap<String, String>) {
        let path = uri
            .path()
            .strip_prefix("/api")
            .unwrap_or(uri.path())
            .to_string();
        let query = parse_query(uri.query().unwrap_or(""));
        let header_value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query: query.clone(),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            body,
        });
        (path, query)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/api/admin/auth/login", post(login))
            .fallback(dispatch)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
    }

    pub fn content(&self) -> BlogContent {
        BlogContent::new(self.config()).expect("valid config")
    }

    /// Client already holding a valid admin session.
    pub fn admin_content(&self) -> BlogContent {
        let content = self.content();
        content
            .session()
            .set(AuthSession::new(VALID_TOKEN, ADMIN_EMAIL));
        content
    }
}

/// A post record in the shape the backend returns.
pub fn post_json(id: &str, slug: &str, title: &str, status: &str, tags: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "slug": slug,
        "content": format!("# {}", title),
        "excerpt": null,
        "publication_dt": "2024-05-01T09:00:00Z",
        "reading_time": 4,
        "featured_image": null,
        "status": status,
        "tags": tags
            .iter()
            .enumerate()
            .map(|(i, name)| json!({ "id": format!("{}-tag-{}", id, i), "name": name }))
            .collect::<Vec<_>>()
    })
}

fn reply(status: StatusCode, body: Value) -> Response {
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, json!({ "detail": "Not found" }))
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.to_string();
            let value = parts.next().unwrap_or("").replace('+', " ");
            Some((key, value))
        })
        .collect()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", VALID_TOKEN))
}

async fn login(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let body = serde_json::to_string(&form).unwrap();
    let (path, _) = state.record(&method, &uri, &headers, body);
    if let Some(response) = state.take_scripted(&method, &path) {
        return response;
    }

    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    if username == Some(ADMIN_EMAIL) && password == Some(ADMIN_PASSWORD) {
        reply(StatusCode::OK, json!({ "access_token": VALID_TOKEN }))
    } else {
        reply(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Incorrect username or password" }),
        )
    }
}

async fn dispatch(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = String::from_utf8_lossy(&body).to_string();
    let (path, query) = state.record(&method, &uri, &headers, body.clone());

    let signature = format!("{} {}?{}", method, path, uri.query().unwrap_or(""));
    if let Some(delay) = state.delay_for(&signature) {
        tokio::time::sleep(delay).await;
    }

    if let Some(response) = state.take_scripted(&method, &path) {
        return response;
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    if segments.first() == Some(&"admin")
        && segments.get(1) != Some(&"auth")
        && !is_authorized(&headers)
    {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Not authenticated" }),
        );
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["blogs"]) => {
            let term = query.get("search_term").map(|t| t.to_lowercase());
            let items: Vec<Value> = state
                .posts()
                .into_iter()
                .filter(|p| match &term {
                    Some(term) => p["title"]
                        .as_str()
                        .map_or(false, |t| t.to_lowercase().contains(term)),
                    None => true,
                })
                .collect();
            reply(StatusCode::OK, json!({ "items": items }))
        }
        ("GET", ["blogs", slug]) => find_by(&state.posts(), "slug", slug)
            .map(|p| reply(StatusCode::OK, p))
            .unwrap_or_else(not_found),
        ("GET", ["admin", "blogs"]) => {
            reply(StatusCode::OK, json!({ "items": state.posts() }))
        }
        ("GET", ["admin", "blogs", id]) => find_by(&state.posts(), "id", id)
            .map(|p| reply(StatusCode::OK, p))
            .unwrap_or_else(not_found),
        ("POST", ["admin", "blogs"]) => {
            let slug = payload["slug"].as_str().unwrap_or("").to_string();
            if find_by(&state.posts(), "slug", &slug).is_some() {
                return reply(
                    StatusCode::CONFLICT,
                    json!({ "detail": "Blog with this slug already exists" }),
                );
            }
            let id = state.next_id("post");
            let post = post_from_payload(&state, &id, &payload);
            state.add_post(post.clone());
            reply(StatusCode::CREATED, post)
        }
        ("PUT", ["admin", "blogs", id]) => {
            let mut posts = state.posts.lock().unwrap();
            let Some(index) = posts.iter().position(|p| p["id"] == *id) else {
                return not_found();
            };
            let post = post_from_payload(&state, id, &payload);
            posts[index] = post.clone();
            reply(StatusCode::OK, post)
        }
        ("DELETE", ["admin", "blogs", id]) => {
            let mut posts = state.posts.lock().unwrap();
            let before = posts.len();
            posts.retain(|p| p["id"] != *id);
            if posts.len() == before {
                not_found()
            } else {
                reply(StatusCode::NO_CONTENT, Value::Null)
            }
        }
        ("GET", ["tags"]) => reply(StatusCode::OK, Value::Array(state.tags())),
        ("GET", ["admin", "tags", id]) => find_by(&state.tags(), "id", id)
            .map(|t| reply(StatusCode::OK, t))
            .unwrap_or_else(not_found),
        ("POST", ["admin", "tags"]) => {
            let tag = json!({
                "id": state.next_id("tag"),
                "name": payload["name"],
                "description": payload.get("description").cloned().unwrap_or(Value::Null),
                "color_code": payload["color_code"],
            });
            state.tags.lock().unwrap().push(tag.clone());
            reply(StatusCode::CREATED, tag)
        }
        ("PUT", ["admin", "tags", id]) => {
            let mut tags = state.tags.lock().unwrap();
            let Some(tag) = tags.iter_mut().find(|t| t["id"] == *id) else {
                return not_found();
            };
            tag["name"] = payload["name"].clone();
            tag["description"] = payload["description"].clone();
            tag["color_code"] = payload["color_code"].clone();
            reply(StatusCode::OK, tag.clone())
        }
        ("DELETE", ["admin", "tags", id]) => {
            let mut tags = state.tags.lock().unwrap();
            let before = tags.len();
            tags.retain(|t| t["id"] != *id);
            if tags.len() == before {
                not_found()
            } else {
                reply(StatusCode::NO_CONTENT, Value::Null)
            }
        }
        ("POST", ["admin", "auth", "logout"]) => reply(StatusCode::NO_CONTENT, Value::Null),
        _ => not_found(),
    }
}

fn find_by(items: &[Value], field: &str, value: &str) -> Option<Value> {
    items.iter().find(|item| item[field] == value).cloned()
}

fn post_from_payload(state: &MockState, id: &str, payload: &Value) -> Value {
    let tags = state.tags();
    let post_tags: Vec<Value> = payload["tag_ids"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|tag_id| tags.iter().find(|t| t["id"] == *tag_id).cloned())
                .collect()
        })
        .unwrap_or_default();

    json!({
        "id": id,
        "title": payload["title"],
        "slug": payload["slug"],
        "content": payload["content"],
        "excerpt": payload["excerpt"],
        "publication_dt": payload["publication_dt"],
        "reading_time": payload["reading_time"],
        "featured_image": payload["featured_image"],
        "status": payload["status"].as_str().map(str::to_uppercase),
        "tags": post_tags,
    })
}
