//! In-process fake of the JSONPlaceholder backend.
//!
//! Serves seeded collections with the same quirks as the real service: writes
//! are echoed but never stored, a created post always gets id 101, and a PUT
//! against an id that does not exist fails with 500.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use restcontract::{HarnessConfig, ResourceKind, Session};
use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const JSON_MIME: &str = "application/json; charset=utf-8";

pub struct FakePlaceholder {
    server: MockServer,
}

impl FakePlaceholder {
    /// Start a fake with every resource kind seeded and routed.
    pub async fn start() -> Self {
        let fake = Self {
            server: MockServer::start().await,
        };
        for kind in ResourceKind::ALL {
            fake.mount_resource(kind).await;
        }
        fake
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::default().with_base_url(self.base_url());
        config.timeout_ms = 2_000;
        config
    }

    pub fn session(&self) -> Session {
        Session::new(&self.config()).expect("session for fake backend")
    }

    /// Answer `GET {request_path}` with `body`, ahead of the seeded routes.
    pub async fn override_get(&self, request_path: &str, status: u16, body: Value) {
        self.override_with(request_path, "GET", json_response(status, &body))
            .await;
    }

    pub async fn override_with(
        &self,
        request_path: &str,
        http_method: &str,
        template: ResponseTemplate,
    ) {
        Mock::given(method(http_method))
            .and(path(request_path))
            .respond_with(template)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answer `GET {request_path}` with the seeded body after `delay`.
    pub async fn delay_get(&self, request_path: &str, body: Value, delay: Duration) {
        self.override_with(request_path, "GET", json_response(200, &body).set_delay(delay))
            .await;
    }

    async fn mount_resource(&self, kind: ResourceKind) {
        let descriptor = kind.descriptor();
        let items = Arc::new(seed(kind));
        let base = descriptor.base_path;
        let item_route = format!("^{base}/[^/]+$");

        let list = Arc::clone(&items);
        Mock::given(method("GET"))
            .and(path(base))
            .respond_with(move |request: &Request| list_response(&list, request))
            .mount(&self.server)
            .await;

        let read = Arc::clone(&items);
        Mock::given(method("GET"))
            .and(path_regex(item_route.as_str()))
            .respond_with(move |request: &Request| match find(&read, request) {
                Some(item) => json_response(200, item),
                None => json_response(404, &json!({})),
            })
            .mount(&self.server)
            .await;

        let next_id = items.len() as i64 + 1;
        Mock::given(method("POST"))
            .and(path(base))
            .respond_with(move |request: &Request| {
                let mut body = request_object(request);
                body.insert("id".to_string(), Value::from(next_id));
                json_response(201, &Value::Object(body))
            })
            .mount(&self.server)
            .await;

        let replace = Arc::clone(&items);
        Mock::given(method("PUT"))
            .and(path_regex(item_route.as_str()))
            .respond_with(move |request: &Request| match find(&replace, request) {
                Some(existing) => {
                    let mut body = request_object(request);
                    body.insert("id".to_string(), existing["id"].clone());
                    json_response(200, &Value::Object(body))
                }
                None => ResponseTemplate::new(500).set_body_raw(
                    "TypeError: Cannot read properties of undefined (reading 'id')",
                    "text/html; charset=utf-8",
                ),
            })
            .mount(&self.server)
            .await;

        let merge = Arc::clone(&items);
        Mock::given(method("PATCH"))
            .and(path_regex(item_route.as_str()))
            .respond_with(move |request: &Request| match find(&merge, request) {
                Some(existing) => {
                    let mut merged = existing.as_object().cloned().unwrap_or_default();
                    merged.extend(request_object(request));
                    json_response(200, &Value::Object(merged))
                }
                None => json_response(404, &json!({})),
            })
            .mount(&self.server)
            .await;

        Mock::given(method("DELETE"))
            .and(path_regex(item_route.as_str()))
            .respond_with(json_response(200, &json!({})))
            .mount(&self.server)
            .await;
    }
}

pub fn json_response(status: u16, body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("cache-control", "max-age=43200")
        .set_body_raw(body.to_string(), JSON_MIME)
}

fn request_object(request: &Request) -> Map<String, Value> {
    serde_json::from_slice::<Value>(&request.body)
        .ok()
        .and_then(|value| value.as_object().cloned())
        .unwrap_or_default()
}

fn find<'a>(items: &'a [Value], request: &Request) -> Option<&'a Value> {
    let segment = request.url.path_segments()?.next_back()?;
    let id: i64 = segment.parse().ok()?;
    items.iter().find(|item| item["id"] == id)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => render(a).cmp(&render(b)),
    }
}

/// `_sort`/`_order`, `_start`/`_page`/`_limit` and field-equality filters.
fn list_response(items: &[Value], request: &Request) -> ResponseTemplate {
    let mut selected: Vec<&Value> = items.iter().collect();
    let mut sort: Option<String> = None;
    let mut descending = false;
    let mut start: Option<usize> = None;
    let mut page: Option<usize> = None;
    let mut limit: Option<usize> = None;

    for (key, value) in request.url.query_pairs() {
        match key.as_ref() {
            "_sort" => sort = Some(value.into_owned()),
            "_order" => descending = value == "desc",
            "_start" => start = value.parse().ok(),
            "_page" => page = value.parse().ok(),
            "_limit" => limit = value.parse().ok(),
            field => {
                selected.retain(|item| item.get(field).is_some_and(|got| render(got) == value))
            }
        }
    }

    if let Some(key) = sort {
        selected.sort_by(|a, b| {
            let ordering = compare(&a[key.as_str()], &b[key.as_str()]);
            if descending { ordering.reverse() } else { ordering }
        });
    }

    let page_size = limit.or(page.map(|_| 10));
    let offset = start.unwrap_or_else(|| match (page, page_size) {
        (Some(page), Some(size)) => page.saturating_sub(1) * size,
        _ => 0,
    });
    let window: Vec<Value> = selected
        .into_iter()
        .skip(offset)
        .take(page_size.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    json_response(200, &Value::Array(window))
}

/// Seeded collection for `kind`, sized to its known count.
pub fn seed(kind: ResourceKind) -> Vec<Value> {
    let count = kind.descriptor().known_count as i64;
    (1..=count).map(|id| seed_item(kind, id)).collect()
}

fn seed_item(kind: ResourceKind, id: i64) -> Value {
    match kind {
        ResourceKind::Post => json!({
            "userId": (id - 1) / 10 + 1,
            "id": id,
            "title": format!("post title {id}"),
            "body": format!("post body {id}")
        }),
        ResourceKind::User => json!({
            "id": id,
            "name": format!("User {id}"),
            "username": format!("user{id}"),
            "email": format!("user{id}@example.org"),
            "address": {
                "street": "Kulas Light",
                "suite": format!("Apt. {id}"),
                "city": "Gwenborough",
                "zipcode": "92998-3874",
                "geo": {"lat": "-37.3159", "lng": "81.1496"}
            },
            "phone": "1-770-736-8031",
            "website": format!("user{id}.example.org"),
            "company": {"name": "Romaguera-Crona", "catchPhrase": "Multi-layered", "bs": "harness"}
        }),
        ResourceKind::Comment => json!({
            "postId": (id - 1) / 5 + 1,
            "id": id,
            "name": format!("comment {id}"),
            "email": format!("commenter{id}@example.net"),
            "body": format!("comment body {id}")
        }),
        ResourceKind::Album => json!({
            "userId": (id - 1) / 10 + 1,
            "id": id,
            "title": format!("album {id}")
        }),
        ResourceKind::Photo => json!({
            "albumId": (id - 1) / 50 + 1,
            "id": id,
            "title": format!("photo {id}"),
            "url": format!("https://via.placeholder.com/600/{id:06x}"),
            "thumbnailUrl": format!("https://via.placeholder.com/150/{id:06x}")
        }),
    }
}
