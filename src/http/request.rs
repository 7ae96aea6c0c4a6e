use std::collections::HashMap;

use reqwest::Url;
use serde_json::Value;

use super::method::HttpMethod;
use crate::error::{HarnessError, Result};

/// One outbound call, relative to the session's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInput {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl RequestInput {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Interpolate `{{key}}` placeholders in a path template.
///
/// Unknown placeholders are left in place.
pub fn interpolate(template: &str, variables: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in variables {
        result = result.replace(&format!("{{{{{key}}}}}"), value);
    }
    result
}

/// Join a base URL and a relative path, keeping any path prefix on the base.
pub fn build_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let raw = format!("{base}/{path}");
    let mut url = Url::parse(&raw).map_err(|e| HarnessError::InvalidUrl {
        input: raw.clone(),
        message: e.to_string(),
    })?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn builder_keeps_body_and_query_order() {
        let request = RequestInput::new(HttpMethod::Get, "/posts")
            .with_query("_sort", "id")
            .with_query("_order", "desc");
        assert!(request.body.is_none());
        assert_eq!(
            request.query,
            vec![
                ("_sort".to_string(), "id".to_string()),
                ("_order".to_string(), "desc".to_string()),
            ]
        );

        let create = RequestInput::new(HttpMethod::Post, "/posts").with_body(json!({"title": "t"}));
        assert_eq!(create.body, Some(json!({"title": "t"})));
    }

    #[test]
    fn interpolate_replaces_id() {
        let mut vars = HashMap::new();
        vars.insert("id", "42".to_string());
        assert_eq!(interpolate("/posts/{{id}}", &vars), "/posts/42");
    }

    #[test]
    fn interpolate_leaves_unknown_placeholders() {
        let vars = HashMap::new();
        assert_eq!(interpolate("/posts/{{id}}", &vars), "/posts/{{id}}");
    }

    #[test]
    fn build_url_keeps_base_prefix() {
        let url = build_url(&base("http://localhost:8080/api/"), "/posts/1", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/posts/1");
    }

    #[test]
    fn build_url_appends_query_in_order() {
        let query = vec![
            ("_sort".to_string(), "id".to_string()),
            ("_order".to_string(), "desc".to_string()),
        ];
        let url = build_url(&base("https://example.com"), "posts", &query).unwrap();
        assert_eq!(url.as_str(), "https://example.com/posts?_sort=id&_order=desc");
    }

    #[test]
    fn build_url_encodes_raw_path_input() {
        let url = build_url(&base("https://example.com"), "/posts/abc", &[]).unwrap();
        assert_eq!(url.path(), "/posts/abc");
    }
}
