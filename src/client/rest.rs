//! PostgREST backend over blocking HTTP.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Method, Url};
use std::sync::RwLock;
use std::time::Duration;

use crate::client::backend::{id_filter, ResourceClient};
use crate::client::query::{parse_content_range, Filter, SelectQuery};
use crate::domain::error::{AdminError, Result};
use crate::domain::{Fields, QueryResult, Record, Resource};
use crate::Config;

/// Path prefix of the table API.
const REST_PATH: &str = "rest/v1";

/// `ResourceClient` backed by a PostgREST endpoint.
///
/// Every request carries the project's anon key as `apikey`. The bearer token
/// is the anon key until [`RestBackend::set_access_token`] installs a user
/// session token after sign-in.
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    /// Creates a backend for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    /// Creates a backend from the URL, key and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the URL or key is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (url, key) = config.validate_remote()?;
        Self::new(url, key, Duration::from_secs(config.request_timeout_secs))
    }

    /// Installs (or clears) the user access token sent as bearer.
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = token;
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a select, query string included.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the base URL is not a valid URL.
    pub fn select_url(&self, query: &SelectQuery) -> Result<Url> {
        self.table_url(query.resource, &query.to_query_pairs())
    }

    fn table_url(&self, resource: Resource, pairs: &[(String, String)]) -> Result<Url> {
        let raw = format!("{}/{REST_PATH}/{}", self.base_url, resource.table());
        Url::parse_with_params(&raw, pairs)
            .map_err(|e| AdminError::Config(format!("invalid backend url {raw}: {e}")))
    }

    fn bearer(&self) -> String {
        let token = self
            .access_token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        format!("Bearer {token}")
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, self.bearer())
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        tracing::debug!(status = status.as_u16(), %message, "backend rejected request");
        Err(AdminError::remote(Some(status.as_u16()), message))
    }

    fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| (f.column().to_string(), f.to_operator()))
            .collect()
    }

    /// Request for one select; asks for an exact count when the query wants it.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the base URL is not a valid URL.
    pub fn select_request(&self, query: &SelectQuery) -> Result<RequestBuilder> {
        let builder = self.request(Method::GET, self.select_url(query)?);
        Ok(if query.count_exact {
            builder.header("Prefer", "count=exact")
        } else {
            builder
        })
    }

    /// POST of one row. List-only keys never reach the store.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the base URL is not a valid URL.
    pub fn insert_request(&self, resource: Resource, fields: &Fields) -> Result<RequestBuilder> {
        let mut body = fields.clone();
        body.remove("subCategories");
        Ok(self
            .request(Method::POST, self.table_url(resource, &[])?)
            .header("Prefer", "return=minimal")
            .json(&body))
    }

    /// PATCH of the row whose `id` equals `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the base URL is not a valid URL.
    pub fn update_request(&self, resource: Resource, id: &str, fields: &Fields) -> Result<RequestBuilder> {
        let mut body = fields.clone();
        body.remove("subCategories");
        body.remove("id");
        let pairs = Self::filter_pairs(&[Filter::eq("id", id)]);
        Ok(self
            .request(Method::PATCH, self.table_url(resource, &pairs)?)
            .header("Prefer", "return=minimal")
            .json(&body))
    }

    /// DELETE by `eq` for one id, `in` for several.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the base URL is not a valid URL.
    pub fn delete_request(&self, resource: Resource, ids: &[String]) -> Result<RequestBuilder> {
        let pairs = Self::filter_pairs(&[id_filter(ids)]);
        Ok(self.request(Method::DELETE, self.table_url(resource, &pairs)?))
    }

    /// HEAD request whose `Content-Range` carries the table's exact row count.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the base URL is not a valid URL.
    pub fn count_request(&self, resource: Resource) -> Result<RequestBuilder> {
        let pairs = vec![("select".to_string(), "id".to_string())];
        Ok(self
            .request(Method::HEAD, self.table_url(resource, &pairs)?)
            .header("Prefer", "count=exact"))
    }
}

impl ResourceClient for RestBackend {
    fn select(&self, query: &SelectQuery) -> Result<QueryResult> {
        let _span = tracing::debug_span!("rest_select",
            resource = %query.resource,
            range = ?query.range,
            count_exact = query.count_exact
        )
        .entered();

        let response = self.send(self.select_request(query)?)?;

        let count = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range);
        let body = response.text()?;
        let data: Vec<Record> = serde_json::from_str(&body)?;

        tracing::debug!(returned = data.len(), count = ?count, "select complete");
        Ok(QueryResult::new(count.filter(|_| query.count_exact), data))
    }

    fn insert(&self, resource: Resource, fields: &Fields) -> Result<()> {
        let _span = tracing::debug_span!("rest_insert", resource = %resource).entered();

        self.send(self.insert_request(resource, fields)?)?;

        tracing::debug!("row inserted");
        Ok(())
    }

    fn update(&self, resource: Resource, id: &str, fields: &Fields) -> Result<()> {
        let _span = tracing::debug_span!("rest_update", resource = %resource, id = %id).entered();

        self.send(self.update_request(resource, id, fields)?)?;

        tracing::debug!("row updated");
        Ok(())
    }

    fn delete(&self, resource: Resource, ids: &[String]) -> Result<()> {
        let _span = tracing::debug_span!("rest_delete", resource = %resource, count = ids.len()).entered();

        self.send(self.delete_request(resource, ids)?)?;

        tracing::debug!("rows deleted");
        Ok(())
    }

    fn count(&self, resource: Resource) -> Result<Option<u64>> {
        let _span = tracing::debug_span!("rest_count", resource = %resource).entered();

        let response = self.send(self.count_request(resource)?)?;

        Ok(response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range))
    }
}

/// Extracts `message` from a PostgREST/GoTrue JSON error body.
///
/// GoTrue uses `error_description` or `msg` instead, so those are tried too.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaginationRange;

    fn backend() -> RestBackend {
        RestBackend::new("https://example.supabase.co/", "anon", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn select_url_targets_table_with_window() {
        let query = SelectQuery::new(Resource::PostCategories)
            .range(PaginationRange::for_page(0, 8))
            .count_exact();
        let url = backend().select_url(&query).unwrap();

        assert_eq!(url.path(), "/rest/v1/post_categories");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("offset".to_string(), "0".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "8".to_string())));
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
    }

    fn query_of(request: &reqwest::blocking::Request) -> Vec<(String, String)> {
        request.url().query_pairs().into_owned().collect()
    }

    fn header<'a>(request: &'a reqwest::blocking::Request, name: &str) -> Option<&'a str> {
        request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn select_asks_for_exact_count_only_when_counting() {
        let backend = backend();
        let counted = backend
            .select_request(&SelectQuery::new(Resource::Posts).count_exact())
            .unwrap()
            .build()
            .unwrap();
        let plain = backend
            .select_request(&SelectQuery::new(Resource::Posts))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(counted.method(), &Method::GET);
        assert_eq!(header(&counted, "prefer"), Some("count=exact"));
        assert_eq!(header(&counted, "apikey"), Some("anon"));
        assert_eq!(header(&plain, "prefer"), None);
    }

    #[test]
    fn update_patches_one_id_with_minimal_return() {
        let mut fields = Fields::new();
        fields.insert("id".into(), "ignored".into());
        fields.insert("name".into(), "Farriery".into());
        fields.insert("subCategories".into(), serde_json::Value::Array(vec![]));

        let request = backend()
            .update_request(Resource::BusinessCategories, "c1", &fields)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.url().path(), "/rest/v1/business_categories");
        assert_eq!(query_of(&request), vec![("id".to_string(), "eq.c1".to_string())]);
        assert_eq!(header(&request, "prefer"), Some("return=minimal"));

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent, serde_json::json!({ "name": "Farriery" }));
    }

    #[test]
    fn delete_uses_eq_for_one_id_and_in_for_many() {
        let backend = backend();
        let single = backend
            .delete_request(Resource::Posts, &["p1".to_string()])
            .unwrap()
            .build()
            .unwrap();
        let batch = backend
            .delete_request(Resource::Posts, &["p1".to_string(), "p2".to_string()])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(single.method(), &Method::DELETE);
        assert_eq!(query_of(&single), vec![("id".to_string(), "eq.p1".to_string())]);
        assert_eq!(query_of(&batch), vec![("id".to_string(), r#"in.("p1","p2")"#.to_string())]);
    }

    #[test]
    fn insert_posts_without_list_only_keys() {
        let mut fields = Fields::new();
        fields.insert("name".into(), "Farriers".into());
        fields.insert("subCategories".into(), serde_json::Value::Array(vec![]));

        let request = backend()
            .insert_request(Resource::BusinessCategories, &fields)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert!(query_of(&request).is_empty());
        assert_eq!(header(&request, "prefer"), Some("return=minimal"));
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(body).unwrap(),
            serde_json::json!({ "name": "Farriers" })
        );
    }

    #[test]
    fn count_is_a_head_request_for_ids() {
        let request = backend().count_request(Resource::Subscribers).unwrap().build().unwrap();

        assert_eq!(request.method(), &Method::HEAD);
        assert_eq!(request.url().path(), "/rest/v1/subscribers");
        assert_eq!(query_of(&request), vec![("select".to_string(), "id".to_string())]);
        assert_eq!(header(&request, "prefer"), Some("count=exact"));
    }

    #[test]
    fn bearer_falls_back_to_anon_key() {
        let backend = backend();
        assert_eq!(backend.bearer(), "Bearer anon");
        backend.set_access_token(Some("user-jwt".into()));
        assert_eq!(backend.bearer(), "Bearer user-jwt");
    }

    #[test]
    fn error_message_reads_postgrest_and_gotrue_bodies() {
        assert_eq!(
            error_message(r#"{"code":"23503","message":"violates foreign key constraint"}"#).as_deref(),
            Some("violates foreign key constraint")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(backend().base_url(), "https://example.supabase.co");
    }
}
