//! Request dispatch, independent of the HTTP transport.
//!
//! [`handle`] takes the method, the raw request target and the body, and
//! returns a status plus an optional JSON body. `http.rs` owns the socket.

use catalog_protocol::ITEMS_PATH;
use catalog_protocol::ListQuery;
use catalog_protocol::STATS_PATH;
use catalog_store::StoreError;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tiny_http::Method;
use url::Url;

use crate::CatalogService;
use crate::error::ApiError;

/// Outcome of a routed request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Option<Value>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_value(value).map_err(StoreError::from)?;
        Ok(Self {
            status,
            body: Some(body),
        })
    }

    fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    fn from_error(err: &ApiError) -> Self {
        let body = serde_json::to_value(err.body()).ok();
        Self {
            status: err.status(),
            body,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Items,
    Item(&'a str),
    Stats,
}

fn parse_route(path: &str) -> Option<Route<'_>> {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    if path == ITEMS_PATH {
        return Some(Route::Items);
    }
    if path == STATS_PATH {
        return Some(Route::Stats);
    }
    path.strip_prefix(ITEMS_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|id| !id.is_empty() && !id.contains('/'))
        .map(Route::Item)
}

/// Route a request and turn any failure into its error reply.
pub fn handle(service: &CatalogService, method: &Method, target: &str, body: &[u8]) -> Reply {
    match route(service, method, target, body) {
        Ok(reply) => reply,
        Err(err) => {
            if err.status() >= 500 {
                tracing::error!("{method} {target} failed: {err}");
            } else {
                tracing::debug!("{method} {target} rejected: {err}");
            }
            Reply::from_error(&err)
        }
    }
}

fn route(
    service: &CatalogService,
    method: &Method,
    target: &str,
    body: &[u8],
) -> Result<Reply, ApiError> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .map_err(|e| ApiError::BadRequest(format!("invalid request target: {e}")))?;

    let Some(route) = parse_route(url.path()) else {
        return Err(ApiError::NotFound("Route not found".to_string()));
    };

    match (method, route) {
        (Method::Options, _) => Ok(Reply::empty(204)),
        (Method::Get, Route::Items) => list_items(service, &url),
        (Method::Post, Route::Items) => create_item(service, body),
        (Method::Get, Route::Item(id)) => get_item(service, id),
        (Method::Get, Route::Stats) => stats(service),
        (method, _) => Err(ApiError::MethodNotAllowed {
            method: method.to_string(),
            path: url.path().to_string(),
        }),
    }
}

/// `GET /api/items`
fn list_items(service: &CatalogService, url: &Url) -> Result<Reply, ApiError> {
    let query = ListQuery::from_pairs(url.query_pairs());
    let items = service.store().read()?;
    let page = query.apply(items);
    Reply::json(200, &page)
}

/// `GET /api/items/:id`
fn get_item(service: &CatalogService, raw_id: &str) -> Result<Reply, ApiError> {
    let not_found = || ApiError::NotFound("Item not found".to_string());
    let id: i64 = raw_id.parse().map_err(|_| not_found())?;

    let item = service
        .store()
        .read()?
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(not_found)?;
    Reply::json(200, &item)
}

/// `POST /api/items`
fn create_item(service: &CatalogService, body: &[u8]) -> Result<Reply, ApiError> {
    let fields = parse_object(body)?;
    let item = match service.store().create(fields) {
        Ok(item) => item,
        Err(StoreError::InvalidItem(e)) => {
            return Err(ApiError::BadRequest(format!("invalid item: {e}")));
        }
        Err(e) => return Err(e.into()),
    };
    Reply::json(201, &item)
}

/// `GET /api/stats`
fn stats(service: &CatalogService) -> Result<Reply, ApiError> {
    let stats = service.stats().get()?;
    Reply::json(200, &*stats)
}

/// An empty body counts as `{}`.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::BadRequest("expected a JSON object".to_string())),
        Err(e) => Err(ApiError::BadRequest(format!("invalid JSON body: {e}"))),
    }
}
