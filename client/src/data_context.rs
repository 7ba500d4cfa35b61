use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use catalog_protocol::ErrorBody;
use catalog_protocol::ITEMS_PATH;
use catalog_protocol::Item;
use catalog_protocol::ItemsPage;
use catalog_protocol::ListQuery;
use catalog_protocol::STATS_PATH;
use catalog_protocol::Stats;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::DropGuard;
use url::Url;

use crate::error::ClientError;

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub page: usize,
    pub limit: usize,
    pub q: String,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            q: String::new(),
        }
    }
}

impl FetchParams {
    fn to_query(&self) -> ListQuery {
        ListQuery {
            q: Some(self.q.trim().to_string()).filter(|q| !q.is_empty()),
            limit: Some(self.limit),
            page: Some(self.page.max(1)),
        }
    }
}

/// A fetch running on its own task.
///
/// Dropping the handle cancels the request, so a page that replaces its
/// handle on every parameter change never applies a stale result.
pub struct FetchHandle {
    token: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<ItemsPage, ClientError>>,
}

impl FetchHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Wait for the fetch to settle.
    pub async fn join(self) -> Result<ItemsPage, ClientError> {
        let Self { guard, task, .. } = self;
        let result = task.await?;
        let _token = guard.disarm();
        result
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    page: RwLock<ItemsPage>,
}

/// Shared handle to the catalog API plus the last committed page.
#[derive(Clone)]
pub struct DataContext {
    inner: Arc<Inner>,
}

impl DataContext {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        Url::parse(base_url)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                page: RwLock::new(ItemsPage::default()),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Items of the last committed page.
    pub fn items(&self) -> Vec<Item> {
        self.snapshot().items
    }

    /// Last committed page, including the server's match count.
    pub fn snapshot(&self) -> ItemsPage {
        self.inner
            .page
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `GET /api/items` and commit the result unless `cancel` fired.
    pub async fn fetch_items(
        &self,
        params: &FetchParams,
        cancel: &CancellationToken,
    ) -> Result<ItemsPage, ClientError> {
        let request = self
            .inner
            .http
            .get(self.url(ITEMS_PATH))
            .query(&params.to_query().to_pairs());
        let page: ItemsPage = self.send_json(request, "fetch items", cancel).await?;

        // Cancellers take no lock, so the token is re-checked under the
        // write guard: a fetch cancelled before this point never commits.
        let mut committed = self
            .inner
            .page
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        *committed = page.clone();
        drop(committed);

        tracing::debug!(
            "fetched {} of {} items (page {}, limit {}, q {:?})",
            page.items.len(),
            page.total,
            params.page,
            params.limit,
            params.q
        );
        Ok(page)
    }

    /// Run [`DataContext::fetch_items`] on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_fetch(&self, params: FetchParams) -> FetchHandle {
        let token = CancellationToken::new();
        let ctx = self.clone();
        let task_token = token.clone();
        let task = tokio::spawn(async move { ctx.fetch_items(&params, &task_token).await });
        FetchHandle {
            guard: token.clone().drop_guard(),
            token,
            task,
        }
    }

    /// `GET /api/items/:id`
    pub async fn get_item(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Item, ClientError> {
        let request = self
            .inner
            .http
            .get(self.url(&format!("{ITEMS_PATH}/{id}")));
        self.send_json(request, "fetch item", cancel).await
    }

    /// `POST /api/items`
    pub async fn create_item(
        &self,
        fields: &Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Item, ClientError> {
        let request = self.inner.http.post(self.url(ITEMS_PATH)).json(fields);
        self.send_json(request, "create item", cancel).await
    }

    /// `GET /api/stats`
    pub async fn stats(&self, cancel: &CancellationToken) -> Result<Stats, ClientError> {
        let request = self.inner.http.get(self.url(STATS_PATH));
        self.send_json(request, "fetch stats", cancel).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    async fn send_json<T>(
        &self,
        request: RequestBuilder,
        action: &'static str,
        cancel: &CancellationToken,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send,
    {
        let exchange = async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let detail = response.json::<ErrorBody>().await.ok().map(|b| b.error);
                return Err(ClientError::Status {
                    action,
                    status: status.as_u16(),
                    detail,
                });
            }
            Ok(response.json::<T>().await?)
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = exchange => result,
        }
    }
}
