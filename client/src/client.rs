//! Advertisement API client.
//!
//! Every call follows the same path: resolve the target URI through the
//! link catalog, obtain a token, send, and either hydrate the 2xx response
//! or classify the failure. A 401/403 on the first attempt invalidates the
//! token and retries exactly once.

use crate::catalog::LinkCatalog;
use crate::classify::classify;
use crate::config::{ClientConfig, CredentialConfig};
use crate::error::{ApiError, ApiResult};
use crate::link::Link;
use crate::resource::{Page, Resource, ResponseMeta};
use crate::token::{ClientCredentialsSource, Token, TokenProvider, TokenSource};
use crate::transport::{ApiRequest, Interceptor, RawResponse, Transport};
use futures::Stream;
use jobad_common::build_http_client;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Where a call is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An absolute URI, typically taken from a hydrated resource
    Uri(Url),
    /// A catalog relation with template parameters
    Relation {
        /// Relation name
        relation: String,
        /// Values for the relation's placeholders
        params: Vec<(String, String)>,
    },
    /// A catalog relation whose template takes a single identifier
    Id {
        /// Relation name
        relation: String,
        /// Identifier
        id: String,
    },
    /// A link from a hydrated resource
    Link(Link),
}

impl Target {
    /// A catalog relation without parameters.
    #[must_use]
    pub fn relation(relation: impl Into<String>) -> Self {
        Self::Relation {
            relation: relation.into(),
            params: Vec::new(),
        }
    }

    /// A catalog relation addressed by id.
    #[must_use]
    pub fn id(relation: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Id {
            relation: relation.into(),
            id: id.into(),
        }
    }

    /// Add a template parameter to a relation target.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Relation { params, .. } = &mut self {
            params.push((name.into(), value.into()));
        }
        self
    }
}

impl From<Url> for Target {
    fn from(url: Url) -> Self {
        Self::Uri(url)
    }
}

impl From<Link> for Target {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

impl From<&Link> for Target {
    fn from(link: &Link) -> Self {
        Self::Link(link.clone())
    }
}

/// Position of a [`ApiClient::pages`] stream.
enum PageCursor<T> {
    Ready(Page<T>),
    Next {
        request: ApiResult<ApiRequest>,
        embedded: String,
    },
    Done,
}

/// Attempt number within one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    AuthRetry,
}

struct Inner {
    base_url: Url,
    config: ClientConfig,
    transport: Transport,
    tokens: Arc<TokenProvider>,
    catalog: Mutex<Option<Arc<LinkCatalog>>>,
}

/// Client for the advertisement API.
///
/// Cloning is cheap; clones share the connection pool, token and catalog.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
    cancel: CancellationToken,
}

impl ApiClient {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// A handle whose calls are abandoned when `cancel` fires.
    ///
    /// A token refresh already in flight keeps running for other callers.
    #[must_use]
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    /// Root URI the catalog is loaded from.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Shared token provider.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenProvider> {
        &self.inner.tokens
    }

    /// The link catalog, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates any failure fetching or parsing the root document.
    pub async fn catalog(&self) -> ApiResult<Arc<LinkCatalog>> {
        let mut slot = self.inner.catalog.lock().await;
        if let Some(catalog) = slot.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let request = ApiRequest::get(self.inner.base_url.clone())
            .with_accept(self.inner.config.media_types.hal.clone());
        let response = self.execute(&request).await?;
        let catalog = Arc::new(LinkCatalog::parse(response.url, &response.body)?);
        info!(
            base_url = %self.inner.base_url,
            relations = catalog.relations().count(),
            "Link catalog loaded"
        );

        *slot = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Discard the catalog and fetch it again.
    ///
    /// # Errors
    ///
    /// Propagates any failure fetching or parsing the root document.
    pub async fn reload_catalog(&self) -> ApiResult<Arc<LinkCatalog>> {
        *self.inner.catalog.lock().await = None;
        self.catalog().await
    }

    /// Resolve `target` to an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownRelation`] or [`ApiError::Configuration`]
    /// for relation misuse.
    pub async fn resolve(&self, target: &Target) -> ApiResult<Url> {
        match target {
            Target::Uri(url) => Ok(url.clone()),
            Target::Link(link) => link.resolve(&self.inner.base_url, &[]),
            Target::Relation { relation, params } => {
                let params: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                self.catalog().await?.resolve(relation, &params)
            }
            Target::Id { relation, id } => self.catalog().await?.resolve_id(relation, id),
        }
    }

    /// `GET` a resource.
    ///
    /// # Errors
    ///
    /// Returns the classified failure, or a transport, timeout or
    /// cancellation error.
    pub async fn get_resource<T: DeserializeOwned>(
        &self,
        target: impl Into<Target>,
    ) -> ApiResult<Resource<T>> {
        let request = self.prepare(Method::GET, &target.into(), None).await?;
        Resource::from_response(&self.execute(&request).await?)
    }

    /// `GET` one page of a collection whose items are under `_embedded.<embedded>`.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_resource`].
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        target: impl Into<Target>,
        embedded: &str,
    ) -> ApiResult<Page<T>> {
        let request = self.prepare(Method::GET, &target.into(), None).await?;
        self.fetch_page(request, embedded).await
    }

    /// Fetch the page after `page`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoMoreResults`] without issuing a request when
    /// `page` is the last one.
    pub async fn next_page<T: DeserializeOwned>(&self, page: &Page<T>) -> ApiResult<Page<T>> {
        let mut request = ApiRequest::get(page.next_uri()?);
        request.accept = page.accept().map(str::to_string);
        self.fetch_page(request, page.embedded()).await
    }

    /// Lazily walk `first` and every page after it.
    ///
    /// Each page is fetched only when polled. The stream ends after the
    /// last page or the first error.
    pub fn pages<T>(&self, first: Page<T>) -> impl Stream<Item = ApiResult<Page<T>>> + use<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        futures::stream::try_unfold(PageCursor::Ready(first), move |cursor| {
            client.clone().advance(cursor)
        })
    }

    async fn advance<T: DeserializeOwned>(
        self,
        cursor: PageCursor<T>,
    ) -> ApiResult<Option<(Page<T>, PageCursor<T>)>> {
        let page = match cursor {
            PageCursor::Ready(page) => page,
            PageCursor::Next { request, embedded } => self.fetch_page(request?, &embedded).await?,
            PageCursor::Done => return Ok(None),
        };
        let next = if page.has_next() {
            PageCursor::Next {
                request: page.next_uri().map(|uri| ApiRequest {
                    accept: page.accept().map(str::to_string),
                    ..ApiRequest::get(uri)
                }),
                embedded: page.embedded().to_string(),
            }
        } else {
            PageCursor::Done
        };
        Ok(Some((page, next)))
    }

    /// `HEAD` a resource and return its response details.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_resource`].
    pub async fn head_status(&self, target: impl Into<Target>) -> ApiResult<ResponseMeta> {
        let request = self.prepare(Method::HEAD, &target.into(), None).await?;
        Ok(Resource::<()>::from_response(&self.execute(&request).await?)?.meta)
    }

    /// `POST` `payload` to a collection.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_resource`]; a duplicate is
    /// [`ApiError::Conflict`] and a rejected payload [`ApiError::Validation`].
    pub async fn create_resource<P, T>(
        &self,
        target: impl Into<Target>,
        content_type: &str,
        payload: &P,
    ) -> ApiResult<Resource<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, target.into(), None, content_type, payload)
            .await
    }

    /// `PUT` a full replacement representation.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::create_resource`].
    pub async fn update_resource<P, T>(
        &self,
        target: impl Into<Target>,
        content_type: &str,
        payload: &P,
    ) -> ApiResult<Resource<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, target.into(), None, content_type, payload)
            .await
    }

    /// `PATCH` a resource.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::create_resource`].
    pub async fn patch_resource<P, T>(
        &self,
        target: impl Into<Target>,
        content_type: &str,
        patch: &P,
    ) -> ApiResult<Resource<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, target.into(), None, content_type, patch)
            .await
    }

    /// Issue a fully prepared request with token handling and the single
    /// authorization retry, returning the raw 2xx response.
    ///
    /// # Errors
    ///
    /// Returns the classified failure for any non-2xx response.
    #[instrument(skip_all, fields(method = %request.method, uri = %request.url))]
    pub async fn execute(&self, request: &ApiRequest) -> ApiResult<RawResponse> {
        let mut attempt = Attempt::First;
        loop {
            let token = self.token().await?;
            let response = self
                .inner
                .transport
                .send(request, &token, &self.cancel)
                .await?;

            if response.is_success() {
                return Ok(response);
            }

            let rejected = matches!(
                response.status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            );
            match (attempt, rejected) {
                (Attempt::First, true) => {
                    warn!(
                        status = response.status.as_u16(),
                        "Authorization rejected, renewing token"
                    );
                    self.inner.tokens.invalidate_token(&token);
                    attempt = Attempt::AuthRetry;
                }
                _ => {
                    let error = classify(&response);
                    debug!(
                        status = response.status.as_u16(),
                        request_id = response.request_id().unwrap_or_default(),
                        error = %error,
                        "Request failed"
                    );
                    return Err(error);
                }
            }
        }
    }

    pub(crate) async fn prepare(
        &self,
        method: Method,
        target: &Target,
        accept: Option<String>,
    ) -> ApiResult<ApiRequest> {
        let url = self.resolve(target).await?;
        Ok(ApiRequest {
            accept,
            ..ApiRequest::new(method, url)
        })
    }

    pub(crate) async fn send_json<P, T>(
        &self,
        method: Method,
        target: Target,
        accept: Option<String>,
        content_type: &str,
        payload: &P,
    ) -> ApiResult<Resource<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .prepare(method, &target, accept)
            .await?
            .with_json(content_type, payload)?;
        Resource::from_response(&self.execute(&request).await?)
    }

    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        embedded: &str,
    ) -> ApiResult<Page<T>> {
        let response = self.execute(&request).await?;
        Ok(Page::from_response(&response, embedded)?.with_accept(request.accept))
    }

    async fn token(&self) -> ApiResult<Arc<Token>> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ApiError::Cancelled),
            token = self.inner.tokens.get_token() => token,
        }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("transport", &self.inner.transport)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<CredentialConfig>,
    token_source: Option<Arc<dyn TokenSource>>,
    tokens: Option<Arc<TokenProvider>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    http: Option<reqwest::Client>,
}

impl ApiClientBuilder {
    /// Use `config`; defaults come from the environment otherwise.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Obtain tokens with the client-credentials grant.
    #[must_use]
    pub fn credentials(mut self, credentials: CredentialConfig) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Obtain tokens from `source`.
    #[must_use]
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Share an existing token provider.
    #[must_use]
    pub fn token_provider(mut self, tokens: Arc<TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Append a caller interceptor. Runs after the client's own headers.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Reuse an existing connection pool.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when no token source is configured
    /// or the base URL is invalid, and [`ApiError::Transport`] when the HTTP
    /// client cannot be built.
    pub fn build(self) -> ApiResult<ApiClient> {
        let config = self.config.unwrap_or_default();
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::configuration(format!("invalid base URL '{}': {e}", config.base_url))
        })?;
        let http = match self.http {
            Some(http) => http,
            None => build_http_client(&config.http)?,
        };

        let tokens = match (self.tokens, self.token_source, self.credentials) {
            (Some(tokens), _, _) => tokens,
            (None, Some(source), _) => Arc::new(TokenProvider::new(source)),
            (None, None, Some(credentials)) => {
                let skew = credentials.expiry_skew;
                let source = ClientCredentialsSource::new(http.clone(), credentials);
                Arc::new(TokenProvider::new(Arc::new(source)).with_expiry_skew(skew))
            }
            (None, None, None) => {
                return Err(ApiError::configuration("no token source configured"));
            }
        };

        let transport = self.interceptors.into_iter().fold(
            Transport::new(http, config.timeout, config.accept.clone()),
            Transport::with_interceptor,
        );

        debug!(base_url = %base_url, "API client built");
        Ok(ApiClient {
            inner: Arc::new(Inner {
                base_url,
                config,
                transport,
                tokens,
                catalog: Mutex::new(None),
            }),
            cancel: CancellationToken::new(),
        })
    }
}
