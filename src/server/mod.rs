//! HTTP server: on-demand rendering with the regeneration contract
//!
//! Routes:
//! - `/`               listing, revalidated every `listing.revalidate` seconds
//! - `/post/{slug}`    detail, revalidated every `post.revalidate` seconds
//! - `/api/posts`      next listing page as JSON, for the load-more button
//! - anything else     files from the static directory

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{Lookup, PageCache};
use crate::cms::{CmsError, Repository};
use crate::config::{FallbackMode, SiteConfig};
use crate::content::{FetchError, PostsPage};
use crate::helpers::{load_more_url, post_path};
use crate::pages::Pages;
use crate::Blog;

/// Seconds the loading page waits before asking again
const LOADING_RETRY_SECS: u64 = 1;

/// A page ready to be sent
#[derive(Debug, Clone)]
pub struct Rendered {
    pub status: StatusCode,
    pub body: Arc<str>,
}

impl Rendered {
    fn ok(body: Arc<str>) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        (self.status, Html(self.body.to_string())).into_response()
    }
}

#[derive(Debug, Clone)]
enum Route {
    Home,
    Post(String),
}

impl Route {
    fn key(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Post(slug) => post_path(slug),
        }
    }
}

/// Serves pages from the cache and regenerates them
pub struct BlogService<R> {
    pages: Pages<R>,
    cache: PageCache,
    /// Slugs known to exist: enumerated at startup or generated since
    known: RwLock<HashSet<String>>,
    listing_revalidate: Duration,
    post_revalidate: Duration,
    fallback: FallbackMode,
    static_dir: PathBuf,
}

impl<R: Repository + 'static> BlogService<R> {
    pub fn new(pages: Pages<R>, config: &SiteConfig, static_dir: PathBuf) -> Self {
        Self {
            pages,
            cache: PageCache::new(),
            known: RwLock::new(HashSet::new()),
            listing_revalidate: config.listing.revalidate_after(),
            post_revalidate: config.post.revalidate_after(),
            fallback: config.post.fallback,
            static_dir,
        }
    }

    /// Render the listing and every enumerated post into the cache
    pub async fn prerender(&self) -> Result<usize> {
        let home = self.pages.build_home(load_more_url).await?;
        self.cache.store(&Route::Home.key(), home).await;

        let slugs = self.pages.fetcher().enumerate_slugs().await?;
        let mut rendered = 0;
        for slug in slugs {
            match self.pages.build_post(&slug).await? {
                Some(html) => {
                    self.cache.store(&Route::Post(slug.clone()).key(), html).await;
                    self.known.write().await.insert(slug);
                    rendered += 1;
                }
                None => tracing::warn!("Post {} disappeared while pre-rendering", slug),
            }
        }
        Ok(rendered)
    }

    pub async fn home(self: &Arc<Self>) -> Rendered {
        let route = Route::Home;
        match self.cache.lookup(&route.key(), self.listing_revalidate).await {
            Lookup::Fresh(html) => Rendered::ok(html),
            Lookup::Stale(html) => {
                self.spawn_refresh(route).await;
                Rendered::ok(html)
            }
            Lookup::Missing => self.generate_now(route).await,
        }
    }

    pub async fn post(self: &Arc<Self>, slug: &str) -> Rendered {
        let route = Route::Post(slug.to_string());
        let key = route.key();
        if self.cache.take_not_found(&key).await {
            return self.not_found();
        }

        match self.cache.lookup(&key, self.post_revalidate).await {
            Lookup::Fresh(html) => Rendered::ok(html),
            Lookup::Stale(html) => {
                self.spawn_refresh(route).await;
                Rendered::ok(html)
            }
            Lookup::Missing => {
                if self.known.read().await.contains(slug) {
                    return self.generate_now(route).await;
                }
                match self.fallback {
                    FallbackMode::Blocking => self.generate_now(route).await,
                    FallbackMode::Loading => {
                        self.spawn_refresh(route).await;
                        self.loading()
                    }
                    FallbackMode::Disabled => self.not_found(),
                }
            }
        }
    }

    /// Next listing page for the load-more button
    pub async fn load_more(&self, cursor: &str) -> Result<PostsPage, FetchError> {
        self.pages.fetcher().fetch_more(cursor).await
    }

    async fn generate(&self, route: &Route) -> Result<Option<String>> {
        match route {
            Route::Home => self.pages.build_home(load_more_url).await.map(Some),
            Route::Post(slug) => self.pages.build_post(slug).await,
        }
    }

    /// Generate while the client waits
    async fn generate_now(&self, route: Route) -> Rendered {
        let key = route.key();
        tracing::debug!("Generating {}", key);
        match self.generate(&route).await {
            Ok(Some(html)) => {
                let html: Arc<str> = html.into();
                self.cache.store(&key, html.to_string()).await;
                if let Route::Post(slug) = route {
                    self.known.write().await.insert(slug);
                }
                Rendered::ok(html)
            }
            Ok(None) => {
                if let Route::Post(slug) = &route {
                    self.known.write().await.remove(slug);
                }
                self.not_found()
            }
            Err(e) => {
                tracing::error!("Failed to generate {}: {:#}", key, e);
                self.error()
            }
        }
    }

    /// Regenerate `route` in the background, at most once at a time
    async fn spawn_refresh(self: &Arc<Self>, route: Route) {
        let key = route.key();
        if !self.cache.begin_refresh(&key).await {
            tracing::debug!("Regeneration of {} already running", key);
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tracing::debug!("Regenerating {}", key);
            match this.generate(&route).await {
                Ok(Some(html)) => {
                    this.cache.store(&key, html).await;
                    if let Route::Post(slug) = &route {
                        this.known.write().await.insert(slug.clone());
                    }
                }
                Ok(None) => {
                    this.cache.remove(&key).await;
                    this.cache.mark_not_found(&key).await;
                    if let Route::Post(slug) = &route {
                        this.known.write().await.remove(slug);
                    }
                }
                Err(e) => {
                    tracing::warn!("Regenerating {} failed: {:#}", key, e);
                }
            }
            this.cache.end_refresh(&key).await;
        });
    }

    fn loading(&self) -> Rendered {
        self.status_page(StatusCode::OK, self.pages.render_loading(LOADING_RETRY_SECS))
    }

    fn not_found(&self) -> Rendered {
        self.status_page(StatusCode::NOT_FOUND, self.pages.render_not_found())
    }

    fn error(&self) -> Rendered {
        self.status_page(StatusCode::INTERNAL_SERVER_ERROR, self.pages.render_error())
    }

    fn status_page(&self, status: StatusCode, page: Result<String>) -> Rendered {
        let body = page.unwrap_or_else(|e| {
            tracing::error!("Failed to render {} page: {:#}", status, e);
            status.to_string()
        });
        Rendered {
            status,
            body: body.into(),
        }
    }
}

/// Build the router for a service
pub fn router<R: Repository + 'static>(service: Arc<BlogService<R>>) -> Router {
    Router::new()
        .route("/", get(home_handler::<R>))
        .route("/post/:slug", get(post_handler::<R>))
        .route("/api/posts", get(load_more_handler::<R>))
        .fallback(static_handler::<R>)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Pre-render, then serve until Ctrl+C
pub async fn start<R: Repository + 'static>(blog: &Blog, repo: R, ip: &str, port: u16) -> Result<()> {
    let pages = blog.pages(repo)?;
    let service = Arc::new(BlogService::new(
        pages,
        &blog.config,
        blog.static_dir.clone(),
    ));

    tracing::info!("Pre-rendering pages...");
    let count = service.prerender().await?;
    tracing::info!("Pre-rendered the listing and {} posts", count);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn home_handler<R: Repository + 'static>(
    State(service): State<Arc<BlogService<R>>>,
) -> Rendered {
    service.home().await
}

async fn post_handler<R: Repository + 'static>(
    State(service): State<Arc<BlogService<R>>>,
    Path(slug): Path<String>,
) -> Rendered {
    service.post(&slug).await
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    cursor: String,
}

async fn load_more_handler<R: Repository + 'static>(
    State(service): State<Arc<BlogService<R>>>,
    Query(params): Query<LoadMoreParams>,
) -> Response {
    match service.load_more(&params.cursor).await {
        Ok(page) => Json(page.with_next_link(load_more_url)).into_response(),
        Err(FetchError::Cms(CmsError::ForeignCursor(_))) => {
            (StatusCode::BAD_REQUEST, "Invalid cursor").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load more posts: {}", e);
            (StatusCode::BAD_GATEWAY, "Could not load more posts").into_response()
        }
    }
}

/// Serve static files, falling back to the not-found page
async fn static_handler<R: Repository + 'static>(
    State(service): State<Arc<BlogService<R>>>,
    request: Request<Body>,
) -> Response {
    let mut files = ServeDir::new(&service.static_dir);
    match files.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => service.not_found().into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}
