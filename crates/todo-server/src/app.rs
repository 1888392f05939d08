//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use bytes::Bytes;
use todo_store::{Database, MemoryDatabase};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::live_reload::{self, BuildId, ConnectionRegistry, StyleBroadcaster};
use crate::middleware::security;
use crate::page::{PageTemplate, TodoPage};
use crate::state::AppState;

/// Inputs for [`create_router`].
pub struct RouterConfig {
    client: Bytes,
    styles: String,
    db: Arc<dyn Database>,
    live_reload: bool,
    build_id: Option<BuildId>,
    page: Arc<dyn PageTemplate>,
}

impl RouterConfig {
    /// Create a config with empty assets, an empty in-memory store, the todo
    /// page and live reload enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Bytes::new(),
            styles: String::new(),
            db: Arc::new(MemoryDatabase::new()),
            live_reload: true,
            build_id: None,
            page: Arc::new(TodoPage),
        }
    }

    /// Set the client bundle served at `/client.js`.
    #[must_use]
    pub fn with_client(mut self, client: impl Into<Bytes>) -> Self {
        self.client = client.into();
        self
    }

    /// Set the initial stylesheet served at `/styles.css`.
    #[must_use]
    pub fn with_styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    /// Set the todo store.
    #[must_use]
    pub fn with_database(mut self, db: Arc<dyn Database>) -> Self {
        self.db = db;
        self
    }

    /// Enable or disable the live reload endpoint.
    #[must_use]
    pub fn with_live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    /// Use a fixed build identity instead of generating one.
    #[must_use]
    pub fn with_build_id(mut self, build_id: BuildId) -> Self {
        self.build_id = Some(build_id);
        self
    }

    /// Replace the page rendered at `/`.
    #[must_use]
    pub fn with_page(mut self, page: Arc<dyn PageTemplate>) -> Self {
        self.page = page;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Router plus the live reload handles it was built around.
pub struct RouterInfo {
    /// Application router with state applied.
    pub router: Router,
    /// Stylesheet snapshot and `loadStyles` broadcaster.
    pub styles: Arc<StyleBroadcaster>,
    /// Open live reload channels.
    pub registry: Arc<ConnectionRegistry>,
    /// Identity of this server instance.
    pub build_id: BuildId,
}

/// Create the application router.
///
/// Routes:
/// - `GET /` streams the page
/// - `GET /client.js`, `GET /styles.css` serve built assets
/// - `GET|POST /todos`, `PATCH|DELETE /todos/{id}` expose the store
/// - `GET /livereload/{id}` upgrades to a live reload socket (when enabled);
///   a missing id counts as stale
#[must_use]
pub fn create_router(config: RouterConfig) -> RouterInfo {
    let registry = ConnectionRegistry::new();
    let styles = Arc::new(StyleBroadcaster::new(config.styles, Arc::clone(&registry)));
    let build_id = config.build_id.unwrap_or_else(BuildId::generate);

    let state = Arc::new(AppState {
        db: config.db,
        client: config.client,
        styles: Arc::clone(&styles),
        registry: Arc::clone(&registry),
        build_id,
        live_reload: config.live_reload,
        page: config.page,
    });

    let mut router = Router::new()
        .route("/", get(handlers::page::get_index))
        .route("/client.js", get(handlers::assets::get_client))
        .route("/styles.css", get(handlers::assets::get_styles))
        .route(
            "/todos",
            get(handlers::todos::list_todos).post(handlers::todos::create_todo),
        )
        .route(
            "/todos/{id}",
            patch(handlers::todos::update_todo).delete(handlers::todos::delete_todo),
        );

    if state.live_reload_enabled() {
        router = router
            .route("/livereload", get(live_reload::ws_handler_untagged))
            .route("/livereload/", get(live_reload::ws_handler_untagged))
            .route("/livereload/{id}", get(live_reload::ws_handler));
    }

    let router = router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state);

    RouterInfo {
        router,
        styles,
        registry,
        build_id,
    }
}
