//! Request dispatch.
//!
//! [`App`] decides what a parsed request head turns into:
//!
//! ```text
//! unknown method                      → 501
//! OPTIONS /api/… or …/upload…         → 204 + CORS
//! GET/HEAD/POST/PUT/DELETE /api/…     → route table → gate → body → handler (+ CORS)
//! GET/HEAD anything else              → static files
//! POST/PUT/DELETE anything else       → 404
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tracing::debug;

use crate::api::{self, AppState};
use crate::auth::AdminGate;
use crate::body::{self, BodyError};
use crate::config::{Config, DEFAULT_MAX_BODY_MB};
use crate::error::ApiError;
use crate::method::Method;
use crate::middleware::{cors, trace};
use crate::request::{Request, RequestHead};
use crate::response::{IntoResponse, Response};
use crate::router::{Access, BodyPolicy, Router};
use crate::static_files::StaticFiles;
use crate::status::Status;
use crate::store::Store;

/// The whole application: route table, shared state, static root, admin gate.
pub struct App {
    state: Arc<AppState>,
    router: Router<AppState>,
    static_files: StaticFiles,
    gate: Box<dyn AdminGate>,
    max_body: u64,
}

impl App {
    pub fn new(store: Store, public_root: impl Into<PathBuf>, gate: impl AdminGate + 'static) -> Self {
        Self {
            state: Arc::new(AppState::new(store)),
            router: api::routes(),
            static_files: StaticFiles::new(public_root),
            gate: Box::new(gate),
            max_body: DEFAULT_MAX_BODY_MB * 1024 * 1024,
        }
    }

    pub fn from_config(config: &Config, store: Store) -> Self {
        Self::new(
            store,
            config.public_dir.clone(),
            crate::auth::SharedSecret::new(config.admin_token.clone()),
        )
        .with_max_body(config.max_body_bytes())
    }

    /// Largest body, in bytes, that any route will read.
    pub fn with_max_body(mut self, bytes: u64) -> Self {
        self.max_body = bytes;
        self
    }

    /// Produces the response for one request. Body bytes, if the route wants
    /// them, are read from `reader`.
    pub async fn dispatch<R>(&self, head: RequestHead, reader: &mut R) -> Response
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let method = head.method().to_owned();
        let target = head.target().to_owned();
        trace::traced(&method, &target, self.route(head, reader)).await
    }

    async fn route<R>(&self, head: RequestHead, reader: &mut R) -> Response
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let Ok(method) = head.method().parse::<Method>() else {
            return not_implemented();
        };
        let Ok(uri) = head.target().parse::<http::Uri>() else {
            return Response::builder().status(Status::BadRequest).text("Bad Request");
        };
        let path = uri.path().to_owned();
        let is_api = path.starts_with("/api/");

        match method {
            Method::Options if is_api || head.target().contains("/upload") => {
                cors::apply(Response::status(Status::NoContent))
            }
            Method::Get | Method::Head | Method::Post | Method::Put | Method::Delete if is_api => {
                cors::apply(self.api(method, head, path, reader).await)
            }
            Method::Get => self.static_files.serve(&path).await,
            Method::Head => self.static_files.serve(&path).await.into_head(),
            Method::Post | Method::Put | Method::Delete => {
                Response::builder().status(Status::NotFound).text("Not Found")
            }
            _ => not_implemented(),
        }
    }

    async fn api<R>(
        &self,
        method: Method,
        head: RequestHead,
        path: String,
        reader: &mut R,
    ) -> Response
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let lookup = if method == Method::Head { Method::Get } else { method };
        let resp = match self.router.lookup(lookup, &path) {
            None => ApiError::unknown_endpoint().into_response(),
            Some(matched) if matched.options.access == Access::Admin
                && !self.gate.authorize(&head.headers) =>
            {
                debug!("admin credential rejected");
                ApiError::Unauthorized.into_response()
            }
            Some(matched) => match self.read_body(matched.options.body, &head, reader).await {
                Err(e) => ApiError::from(e).into_response(),
                Ok(body) => {
                    let req = Request::new(path, body);
                    matched.handler.call(Arc::clone(&self.state), req).await
                }
            },
        };

        if method == Method::Head { resp.strip_body() } else { resp }
    }

    async fn read_body<R>(
        &self,
        policy: BodyPolicy,
        head: &RequestHead,
        reader: &mut R,
    ) -> Result<Vec<u8>, BodyError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        match policy {
            BodyPolicy::Empty => Ok(Vec::new()),
            BodyPolicy::Framed => body::read_body(&head.headers, reader, self.max_body).await,
            BodyPolicy::DeclaredLength => {
                body::read_declared_length(&head.headers, reader, self.max_body).await
            }
        }
    }
}

fn not_implemented() -> Response {
    Response::builder().status(Status::NotImplemented).text("Not Implemented")
}
