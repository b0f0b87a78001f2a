//! Read-only HTTP view of the registry.

use crate::error::SwarmResult;
use crate::server::accept_backoff;
use crate::tracker::registry::Registry;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const TORRENTS_PATH: &str = "/torrents";

/// Serve `GET /torrents` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<Registry>,
    shutdown: CancellationToken,
) -> SwarmResult<()> {
    info!(operation = "listen", role = "diagnostics", addr = ?listener.local_addr().ok());

    loop {
        let stream = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    accept_backoff("diagnostics", &e, &shutdown).await;
                    continue;
                }
            },
        };

        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            let service = service_fn(move |request: Request<Incoming>| {
                let response = respond(&registry, request.method(), request.uri().path());
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(error = %e, "diagnostics connection failed");
            }
        });
    }
}

fn respond(registry: &Registry, method: &Method, path: &str) -> Response<Full<Bytes>> {
    if *method != Method::GET || path != TORRENTS_PATH {
        return status(StatusCode::NOT_FOUND);
    }

    match serde_json::to_vec(&registry.snapshot()) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize registry");
            status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn status(code: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = code;
    response
}
