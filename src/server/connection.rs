// Connection handling module
// Serves one TCP connection over HTTP/1.1 and buffers each request body

use super::App;
use crate::http::{response, HttpRequest, HttpResponse};
use crate::logger;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::CONTENT_LENGTH;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

/// Serve `stream` on its own task until the client closes it
pub fn spawn_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    app: Arc<App>,
    max_body_size: u64,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let service = service_fn(move |req: Request<Incoming>| {
            let app = Arc::clone(&app);
            async move {
                let response = match buffer_request(req, max_body_size).await {
                    Ok(request) => app.handle(request, Some(peer_addr)).await,
                    Err(rejection) => rejection,
                };
                Ok::<_, Infallible>(response)
            }
        });

        if let Err(err) = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service)
            .await
        {
            logger::log_connection_error(&err);
        }
    });
}

/// Declared body length, if the header is present and numeric
fn declared_length(req: &Request<Incoming>) -> Option<u64> {
    req.headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Collect the body, answering 413 past `max_body_size` and 400 on a broken stream
async fn buffer_request(
    req: Request<Incoming>,
    max_body_size: u64,
) -> Result<HttpRequest, HttpResponse> {
    if declared_length(&req).is_some_and(|len| len > max_body_size) {
        logger::log_warning(&format!(
            "Rejected {} {}: body exceeds {max_body_size} bytes",
            req.method(),
            req.uri().path()
        ));
        return Err(response::payload_too_large());
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Request::from_parts(parts, collected.to_bytes())),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(response::payload_too_large())
        }
        Err(err) => {
            logger::log_debug(&format!("Failed to read request body: {err}"));
            Err(response::bad_request("Could not read request body"))
        }
    }
}
