// Server module entry point
// Listener setup, the accept loop and graceful shutdown

mod app;
pub mod connection;
pub mod listener;
pub mod signal;

pub use app::App;
pub use listener::create_reusable_listener;

use crate::articles::{MemoryArticleStore, SharedStore};
use crate::config::Config;
use crate::error::ServerError;
use crate::handler::static_files::load_document;
use crate::logger;
use crate::routes;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Accept connections until `shutdown` resolves
///
/// Connections already accepted keep running on their own tasks after the loop stops.
pub async fn serve(
    listener: TcpListener,
    app: Arc<App>,
    max_body_size: u64,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    logger::log_connection_accepted(&peer_addr);
                    connection::spawn_connection(stream, peer_addr, Arc::clone(&app), max_body_size);
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = &mut shutdown => break,
        }
    }
    Ok(())
}

/// Build the application from `config`
///
/// Reads the fallback document and compiles the route table; either failing aborts
/// startup.
pub async fn build_app(config: &Config, store: &SharedStore) -> Result<App, ServerError> {
    let app_shell = load_document(&config.index_path()).await?;
    let table = routes::cms_routes(config, store, app_shell)?;
    Ok(App::new(table)
        .with_middleware(&routes::global_middleware(config))
        .with_server_name(&config.http.server_name))
}

/// Validate, bind and serve until SIGINT or SIGTERM
pub async fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    let addr = config.socket_addr()?;

    let store: SharedStore = Arc::new(MemoryArticleStore::new());
    let app = Arc::new(build_app(&config, &store).await?);
    let listener = create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &config, app.route_count());
    serve(
        listener,
        app,
        config.http.max_body_size,
        signal::shutdown_signal(),
    )
    .await?;
    logger::log_info("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserEntry;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("index.html"), "<html></html>").unwrap();
        let mut config =
            Config::load_with(assets.path().join("absent").to_str().unwrap(), |_| None).unwrap();
        config.assets.root = assets.path().to_str().unwrap().to_string();
        config.logging.access_log = false;
        config.http.max_body_size = 16;
        config.auth.users.push(UserEntry {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        });

        let store: SharedStore = Arc::new(MemoryArticleStore::new());
        let app = Arc::new(build_app(&config, &store).await.unwrap());
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, app, config.http.max_body_size, async {
            let _ = stopped.await;
        }));

        let reply = roundtrip(
            addr,
            "GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 200 OK"), "{reply}");
        assert!(reply.to_ascii_lowercase().contains("server: cms-router"));
        assert!(reply.ends_with("ok"));

        let reply = roundtrip(
            addr,
            "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 404"), "{reply}");

        let reply = roundtrip(
            addr,
            "POST /api/articles/1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 64\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 413"), "{reply}");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
