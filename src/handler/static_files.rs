//! Static file serving with single-page-app fallback
//!
//! Any path under the asset root that cannot be read serves the app shell with a 200,
//! so the frontend's client-side router can take over. That covers missing files,
//! directories, permission errors and traversal attempts alike.

use super::{RequestContext, SharedHandler};
use crate::error::ConfigError;
use crate::http::{cache, mime, response, HttpResponse};
use crate::logger;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CACHE_CONTROL, ETAG};
use hyper::StatusCode;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Result of resolving a captured path against the asset root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResponse {
    /// A file under the root was read
    File {
        content_type: &'static str,
        body: Bytes,
        etag: String,
    },
    /// The fallback document, served as-is
    Fallback(Bytes),
}

impl FileResponse {
    pub const fn status(&self) -> StatusCode {
        StatusCode::OK
    }

    pub const fn body(&self) -> &Bytes {
        match self {
            Self::File { body, .. } | Self::Fallback(body) => body,
        }
    }

    /// Build the HTTP response, answering 304 when the client's validator is current
    pub fn into_response(self, if_none_match: Option<&str>) -> HttpResponse {
        match self {
            Self::File {
                content_type,
                body,
                etag,
            } => {
                if cache::etag_matches(if_none_match, &etag) {
                    return response::not_modified(&etag);
                }
                let mut resp = response::bytes(StatusCode::OK, content_type, body);
                if let Ok(value) = HeaderValue::from_str(&etag) {
                    resp.headers_mut().insert(ETAG, value);
                }
                resp.headers_mut().insert(
                    CACHE_CONTROL,
                    HeaderValue::from_static(cache::ASSET_CACHE_CONTROL),
                );
                resp
            }
            Self::Fallback(body) => response::bytes(StatusCode::OK, mime::HTML, body),
        }
    }
}

/// Resolve `captured` under `root`, falling back to `fallback` on any failure
pub async fn resolve(root: &Path, captured: &str, fallback: &Bytes) -> FileResponse {
    let Some(path) = contained_path(root, captured).await else {
        return FileResponse::Fallback(fallback.clone());
    };

    match fs::read(&path).await {
        Ok(content) => {
            let body = Bytes::from(content);
            FileResponse::File {
                content_type: mime::content_type_for(&path),
                etag: cache::generate_etag(&body),
                body,
            }
        }
        Err(e) => {
            logger::log_debug(&format!(
                "Serving fallback document for '{captured}': {e}"
            ));
            FileResponse::Fallback(fallback.clone())
        }
    }
}

/// Join `captured` onto `root`, refusing anything that would leave the root
///
/// Rejects `..`, absolute paths and, once the file exists, symlinks pointing
/// outside the root.
async fn contained_path(root: &Path, captured: &str) -> Option<PathBuf> {
    let mut joined = root.to_path_buf();
    for component in Path::new(captured).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                logger::log_warning(&format!("Path traversal attempt blocked: '{captured}'"));
                return None;
            }
        }
    }

    let canonical_root = fs::canonicalize(root).await.ok()?;
    let canonical = fs::canonicalize(&joined).await.ok()?;
    if canonical.starts_with(&canonical_root) {
        Some(canonical)
    } else {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: '{captured}' -> {}",
            canonical.display()
        ));
        None
    }
}

/// Handler serving files under `root` from the wildcard capture `param`
pub fn files_with_fallback(
    root: impl Into<PathBuf>,
    param: impl Into<String>,
    fallback: Bytes,
) -> SharedHandler {
    let root: Arc<Path> = Arc::from(root.into());
    let param: Arc<str> = Arc::from(param.into());
    super::from_fn(move |ctx: RequestContext| {
        let root = Arc::clone(&root);
        let param = Arc::clone(&param);
        let fallback = fallback.clone();
        async move {
            let captured = ctx.param(&param).unwrap_or_default();
            let file = resolve(&root, captured, &fallback).await;
            Ok(file.into_response(ctx.header("if-none-match")))
        }
    })
}

/// Read a document once at startup, e.g. the app shell used as fallback
pub async fn load_document(path: &Path) -> Result<Bytes, ConfigError> {
    fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| ConfigError::Asset {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::body_string;
    use crate::routing::RoutePattern;

    const SHELL: &[u8] = b"<html>app shell</html>";

    fn asset_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/app.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("main.js"), "main()").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_existing_file() {
        let dir = asset_root();
        let file = resolve(dir.path(), "css/app.css", &Bytes::from_static(SHELL)).await;
        match &file {
            FileResponse::File {
                content_type, body, ..
            } => {
                assert_eq!(*content_type, "text/css; charset=utf-8");
                assert_eq!(body.as_ref(), b"body{}");
            }
            FileResponse::Fallback(_) => panic!("expected file"),
        }
        assert_eq!(file.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_file_serves_fallback() {
        let dir = asset_root();
        let file = resolve(dir.path(), "does-not-exist.js", &Bytes::from_static(SHELL)).await;
        assert_eq!(file, FileResponse::Fallback(Bytes::from_static(SHELL)));
    }

    #[tokio::test]
    async fn test_directory_serves_fallback() {
        let dir = asset_root();
        let file = resolve(dir.path(), "css", &Bytes::from_static(SHELL)).await;
        assert_eq!(file.body().as_ref(), SHELL);
        let file = resolve(dir.path(), "", &Bytes::from_static(SHELL)).await;
        assert_eq!(file.body().as_ref(), SHELL);
    }

    #[tokio::test]
    async fn test_traversal_serves_fallback() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let root = outer.path().join("public");
        std::fs::create_dir_all(&root).unwrap();

        for captured in ["../secret.txt", "css/../../secret.txt", "/etc/passwd"] {
            let file = resolve(&root, captured, &Bytes::from_static(SHELL)).await;
            assert_eq!(file.body().as_ref(), SHELL, "{captured} escaped the root");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_serves_fallback() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let root = outer.path().join("public");
        std::fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("link.txt"))
            .unwrap();

        let file = resolve(&root, "link.txt", &Bytes::from_static(SHELL)).await;
        assert_eq!(file.body().as_ref(), SHELL);
    }

    #[tokio::test]
    async fn test_conditional_request() {
        let dir = asset_root();
        let file = resolve(dir.path(), "main.js", &Bytes::from_static(SHELL)).await;
        let FileResponse::File { etag, .. } = &file else {
            panic!("expected file");
        };
        let etag = etag.clone();
        let response = file.into_response(Some(&etag));
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_handler_uses_named_capture() {
        let dir = asset_root();
        let handler = files_with_fallback(dir.path(), "filename", Bytes::from_static(SHELL));
        let pattern = RoutePattern::compile("/admin/*filename").unwrap();

        let mut ctx = crate::handler::test_support::ctx("GET", "/admin/main.js");
        ctx.set_params(pattern.matches(ctx.path()).unwrap());
        let response = handler.call(ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "main()");

        let mut ctx = crate::handler::test_support::ctx("GET", "/admin/does-not-exist.js");
        ctx.set_params(pattern.matches(ctx.path()).unwrap());
        let response = handler.call(ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], mime::HTML);
        assert_eq!(body_string(response).await, "<html>app shell</html>");
    }

    #[tokio::test]
    async fn test_load_document_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("index.html")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Asset { .. }));
    }
}
