//! HTTP Basic authentication gate
//!
//! Every rejection looks the same to the client: missing header, wrong scheme, bad
//! base64, unknown user and wrong password all produce the same 401.

use super::{Middleware, Next, SharedMiddleware};
use crate::handler::{BoxFuture, HandlerResult, RequestContext};
use crate::http::{response, HttpResponse};
use crate::logger;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::StatusCode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use subtle::{Choice, ConstantTimeEq};

pub const DEFAULT_REALM: &str = "Log in to the admin panel";
pub const DEFAULT_BODY: &str = "Not authorized, try request again with credentials.";

/// Longest password the gate can hold; longer stored or presented passwords never match
pub const MAX_PASSWORD_LEN: usize = 256;

/// A password padded to a fixed width
///
/// Comparing two secrets always touches `MAX_PASSWORD_LEN` bytes plus the lengths,
/// whatever the real lengths are.
#[derive(Clone)]
struct Secret {
    bytes: [u8; MAX_PASSWORD_LEN],
    len: u64,
    /// 1 when non-empty and within `MAX_PASSWORD_LEN`
    usable: u8,
}

/// Compared against when the username is unknown, so both paths do the same work
static UNKNOWN_USER: Secret = Secret {
    bytes: [0; MAX_PASSWORD_LEN],
    len: 0,
    usable: 0,
};

impl Secret {
    fn new(password: &str) -> Self {
        let raw = password.as_bytes();
        let mut bytes = [0; MAX_PASSWORD_LEN];
        let kept = raw.len().min(MAX_PASSWORD_LEN);
        bytes[..kept].copy_from_slice(&raw[..kept]);
        Self {
            bytes,
            len: u64::try_from(raw.len()).unwrap_or(u64::MAX),
            usable: u8::from(!raw.is_empty() && raw.len() <= MAX_PASSWORD_LEN),
        }
    }

    fn ct_matches(&self, presented: &Self) -> Choice {
        self.bytes[..].ct_eq(&presented.bytes[..])
            & self.len.ct_eq(&presented.len)
            & Choice::from(self.usable & presented.usable)
    }
}

/// Username to password map, filled once at startup and only read afterwards
#[derive(Clone, Default)]
pub struct Credentials {
    users: HashMap<String, Secret>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.insert(username, password);
        self
    }

    /// Empty passwords are stored but never verify
    pub fn insert(&mut self, username: impl Into<String>, password: impl Into<String>) {
        let password: String = password.into();
        self.users.insert(username.into(), Secret::new(&password));
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check a username/password pair in constant time over the password
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let presented = Secret::new(password);
        let (expected, known) = match self.users.get(username) {
            Some(expected) => (expected, Choice::from(1)),
            None => (&UNKNOWN_USER, Choice::from(0)),
        };
        (expected.ct_matches(&presented) & known).into()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut users: Vec<&str> = self.users.keys().map(String::as_str).collect();
        users.sort_unstable();
        f.debug_struct("Credentials").field("users", &users).finish()
    }
}

impl<U, P> FromIterator<(U, P)> for Credentials
where
    U: Into<String>,
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (U, P)>>(iter: I) -> Self {
        let mut credentials = Self::new();
        for (username, password) in iter {
            credentials.insert(username, password);
        }
        credentials
    }
}

/// Decode `Basic <base64(username:password)>`
///
/// The password is everything after the first colon, so it may contain colons itself.
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Builds the rejection response; its status and challenge header are enforced afterwards
pub type UnauthorizedHandler = Arc<dyn Fn(&RequestContext) -> HttpResponse + Send + Sync>;

pub struct BasicAuth {
    credentials: Arc<Credentials>,
    realm: String,
    on_unauthorized: UnauthorizedHandler,
}

impl BasicAuth {
    /// Gate with the stock 401 body and a challenge for `realm`
    pub fn new(credentials: Arc<Credentials>, realm: impl Into<String>) -> Self {
        let realm = realm.into();
        let challenge_realm = realm.clone();
        Self {
            credentials,
            realm,
            on_unauthorized: Arc::new(move |_| {
                response::unauthorized(&challenge_realm, DEFAULT_BODY)
            }),
        }
    }

    #[must_use]
    pub fn on_unauthorized(mut self, handler: UnauthorizedHandler) -> Self {
        self.on_unauthorized = handler;
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    fn authorized(&self, ctx: &RequestContext) -> bool {
        ctx.header(AUTHORIZATION.as_str())
            .and_then(parse_basic)
            .is_some_and(|(username, password)| self.credentials.verify(&username, &password))
    }

    fn reject(&self, ctx: &RequestContext) -> HttpResponse {
        let mut response = (self.on_unauthorized)(ctx);
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        if !response.headers().contains_key(WWW_AUTHENTICATE) {
            let challenge = format!("Basic realm=\"{}\"", self.realm.replace('"', "'"));
            let value = HeaderValue::from_str(&challenge)
                .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl Middleware for BasicAuth {
    fn handle(&self, ctx: RequestContext, next: Next) -> BoxFuture<HandlerResult> {
        if self.authorized(&ctx) {
            return next.run(ctx);
        }
        logger::log_debug(&format!(
            "Rejected unauthenticated {} {}",
            ctx.method(),
            ctx.path()
        ));
        let response = self.reject(&ctx);
        Box::pin(async move { Ok(response) })
    }
}

/// Basic auth middleware with a caller-supplied rejection response
pub fn gate(
    credentials: Arc<Credentials>,
    on_unauthorized: UnauthorizedHandler,
) -> SharedMiddleware {
    Arc::new(BasicAuth::new(credentials, DEFAULT_REALM).on_unauthorized(on_unauthorized))
}
