//! Stateless XRPC request building and response handling.

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue, WWW_AUTHENTICATE};
use http::{Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;
use url::Url;

use crate::error::{
    ApiError, ApiResult, AuthError, DecodeError, EncodeError, GenericXrpcError, HttpError,
    TransportError,
};
use crate::http_client::HttpClient;

/// XRPC method kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrpcMethod {
    /// Query (HTTP GET)
    Query,
    /// Procedure (HTTP POST) with the given body encoding
    Procedure(&'static str),
}

impl XrpcMethod {
    /// Get the HTTP method string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "GET",
            Self::Procedure(_) => "POST",
        }
    }
}

/// A typed XRPC call.
///
/// Query parameters come from serializing the request as a form; procedure
/// bodies from serializing it as JSON.
pub trait XrpcRequest: Serialize {
    /// Method NSID, e.g. `app.bsky.actor.getProfile`
    const NSID: &'static str;
    /// Query or procedure
    const METHOD: XrpcMethod;
    /// Decoded success body
    type Output: DeserializeOwned;

    /// Procedure body; JSON unless overridden
    fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Bearer access token
    pub auth: Option<SmolStr>,
    /// `atproto-proxy` header value, e.g. `did:web:api.bsky.app#bsky_appview`
    pub atproto_proxy: Option<SmolStr>,
}

/// Build an HTTP request for an XRPC call given base URL and options
pub fn build_http_request<R: XrpcRequest>(
    base: &Url,
    req: &R,
    opts: &CallOptions,
) -> ApiResult<Request<Vec<u8>>> {
    let mut url = base.clone();
    let mut path = url.path().trim_end_matches('/').to_owned();
    path.push_str("/xrpc/");
    path.push_str(R::NSID);
    url.set_path(&path);

    if let XrpcMethod::Query = R::METHOD {
        let qs = serde_html_form::to_string(req).map_err(EncodeError::from)?;
        url.set_query((!qs.is_empty()).then_some(qs.as_str()));
    }

    let mut builder = Request::builder()
        .method(R::METHOD.as_str())
        .uri(url.as_str())
        .header(ACCEPT, "application/json");

    if let XrpcMethod::Procedure(encoding) = R::METHOD {
        builder = builder.header(CONTENT_TYPE, encoding);
    }
    if let Some(token) = &opts.auth {
        let hv = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            TransportError::InvalidRequest(format!("Invalid authorization token: {e}"))
        })?;
        builder = builder.header(AUTHORIZATION, hv);
    }
    if let Some(proxy) = &opts.atproto_proxy {
        builder = builder.header(HeaderName::from_static("atproto-proxy"), proxy.as_str());
    }

    let body = match R::METHOD {
        XrpcMethod::Procedure(_) => req.encode_body()?,
        XrpcMethod::Query => Vec::new(),
    };

    builder
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
}

/// Turn a raw response into the call's output or a typed error.
///
/// A 401 carrying `WWW-Authenticate` surfaces the challenge as
/// [`AuthError::Other`]. 400/401 bodies are read as XRPC errors, with
/// `ExpiredToken` and `InvalidToken` mapped to [`AuthError`].
pub fn process_response<R: XrpcRequest>(response: Response<Vec<u8>>) -> ApiResult<R::Output> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        if let Some(hv) = response.headers().get(WWW_AUTHENTICATE) {
            return Err(AuthError::Other(hv.clone()).into());
        }
    }
    let body = response.into_body();

    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|e| DecodeError::Json(e).into());
    }

    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
        if let Ok(mut generic) = serde_json::from_slice::<GenericXrpcError>(&body) {
            generic.nsid = R::NSID;
            generic.method = R::METHOD.as_str();
            generic.http_status = status;
            return Err(match generic.error.as_str() {
                "ExpiredToken" => AuthError::TokenExpired.into(),
                "InvalidToken" => AuthError::InvalidToken.into(),
                _ if status == StatusCode::UNAUTHORIZED => AuthError::NotAuthenticated.into(),
                _ => ApiError::Xrpc(generic),
            });
        }
    }

    Err(HttpError {
        status,
        body: Some(body.into()),
    }
    .into())
}

/// Build, send and decode one XRPC call.
#[tracing::instrument(level = "debug", skip(client, base, request, opts), fields(nsid = R::NSID, base = %base))]
pub async fn send<C, R>(
    client: &C,
    base: &Url,
    request: &R,
    opts: &CallOptions,
) -> ApiResult<R::Output>
where
    C: HttpClient + Sync,
    R: XrpcRequest + Sync,
{
    let http_request = build_http_request(base, request, opts)?;
    let http_response = client
        .send_http(http_request)
        .await
        .map_err(|e| ApiError::Transport(e.into()))?;
    tracing::debug!(status = %http_response.status(), "xrpc response");
    process_response::<R>(http_response)
}
