//! Raw HTTP seam under the XRPC layer; tests swap in a queued mock.

use std::future::Future;
use std::sync::Arc;

use crate::error::TransportError;

/// Sends one fully-built HTTP request and buffers the whole response.
#[trait_variant::make(Send)]
pub trait HttpClient {
    /// Client failure, classified into a [`TransportError`] by the XRPC layer
    type Error: std::error::Error + Send + Sync + 'static + Into<TransportError>;

    /// Send `request` and collect the response body
    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = Result<http::Response<Vec<u8>>, Self::Error>>;
}

impl HttpClient for reqwest::Client {
    type Error = reqwest::Error;

    async fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, Self::Error> {
        let (parts, body) = request.into_parts();
        let mut outgoing = self.request(parts.method, parts.uri.to_string()).body(body);
        for (name, value) in parts.headers.iter() {
            outgoing = outgoing.header(name.as_str(), value.as_bytes());
        }

        let incoming = outgoing.send().await?;
        let status = incoming.status();
        let headers = incoming.headers().clone();
        let body = incoming.bytes().await?.to_vec();

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

impl<T: HttpClient + Sync> HttpClient for Arc<T> {
    type Error = T::Error;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = Result<http::Response<Vec<u8>>, Self::Error>> + Send {
        self.as_ref().send_http(request)
    }
}
