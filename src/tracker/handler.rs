use std::net::IpAddr;

use super::request::AnnounceRequest;
use super::response::AnnounceResponse;
use crate::bencode::{encode_dict, Value};
use crate::constants::HTTP_INTERNAL_ERROR;

/// Decides what a validated announce gets back.
///
/// `remote` is the address the request arrived from. Implementations that
/// track peers should prefer [`AnnounceRequest::ip`] when it is set.
pub trait AnnounceHandler {
    fn announce(&self, request: &AnnounceRequest, remote: IpAddr) -> AnnounceResponse;
}

impl<F> AnnounceHandler for F
where
    F: Fn(&AnnounceRequest, IpAddr) -> AnnounceResponse,
{
    fn announce(&self, request: &AnnounceRequest, remote: IpAddr) -> AnnounceResponse {
        self(request, remote)
    }
}

/// Status and bencoded body ready to be written by any HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn failure(status: u16, reason: &str) -> Self {
        let reason = Value::string(reason);
        Self {
            status,
            body: encode_dict([("failure reason", Some(&reason))]),
        }
    }
}

/// Validates an announce query, runs `handler`, and encodes the result.
///
/// Invalid queries are answered with 400 and a `failure reason` without
/// reaching the handler.
///
/// ```
/// use bcanon::tracker::{handle_announce, AnnounceRequest, AnnounceResponse};
/// use std::net::{IpAddr, Ipv4Addr};
///
/// let handler = |_: &AnnounceRequest, _: IpAddr| AnnounceResponse::Peers {
///     interval: 60,
///     peers: Vec::new(),
/// };
/// let remote = IpAddr::V4(Ipv4Addr::LOCALHOST);
///
/// let response = handle_announce("port=1", remote, &handler);
/// assert_eq!(response.status, 400);
/// assert_eq!(response.body, b"d14:failure reason30:Missing or invalid `info_hash`e");
/// ```
pub fn handle_announce<H>(query: &str, remote: IpAddr, handler: &H) -> HttpResponse
where
    H: AnnounceHandler + ?Sized,
{
    let request = match AnnounceRequest::from_query(query) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(%remote, error = %err, "rejected announce");
            return HttpResponse::failure(err.status(), &err.to_string());
        }
    };

    let response = handler.announce(&request, remote);
    let status = response.status();

    match response.to_bytes() {
        Ok(body) => {
            tracing::debug!(
                info_hash = %request.info_hash,
                %remote,
                status,
                event = request.event.as_str(),
                "announce handled"
            );
            HttpResponse { status, body }
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to encode announce response");
            HttpResponse::failure(HTTP_INTERNAL_ERROR, "internal server error")
        }
    }
}
