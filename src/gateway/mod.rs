//! Outbound HTTP calls to the tracker service.
//!
//! Every call carries the current credential, is bounded by the configured
//! timeout, and fails with a [`GatewayError`]. A 401 answer also expires the
//! shared session, but only while it still holds the credential that request
//! carried. Nothing is retried.

mod error;

pub use error::GatewayError;

/// Service endpoints, relative to the base URL.
pub mod paths {
    use crate::model::ApplicationId;

    pub const APPLICATIONS: &str = "/api/applications";
    pub const STATS_SUMMARY: &str = "/api/applications/stats/summary";
    pub const UPCOMING_DEADLINES: &str = "/api/applications/upcoming/deadlines";

    pub fn application(id: &ApplicationId) -> String {
        format!("{APPLICATIONS}/{id}")
    }
}

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    http_client,
    session::{Credential, SessionContext},
};

/// Header carrying the session credential.
pub const AUTH_HEADER: &str = "x-auth-token";

const MAX_RESPONSE_BYTES: usize = 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Client for the service's REST endpoints. Cheap to clone; clones share
/// the connection pool and the session.
#[derive(Clone)]
pub struct GatewayClient {
    agent: ureq::Agent,
    base_url: Url,
    session: Arc<SessionContext>,
}

impl GatewayClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionContext>) -> Self {
        Self {
            agent: http_client::agent(config.timeout()),
            base_url: config.base_url().clone(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let body = self.send(Method::Get, path, query, None)?;
        decode(path, &body)
    }

    pub fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = encode(body)?;
        let body = self.send(Method::Post, path, &[], Some(payload))?;
        decode(path, &body)
    }

    pub fn put<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = encode(body)?;
        let body = self.send(Method::Put, path, &[], Some(payload))?;
        decode(path, &body)
    }

    /// Issue a DELETE; the confirmation body is discarded.
    pub fn delete(&self, path: &str) -> Result<(), GatewayError> {
        self.send(Method::Delete, path, &[], None).map(|_| ())
    }

    /// Resolve `path` (and query pairs) against the base URL.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for segment in path.split('/').filter(|segment| !segment.is_empty()) {
                segments.push(segment);
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        payload: Option<String>,
    ) -> Result<String, GatewayError> {
        let url = self.endpoint(path, query);
        debug!("{} {}", method.as_str(), url);

        let mut request = self
            .agent
            .request(method.as_str(), url.as_str())
            .set("Accept", "application/json");
        let sent = self.session.credential();
        if let Some(credential) = &sent {
            request = request.set(AUTH_HEADER, credential.expose());
        }
        let result = match payload {
            Some(payload) => request
                .set("Content-Type", "application/json")
                .send_string(&payload),
            None => request.call(),
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = http_client::read_response_text(response, MAX_ERROR_BODY_BYTES)
                    .unwrap_or_default();
                return Err(self.status_error(method, path, code, &body, sent.as_ref()));
            }
            Err(ureq::Error::Transport(transport)) => {
                let err = if http_client::is_timeout(&transport) {
                    GatewayError::NetworkTimeout
                } else {
                    GatewayError::NetworkError(transport.to_string())
                };
                warn!("{} {path} failed: {err}", method.as_str());
                return Err(err);
            }
        };

        http_client::read_response_text(response, MAX_RESPONSE_BYTES).map_err(|err| {
            let err = if http_client::is_timeout_io(&err) {
                GatewayError::NetworkTimeout
            } else {
                GatewayError::InvalidResponse(err.to_string())
            };
            warn!("{} {path} body unreadable: {err}", method.as_str());
            err
        })
    }

    fn status_error(
        &self,
        method: Method,
        path: &str,
        code: u16,
        body: &str,
        sent: Option<&Credential>,
    ) -> GatewayError {
        if code == 401 {
            warn!("{} {path} rejected with 401", method.as_str());
            if let Some(sent) = sent {
                self.session.expire_if_current(sent);
            }
            return GatewayError::Unauthorized;
        }
        let err = GatewayError::ApiError {
            status: code,
            message: error::extract_message(body),
        };
        warn!("{} {path} failed: {err}", method.as_str());
        err
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish()
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String, GatewayError> {
    serde_json::to_string(body).map_err(|err| GatewayError::InvalidRequest(err.to_string()))
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|err| {
        warn!("{path} returned an undecodable body: {err}");
        GatewayError::InvalidResponse(err.to_string())
    })
}
