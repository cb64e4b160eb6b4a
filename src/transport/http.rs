use std::time::Duration;

use tracing::{debug, info};

use super::Transport;
use crate::envelope::Envelope;
use crate::errors::{OtaError, Result};

/// Blocking HTTPS transport built on `ureq`.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Build a transport with a whole-request timeout and optional proxy
    /// (`http://`, `https://`, `socks5://` URLs).
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let proxy = match proxy.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(
                ureq::Proxy::new(p)
                    .map_err(|e| OtaError::Config(format!("invalid proxy '{p}': {e}")))?,
            ),
            None => None,
        };

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            // Non-2xx replies still carry a body worth reporting.
            .http_status_as_error(false)
            .proxy(proxy)
            .build();

        Ok(Self {
            agent: config.into(),
        })
    }
}

impl Transport for HttpTransport {
    fn post(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        let mut request = self.agent.post(envelope.url.as_str());
        for (name, value) in &envelope.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        info!(url = %envelope.url, "sending update query");
        let mut response = request
            .send(envelope.body.as_str())
            .map_err(|e| OtaError::Transport(format!("POST {} failed: {e}", envelope.url)))?;

        let status = response.status();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| OtaError::Transport(format!("reading reply failed: {e}")))?;
        debug!(status = status.as_u16(), len = bytes.len(), "reply received");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_proxy() {
        assert!(HttpTransport::new(Duration::from_secs(5), None).is_ok());
        assert!(HttpTransport::new(Duration::from_secs(5), Some("  ")).is_ok());
    }

    #[test]
    fn builds_with_http_proxy() {
        assert!(HttpTransport::new(Duration::from_secs(5), Some("http://127.0.0.1:8080")).is_ok());
    }
}
