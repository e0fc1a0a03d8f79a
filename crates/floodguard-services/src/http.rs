//! Shared blocking HTTP plumbing for the service adapters.

use std::time::Duration;

use floodguard_core::ProviderError;
use reqwest::blocking::{Client, Response};

const USER_AGENT: &str = concat!("floodguard/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| ProviderError::NotConfigured {
            service: "http",
            message: err.to_string(),
        })
}

/// Map a transport error. Timeouts are reported like any other outage.
pub fn request_error(service: &'static str, err: reqwest::Error) -> ProviderError {
    ProviderError::unavailable(service, err)
}

/// Reject non-2xx responses.
pub fn check_status(service: &'static str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status {
            service,
            status: status.as_u16(),
        })
    }
}

/// Read a successful response body as text.
pub fn read_body(service: &'static str, response: Response) -> Result<String, ProviderError> {
    check_status(service, response)?
        .text()
        .map_err(|err| request_error(service, err))
}

pub fn trim_base(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}
