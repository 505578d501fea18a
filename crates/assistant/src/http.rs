// Shared HTTP plumbing for the provider transports

use std::io::BufRead;
use std::time::Duration;

use crate::error::ServiceError;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub(crate) const USER_AGENT: &str = concat!("ledgerlens/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client() -> Result<reqwest::blocking::Client, ServiceError> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ServiceError::Transport(e.to_string()))
}

pub(crate) fn send(request: reqwest::blocking::RequestBuilder) -> Result<reqwest::blocking::Response, ServiceError> {
    request
        .send()
        .map_err(|e| ServiceError::Transport(e.to_string()))
}

/// Truncated body for error messages.
pub(crate) fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Read a `text/event-stream` body, calling `on_data` with the payload of
/// every event. Multi-line `data:` fields are joined with `\n`. Returning
/// `Ok(false)` from the callback stops reading.
pub(crate) fn read_sse<R: BufRead>(
    reader: R,
    mut on_data: impl FnMut(&str) -> Result<bool, ServiceError>,
) -> Result<(), ServiceError> {
    let mut data = String::new();
    let mut has_data = false;

    for line in reader.lines() {
        let line = line.map_err(|e| ServiceError::Transport(format!("stream interrupted: {e}")))?;
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            if has_data {
                if !on_data(&data)? {
                    return Ok(());
                }
                data.clear();
                has_data = false;
            }
            continue;
        }
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if has_data {
                data.push('\n');
            }
            data.push_str(value);
            has_data = true;
        }
        // event:, id:, retry: carry nothing the providers need
    }

    if has_data {
        on_data(&data)?;
    }
    Ok(())
}
