use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::state::LauncherSettings;

const APP_USER_AGENT: &str = "Limacina/0.1.0";

/// Shared client for manifests and artifacts.
///
/// `identity` encoding keeps `Content-Length` equal to the bytes we write,
/// which the progress denominator relies on.
pub fn build_http_client(settings: &LauncherSettings) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .read_timeout(Duration::from_secs(settings.read_timeout_secs))
        .build()
}
