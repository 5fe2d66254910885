use std::sync::Mutex;
use std::time::Duration;

use livery_application::ApplicationError;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("livery/", env!("CARGO_PKG_VERSION"));

/// Downloads image bytes over HTTP(S). Runs on the caller's thread; a failed
/// request is reported once and never retried.
#[derive(Debug)]
pub struct HttpAssetFetcher {
    use_system_proxy: bool,
    client: Mutex<Option<Client>>,
}

impl Default for HttpAssetFetcher {
    fn default() -> Self {
        Self {
            use_system_proxy: true,
            client: Mutex::new(None),
        }
    }
}

impl HttpAssetFetcher {
    /// Connects straight to the host, ignoring proxy environment variables.
    pub fn direct() -> Self {
        Self {
            use_system_proxy: false,
            ..Self::default()
        }
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, ApplicationError> {
        let client = self.client()?;
        debug!(%url, "fetching remote asset");

        let response = client
            .get(url)
            .send()
            .map_err(|error| ApplicationError::Io(format!("{url}: {error}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApplicationError::NotFound(format!("remote asset {url}")));
        }
        if !status.is_success() {
            return Err(ApplicationError::Io(format!("{url}: HTTP status {status}")));
        }

        let body = response
            .bytes()
            .map_err(|error| ApplicationError::Io(format!("{url}: {error}")))?;
        Ok(body.to_vec())
    }

    fn client(&self) -> Result<Client, ApplicationError> {
        let mut slot = self
            .client
            .lock()
            .map_err(|_| ApplicationError::Io("http client lock poisoned".to_string()))?;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);
        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|error| ApplicationError::Io(format!("http client: {error}")))?;
        *slot = Some(client.clone());
        Ok(client)
    }
}
