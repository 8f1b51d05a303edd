use crate::errors::RecorderError;
use crate::recorder::RequestPath;
use reqwest::{Client, Url};
use std::future::Future;

/// Fetches a server path and returns the response body as text.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, path: &RequestPath) -> impl Future<Output = Result<String, RecorderError>> + Send;
}

/// Talks to a running server over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, RecorderError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, RecorderError> {
        let base_url = Url::parse(base_url).map_err(|err| RecorderError::BaseUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RecorderError::BaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &RequestPath) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().extend(path.segments());
        }
        url
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &RequestPath) -> impl Future<Output = Result<String, RecorderError>> + Send {
        let url = self.url_for(path);
        let path = path.to_string();
        let client = self.client.clone();
        async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|err| RecorderError::Transport {
                    path: path.clone(),
                    message: err.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RecorderError::Status {
                    path,
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|err| RecorderError::Transport {
                path,
                message: err.to_string(),
            })
        }
    }
}
