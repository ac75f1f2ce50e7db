use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to load {path}: {status}")]
    Status { path: String, status: u16 },

    #[error("Request for {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of site-relative documents (`assets/data/exercises.json`,
/// `legacy/<file>.html`).
pub trait Fetcher: Send + Sync + 'static {
    fn fetch_text(&self, path: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Fetches relative paths against an HTTP base URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    base: String,
}

impl HttpFetcher {
    pub fn new(base: &str) -> Self {
        HttpFetcher {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.base, path);
        let http = |source| FetchError::Http {
            path: path.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(http)
    }
}

/// Reads relative paths from a local site root.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirFetcher { root: root.into() }
    }
}

impl Fetcher for DirFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        tokio::fs::read_to_string(self.root.join(path))
            .await
            .map_err(|source| FetchError::Io {
                path: path.to_string(),
                source,
            })
    }
}

/// Either source, chosen from a command-line argument.
pub enum Source {
    Http(HttpFetcher),
    Dir(DirFetcher),
}

impl Source {
    /// `http://` and `https://` arguments are base URLs; anything else is a
    /// directory.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Http(HttpFetcher::new(arg))
        } else {
            Source::Dir(DirFetcher::new(arg))
        }
    }

    /// Where a site-relative path lives, for handing to a browser.
    pub fn resolve(&self, path: &str) -> String {
        match self {
            Source::Http(f) => format!("{}/{}", f.base, path),
            Source::Dir(f) => f.root.join(path).display().to_string(),
        }
    }
}

impl Fetcher for Source {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        match self {
            Source::Http(f) => f.fetch_text(path).await,
            Source::Dir(f) => f.fetch_text(path).await,
        }
    }
}
