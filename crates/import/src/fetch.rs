use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where an export lives in the blob store: account endpoint, container and
/// object name, with an optional pre-signed query token for private stores.
#[derive(Debug, Clone)]
pub struct BlobLocation {
    pub account_url: String,
    pub container: String,
    pub blob: String,
    pub sas_token: Option<String>,
}

impl BlobLocation {
    pub fn url(&self) -> String {
        let base = self.account_url.trim_end_matches('/');
        let mut url = format!("{base}/{}/{}", self.container, self.blob);
        if let Some(token) = &self.sas_token {
            url.push('?');
            url.push_str(token.trim_start_matches('?'));
        }
        url
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("blob store returned {status} for {container}/{blob}")]
    Status {
        status: StatusCode,
        container: String,
        blob: String,
    },
    #[error("could not write downloaded export: {0}")]
    Write(#[from] std::io::Error),
}

/// Downloads the export blob to `dest`. Connectivity and authorization
/// failures surface as errors; callers treat any of them as "no data
/// available" rather than aborting the session.
pub async fn download_export(location: &BlobLocation, dest: &Path) -> Result<PathBuf, FetchError> {
    let response = reqwest::get(location.url()).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            container: location.container.clone(),
            blob: location.blob.clone(),
        });
    }

    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes).await?;

    tracing::info!(
        "Downloaded {}/{} ({} bytes) to {}",
        location.container,
        location.blob,
        bytes.len(),
        dest.display()
    );
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(account_url: &str, sas_token: Option<&str>) -> BlobLocation {
        BlobLocation {
            account_url: account_url.to_string(),
            container: "bankstatements".to_string(),
            blob: "Data_export_09052025.csv".to_string(),
            sas_token: sas_token.map(str::to_string),
        }
    }

    #[test]
    fn url_joins_container_and_blob() {
        let loc = location("https://acct.blob.example.net", None);
        assert_eq!(
            loc.url(),
            "https://acct.blob.example.net/bankstatements/Data_export_09052025.csv"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash_on_account() {
        let loc = location("https://acct.blob.example.net/", None);
        assert_eq!(
            loc.url(),
            "https://acct.blob.example.net/bankstatements/Data_export_09052025.csv"
        );
    }

    #[test]
    fn url_appends_sas_token_once() {
        let loc = location("https://acct.blob.example.net", Some("?sv=2024&sig=abc"));
        assert_eq!(
            loc.url(),
            "https://acct.blob.example.net/bankstatements/Data_export_09052025.csv?sv=2024&sig=abc"
        );
    }
}
