use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use crate::resources::fetch_bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    Available { latest: String },
}

/// Compares the launcher version published at `url` with `current`.
///
/// The remote file holds a bare version string. Any difference counts as
/// an update, there is no ordering between versions.
#[instrument(skip(client))]
pub async fn check_update(
    client: &Client,
    url: Url,
    current: &str,
) -> crate::Result<UpdateStatus> {
    let filebuf = fetch_bytes(client, url).await?;
    let latest = String::from_utf8_lossy(&filebuf).trim().to_owned();
    if latest == current {
        return Ok(UpdateStatus::UpToDate);
    }
    info!(%latest, %current, "Launcher update available");
    Ok(UpdateStatus::Available { latest })
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    async fn serve(body: &'static str, status: u16) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/launcher/version.txt"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/launcher/version.txt", server.uri())).unwrap();
        (server, url)
    }

    #[tokio::test]
    async fn same_version_is_up_to_date() {
        let (_server, url) = serve("0.1.0\n", 200).await;
        let status = check_update(&Client::new(), url, "0.1.0").await.unwrap();
        assert_eq!(status, UpdateStatus::UpToDate);
    }

    #[tokio::test]
    async fn different_version_is_an_update() {
        let (_server, url) = serve("0.2.0", 200).await;
        let status = check_update(&Client::new(), url, "0.1.0").await.unwrap();
        assert_eq!(
            status,
            UpdateStatus::Available {
                latest: "0.2.0".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let (_server, url) = serve("", 500).await;
        let err = check_update(&Client::new(), url, "0.1.0").await.unwrap_err();
        assert!(matches!(err, crate::Error::Reqwest(_)));
    }
}
