// Document service HTTP client
//
// Wraps `reqwest::Client` with project-scoped URL construction, bearer
// authentication and status-envelope decoding. Collection paths are
// relative to the database root, e.g. `companies/acme/products`.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::models::{Document, Fields, ListDocumentsResponse, NewDocument, StatusEnvelope};
use crate::error::Error;
use crate::transport::{TransportConfig, decode_json, send_error};

/// Production document endpoint root.
pub const DEFAULT_DOCUMENTS_URL: &str = "https://firestore.googleapis.com/";

const PAGE_SIZE: &str = "300";

/// Raw HTTP client for the document service.
pub struct DocumentsClient {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    timeout: Duration,
}

impl DocumentsClient {
    pub fn new(base_url: Url, project_id: String, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, project_id, transport.timeout))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        project_id: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url,
            project_id,
            timeout,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// List every document in a collection, following page tokens.
    ///
    /// Documents come back in the service's order; callers must not
    /// assume any particular sort.
    pub async fn list_documents(
        &self,
        collection: &str,
        id_token: &SecretString,
    ) -> Result<Vec<Document>, Error> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }
            debug!("GET {}", url);

            let resp = self
                .http
                .get(url)
                .bearer_auth(id_token.expose_secret())
                .send()
                .await
                .map_err(|e| send_error(e, self.timeout))?;
            let page: ListDocumentsResponse = self.parse(resp).await?;

            documents.extend(page.documents);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Create a document with a service-assigned id.
    pub async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
        id_token: &SecretString,
    ) -> Result<Document, Error> {
        let url = self.collection_url(collection)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .bearer_auth(id_token.expose_secret())
            .json(&NewDocument { fields })
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;
        self.parse(resp).await
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// `{base}/v1/projects/{project}/databases/(default)/documents/{collection}`
    fn collection_url(&self, collection: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let collection = collection.trim_matches('/');
        let full = format!(
            "{base}/v1/projects/{}/databases/(default)/documents/{collection}",
            self.project_id
        );
        Ok(Url::parse(&full)?)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            return decode_json(resp).await;
        }

        let body = resp.text().await.unwrap_or_default();
        let (message, code) = match serde_json::from_str::<StatusEnvelope>(&body) {
            Ok(env) => (env.error.message, env.error.status),
            Err(_) => (body, None),
        };
        Err(Error::Documents {
            message,
            status: code,
            http_status: status.as_u16(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn collection_url_is_project_scoped() {
        let client = DocumentsClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://firestore.googleapis.com/").unwrap(),
            "demo-shop".into(),
            Duration::from_secs(5),
        );
        let url = client.collection_url("/companies/acme/products/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/demo-shop/databases/(default)/documents/companies/acme/products"
        );
    }
}
