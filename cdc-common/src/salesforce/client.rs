use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::SalesforceConfig;
use crate::error::QueryError;
use crate::record::SourceRecord;
use crate::salesforce::login::{login, Session};
use crate::salesforce::RecordSource;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    done: bool,
    #[serde(default)]
    records: Vec<SourceRecord>,
    next_records_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    fields: Vec<FieldDescription>,
}

#[derive(Debug, Deserialize)]
struct FieldDescription {
    name: String,
}

/// A Salesforce REST API client bound to one authenticated session. A client that logged in
/// itself logs in again when Salesforce rejects its session.
#[derive(Clone)]
pub struct SalesforceClient {
    client: reqwest::Client,
    session: Arc<RwLock<Session>>,
    credentials: Option<Arc<SalesforceConfig>>,
    api_version: String,
}

impl SalesforceClient {
    /// Log in with the configured credentials and return a client for the resulting session.
    pub async fn connect(config: &SalesforceConfig) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .user_agent("Salesforce CDC Worker")
            .timeout(config.request_timeout.0)
            .build()?;

        let session = login(&client, config).await?;

        let mut salesforce = Self::with_session(client, session, &config.api_version);
        salesforce.credentials = Some(Arc::new(config.clone()));

        Ok(salesforce)
    }

    pub fn with_session(client: reqwest::Client, session: Session, api_version: &str) -> Self {
        Self {
            client,
            session: Arc::new(RwLock::new(session)),
            credentials: None,
            api_version: api_version.to_owned(),
        }
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    fn data_path(&self, path: &str) -> String {
        format!("/services/data/v{}/{}", self.api_version, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, QueryError> {
        let session = self.session().await;

        match self.get_json_with(&session, path, query).await {
            Err(QueryError::Status { status, body }) if status == StatusCode::UNAUTHORIZED => {
                let Some(credentials) = &self.credentials else {
                    warn!("Salesforce rejected the session and no credentials are configured");
                    return Err(QueryError::Status { status, body });
                };

                warn!("Salesforce rejected the session, logging in again: {}", body);
                let session = login(&self.client, credentials).await?;
                *self.session.write().await = session.clone();

                self.get_json_with(&session, path, query).await
            }
            result => result,
        }
    }

    async fn get_json_with<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, QueryError> {
        let response = self
            .client
            .get(format!("{}{}", session.instance_url, path))
            .query(query)
            .bearer_auth(&session.access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status { status, body });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| QueryError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RecordSource for SalesforceClient {
    #[instrument(skip(self))]
    async fn describe_fields(&self, entity: &str) -> Result<Vec<String>, QueryError> {
        let path = self.data_path(&format!("sobjects/{}/describe/", entity));
        let description: DescribeResponse = self.get_json(&path, &[]).await?;

        debug!(
            "{} describes {} fields",
            entity,
            description.fields.len()
        );

        Ok(description
            .fields
            .into_iter()
            .map(|field| field.name)
            .collect())
    }

    #[instrument(skip_all)]
    async fn query_all(&self, soql: &str) -> Result<Vec<SourceRecord>, QueryError> {
        let mut page: QueryResponse = self
            .get_json(&self.data_path("query/"), &[("q", soql)])
            .await?;
        let mut records = std::mem::take(&mut page.records);

        while !page.done {
            let next = page.next_records_url.take().ok_or_else(|| {
                QueryError::InvalidResponse(
                    "query result is not done but holds no nextRecordsUrl".to_owned(),
                )
            })?;

            debug!("fetching next query result page {}", next);
            page = self.get_json(&next, &[]).await?;
            records.append(&mut page.records);
        }

        Ok(records)
    }
}
