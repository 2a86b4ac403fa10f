//! http client
//!
//! posts `{query, variables}` to the configured endpoint and implements
//! [`Transport`] for the state machines.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::graphql::{GraphQlError, GraphQlResponse};
use crate::operation::Operation;
use crate::request::Request;
use crate::transport::{BoxFutureResult, Transport};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// graphql client over http
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    endpoint: Url,
    http: reqwest::Client,
}

impl Client {
    /// create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = config.validate()?.clone();

        let http = match &config.http_client {
            Some(http) => http.clone(),
            None => {
                let mut headers = HeaderMap::new();
                if let Some(token) = &config.token {
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!("bearer {token}")).map_err(|err| {
                            Error::Config(format!("invalid bearer token header value: {err}"))
                        })?,
                    );
                }
                headers.extend(config.extra_headers.clone());

                let mut builder = reqwest::Client::builder()
                    .default_headers(headers)
                    .user_agent(config.user_agent.clone())
                    .timeout(config.timeout)
                    .danger_accept_invalid_certs(!config.verify_ssl);
                if let Some(customize) = &config.http_client_builder {
                    builder = customize(builder);
                }
                builder.build()?
            }
        };

        Ok(Self {
            config: Arc::new(config),
            endpoint,
            http,
        })
    }

    /// access the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// send a request and return the raw json response
    pub async fn execute_raw(&self, request: &Request) -> Result<GraphQlResponse<Value>> {
        self.execute(request).await
    }

    /// send a request and deserialize data into a typed response
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &Request,
    ) -> Result<GraphQlResponse<T>> {
        self.execute_with(request, |url, body| async move {
            let response = self.http.post(url).json(&body).send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok((status, text))
        })
        .await
    }

    /// execute a typed operation
    pub async fn execute_operation<O: Operation>(
        &self,
        variables: crate::request::Variables,
    ) -> Result<GraphQlResponse<O::Response>> {
        self.execute(&O::request(variables)).await
    }

    pub(crate) async fn execute_with<T: DeserializeOwned, F, Fut>(
        &self,
        request: &Request,
        send: F,
    ) -> Result<GraphQlResponse<T>>
    where
        F: FnOnce(Url, Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let body = serde_json::to_value(request)?;
        let operation = request.operation_name();
        debug!(
            endpoint = %self.endpoint,
            operation = operation.as_deref().unwrap_or("<anonymous>"),
            "posting graphql request"
        );

        let (status, text) = send(self.endpoint.clone(), body).await?;
        let parsed = parse_graphql_response(status, text);
        if let Err(err) = &parsed {
            warn!(%status, error = %err, "graphql request failed");
        }
        parsed
    }
}

impl Transport for Client {
    fn query(&self, request: Request) -> BoxFutureResult<'_, GraphQlResponse<Value>> {
        Box::pin(async move { self.execute_raw(&request).await })
    }

    fn mutate(&self, request: Request) -> BoxFutureResult<'_, GraphQlResponse<Value>> {
        Box::pin(async move { self.execute_raw(&request).await })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

fn parse_graphql_response<T: DeserializeOwned>(
    status: StatusCode,
    text: String,
) -> Result<GraphQlResponse<T>> {
    if !status.is_success() {
        let errors = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.errors)
            .unwrap_or_default();
        let message = errors
            .first()
            .map(|err| err.message.clone())
            .unwrap_or_else(|| format!("graphql http error: {}", status));
        return Err(Error::GraphQl {
            status: Some(status.as_u16()),
            errors,
            body: text,
            message,
        });
    }

    Ok(serde_json::from_str(&text)?)
}
