use crate::model::{PastSeason, SeasonId, TeamSummary, View, ViewDescriptor};
use log::{debug, warn};
use reqwest::{
    Client, ClientBuilder, Method, RequestBuilder, StatusCode,
    header::{AUTHORIZATION, HeaderValue},
};
use serde::de::DeserializeOwned;
use std::{future::Future, time::Duration};
use thiserror::Error;

const VIEWS_ENDPOINT: &str = "/api/teams/available-views";
const TEAMS_ENDPOINT: &str = "/api/teams/sidebar";
const SEASONS_ENDPOINT: &str = "/api/seasons/past";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Could not parse the {endpoint} response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} reported a failure: {message}")]
    Unsuccessful {
        endpoint: &'static str,
        message: String,
    },
    #[error("{endpoint} response has no `{field}` field")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },
    #[error("The access token contains characters that can't be sent in a header")]
    InvalidToken,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// The dashboard endpoints the sidebar reads from.
pub trait SidebarApi {
    fn available_views(&self) -> impl Future<Output = Result<Vec<ViewDescriptor>>> + Send;

    fn sidebar_teams(
        &self,
        view: &View,
        season_id: Option<SeasonId>,
    ) -> impl Future<Output = Result<Vec<TeamSummary>>> + Send;

    fn past_seasons(&self) -> impl Future<Output = Result<Vec<PastSeason>>> + Send;
}

#[derive(Clone, Debug)]
pub struct PortalClient {
    base_url: String,
    access_token: Option<HeaderValue>,
    client: Client,
}

impl PortalClient {
    pub fn new(
        base_url: &str,
        access_token: Option<&str>,
        require_https: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let client = ClientBuilder::new()
            .https_only(require_https)
            .timeout(timeout)
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        let mut portal = Self {
            base_url,
            access_token: None,
            client,
        };
        if let Some(token) = access_token {
            portal.set_token(token)?;
        }
        Ok(portal)
    }

    pub fn set_token(&mut self, token: &str) -> Result<()> {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        self.access_token = Some(value);
        Ok(())
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{endpoint}", self.base_url);
        let mut request = self.client.request(Method::GET, url);
        if let Some(token) = &self.access_token {
            request = request.header(AUTHORIZATION, token.clone());
        }
        request
    }
}

impl SidebarApi for PortalClient {
    fn available_views(&self) -> impl Future<Output = Result<Vec<ViewDescriptor>>> + Send {
        let request = self.request(VIEWS_ENDPOINT).send();

        async move {
            let body = read_body(VIEWS_ENDPOINT, request.await?).await?;
            let views: Vec<ViewDescriptor> = take_field(VIEWS_ENDPOINT, body, "views")?;
            debug!("Server offered {} team views", views.len());
            Ok(views)
        }
    }

    fn sidebar_teams(
        &self,
        view: &View,
        season_id: Option<SeasonId>,
    ) -> impl Future<Output = Result<Vec<TeamSummary>>> + Send {
        let mut request = self
            .request(TEAMS_ENDPOINT)
            .query(&[("view", view.as_str())]);
        if let Some(season_id) = season_id {
            request = request.query(&[("season_id", season_id)]);
        }
        let request = request.send();

        async move {
            let body = read_body(TEAMS_ENDPOINT, request.await?).await?;
            take_field(TEAMS_ENDPOINT, body, "teams")
        }
    }

    fn past_seasons(&self) -> impl Future<Output = Result<Vec<PastSeason>>> + Send {
        let request = self.request(SEASONS_ENDPOINT).send();

        async move {
            let body = read_body(SEASONS_ENDPOINT, request.await?).await?;
            take_field(SEASONS_ENDPOINT, body, "seasons")
        }
    }
}

async fn read_body(endpoint: &'static str, response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();
    if status == StatusCode::OK {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Parse { endpoint, source })
    } else {
        warn!("{endpoint} request failed, response: {response:?}");
        let body = response.text().await?;
        Err(ApiError::Status {
            endpoint,
            status,
            body,
        })
    }
}

/// Checks the `success` flag of a dashboard response and pulls `field` out of it
pub(crate) fn take_field<T: DeserializeOwned>(
    endpoint: &'static str,
    mut body: serde_json::Value,
    field: &'static str,
) -> Result<T> {
    if !body["success"].as_bool().unwrap_or(false) {
        let message = body["error"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("no reason given")
            .to_string();
        return Err(ApiError::Unsuccessful { endpoint, message });
    }

    match body.get_mut(field).map(serde_json::Value::take) {
        Some(serde_json::Value::Null) | None => Err(ApiError::MissingField { endpoint, field }),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| ApiError::Parse { endpoint, source })
        }
    }
}
