use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::Response;
use sim_geo::ZoneDirectory;
use sim_proto::{ConstituentMessage, ReactionRequest, SimulationEvent, SimulationRequest};
use tokio::sync::OnceCell;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::reactions::ReactionSynthesizer;
use crate::stream::{ByteStream, ChunkStream};

/// HTTP access to the simulation backend.
#[derive(Debug)]
pub struct SimulationClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    zones: OnceCell<Arc<ZoneDirectory>>,
}

impl SimulationClient {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            http,
            config,
            zones: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts a run. Comments are synthesized for every event.
    ///
    /// A non-2xx answer is returned as [`ClientError::Status`] before any
    /// chunk is produced.
    pub async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<ChunkStream<ByteStream>, ClientError> {
        let reactions = ReactionSynthesizer::new(&self.config.reactions);
        self.simulate_with(request, Some(reactions)).await
    }

    pub async fn simulate_with(
        &self,
        request: &SimulationRequest,
        reactions: Option<ReactionSynthesizer>,
    ) -> Result<ChunkStream<ByteStream>, ClientError> {
        let url = self.config.simulate_url();
        tracing::info!(
            target: "policy_sim::client",
            url = %url,
            zones = request.selected_zones.len(),
            "simulate.request"
        );
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: ByteStream = Box::pin(response.bytes_stream());
        Ok(ChunkStream::new(body, reactions))
    }

    /// Asks the backend for constituent reactions to one event.
    pub async fn fetch_reactions(
        &self,
        event: &SimulationEvent,
    ) -> Result<Vec<ConstituentMessage>, ClientError> {
        let response = self
            .http
            .post(self.config.messages_url())
            .json(&ReactionRequest::for_event(event))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Zone directory, loaded on first call and shared afterwards.
    pub async fn zone_directory(&self) -> Result<Arc<ZoneDirectory>, ClientError> {
        self.zones
            .get_or_try_init(|| self.load_zones())
            .await
            .cloned()
    }

    async fn load_zones(&self) -> Result<Arc<ZoneDirectory>, ClientError> {
        let directory = if let Some(url) = &self.config.zones_url {
            tracing::info!(target: "policy_sim::client", url = %url, "zones.fetch");
            let response = ensure_success(self.http.get(url).send().await?).await?;
            let body = response.text().await?;
            ZoneDirectory::from_geojson_str(&body)?
        } else if let Some(path) = &self.config.zones_path {
            tracing::info!(target: "policy_sim::client", path = %path.display(), "zones.read");
            ZoneDirectory::from_file(path)?
        } else {
            return Err(ClientError::NoZoneSource);
        };
        Ok(Arc::new(directory))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        target: "policy_sim::client",
        status = status.as_u16(),
        "http.unsuccessful_status"
    );
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
