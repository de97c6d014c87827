use anyhow::{anyhow, Context, Result};
use async_nats::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, request_timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::ConnectOptions::new()
            .request_timeout(Some(request_timeout))
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Send a JSON request and wait for the JSON reply
    pub async fn request<Req, Resp>(&self, subject: &str, message: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(message)?;
        let bytes = payload.len();

        let reply = self
            .client
            .request(subject.to_string(), payload.into())
            .await
            .map_err(|e| anyhow!("Request on {} failed: {}", subject, e))?;

        debug!(
            "Request on {} answered (sent={} bytes, received={} bytes)",
            subject,
            bytes,
            reply.payload.len()
        );

        serde_json::from_slice(&reply.payload)
            .with_context(|| format!("Malformed reply on {}", subject))
    }

    /// Publish a JSON message
    pub async fn publish<M: Serialize>(&self, subject: &str, message: &M) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .context("Failed to publish message")?;

        debug!("Published message to {}", subject);

        Ok(())
    }
}
