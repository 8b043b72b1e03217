//! Domain event fan-out: structured log line always, NATS when connected.

use crate::domain::events::DomainEvent;

const SUBJECT_PREFIX: &str = "maison";

#[derive(Clone, Debug, Default)]
pub struct EventBus {
    nats: Option<async_nats::Client>,
}

impl EventBus {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub async fn connect(url: &str) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        tracing::info!(url, "connected to NATS");
        Ok(Self::new(Some(client)))
    }

    /// Publishing failures are logged and swallowed; the write they follow has already happened.
    pub async fn publish(&self, event: DomainEvent) {
        let subject = format!("{SUBJECT_PREFIX}.{}", event.subject());
        tracing::info!(%subject, ?event, "domain event");

        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(%subject, error = %e, "could not serialize event");
                return;
            }
        };
        if let Err(e) = nats.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %e, "could not publish event");
        }
    }
}
