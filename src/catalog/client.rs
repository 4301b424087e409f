//! Catalog client implementation.
use super::{Classification, Episode, Series, resources};
use crate::config::InstanceId;
use crate::transport::{HttpTransport, Transport, TransportError, TransportResponse};
use serde::de::DeserializeOwned;

/// Read-only client for one remote catalog instance.
///
/// Lookups that the remote service cannot satisfy return `None`. Only
/// transport failures are reported as errors.
pub struct CatalogClient<T = HttpTransport> {
    instance: InstanceId,
    transport: T,
}

impl<T: Transport> CatalogClient<T> {
    /// Creates a client for `instance` on top of the given transport.
    pub fn new(instance: InstanceId, transport: T) -> Self {
        Self {
            instance,
            transport,
        }
    }

    /// The instance this client talks to
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Fetches a series by identifier.
    pub fn get_series(&self, series_id: &str) -> Result<Option<Series>, TransportError> {
        let response = self.transport.get(&resources::series(series_id))?;
        Ok(decode_found(&response))
    }

    /// Fetches an episode by identifier.
    ///
    /// When `expected_series_id` is given, an episode that belongs to another
    /// series (or to none) is reported as not found.
    pub fn get_episode(
        &self,
        episode_id: &str,
        expected_series_id: Option<&str>,
    ) -> Result<Option<Episode>, TransportError> {
        let response = self.transport.get(&resources::episode(episode_id))?;
        let episode: Option<Episode> = decode_found(&response);

        Ok(episode.filter(|e| match expected_series_id {
            Some(expected) => e.is_part_of.as_deref() == Some(expected),
            None => true,
        }))
    }

    /// Lists the episodes of a series.
    ///
    /// Episodes come back in the order delivered by the remote service: start
    /// date descending, then title ascending. An empty list is a valid result.
    pub fn list_episodes_in_series(
        &self,
        series_id: &str,
    ) -> Result<Option<Vec<Episode>>, TransportError> {
        let response = self
            .transport
            .get(&resources::episodes_in_series(series_id))?;
        Ok(decode_found(&response))
    }

    /// Determines whether `id` names an episode, a series, or neither.
    ///
    /// The episode probe runs first; the series probe only when it fails.
    pub fn classify_identifier(&self, id: &str) -> Result<Classification, TransportError> {
        if self.transport.get(&resources::episode_probe(id))?.is_ok() {
            return Ok(Classification::Episode);
        }

        if self.transport.get(&resources::series_probe(id))?.is_ok() {
            return Ok(Classification::Series);
        }

        Ok(Classification::Undefined)
    }
}

/// Decodes a 200 response with a non-null body, anything else is `None`
fn decode_found<D: DeserializeOwned>(response: &TransportResponse) -> Option<D> {
    if !response.is_ok() {
        return None;
    }

    match serde_json::from_slice::<Option<D>>(&response.body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "undecodable catalog response");
            None
        }
    }
}
