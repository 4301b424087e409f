//! media_catalog - read-only client for a remote media-catalog service
//!
//! This library fetches series and episodes from configured media-catalog
//! instances, classifies opaque identifiers, and aggregates the series
//! attached to a course into ordered choice tables.

mod catalog;
mod config;
mod course_choices;
mod mapping_store;
mod transport;

pub use catalog::{CatalogClient, Classification, ClientScope, Episode, Series};
pub use config::{CatalogConfig, InstanceConfig, InstanceId, Labels};
pub use course_choices::{
    ALL_VIDEOS_KEY, Choices, CourseChoices, FailurePolicy, choice_key, collect_course_choices,
};
pub use mapping_store::{JsonMappingStore, SeriesMapping, SeriesMappingStore};
pub use transport::{HttpTransport, Transport, TransportFactory, TransportResponse};

// Re-export error types
pub use config::ConfigError;
pub use mapping_store::MappingStoreError;
pub use transport::TransportError;

use thiserror::Error;

/// Top-level error type for media_catalog operations
///
/// Display and `source()` are forwarded to the wrapped error.
#[derive(Debug, Error)]
pub enum MediaCatalogError {
    /// Error while loading the configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error while talking to a remote instance
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Error while reading series mappings
    #[error(transparent)]
    MappingStore(#[from] MappingStoreError),
}

/// Builds the series and episode choices of a course
///
/// The mappings of `course_id` are read from `store`, every referenced series
/// is fetched from its configured instance, and the sentinel entry of each
/// episode table is labelled with `config.labels.all_videos`.
///
/// # Arguments
///
/// * `config` - Instance profiles used to reach the remote services
/// * `store` - Source of the course's series mappings
/// * `course_id` - The course to aggregate
/// * `policy` - Whether a transport failure aborts or skips the mapping
///
/// # Examples
///
/// ```no_run
/// use media_catalog::{course_choices, CatalogConfig, FailurePolicy, JsonMappingStore};
/// use std::path::Path;
///
/// let config = CatalogConfig::load(Path::new("config.toml")).unwrap();
/// let store = JsonMappingStore::open(Path::new("mappings.json")).unwrap();
///
/// let choices = course_choices(&config, &store, 42, FailurePolicy::SkipFailed).unwrap();
/// for (key, title) in choices.series.iter() {
///     println!("{}: {}", key, title);
/// }
/// ```
pub fn course_choices<S>(
    config: &CatalogConfig,
    store: &S,
    course_id: u64,
    policy: FailurePolicy,
) -> Result<CourseChoices, MediaCatalogError>
where
    S: SeriesMappingStore + ?Sized,
{
    let mappings = store.mappings_for_course(course_id)?;
    tracing::debug!(course_id, mappings = mappings.len(), "aggregating course");

    let mut scope = ClientScope::new(config);
    let choices =
        collect_course_choices(&mut scope, &mappings, &config.labels.all_videos, policy)?;

    Ok(choices)
}

/// Creates a client for a configured instance
///
/// # Examples
///
/// ```no_run
/// use media_catalog::{connect, CatalogConfig, InstanceId};
/// use std::path::Path;
///
/// let config = CatalogConfig::load(Path::new("config.toml")).unwrap();
/// let client = connect(&config, InstanceId(1)).unwrap();
/// if let Some(series) = client.get_series("b7a9c3e2").unwrap() {
///     println!("{}", series.title);
/// }
/// ```
pub fn connect(
    config: &CatalogConfig,
    instance: InstanceId,
) -> Result<CatalogClient<HttpTransport>, MediaCatalogError> {
    let transport = config.connect(instance)?;
    Ok(CatalogClient::new(instance, transport))
}
