//! Course choice aggregation module
//!
//! This module turns the series mappings of a course into the two lookup
//! tables used to populate series and episode selections: series titles keyed
//! by `{series}_{instance}`, and per-series episode titles headed by an
//! "all videos" entry.

use crate::catalog::ClientScope;
use crate::config::InstanceId;
use crate::mapping_store::SeriesMapping;
use crate::transport::{TransportError, TransportFactory};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key of the sentinel entry standing for every episode of a series
pub const ALL_VIDEOS_KEY: &str = "allvideos";

/// How a transport failure for one mapping affects the whole aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first transport failure and return it
    #[default]
    Abort,
    /// Log the failure, skip the mapping and continue with the next one
    SkipFailed,
}

/// Insertion-ordered string-keyed table
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Choices<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for Choices<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Choices<V> {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value of `key`
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up the value of `key`
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<V: Serialize> Serialize for Choices<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Series and episode choices of one course
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CourseChoices {
    /// Choice key to series title
    pub series: Choices<String>,
    /// Choice key to episode identifier to episode title
    pub episodes: Choices<Choices<String>>,
}

/// Builds the composite key `{series}_{instance}`
pub fn choice_key(series_id: &str, instance: InstanceId) -> String {
    format!("{}_{}", series_id, instance)
}

/// Collects the series and episode choices for a set of series mappings
///
/// Mappings are processed in the given order. A mapping whose series cannot be
/// found is skipped; transport failures are handled according to `policy`.
///
/// # Arguments
///
/// * `scope` - Client scope used to reach each mapping's instance
/// * `mappings` - The series mappings of one course, in storage order
/// * `all_videos_label` - Title of the sentinel entry heading each episode table
/// * `policy` - What to do when the transport fails for a mapping
///
/// # Examples
///
/// ```ignore
/// let mut scope = ClientScope::new(&config);
/// let mappings = store.mappings_for_course(42)?;
/// let choices = collect_course_choices(&mut scope, &mappings, "All videos", FailurePolicy::Abort)?;
/// ```
pub fn collect_course_choices<F: TransportFactory>(
    scope: &mut ClientScope<'_, F>,
    mappings: &[SeriesMapping],
    all_videos_label: &str,
    policy: FailurePolicy,
) -> Result<CourseChoices, TransportError> {
    let mut choices = CourseChoices::default();

    for mapping in mappings {
        match add_mapping(scope, mapping, all_videos_label, &mut choices) {
            Ok(()) => {}
            Err(e) if policy == FailurePolicy::SkipFailed => {
                tracing::warn!(
                    series = %mapping.series,
                    instance = %mapping.instance_id,
                    error = %e,
                    "skipping series after transport failure"
                );
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        mappings = mappings.len(),
        series = choices.series.len(),
        "course choices collected"
    );

    Ok(choices)
}

/// Adds the choices of one mapping
///
/// Nothing is inserted until the series lookup has succeeded.
fn add_mapping<F: TransportFactory>(
    scope: &mut ClientScope<'_, F>,
    mapping: &SeriesMapping,
    all_videos_label: &str,
    choices: &mut CourseChoices,
) -> Result<(), TransportError> {
    let client = scope.acquire(mapping.instance_id)?;

    let Some(series) = client.get_series(&mapping.series)? else {
        tracing::warn!(
            series = %mapping.series,
            instance = %mapping.instance_id,
            "series not found, skipping"
        );
        return Ok(());
    };

    let episodes = client.list_episodes_in_series(&mapping.series)?;

    let key = choice_key(&mapping.series, mapping.instance_id);

    let mut episode_choices = Choices::new();
    episode_choices.insert(ALL_VIDEOS_KEY, all_videos_label.to_string());
    match episodes {
        Some(episodes) => {
            for episode in episodes {
                episode_choices.insert(episode.identifier, episode.title);
            }
        }
        None => {
            tracing::warn!(
                series = %mapping.series,
                instance = %mapping.instance_id,
                "episode listing not found"
            );
        }
    }

    choices.series.insert(key.clone(), series.title);
    choices.episodes.insert(key, episode_choices);

    Ok(())
}
