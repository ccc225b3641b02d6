use crate::repos::Repos;
use chrono::{DateTime, Utc};
use notibot_domain::{Event, EventCategory};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info};

const SAMPLE_EVENTS: &str = include_str!("../seed/sample_events.json");

/// Events of one organization as found in a data source file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDataset {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub events: Vec<SeedEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEvent {
    #[serde(default)]
    pub external_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl SeedEvent {
    fn into_event(self, organization: Option<String>) -> Event {
        Event {
            id: Default::default(),
            title: self.title,
            description: self.description,
            category: self
                .category
                .map(|c| EventCategory::parse(&c))
                .unwrap_or_default(),
            location: self.location,
            start_time: self.datetime,
            organization,
        }
    }
}

/// A data source file holds either a list of datasets or a single one
#[derive(Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Many(Vec<SeedDataset>),
    One(SeedDataset),
}

impl From<SeedFile> for Vec<SeedDataset> {
    fn from(file: SeedFile) -> Self {
        match file {
            SeedFile::Many(datasets) => datasets,
            SeedFile::One(dataset) => vec![dataset],
        }
    }
}

pub fn parse_datasets(raw: &str) -> serde_json::Result<Vec<SeedDataset>> {
    serde_json::from_str::<SeedFile>(raw).map(Into::into)
}

pub fn sample_datasets() -> Vec<SeedDataset> {
    parse_datasets(SAMPLE_EVENTS).unwrap_or_else(|e| {
        error!("The bundled sample events are invalid: {:?}", e);
        vec![]
    })
}

/// Reads the datasets at `path`. Falls back to the sample data when no
/// path is given or the file cannot be read or parsed.
pub async fn load_datasets(path: Option<&Path>) -> Vec<SeedDataset> {
    let path = match path {
        Some(path) => path,
        None => return sample_datasets(),
    };

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(
                "Failed to read events from {}, falling back to sample data: {:?}",
                path.display(),
                e
            );
            return sample_datasets();
        }
    };
    match parse_datasets(&raw) {
        Ok(datasets) => datasets,
        Err(e) => {
            error!(
                "Failed to parse events from {}, falling back to sample data: {:?}",
                path.display(),
                e
            );
            sample_datasets()
        }
    }
}

/// Inserts the events of the data source when no event is stored yet.
/// Returns the number of inserted events.
pub async fn ensure_seed_data(repos: &Repos, path: Option<&Path>) -> anyhow::Result<usize> {
    if repos.events.count().await? > 0 {
        return Ok(0);
    }

    let mut seen = HashSet::new();
    let mut inserted = 0;
    for dataset in load_datasets(path).await {
        for seed in dataset.events {
            let key = (seed.external_id.clone(), seed.title.clone(), seed.datetime);
            if !seen.insert(key) {
                continue;
            }
            let event = seed.into_event(dataset.organization.clone());
            repos.events.insert(&event).await?;
            inserted += 1;
        }
    }

    info!("Seeded {} events into the database", inserted);
    Ok(inserted)
}
