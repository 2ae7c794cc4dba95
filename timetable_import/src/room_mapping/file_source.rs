use crate::room_mapping::{RoomMapping, RoomMappingSource};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Room mapping kept in a local JSON file, either `{"LT1": "Lecture Theatre 1"}` or
/// `[{"ShortCode": "LT1", "Name": "Lecture Theatre 1"}]`.
pub struct FileRooms {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoomFile {
    Pairs(BTreeMap<String, String>),
    Rows(Vec<RoomRow>),
}

#[derive(Deserialize)]
struct RoomRow {
    #[serde(rename = "ShortCode")]
    short_code: String,
    #[serde(rename = "Name")]
    name: String,
}

impl FileRooms {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RoomMappingSource for FileRooms {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()), level = "info")]
    async fn load(&self) -> anyhow::Result<RoomMapping> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let file: RoomFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        let mapping = match file {
            RoomFile::Pairs(pairs) => RoomMapping::new(pairs),
            RoomFile::Rows(rows) => {
                RoomMapping::new(rows.into_iter().map(|row| (row.short_code, row.name)))
            }
        };
        info!(entries = mapping.len(), "Room mapping read from file");
        Ok(mapping)
    }
}
