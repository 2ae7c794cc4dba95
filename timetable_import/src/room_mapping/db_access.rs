use crate::room_mapping::{RoomMapping, RoomMappingSource};
use anyhow::Context;
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use shared_kernel::http_client::HttpClient;
use std::collections::HashMap;
use tracing::{error, info, warn};
use url::Url;

/// Reads the `Rooms` table through the Supabase REST endpoint.
pub struct SupabaseRooms {
    url: Url,
    service_role_key: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct RoomRow {
    #[serde(rename = "ShortCode")]
    short_code: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
}

impl SupabaseRooms {
    pub fn new(url: Url, service_role_key: Secret<String>) -> Self {
        Self {
            url,
            service_role_key,
        }
    }

    fn rooms_url(&self) -> anyhow::Result<Url> {
        let mut url = self
            .url
            .join("rest/v1/Rooms")
            .context("Failed to build the Rooms endpoint")?;
        url.query_pairs_mut()
            .append_pair("select", "Name,ShortCode")
            .append_pair("Name", "not.ilike.*Consultation*")
            .append_pair("Name", "not.ilike.*Online*");
        Ok(url)
    }

    fn headers(&self) -> HashMap<&'static str, String> {
        let key = self.service_role_key.expose_secret();
        HashMap::from([
            ("apikey", key.clone()),
            ("authorization", format!("Bearer {key}")),
            ("accept", "application/json".to_string()),
        ])
    }
}

#[async_trait]
impl RoomMappingSource for SupabaseRooms {
    #[tracing::instrument(skip(self), level = "info")]
    async fn load(&self) -> anyhow::Result<RoomMapping> {
        let url = self.rooms_url()?;
        let rows = match HttpClient::get_with_headers::<Vec<RoomRow>>(url, self.headers()).await {
            Ok(rows) => rows,
            Err(err) => {
                // Every room passes through unmapped rather than failing the run.
                error!(error = %err, "Failed to fetch the room mapping, continuing without it");
                return Ok(RoomMapping::default());
            }
        };

        let mapping = RoomMapping::new(
            rows.into_iter()
                .filter_map(|row| Some((row.short_code?, row.name?))),
        );
        if mapping.is_empty() {
            warn!("No rooms matched the mapping criteria");
        } else {
            info!(entries = mapping.len(), "Room mapping fetched");
        }
        Ok(mapping)
    }
}
