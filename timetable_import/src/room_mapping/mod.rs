mod db_access;
mod file_source;

pub use db_access::SupabaseRooms;
pub use file_source::FileRooms;

use crate::normalizer::normalize_whitespace;
use async_trait::async_trait;
use std::cmp::Reverse;
use tracing::debug;

/// Where the authoritative short code -> room name pairs come from.
#[async_trait]
pub trait RoomMappingSource: Send + Sync {
    async fn load(&self) -> anyhow::Result<RoomMapping>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEntry {
    pub short_code: String,
    pub name: String,
}

/// Short code -> canonical room name, ordered so that longer short codes are tried first.
///
/// Built once per run and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomMapping {
    entries: Vec<RoomEntry>,
}

impl RoomMapping {
    /// Both sides of every pair are normalized; pairs that end up empty on either side are
    /// dropped. A repeated short code keeps its first position and takes the later name.
    pub fn new<I, C, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: AsRef<str>,
        N: AsRef<str>,
    {
        let mut entries: Vec<RoomEntry> = vec![];
        for (short_code, name) in pairs {
            let short_code = normalize_whitespace(short_code.as_ref());
            let name = normalize_whitespace(name.as_ref());
            if short_code.is_empty() || name.is_empty() {
                continue;
            }
            match entries
                .iter_mut()
                .find(|entry| entry.short_code == short_code)
            {
                Some(existing) => existing.name = name,
                None => entries.push(RoomEntry { short_code, name }),
            }
        }
        // stable: equal lengths keep insertion order
        entries.sort_by_key(|entry| Reverse(entry.short_code.chars().count()));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomEntry> {
        self.entries.iter()
    }

    /// The entry with the longest short code that prefixes `location`.
    pub fn lookup(&self, location: &str) -> Option<&RoomEntry> {
        self.entries
            .iter()
            .find(|entry| location.starts_with(entry.short_code.as_str()))
    }

    /// Canonical name for a raw location, or the normalized location itself when no
    /// short code matches.
    pub fn map_room(&self, raw_location: &str) -> String {
        let location = normalize_whitespace(raw_location);
        match self.lookup(&location) {
            Some(entry) => {
                if entry.name != location {
                    debug!(
                        %location,
                        short_code = %entry.short_code,
                        room = %entry.name,
                        "room mapped"
                    );
                }
                entry.name.clone()
            }
            None => {
                debug!(%location, "no short code matches location, keeping it unmapped");
                location
            }
        }
    }
}
