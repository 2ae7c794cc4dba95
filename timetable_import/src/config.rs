use crate::errors::ConfigurationError;
use crate::fetcher::Pacing;
use crate::room_mapping::{FileRooms, RoomMappingSource, SupabaseRooms};
use crate::term_resolver::TermFallback;
use chrono_tz::Tz;
use secrecy::Secret;
use serde::Deserialize;
use shared_kernel::configuration::config;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub timetable: TimetableSettings,
    #[serde(default)]
    pub pacing: Pacing,
    pub room_mapping: RoomMappingSettings,
    #[serde(default)]
    pub supabase: Option<SupabaseSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimetableSettings {
    pub base_url: Url,
    pub term_query_param: String,
    pub max_attempts: u32,
    pub timeout_secs: u64,
    #[serde(default)]
    pub term_fallback: TermFallback,
    pub timezone: Tz,
}

impl TimetableSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomMappingSourceKind {
    Supabase,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoomMappingSettings {
    pub source: RoomMappingSourceKind,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: Option<Url>,
    pub service_role_key: Option<Secret<String>>,
}

impl Settings {
    pub fn parse() -> Result<Self, ConfigurationError> {
        config::<Settings>()
            .map_err(ConfigurationError::Settings)?
            .validated()
    }

    pub fn validated(self) -> Result<Self, ConfigurationError> {
        if !matches!(self.timetable.base_url.scheme(), "http" | "https") {
            return Err(ConfigurationError::Invalid {
                name: "timetable.base_url",
                reason: format!("{} is not an http(s) url", self.timetable.base_url),
            });
        }
        if self.timetable.term_query_param.trim().is_empty() {
            return Err(ConfigurationError::Missing("timetable.term_query_param"));
        }
        if self.timetable.max_attempts == 0 {
            return Err(ConfigurationError::Invalid {
                name: "timetable.max_attempts",
                reason: "at least one attempt is needed".to_string(),
            });
        }
        if self.timetable.timeout_secs == 0 {
            return Err(ConfigurationError::Invalid {
                name: "timetable.timeout_secs",
                reason: "the timeout must be positive".to_string(),
            });
        }
        if !self.pacing.is_valid() {
            return Err(ConfigurationError::Invalid {
                name: "pacing",
                reason: "every range needs 0 <= min_secs <= max_secs".to_string(),
            });
        }
        // fail before any network activity
        self.room_mapping_source()?;
        Ok(self)
    }

    pub fn room_mapping_source(&self) -> Result<Box<dyn RoomMappingSource>, ConfigurationError> {
        match self.room_mapping.source {
            RoomMappingSourceKind::File => {
                let path = self
                    .room_mapping
                    .file
                    .clone()
                    .ok_or(ConfigurationError::Missing("room_mapping.file"))?;
                Ok(Box::new(FileRooms::new(path)))
            }
            RoomMappingSourceKind::Supabase => {
                let supabase = self
                    .supabase
                    .as_ref()
                    .ok_or(ConfigurationError::Missing("supabase.url"))?;
                let url = supabase
                    .url
                    .clone()
                    .ok_or(ConfigurationError::Missing("supabase.url"))?;
                let key = supabase
                    .service_role_key
                    .clone()
                    .ok_or(ConfigurationError::Missing("supabase.service_role_key"))?;
                Ok(Box::new(SupabaseRooms::new(url, key)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RoomMappingSettings, RoomMappingSourceKind, Settings, SupabaseSettings, TimetableSettings};
    use crate::errors::ConfigurationError;
    use crate::fetcher::{DelayRange, Pacing};
    use crate::term_resolver::TermFallback;
    use secrecy::Secret;
    use url::Url;

    fn settings() -> Settings {
        Settings {
            timetable: TimetableSettings {
                base_url: Url::parse("https://my.uowdubai.ac.ae/timetable/viewer").unwrap(),
                term_query_param: "semester".to_string(),
                max_attempts: 5,
                timeout_secs: 45,
                term_fallback: TermFallback::FirstAvailable,
                timezone: chrono_tz::Asia::Dubai,
            },
            pacing: Pacing::default(),
            room_mapping: RoomMappingSettings {
                source: RoomMappingSourceKind::File,
                file: Some("rooms.json".into()),
            },
            supabase: None,
        }
    }

    #[test]
    fn test_that_complete_settings_validate() {
        assert!(settings().validated().is_ok());
    }

    #[test]
    fn test_that_supabase_credentials_are_required_for_the_supabase_source() {
        let mut settings = settings();
        settings.room_mapping.source = RoomMappingSourceKind::Supabase;
        settings.supabase = Some(SupabaseSettings {
            url: Some(Url::parse("https://project.supabase.co").unwrap()),
            service_role_key: None,
        });

        let error = settings.clone().validated().unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::Missing("supabase.service_role_key")
        ));

        settings.supabase = Some(SupabaseSettings {
            url: Some(Url::parse("https://project.supabase.co").unwrap()),
            service_role_key: Some(Secret::new("key".to_string())),
        });
        assert!(settings.validated().is_ok());
    }

    #[test]
    fn test_that_the_file_source_needs_a_path() {
        let mut settings = settings();
        settings.room_mapping.file = None;
        assert!(matches!(
            settings.validated(),
            Err(ConfigurationError::Missing("room_mapping.file"))
        ));
    }

    #[test]
    fn test_that_zero_attempts_is_rejected() {
        let mut settings = settings();
        settings.timetable.max_attempts = 0;
        assert!(settings.validated().is_err());
    }

    #[test]
    fn test_that_inverted_pacing_is_rejected() {
        let mut settings = settings();
        settings.pacing.backoff = DelayRange::new(15.0, 5.0);
        assert!(settings.validated().is_err());
    }

    #[test]
    fn test_that_the_shipped_configuration_parses() {
        let directory = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("configuration");
        let settings: Settings = shared_kernel::configuration::config_from(&directory).unwrap();
        assert_eq!(settings.timetable.max_attempts, 5);
        assert_eq!(settings.timetable.term_query_param, "semester");
        assert_eq!(settings.pacing, Pacing::default());
    }
}
