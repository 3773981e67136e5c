//! showcal configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use showcal_core::store::DEFAULT_PRODUCT_ID;
use showcal_core::{InvalidRecordPolicy, MapperOptions, TimeSource};
use url::Url;

static DEFAULT_FEED_URL: &str = "https://aegwebprod.blob.core.windows.net/json/events/51/events.json";
static DEFAULT_CALENDAR_FILE: &str = "concert_schedule.ics";
static DEFAULT_UID_NAMESPACE: &str = "thenationalva.com";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Settings from ~/.config/showcal/config.toml
///
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed_url: String,
    /// Calendar file, relative to the working directory unless absolute (`~` allowed)
    pub calendar_file: PathBuf,
    pub uid_namespace: String,
    pub product_id: String,
    /// IANA zone for naive local feed times and for displayed times
    pub timezone: String,
    pub time_source: TimeSource,
    pub reminders: bool,
    pub on_invalid_record: InvalidRecordPolicy,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            feed_url: DEFAULT_FEED_URL.to_string(),
            calendar_file: PathBuf::from(DEFAULT_CALENDAR_FILE),
            uid_namespace: DEFAULT_UID_NAMESPACE.to_string(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            timezone: "UTC".to_string(),
            time_source: TimeSource::default(),
            reminders: true,
            on_invalid_record: InvalidRecordPolicy::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("showcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .build()
            .with_context(|| format!("Failed to read config file at {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn calendar_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.calendar_file.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn feed_url(&self) -> Result<Url> {
        Url::parse(&self.feed_url).with_context(|| format!("Invalid feed_url '{}'", self.feed_url))
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn mapper_options(&self) -> Result<MapperOptions> {
        Ok(MapperOptions {
            namespace: self.uid_namespace.clone(),
            time_source: self.time_source,
            timezone: self.timezone()?,
            reminders: self.reminders,
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# showcal configuration

# JSON event feed to pull from:
# feed_url = \"{feed_url}\"

# Calendar file that gets created/updated:
# calendar_file = \"{calendar_file}\"

# Event UIDs are \"<eventId>@<uid_namespace>\":
# uid_namespace = \"{namespace}\"

# PRODID for newly created calendars:
# product_id = \"{product_id}\"

# Timezone for feed times without an offset, and for the times shown in descriptions:
# timezone = \"UTC\"

# Which feed fields hold show/door times: \"utc\" or \"local\"
# time_source = \"utc\"

# Add \"30 Minutes to Doors\" / \"15 Minutes to Show\" alarms:
# reminders = true

# On a malformed feed record: \"abort\" the run or \"skip\" the record
# on_invalid_record = \"abort\"

# request_timeout_secs = {timeout}
",
            feed_url = DEFAULT_FEED_URL,
            calendar_file = DEFAULT_CALENDAR_FILE,
            namespace = DEFAULT_UID_NAMESPACE,
            product_id = DEFAULT_PRODUCT_ID,
            timeout = DEFAULT_TIMEOUT_SECS,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create config directory {}", parent.display()))?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Could not write config file {}", path.display()))?;

        Ok(())
    }
}
