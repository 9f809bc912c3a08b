use std::env;
use std::path::PathBuf;

pub const MLB_EVENT_GROUP: u32 = 84240;
pub const DEFAULT_BASE_URL: &str = "https://sportsbook-nash-usny.draftkings.com/sites/US-NY-SB/api/v5";
pub const DEFAULT_OUTPUT_PATH: &str = "results.csv";
pub const DEFAULT_SPORT: &str = "Baseball";
pub const DEFAULT_SPORTSBOOK: &str = "DraftKings";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct DkConfig {
    pub event_group: u32,
    pub base_url: String,
    pub output_path: PathBuf,
    pub sport: String,
    pub sportsbook: String,
    pub log_filter: String,
}

impl Default for DkConfig {
    fn default() -> Self {
        Self {
            event_group: MLB_EVENT_GROUP,
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            sport: DEFAULT_SPORT.to_string(),
            sportsbook: DEFAULT_SPORTSBOOK.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DkConfig {
    /// Reads `DK_*` overrides on top of the defaults. Call after the `.env`
    /// files have been loaded.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let event_group = env_string("DK_EVENT_GROUP")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.event_group);
        let base_url = env_string("DK_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let output_path = env_string("DK_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_path);

        Self {
            event_group,
            base_url,
            output_path,
            sport: env_string("DK_SPORT").unwrap_or(defaults.sport),
            sportsbook: env_string("DK_SPORTSBOOK").unwrap_or(defaults.sportsbook),
            log_filter: env_string("DK_LOG").unwrap_or(defaults.log_filter),
        }
    }

    pub fn event_group_url(&self) -> String {
        format!("{}/eventgroups/{}", self.base_url, self.event_group)
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
