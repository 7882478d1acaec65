use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::http::USER_AGENT;

pub(crate) const MIN_CONCURRENCY: usize = 1;
pub(crate) const MAX_CONCURRENCY: usize = 32;

/// Root folder of the 2023.08 data release.
pub const RELEASE_2023_URL: &str =
    "https://drive.google.com/drive/folders/1EP6oEabyZRamveGNyzYU0u6qJ-N43Qfq";

#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize, Eq)]
pub enum ProxyMode {
    // Use a random proxy from the list
    Random,

    // Use a single proxy
    Single,

    // No proxy
    None,
}

/// One published data release: where it lives and how its files map to dataset keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub folder_url: String,
    /// remote file name -> logical dataset key
    pub datasets: BTreeMap<String, String>,
}

impl Release {
    pub fn new(folder_url: impl Into<String>, datasets: BTreeMap<String, String>) -> Self {
        Self {
            folder_url: folder_url.into(),
            datasets,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub min_retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub proxy_mode: ProxyMode,
    pub proxies: Vec<Url>,
    /// sibling folders fetched at once during a walk
    pub concurrency: usize,
    pub max_nodes: usize,
    pub pruned_folders: Vec<String>,
    pub predictors_folder: String,
    /// rows whose name matches are dropped before paths are rebuilt
    pub skip_names: String,
    pub releases: BTreeMap<u16, Release>,
}

// default options
impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            min_retry_delay: Duration::from_secs(2),
            max_retry_delay: Duration::from_secs(30),
            proxy_mode: ProxyMode::None,
            proxies: Vec::new(),
            concurrency: 4,
            max_nodes: 5_000,
            pruned_folders: vec!["Individual".to_string(), "Results".to_string()],
            predictors_folder: "Predictors".to_string(),
            skip_names: "xlsx$|docx$|txt".to_string(),
            releases: BTreeMap::from([(2023, default_release())]),
        }
    }
}

impl Config {
    /// load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut config: Config = serde_json::from_reader(file)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn concurrency_bounded(&self) -> usize {
        self.concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
    }

    pub fn normalize(&mut self) {
        self.concurrency = self.concurrency_bounded();
        self.max_nodes = self.max_nodes.max(1);
        self.max_retries = self.max_retries.max(1);
        if self.min_retry_delay > self.max_retry_delay {
            self.max_retry_delay = self.min_retry_delay;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.proxy_mode != ProxyMode::None && self.proxies.is_empty() {
            return Err(Error::InvalidConfig(
                "proxy_mode is enabled but no proxies are configured".to_string(),
            ));
        }

        if self.releases.is_empty() {
            return Err(Error::InvalidConfig(
                "no data releases are configured".to_string(),
            ));
        }

        self.skip_pattern()?;
        Ok(())
    }

    /// The compiled `skip_names` pattern.
    pub fn skip_pattern(&self) -> Result<Regex> {
        Regex::new(&self.skip_names)
            .map_err(|error| Error::InvalidConfig(format!("skip_names: {error}")))
    }

    /// Look up a release by year, or the most recent one.
    pub fn release(&self, year: Option<u16>) -> Result<(u16, &Release)> {
        match year {
            Some(year) => self
                .releases
                .get(&year)
                .map(|release| (year, release))
                .ok_or(Error::UnknownRelease(year)),
            None => self
                .releases
                .iter()
                .next_back()
                .map(|(year, release)| (*year, release))
                .ok_or_else(|| Error::InvalidConfig("no data releases are configured".to_string())),
        }
    }
}

fn default_release() -> Release {
    let datasets = [
        ("SignalDoc.csv", "signal_doc"),
        ("PredictorPortsFull.csv", "op"),
        ("PredictorAltPorts_Deciles.zip", "deciles_ew"),
        ("PredictorAltPorts_DecilesVW.zip", "deciles_vw"),
        ("PredictorAltPorts_LiqScreen_ME_gt_NYSE20pct.zip", "ex_nyse_p20_me"),
        ("PredictorAltPorts_LiqScreen_NYSEonly.zip", "nyse"),
        ("PredictorAltPorts_LiqScreen_Price_gt_5.zip", "ex_price5"),
        ("PredictorAltPorts_Quintiles.zip", "quintiles_ew"),
        ("PredictorAltPorts_QuintilesVW.zip", "quintiles_vw"),
        ("signed_predictors_dl_wide.zip", "firm_char"),
    ]
    .into_iter()
    .map(|(name, key)| (name.to_string(), key.to_string()))
    .collect();

    Release::new(RELEASE_2023_URL, datasets)
}
