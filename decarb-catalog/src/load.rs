use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use decarb_types::catalog::{FundingCatalog, MeasureCatalog};
use decarb_types::profile::CompanyProfile;
use decarb_types::report::RunInput;
use fs_err as fs;
use glob::glob;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

pub const MEASURE_CATALOG_FILE: &str = "catalog/measures.json";
pub const FUNDING_CATALOG_FILE: &str = "catalog/funding.json";

/// A parsed catalog together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedCatalog<T> {
    pub path: Utf8PathBuf,
    pub sha256: String,
    pub catalog: T,
}

impl<T> LoadedCatalog<T> {
    pub fn as_input(&self, schema: &str) -> RunInput {
        RunInput {
            path: self.path.to_string(),
            schema: Some(schema.to_string()),
            sha256: Some(self.sha256.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub path: Utf8PathBuf,
    pub profile: Result<CompanyProfile, ProfileLoadError>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

pub fn load_measure_catalog(path: &Utf8Path) -> anyhow::Result<LoadedCatalog<MeasureCatalog>> {
    load_catalog(path)
}

pub fn load_funding_catalog(path: &Utf8Path) -> anyhow::Result<LoadedCatalog<FundingCatalog>> {
    load_catalog(path)
}

fn load_catalog<T: DeserializeOwned>(path: &Utf8Path) -> anyhow::Result<LoadedCatalog<T>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read catalog {}", path))?;
    let catalog: T =
        serde_json::from_str(&contents).with_context(|| format!("parse catalog {}", path))?;
    debug!(path = %path, "loaded catalog");
    Ok(LoadedCatalog {
        path: path.to_path_buf(),
        sha256: sha256_hex(contents.as_bytes()),
        catalog,
    })
}

/// Load every `*.json` profile directly under `profiles_dir`.
///
/// A missing directory yields an empty list.
pub fn load_profiles(profiles_dir: &Utf8Path) -> anyhow::Result<Vec<LoadedProfile>> {
    let pattern = profiles_dir.join("*.json");
    let pattern_str = pattern.as_str();

    debug!(pattern = %pattern_str, "scanning for company profiles");

    let mut out = Vec::new();
    for entry in glob(pattern_str).context("glob profiles/*.json")? {
        let path = entry
            .map_err(|e| anyhow::anyhow!("glob error: {e}"))?
            .to_string_lossy()
            .to_string();
        let utf8_path = Utf8PathBuf::from(path);

        let profile = match fs::read_to_string(&utf8_path) {
            Ok(s) => serde_json::from_str::<CompanyProfile>(&s).map_err(|e| {
                ProfileLoadError::Json {
                    message: e.to_string(),
                }
            }),
            Err(e) => Err(ProfileLoadError::Io {
                message: e.to_string(),
            }),
        };

        if let Err(err) = &profile {
            warn!(path = %utf8_path, error = %err, "unreadable company profile");
        }

        out.push(LoadedProfile {
            path: utf8_path,
            profile,
        });
    }

    // Deterministic order matters.
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
