//! Default filesystem-backed port implementations.

use crate::ports::{CatalogSource, ProfileSource, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use decarb_catalog::{
    FUNDING_CATALOG_FILE, LoadedCatalog, LoadedProfile, MEASURE_CATALOG_FILE, sha256_hex,
};
use decarb_types::catalog::{FundingCatalog, MeasureCatalog};
use fs_err as fs;
use serde::Serialize;

/// Loads `catalog/measures.json` and `catalog/funding.json` under a data directory.
#[derive(Debug, Clone)]
pub struct FsCatalogSource {
    pub data_dir: Utf8PathBuf,
}

impl FsCatalogSource {
    pub fn new(data_dir: Utf8PathBuf) -> Self {
        Self { data_dir }
    }
}

impl CatalogSource for FsCatalogSource {
    fn load_measures(&self) -> anyhow::Result<LoadedCatalog<MeasureCatalog>> {
        decarb_catalog::load_measure_catalog(&self.data_dir.join(MEASURE_CATALOG_FILE))
    }

    fn load_funding(&self) -> anyhow::Result<LoadedCatalog<FundingCatalog>> {
        decarb_catalog::load_funding_catalog(&self.data_dir.join(FUNDING_CATALOG_FILE))
    }
}

/// Loads every profile under `profiles/` of a data directory.
#[derive(Debug, Clone)]
pub struct FsProfileSource {
    pub profiles_dir: Utf8PathBuf,
}

impl FsProfileSource {
    pub fn new(profiles_dir: Utf8PathBuf) -> Self {
        Self { profiles_dir }
    }

    pub fn in_data_dir(data_dir: &Utf8Path) -> Self {
        Self::new(data_dir.join("profiles"))
    }
}

impl ProfileSource for FsProfileSource {
    fn load_profiles(&self) -> anyhow::Result<Vec<LoadedProfile>> {
        decarb_catalog::load_profiles(&self.profiles_dir)
            .with_context(|| format!("load profiles from {}", self.profiles_dir))
    }
}

/// In-memory catalogs for embedding and testing.
///
/// Paths and hashes are derived from the canonical JSON of each catalog so that run inputs stay
/// comparable with the filesystem source.
#[derive(Debug, Clone)]
pub struct InMemoryCatalogSource {
    measures: LoadedCatalog<MeasureCatalog>,
    funding: LoadedCatalog<FundingCatalog>,
}

impl InMemoryCatalogSource {
    pub fn new(measures: MeasureCatalog, funding: FundingCatalog) -> anyhow::Result<Self> {
        Ok(Self {
            measures: in_memory(MEASURE_CATALOG_FILE, measures)?,
            funding: in_memory(FUNDING_CATALOG_FILE, funding)?,
        })
    }
}

fn in_memory<T: Serialize>(path: &str, catalog: T) -> anyhow::Result<LoadedCatalog<T>> {
    let json = serde_json::to_vec(&catalog).context("serialize in-memory catalog")?;
    Ok(LoadedCatalog {
        path: Utf8PathBuf::from(path),
        sha256: sha256_hex(&json),
        catalog,
    })
}

impl CatalogSource for InMemoryCatalogSource {
    fn load_measures(&self) -> anyhow::Result<LoadedCatalog<MeasureCatalog>> {
        Ok(self.measures.clone())
    }

    fn load_funding(&self) -> anyhow::Result<LoadedCatalog<FundingCatalog>> {
        Ok(self.funding.clone())
    }
}

/// In-memory profile source for embedding and testing.
///
/// Sorts by path on construction to match `FsProfileSource`'s deterministic ordering.
#[derive(Debug, Clone)]
pub struct InMemoryProfileSource {
    profiles: Vec<LoadedProfile>,
}

impl InMemoryProfileSource {
    pub fn new(mut profiles: Vec<LoadedProfile>) -> Self {
        profiles.sort_by(|a, b| a.path.cmp(&b.path));
        Self { profiles }
    }
}

impl ProfileSource for InMemoryProfileSource {
    fn load_profiles(&self) -> anyhow::Result<Vec<LoadedProfile>> {
        Ok(self.profiles.clone())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}
