//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use decarb_catalog::{LoadedCatalog, LoadedProfile};
use decarb_types::catalog::{FundingCatalog, MeasureCatalog};

/// Source of the reference catalogs.
pub trait CatalogSource {
    fn load_measures(&self) -> anyhow::Result<LoadedCatalog<MeasureCatalog>>;
    fn load_funding(&self) -> anyhow::Result<LoadedCatalog<FundingCatalog>>;
}

/// Source of company profiles, in a deterministic order.
pub trait ProfileSource {
    fn load_profiles(&self) -> anyhow::Result<Vec<LoadedProfile>>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
