//! Catalog and profile ingestion.
//!
//! Catalog files are mandatory and must parse; a planning session cannot run without them. Profile
//! files are loaded tolerantly: one broken profile is recorded as a load error and does not stop the
//! others from loading. Extra fields are ignored everywhere.

mod load;

pub use load::{
    FUNDING_CATALOG_FILE, LoadedCatalog, LoadedProfile, MEASURE_CATALOG_FILE, ProfileLoadError,
    load_funding_catalog, load_measure_catalog, load_profiles, sha256_hex,
};
