//! Unit tests for the catalog and profile loaders.

use camino::Utf8PathBuf;
use decarb_catalog::{
    ProfileLoadError, load_funding_catalog, load_measure_catalog, load_profiles, sha256_hex,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn data_path(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap()
}

fn create_profile(dir: &Utf8PathBuf, name: &str, contents: &str) {
    let profiles = dir.join("profiles");
    fs::create_dir_all(&profiles).unwrap();
    fs::write(profiles.join(name), contents).unwrap();
}

fn valid_profile(id: &str) -> String {
    format!(
        r#"{{
            "company_id": "{id}",
            "sector": "manufacturing",
            "company_size": "media",
            "total_emissions": 500,
            "infrastructure_facts": {{ "roof_area_m2": 1200 }}
        }}"#
    )
}

fn measures_json() -> &'static str {
    r#"{
        "schema": "decarb.measures.v1",
        "measures": [{
            "id": "solar-pv",
            "name": "Rooftop solar PV",
            "category": "energy",
            "scope": 2,
            "investment": 45000,
            "emission_reduction": 38.5,
            "priority": "high",
            "required_infrastructure": { "key": "roof_area_m2", "minimum_value": 200 },
            "applicable_to": { "sizes": ["media", "grande"], "min_emissions": 100 }
        }]
    }"#
}

#[test]
fn test_missing_profiles_dir() {
    let temp = create_temp_dir();
    let data = data_path(&temp);

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    assert!(profiles.is_empty());
}

#[test]
fn test_single_valid_profile() {
    let temp = create_temp_dir();
    let data = data_path(&temp);
    create_profile(&data, "acme.json", &valid_profile("acme"));

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    assert_eq!(profiles.len(), 1);
    let profile = profiles[0].profile.as_ref().expect("parsed profile");
    assert_eq!(profile.company_id, "acme");
    assert_eq!(profile.sector.as_deref(), Some("manufacturing"));
}

#[test]
fn test_profiles_sorted_deterministically() {
    let temp = create_temp_dir();
    let data = data_path(&temp);

    create_profile(&data, "zebra.json", &valid_profile("zebra"));
    create_profile(&data, "alpha.json", &valid_profile("alpha"));
    create_profile(&data, "middle.json", &valid_profile("middle"));

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    let ids: Vec<String> = profiles
        .iter()
        .map(|p| p.profile.as_ref().unwrap().company_id.clone())
        .collect();
    assert_eq!(ids, vec!["alpha", "middle", "zebra"]);
}

#[test]
fn test_corrupted_profile_collected_without_failing() {
    let temp = create_temp_dir();
    let data = data_path(&temp);

    create_profile(&data, "good.json", &valid_profile("good"));
    create_profile(&data, "bad.json", "{ not valid json }}}");

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    assert_eq!(profiles.len(), 2);

    let bad = profiles
        .iter()
        .find(|p| p.path.as_str().ends_with("bad.json"))
        .unwrap();
    let good = profiles
        .iter()
        .find(|p| p.path.as_str().ends_with("good.json"))
        .unwrap();
    assert!(good.profile.is_ok());
    assert!(matches!(bad.profile, Err(ProfileLoadError::Json { .. })));
}

#[test]
fn test_profile_missing_company_id_is_json_error() {
    let temp = create_temp_dir();
    let data = data_path(&temp);
    create_profile(&data, "anon.json", r#"{ "sector": "retail" }"#);

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    assert!(matches!(
        profiles[0].profile,
        Err(ProfileLoadError::Json { .. })
    ));
}

#[test]
fn test_profile_path_that_is_a_directory_yields_io_error() {
    let temp = create_temp_dir();
    let data = data_path(&temp);
    fs::create_dir_all(data.join("profiles").join("weird.json")).unwrap();

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    assert_eq!(profiles.len(), 1);
    assert!(matches!(profiles[0].profile, Err(ProfileLoadError::Io { .. })));
}

#[test]
fn test_non_json_files_ignored() {
    let temp = create_temp_dir();
    let data = data_path(&temp);
    create_profile(&data, "acme.json", &valid_profile("acme"));
    create_profile(&data, "notes.txt", "not a profile");

    let profiles = load_profiles(&data.join("profiles")).unwrap();
    assert_eq!(profiles.len(), 1);
}

#[test]
fn test_measure_catalog_loads_with_hash() {
    let temp = create_temp_dir();
    let data = data_path(&temp);
    fs::create_dir_all(data.join("catalog")).unwrap();
    let path = data.join("catalog").join("measures.json");
    fs::write(&path, measures_json()).unwrap();

    let loaded = load_measure_catalog(&path).unwrap();
    assert_eq!(loaded.catalog.measures.len(), 1);
    assert_eq!(loaded.sha256, sha256_hex(measures_json().as_bytes()));
    assert_eq!(loaded.sha256.len(), 64);

    let input = loaded.as_input(decarb_types::schema::DECARB_MEASURES_V1);
    assert_eq!(input.path, path.to_string());
    assert_eq!(input.sha256.as_deref(), Some(loaded.sha256.as_str()));
}

#[test]
fn test_missing_catalog_is_an_error() {
    let temp = create_temp_dir();
    let data = data_path(&temp);

    let err = load_funding_catalog(&data.join("catalog").join("funding.json"))
        .expect_err("missing catalog");
    assert!(format!("{err:#}").contains("read catalog"));
}

#[test]
fn test_malformed_catalog_is_an_error() {
    let temp = create_temp_dir();
    let data = data_path(&temp);
    fs::create_dir_all(data.join("catalog")).unwrap();
    let path = data.join("catalog").join("funding.json");
    fs::write(&path, r#"{ "sources": [{ "id": "x", "kind": "loan" }] }"#).unwrap();

    let err = load_funding_catalog(&path).expect_err("unknown kind");
    assert!(format!("{err:#}").contains("parse catalog"));
}
