//! Configuration file loading for decarb.
//!
//! Discovers and loads `decarb.toml` from the data directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use decarb_core::settings::{BatchSettings, PlanSettings};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "decarb.toml";

/// Top-level configuration from decarb.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecarbConfig {
    /// Known infrastructure keys and funding categories.
    pub registry: RegistryConfig,

    /// Defaults for planning runs.
    pub planning: PlanningConfig,
}

/// Registry section of the config. Empty lists accept every key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub infrastructure_keys: Vec<String>,
    pub funding_categories: Vec<String>,
}

/// Planning section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanningConfig {
    /// Date funding deadlines are checked against.
    pub reference_date: Option<NaiveDate>,

    /// Upper bound on measures planned per company.
    pub max_measures: Option<usize>,

    /// Output directory, relative to the data directory unless absolute.
    pub out_dir: Option<Utf8PathBuf>,

    /// Restrict plans to these measure ids.
    pub measures: Vec<String>,

    /// Batch processing order.
    pub order: Vec<String>,
}

/// Discover the decarb.toml config file.
///
/// Returns `None` if no config file is found.
pub fn discover_config(data_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = data_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a decarb.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DecarbConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<DecarbConfig> {
    let config: DecarbConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the data directory, or return default if not found.
pub fn load_or_default(data_dir: &Utf8Path) -> anyhow::Result<DecarbConfig> {
    match discover_config(data_dir) {
        Some(path) => load_config(&path),
        None => Ok(DecarbConfig::default()),
    }
}

/// Planning flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct PlanOverrides {
    pub out_dir: Option<Utf8PathBuf>,
    pub reference_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub measures: Vec<String>,
    pub max_measures: Option<usize>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: DecarbConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: DecarbConfig) -> Self {
        Self { config }
    }

    /// Merge with single-company command arguments.
    ///
    /// Scalar CLI values replace config values. A non-empty CLI measure list replaces the
    /// configured one. The registry comes from the config file only.
    pub fn merge_plan_args(self, data_dir: &Utf8Path, cli: &PlanOverrides) -> PlanSettings {
        let planning = self.config.planning;

        let out_dir = match (&cli.out_dir, planning.out_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) if dir.is_absolute() => dir,
            (None, Some(dir)) => data_dir.join(dir),
            (None, None) => data_dir.join("out"),
        };

        let measures = if cli.measures.is_empty() {
            planning.measures
        } else {
            cli.measures.clone()
        };

        PlanSettings {
            data_dir: data_dir.to_path_buf(),
            out_dir,
            reference_date: cli.reference_date.or(planning.reference_date),
            created_at: cli.created_at,
            infrastructure_keys: self.config.registry.infrastructure_keys,
            funding_categories: self.config.registry.funding_categories,
            measures,
            max_measures: cli.max_measures.or(planning.max_measures),
        }
    }

    /// Merge with batch command arguments. A non-empty CLI order replaces the configured one.
    pub fn merge_batch_args(
        self,
        data_dir: &Utf8Path,
        cli: &PlanOverrides,
        cli_order: &[String],
    ) -> BatchSettings {
        let order = if cli_order.is_empty() {
            self.config.planning.order.clone()
        } else {
            cli_order.to_vec()
        };
        BatchSettings {
            plan: self.merge_plan_args(data_dir, cli),
            order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[registry]
infrastructure_keys = ["roof_area_m2", "parking_spaces"]
funding_categories = ["subsidy", "financing", "incentive"]

[planning]
reference_date = "2025-01-01"
max_measures = 10
out_dir = "out"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(
            config.registry.infrastructure_keys,
            vec!["roof_area_m2", "parking_spaces"]
        );
        assert_eq!(config.registry.funding_categories.len(), 3);
        assert_eq!(
            config.planning.reference_date,
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(config.planning.max_measures, Some(10));
        assert_eq!(config.planning.out_dir, Some(Utf8PathBuf::from("out")));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.registry.infrastructure_keys.is_empty());
        assert!(config.planning.reference_date.is_none());
        assert!(config.planning.order.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = parse_config("[planing]\nmax_measures = 3\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid TOML"));
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        assert!(parse_config("[planning]\nreference_date = \"someday\"\n").is_err());
    }

    #[test]
    fn test_merge_defaults_out_dir_under_data_dir() {
        let settings = ConfigMerger::new(DecarbConfig::default())
            .merge_plan_args(Utf8Path::new("data"), &PlanOverrides::default());
        assert_eq!(settings.data_dir, Utf8PathBuf::from("data"));
        assert_eq!(settings.out_dir, Utf8PathBuf::from("data/out"));
        assert!(settings.reference_date.is_none());
        assert!(settings.measures.is_empty());
    }

    #[test]
    fn test_merge_cli_overrides_config() {
        let config = DecarbConfig {
            registry: RegistryConfig {
                infrastructure_keys: vec!["roof_area_m2".to_string()],
                funding_categories: vec![],
            },
            planning: PlanningConfig {
                reference_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                max_measures: Some(10),
                out_dir: Some(Utf8PathBuf::from("reports")),
                measures: vec!["solar".to_string()],
                order: vec![],
            },
        };
        let cli = PlanOverrides {
            out_dir: Some(Utf8PathBuf::from("/tmp/elsewhere")),
            reference_date: NaiveDate::from_ymd_opt(2026, 6, 30),
            measures: vec!["led".to_string(), "heat-pump".to_string()],
            max_measures: Some(2),
            ..Default::default()
        };

        let settings = ConfigMerger::new(config).merge_plan_args(Utf8Path::new("data"), &cli);
        assert_eq!(settings.out_dir, Utf8PathBuf::from("/tmp/elsewhere"));
        assert_eq!(settings.reference_date, NaiveDate::from_ymd_opt(2026, 6, 30));
        assert_eq!(settings.measures, vec!["led", "heat-pump"]);
        assert_eq!(settings.max_measures, Some(2));
        assert_eq!(settings.infrastructure_keys, vec!["roof_area_m2"]);
    }

    #[test]
    fn test_merge_config_used_when_cli_absent() {
        let config = DecarbConfig {
            planning: PlanningConfig {
                reference_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                max_measures: Some(10),
                out_dir: Some(Utf8PathBuf::from("reports")),
                measures: vec!["solar".to_string()],
                order: vec!["b".to_string(), "a".to_string()],
            },
            ..Default::default()
        };

        let batch = ConfigMerger::new(config).merge_batch_args(
            Utf8Path::new("data"),
            &PlanOverrides::default(),
            &[],
        );
        assert_eq!(batch.plan.out_dir, Utf8PathBuf::from("data/reports"));
        assert_eq!(batch.plan.reference_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(batch.plan.measures, vec!["solar"]);
        assert_eq!(batch.plan.max_measures, Some(10));
        assert_eq!(batch.order, vec!["b", "a"]);
    }

    #[test]
    fn test_merge_batch_cli_order_replaces_config() {
        let config = DecarbConfig {
            planning: PlanningConfig {
                order: vec!["b".to_string(), "a".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let batch = ConfigMerger::new(config).merge_batch_args(
            Utf8Path::new("data"),
            &PlanOverrides::default(),
            &["c".to_string()],
        );
        assert_eq!(batch.order, vec!["c"]);
    }

    #[test]
    fn test_load_or_default_reads_file() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        assert!(load_or_default(&root).unwrap().planning.max_measures.is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "[planning]\nmax_measures = 4\n").unwrap();
        assert_eq!(load_or_default(&root).unwrap().planning.max_measures, Some(4));
    }
}
