// Configuration loading and parsing (squad.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use fpl_core::{FallbackPolicy, Position, QuotaPolicy, SelectionRequest, DEFAULT_BUDGET_UNIT};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no squad config at {path}")]
    Missing { path: PathBuf },

    #[error("squad config {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid squad setting `{field}`: {message}")]
    Invalid { field: String, message: String },

    #[error("could not set up config/ from defaults/: {message}")]
    Seed { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub budget: f64,
    pub policy: QuotaPolicy,
    pub selection: SelectionConfig,
    pub ranking: RankingConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Selection request for the configured budget and selection settings.
    pub fn request(&self) -> SelectionRequest {
        let mut request = SelectionRequest::new(self.budget)
            .with_auto_select_bench(self.selection.auto_select_bench)
            .with_fallback(self.selection.fallback);
        if let Some(ms) = self.selection.time_limit_ms {
            request = request.with_time_limit(Duration::from_millis(ms));
        }
        if let Some(limit) = self.selection.max_per_club {
            request = request.with_max_per_club(limit);
        }
        request
    }
}

// ---------------------------------------------------------------------------
// squad.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct SquadFile {
    budget: BudgetSection,
    quota: BTreeMap<String, QuotaEntry>,
    #[serde(default)]
    selection: SelectionConfig,
    #[serde(default)]
    ranking: RankingConfig,
    data: DataConfig,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct BudgetSection {
    total: f64,
    #[serde(default = "default_unit")]
    unit: f64,
}

fn default_unit() -> f64 {
    DEFAULT_BUDGET_UNIT
}

/// Signed so that negative counts reach validation with a clear message.
#[derive(Debug, Clone, Copy, Deserialize)]
struct QuotaEntry {
    starting: i64,
    #[serde(default)]
    bench: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub auto_select_bench: bool,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    /// Most players allowed from one club. Absent means no limit.
    #[serde(default)]
    pub max_per_club: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Signed for the same reason as quota counts.
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> i64 {
    32
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Candidate CSV. Relative paths resolve against the base directory.
    pub candidates: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load `config/squad.toml` relative to `base_dir`.
///
/// Does not copy defaults; call `ensure_config_files` first for that.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("squad.toml");
    let text = read_file(&path)?;
    let file: SquadFile = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        source: e,
    })?;

    let policy = build_policy(&file.quota, file.budget.unit)?;

    let mut data = file.data;
    if data.candidates.is_relative() {
        data.candidates = base_dir.join(&data.candidates);
    }

    let config = Config {
        budget: file.budget.total,
        policy,
        selection: file.selection,
        ranking: file.ranking,
        data,
        output: file.output,
    };

    validate(&config)?;

    Ok(config)
}

/// First-run setup: copy every shipped `.toml` in `defaults/` into
/// `config/` unless a copy is already there. Returns the files written.
///
/// A base directory with `config/` but no `defaults/` is an installed setup
/// and needs nothing. One with neither is the wrong directory.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, true) => return Ok(Vec::new()),
        (false, false) => {
            return Err(seed_error(format!(
                "{} has no defaults/ or config/ directory; point --config-dir at the \
                 directory that holds fpl-squad's defaults/squad.toml",
                base_dir.display()
            )))
        }
        _ => {}
    }

    fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let listing = fs::read_dir(&defaults_dir)
        .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults_dir.display())))?;
    let mut shipped = Vec::new();
    for entry in listing {
        let path = entry
            .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            shipped.push(path);
        }
    }
    shipped.sort();

    let mut written = Vec::new();
    for source in shipped {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(name);
        if copy_if_absent(&source, &target)? {
            tracing::info!("Seeded {} from {}", target.display(), source.display());
            written.push(target);
        }
    }
    Ok(written)
}

/// Copy `source` to `target` unless `target` already exists; an edited copy
/// is never replaced. Returns whether a copy was made.
fn copy_if_absent(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(format!("cannot create {}: {e}", target.display()))),
    };
    let mut src = fs::File::open(source)
        .map_err(|e| seed_error(format!("cannot open {}: {e}", source.display())))?;
    io::copy(&mut src, &mut dest)
        .map_err(|e| seed_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::Seed { message }
}

/// Loads config relative to `base_dir`, copying defaults first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|_| ConfigError::Missing {
        path: path.to_path_buf(),
    })
}

fn build_policy(
    quota: &BTreeMap<String, QuotaEntry>,
    unit: f64,
) -> Result<QuotaPolicy, ConfigError> {
    let mut entries = Vec::with_capacity(quota.len());
    for (key, entry) in quota {
        let position = Position::from_str_pos(key).ok_or_else(|| ConfigError::Invalid {
            field: format!("quota.{key}"),
            message: format!(
                "unknown position; expected one of {}",
                Position::ALL.map(|p| p.key()).join(", ")
            ),
        })?;
        entries.push((position, entry.starting, entry.bench));
    }
    QuotaPolicy::new(entries, unit).map_err(|e| ConfigError::Invalid {
        field: "quota".into(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check values the TOML types alone cannot rule out. Also run after CLI
/// overrides are applied.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if !config.budget.is_finite() || config.budget <= 0.0 {
        return Err(ConfigError::Invalid {
            field: "budget.total".into(),
            message: format!("must be > 0, got {}", config.budget),
        });
    }

    if config.ranking.top_n < 0 {
        return Err(ConfigError::Invalid {
            field: "ranking.top_n".into(),
            message: format!("must be >= 0, got {}", config.ranking.top_n),
        });
    }

    if config.selection.time_limit_ms == Some(0) {
        return Err(ConfigError::Invalid {
            field: "selection.time_limit_ms".into(),
            message: "must be > 0; omit it for no limit".into(),
        });
    }

    if config.selection.max_per_club == Some(0) {
        return Err(ConfigError::Invalid {
            field: "selection.max_per_club".into(),
            message: "must be >= 1; omit it for no limit".into(),
        });
    }

    if config.data.candidates.as_os_str().is_empty() {
        return Err(ConfigError::Invalid {
            field: "data.candidates".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn crate_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Fresh temp base dir with the shipped defaults copied into config/.
    fn base_with_defaults(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::copy(
            crate_root().join("defaults/squad.toml"),
            config_dir.join("squad.toml"),
        )
        .unwrap();
        tmp
    }

    /// Rewrite one line of the copied squad.toml.
    fn patch(base: &Path, from: &str, to: &str) {
        let path = base.join("config/squad.toml");
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "pattern {from:?} not in squad.toml");
        fs::write(&path, text.replacen(from, to, 1)).unwrap();
    }

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = base_with_defaults("fpl_config_test_valid");
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.budget, 100.0);
        assert_eq!(config.policy, QuotaPolicy::standard());
        assert_eq!(config.policy.total_squad_size(), 15);
        assert!(!config.selection.auto_select_bench);
        assert_eq!(config.selection.time_limit_ms, None);
        assert_eq!(config.selection.fallback, FallbackPolicy::Greedy);
        assert_eq!(config.selection.max_per_club, None);
        assert_eq!(config.ranking.top_n, 32);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.data.candidates, tmp.join("data/predictions.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn request_carries_selection_settings() {
        let tmp = base_with_defaults("fpl_config_test_request");
        patch(&tmp, "# time_limit_ms = 5000", "time_limit_ms = 250");
        patch(&tmp, "auto_select_bench = false", "auto_select_bench = true");
        patch(&tmp, "fallback = \"greedy\"", "fallback = \"fail\"");
        patch(&tmp, "# max_per_club = 3", "max_per_club = 3");

        let request = load_config_from(&tmp).unwrap().request();
        assert_eq!(request.budget, 100.0);
        assert!(request.auto_select_bench);
        assert_eq!(request.time_limit, Some(Duration::from_millis(250)));
        assert_eq!(request.fallback, FallbackPolicy::Fail);
        assert_eq!(request.max_per_club, Some(3));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn quota_keys_accept_short_codes() {
        let tmp = base_with_defaults("fpl_config_test_short_codes");
        patch(&tmp, "[quota.goalkeeper]", "[quota.GKP]");
        patch(&tmp, "[quota.forward]", "[quota.fwd]");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.policy, QuotaPolicy::standard());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_quota_position() {
        let tmp = base_with_defaults("fpl_config_test_unknown_position");
        patch(&tmp, "[quota.forward]", "[quota.winger]");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "quota.winger"),
            other => panic!("expected Invalid, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_bench_count() {
        let tmp = base_with_defaults("fpl_config_test_negative_bench");
        patch(&tmp, "starting = 4\nbench = 1", "starting = 4\nbench = -1");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, message } => {
                assert_eq!(field, "quota");
                assert!(message.contains(">= 0"));
            }
            other => panic!("expected Invalid, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_budget() {
        let tmp = base_with_defaults("fpl_config_test_zero_budget");
        patch(&tmp, "total = 100.0", "total = 0.0");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "budget.total"),
            other => panic!("expected Invalid, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_budget_unit() {
        let tmp = base_with_defaults("fpl_config_test_zero_unit");
        patch(&tmp, "unit = 0.1", "unit = 0.0");
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::Invalid { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_top_n() {
        let tmp = base_with_defaults("fpl_config_test_negative_top_n");
        patch(&tmp, "top_n = 32", "top_n = -4");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "ranking.top_n"),
            other => panic!("expected Invalid, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_club_limit() {
        let tmp = base_with_defaults("fpl_config_test_zero_club_limit");
        patch(&tmp, "# max_per_club = 3", "max_per_club = 0");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "selection.max_per_club"),
            other => panic!("expected Invalid, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_output_format() {
        let tmp = base_with_defaults("fpl_config_test_bad_format");
        patch(&tmp, "format = \"table\"", "format = \"xml\"");
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::Parse { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_squad_toml() {
        let tmp = std::env::temp_dir().join("fpl_config_test_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Missing { path } => assert!(path.ends_with("squad.toml")),
            other => panic!("expected Missing, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = std::env::temp_dir().join("fpl_config_test_invalid_toml");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/squad.toml"), "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Parse { path, .. } => assert!(path.ends_with("squad.toml")),
            other => panic!("expected Parse, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("fpl_config_test_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(
            crate_root().join("defaults/squad.toml"),
            defaults_dir.join("squad.toml"),
        )
        .unwrap();
        fs::write(defaults_dir.join("squad.toml.example"), "# template\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/squad.toml").exists());
        assert!(!tmp.join("config/squad.toml.example").exists());

        // The copy loads like the shipped file.
        assert!(load_config_from(&tmp).is_ok());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("fpl_config_test_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        fs::copy(
            crate_root().join("defaults/squad.toml"),
            defaults_dir.join("squad.toml"),
        )
        .unwrap();
        fs::write(config_dir.join("squad.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());
        let content = fs::read_to_string(config_dir.join("squad.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("fpl_config_test_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::Seed { message } => {
                assert!(message.contains("no defaults/ or config/ directory"));
                assert!(message.contains("--config-dir"));
            }
            other => panic!("expected Seed, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
