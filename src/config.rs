//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. the path given with `--config`
//! 2. `$FILEMAILER_CONFIG` (environment variable)
//! 3. `~/.config/filemailer/config.toml` (Linux/macOS)
//!    `%APPDATA%\filemailer\config.toml` (Windows)
//! 4. Built-in defaults
//!
//! The loaded [`Config`] is immutable and handed to each component's
//! constructor at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FileMailerError, Result};
use crate::model::archive::{ArchiveNaming, ArchiveSpec};
use crate::model::selection::SelectionCriteria;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Which files get bundled.
    pub source: SourceConfig,
    /// Where and how the archive is written.
    pub archive: ArchiveConfig,
    /// Message body template.
    pub template: TemplateConfig,
    /// Outbound mail settings.
    pub mail: MailConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for the log file.
    pub log_dir: Option<PathBuf>,
    /// Interface language ("en", "es"). Defaults to the system locale.
    pub lang: Option<String>,
    /// `strftime` format for the `generated_at` template variable.
    pub date_format: String,
}

/// File selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory scanned for files.
    pub dir: PathBuf,
    /// Case-sensitive file name suffix, e.g. ".log".
    pub extension: String,
}

/// Archive output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory receiving the archive. Created if missing.
    pub output_dir: PathBuf,
    /// Archive file name.
    pub file_name: String,
    /// "fixed" reuses `file_name`; "unique" appends a per-dispatch id.
    pub naming: ArchiveNaming,
    /// Copy buffer size in bytes (default: 8192).
    pub buffer_size: usize,
}

/// Template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory templates are loaded from.
    pub root: PathBuf,
    /// Template used for the message body.
    pub name: String,
}

/// How messages leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Deliver over SMTP.
    Smtp,
    /// Write `.eml` files into `mail.outbox_dir`.
    Outbox,
}

/// SMTP connection security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain connection upgraded with STARTTLS (required).
    Starttls,
    /// Implicit TLS from the first byte.
    Tls,
    /// No encryption. Only for local relays.
    None,
}

/// Outbound mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// "smtp" or "outbox".
    pub transport: TransportKind,
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    pub port: u16,
    /// SMTP user. Empty disables authentication.
    pub username: String,
    /// SMTP password, base64-encoded.
    pub password: String,
    /// Sender address. Falls back to `username` when empty.
    pub from: String,
    /// Subject override. Defaults to the localized backup subject.
    pub subject: Option<String>,
    /// Connection security.
    pub tls: TlsMode,
    /// Upper bound for a single SMTP exchange, in seconds.
    pub timeout_secs: u64,
    /// Directory for the outbox transport.
    pub outbox_dir: PathBuf,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
            lang: None,
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            extension: ".log".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir().join("filemailer"),
            file_name: "backup.zip".to_string(),
            naming: ArchiveNaming::Fixed,
            buffer_size: 8 * 1024, // 8 KB
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            name: "filemailer.html".to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Smtp,
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            subject: None,
            tls: TlsMode::Starttls,
            timeout_secs: 30,
            outbox_dir: PathBuf::from("outbox"),
        }
    }
}

// ── Derived component settings ──────────────────────────────────

impl Config {
    /// Selection criteria for the file selector.
    pub fn selection(&self) -> SelectionCriteria {
        SelectionCriteria::new(&self.source.dir, &self.source.extension)
    }

    /// Canonical archive location.
    pub fn archive_spec(&self) -> ArchiveSpec {
        ArchiveSpec::new(&self.archive.output_dir, &self.archive.file_name)
    }

    /// Sender address, falling back to the SMTP user name.
    pub fn sender(&self) -> &str {
        if self.mail.from.is_empty() {
            &self.mail.username
        } else {
            &self.mail.from
        }
    }

    /// Decode the base64-encoded SMTP password.
    pub fn smtp_password(&self) -> Result<String> {
        if self.mail.password.is_empty() {
            return Ok(String::new());
        }
        crate::codec::decode(&self.mail.password)
            .map(|pair| pair.decoded)
            .map_err(|e| FileMailerError::Config(format!("mail.password: {e}")))
    }

    /// Reject settings that would only fail later, mid-dispatch.
    pub fn validate(&self) -> Result<()> {
        let name = &self.archive.file_name;
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(FileMailerError::Config(format!(
                "archive.file_name must be a plain file name, got '{name}'"
            )));
        }
        // The body template is HTML-escaped; these would not appear verbatim.
        if name.contains(['&', '<', '>', '"', '\'']) {
            return Err(FileMailerError::Config(format!(
                "archive.file_name must not contain & < > \" or ', got '{name}'"
            )));
        }
        if self.archive.buffer_size == 0 {
            return Err(FileMailerError::Config(
                "archive.buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.template.name.is_empty() {
            return Err(FileMailerError::Config(
                "template.name must not be empty".to_string(),
            ));
        }
        if self.mail.timeout_secs == 0 {
            return Err(FileMailerError::Config(
                "mail.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if chrono::format::StrftimeItems::new(&self.general.date_format)
            .any(|item| matches!(item, chrono::format::Item::Error))
        {
            return Err(FileMailerError::Config(format!(
                "general.date_format is not a valid strftime format: '{}'",
                self.general.date_format
            )));
        }
        self.smtp_password()?;
        Ok(())
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// An explicit path must exist. A file found at a standard location that
/// cannot be read or parsed is an error; no file at all yields the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(FileMailerError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            Some(p.to_path_buf())
        }
        None => config_file_path().filter(|p| p.exists()),
    };

    let config = match path {
        Some(path) => {
            let cfg = load_config_from(&path)?;
            tracing::info!(path = %path.display(), "Loaded config");
            cfg
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    config.validate()?;
    Ok(config)
}

/// Read and parse a configuration file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| FileMailerError::Config(format!("{}: {e}", path.display())))?;
    toml::from_str::<Config>(&contents)
        .map_err(|e| FileMailerError::Config(format!("{}: {e}", path.display())))
}

/// Save configuration to `path`, or to the standard location when `None`.
pub fn save_config(config: &Config, path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("FILEMAILER_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("filemailer").join("config.toml"))
}

/// Return the directory holding the log file.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filemailer")
}
