use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the onboarding engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OnboardingConfig {
    /// Trigger dispatch policy
    pub dispatcher: DispatcherConfig,
    /// Step retry and signature settings
    pub workflow: WorkflowConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Where the CLI keeps its state between invocations
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Automatic dispatch on/off; manual dispatch is unaffected
    pub enabled: bool,
    /// Roles that start onboarding automatically
    pub qualifying_roles: Vec<String>,
    /// Pause automatic dispatch for an administrator's approval
    pub require_approval: bool,
    /// Copy the compliance/HR recipient on session start
    pub notify_compliance: bool,
    pub compliance_recipient: Option<String>,
    /// System-channel recipients for escalations and approvals
    pub admin_recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Backoff reported to callers after a retryable step failure
    pub retry_backoff_seconds: u64,
    pub signature_expiry_days: i64,
    /// Days before expiry at which reminders go out
    pub reminder_days: Vec<i64>,
    pub max_reminders: u32,
    pub signature_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PersistenceConfig {
    /// Path to the session snapshot file
    pub state_file_path: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig {
                enabled: true,
                qualifying_roles: vec!["Dispatcher".to_string(), "Broker Agent".to_string()],
                require_approval: false,
                notify_compliance: false,
                compliance_recipient: None,
                admin_recipients: vec!["onboarding-admins".to_string()],
            },
            workflow: WorkflowConfig {
                retry_backoff_seconds: 5,
                signature_expiry_days: 7,
                reminder_days: vec![3, 1],
                max_reminders: 3,
                signature_base_url: "https://signature.example.com".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
            persistence: PersistenceConfig {
                state_file_path: ".onboarding/state.json".to_string(),
            },
        }
    }
}

impl OnboardingConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (onboarding.toml, .onboarding-rc)
    /// 3. Environment variables (prefixed with ONBOARDING_, nested keys split on `__`)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&OnboardingConfig::default())?);

        if Path::new("onboarding.toml").exists() {
            builder = builder.add_source(File::with_name("onboarding"));
        }

        if Path::new(".onboarding-rc").exists() {
            builder = builder.add_source(File::new(".onboarding-rc", config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("ONBOARDING")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("dispatcher.qualifying_roles")
                .with_list_parse_key("dispatcher.admin_recipients")
                .with_list_parse_key("workflow.reminder_days")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let onboarding_config: OnboardingConfig = config.try_deserialize()?;
        Ok(onboarding_config)
    }

    /// Load a single TOML file layered over the defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&OnboardingConfig::default())?)
            .add_source(File::from(path.as_ref()).format(config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn state_file(&self) -> PathBuf {
        PathBuf::from(&self.persistence.state_file_path)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<OnboardingConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = OnboardingConfig::load_env_file();
        OnboardingConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static OnboardingConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
