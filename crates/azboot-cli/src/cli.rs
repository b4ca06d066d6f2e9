use azboot_domain::{ScopeLevel, SubjectMode};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "azboot",
    about = "Bootstrap and validate an Azure deployment identity for GitHub Actions OIDC",
    version
)]
pub struct Cli {
    /// YAML profile supplying defaults; explicit flags win.
    #[arg(long, env = "AZBOOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create (or find) the resource group, application, service principal,
    /// federated credential and role assignment.
    Setup(SetupArgs),

    /// Check an existing identity and probe what it is allowed to do.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct SetupArgs {
    #[arg(long, env = "AZBOOT_SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    /// Display name of the application registration.
    #[arg(long, env = "AZBOOT_DISPLAY_NAME")]
    pub display_name: Option<String>,

    #[arg(long, env = "AZBOOT_RESOURCE_GROUP")]
    pub resource_group: Option<String>,

    /// Region for the resource group; only needed when it does not exist.
    #[arg(long, env = "AZBOOT_LOCATION")]
    pub location: Option<String>,

    /// GitHub repository as owner/repo.
    #[arg(long, env = "AZBOOT_REPOSITORY")]
    pub repository: Option<String>,

    #[arg(long, value_enum)]
    pub subject_mode: Option<SubjectArg>,

    /// Branch, environment or tag pattern. Default: main.
    #[arg(long)]
    pub subject_value: Option<String>,

    /// Role definition to assign. Default: Contributor.
    #[arg(long)]
    pub role: Option<String>,

    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Report what would be created without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Application (client) id to validate.
    #[arg(long, env = "AZBOOT_APP_ID")]
    pub app_id: Option<String>,

    #[arg(long, env = "AZBOOT_SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    #[arg(long, env = "AZBOOT_RESOURCE_GROUP")]
    pub resource_group: Option<String>,

    /// Defaults to the tenant of the signed-in session.
    #[arg(long, env = "AZBOOT_TENANT_ID")]
    pub tenant_id: Option<String>,

    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SubjectArg {
    Branch,
    Environment,
    Tags,
}

impl From<SubjectArg> for SubjectMode {
    fn from(a: SubjectArg) -> Self {
        match a {
            SubjectArg::Branch => SubjectMode::Branch,
            SubjectArg::Environment => SubjectMode::Environment,
            SubjectArg::Tags => SubjectMode::Tags,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    ResourceGroup,
    Subscription,
}

impl From<ScopeArg> for ScopeLevel {
    fn from(a: ScopeArg) -> Self {
        match a {
            ScopeArg::ResourceGroup => ScopeLevel::ResourceGroup,
            ScopeArg::Subscription => ScopeLevel::Subscription,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
