use std::path::Path;

use anyhow::{Context, Result};
use azboot_config::{load_profile, require, Profile};
use azboot_domain::GitHubRepo;
use azboot_provider::AzCliProvider;
use azboot_workflow::{run_setup, run_validation, SetupParams, ValidateParams};
use tracing::debug;

use crate::cli::{OutputFormat, SetupArgs, ValidateArgs};
use crate::output::{self, StdoutProgress};

// ── Profile ───────────────────────────────────────────────────────────────────

pub fn profile(path: Option<&Path>) -> Result<Profile> {
    match path {
        Some(p) => load_profile(p).with_context(|| format!("Failed to load profile {}", p.display())),
        None => Ok(Profile::default()),
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

pub async fn setup(args: SetupArgs, profile: Profile) -> Result<()> {
    let params = setup_params(args, profile)?;
    debug!(?params, "resolved setup parameters");

    let provider = AzCliProvider::new();
    let mut progress = StdoutProgress { enabled: true };
    let report = run_setup(&params, &provider, &mut progress).await?;

    print!("{}", output::render_setup_report(&report)?);
    Ok(())
}

/// Merge flags over the profile. Flags win; the five identifying values must
/// come from one or the other.
fn setup_params(args: SetupArgs, profile: Profile) -> Result<SetupParams> {
    let sp = profile.setup;
    let repository = match args.repository {
        Some(r) => GitHubRepo::parse(&r)?,
        None => sp.repository.ok_or_else(|| azboot_config::ConfigError::Missing {
            field: "repository".into(),
        })?,
    };

    let mut params = SetupParams::new(
        require("subscription-id", args.subscription_id, profile.subscription_id)?,
        require("display-name", args.display_name, sp.display_name)?,
        require("resource-group", args.resource_group, profile.resource_group)?,
        repository,
    );
    params.location = args.location.or(profile.location);
    if let Some(mode) = args.subject_mode.map(Into::into).or(sp.subject_mode) {
        params.subject_mode = mode;
    }
    if let Some(value) = args.subject_value.or(sp.subject_value) {
        params.subject_value = value;
    }
    if let Some(role) = args.role.or(sp.role) {
        params.role = role;
    }
    if let Some(scope) = args.scope.map(Into::into).or(sp.scope) {
        params.scope_level = scope;
    }
    params.dry_run = args.dry_run;
    Ok(params)
}

// ── Validate ──────────────────────────────────────────────────────────────────

/// Returns whether every check passed.
pub async fn validate(args: ValidateArgs, profile: Profile) -> Result<bool> {
    let format = args.output;
    let params = validate_params(args, profile)?;
    debug!(?params, "resolved validate parameters");

    let provider = AzCliProvider::new();
    let mut progress = StdoutProgress { enabled: format == OutputFormat::Text };
    let report = run_validation(&params, &provider, &mut progress).await?;

    match format {
        OutputFormat::Text => print!("{}", output::render_validation_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(report.is_success())
}

fn validate_params(args: ValidateArgs, profile: Profile) -> Result<ValidateParams> {
    Ok(ValidateParams {
        app_id: require("app-id", args.app_id, profile.validate.app_id)?,
        subscription_id: require("subscription-id", args.subscription_id, profile.subscription_id)?,
        resource_group: require("resource-group", args.resource_group, profile.resource_group)?,
        tenant_id: args.tenant_id.or(profile.tenant_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ScopeArg, SubjectArg};
    use azboot_config::SetupProfile;
    use azboot_domain::{ScopeLevel, SubjectMode};

    fn empty_setup_args() -> SetupArgs {
        SetupArgs {
            subscription_id: None,
            display_name: None,
            resource_group: None,
            location: None,
            repository: None,
            subject_mode: None,
            subject_value: None,
            role: None,
            scope: None,
            dry_run: false,
        }
    }

    fn full_profile() -> Profile {
        Profile {
            subscription_id: Some("sub-profile".into()),
            tenant_id: None,
            resource_group: Some("rg-profile".into()),
            location: Some("northeurope".into()),
            setup: SetupProfile {
                display_name: Some("from-profile".into()),
                repository: Some(GitHubRepo::parse("p/repo").unwrap()),
                subject_mode: Some(SubjectMode::Tags),
                subject_value: Some("v*".into()),
                role: Some("Reader".into()),
                scope: Some(ScopeLevel::Subscription),
            },
            validate: Default::default(),
        }
    }

    #[test]
    fn profile_supplies_everything() {
        let p = setup_params(empty_setup_args(), full_profile()).unwrap();
        assert_eq!(p.subscription_id, "sub-profile");
        assert_eq!(p.repository.to_string(), "p/repo");
        assert_eq!(p.subject_mode, SubjectMode::Tags);
        assert_eq!(p.scope_level, ScopeLevel::Subscription);
        assert_eq!(p.location.as_deref(), Some("northeurope"));
    }

    #[test]
    fn flags_override_profile() {
        let mut args = empty_setup_args();
        args.resource_group = Some("rg-flag".into());
        args.repository = Some("f/repo".into());
        args.subject_mode = Some(SubjectArg::Branch);
        args.scope = Some(ScopeArg::ResourceGroup);
        let p = setup_params(args, full_profile()).unwrap();
        assert_eq!(p.resource_group, "rg-flag");
        assert_eq!(p.repository.to_string(), "f/repo");
        assert_eq!(p.subject_mode, SubjectMode::Branch);
        assert_eq!(p.scope_level, ScopeLevel::ResourceGroup);
        assert_eq!(p.role, "Reader");
    }

    #[test]
    fn defaults_apply_without_profile() {
        let mut args = empty_setup_args();
        args.subscription_id = Some("s".into());
        args.display_name = Some("d".into());
        args.resource_group = Some("rg".into());
        args.repository = Some("o/r".into());
        let p = setup_params(args, Profile::default()).unwrap();
        assert_eq!(p.subject_value, "main");
        assert_eq!(p.role, "Contributor");
        assert_eq!(p.subject_mode, SubjectMode::Branch);
    }

    #[test]
    fn missing_required_value_names_the_flag() {
        let err = setup_params(empty_setup_args(), Profile::default()).unwrap_err();
        assert!(err.to_string().contains("--repository"), "{}", err);
    }

    #[test]
    fn validate_requires_app_id() {
        let args = ValidateArgs {
            app_id: None,
            subscription_id: Some("s".into()),
            resource_group: Some("rg".into()),
            tenant_id: None,
            output: OutputFormat::Text,
        };
        let err = validate_params(args, Profile::default()).unwrap_err();
        assert!(err.to_string().contains("--app-id"), "{}", err);
    }
}
