use std::path::Path;

use azboot_domain::{GitHubRepo, ScopeLevel, SubjectMode};
use tracing::debug;

use crate::error::ConfigError;
use crate::raw::{RawProfile, RawSetup, RawValidate};

/// Defaults for `setup`/`validate` parameters read from a profile file.
///
/// Values are already validated; anything absent is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub setup: SetupProfile,
    pub validate: ValidateProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupProfile {
    pub display_name: Option<String>,
    pub repository: Option<GitHubRepo>,
    pub subject_mode: Option<SubjectMode>,
    pub subject_value: Option<String>,
    pub role: Option<String>,
    pub scope: Option<ScopeLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateProfile {
    pub app_id: Option<String>,
}

/// Read and validate the profile at `path`.
///
/// Expected layout:
/// ```text
/// subscription_id: 00000000-0000-0000-0000-000000000000
/// resource_group: rg-app
/// location: westeurope
/// setup:
///   display_name: gh-deployer
///   repository: owner/repo
///   subject_mode: environment
///   subject_value: production
/// validate:
///   app_id: 11111111-1111-1111-1111-111111111111
/// ```
pub fn load_profile(path: &Path) -> Result<Profile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    // An empty file is a valid, empty profile.
    let raw: RawProfile = if content.trim().is_empty() {
        RawProfile::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.display().to_string(),
            source: e,
        })?
    };

    debug!("Loading profile from {}", path.display());
    convert_profile(raw)
}

/// The first of `flag` and `fallback` that is set and non-blank, else
/// [`ConfigError::Missing`] naming `field`.
pub fn require(
    field: &str,
    flag: Option<String>,
    fallback: Option<String>,
) -> Result<String, ConfigError> {
    flag.into_iter()
        .chain(fallback)
        .find(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing { field: field.to_string() })
}

fn convert_profile(raw: RawProfile) -> Result<Profile, ConfigError> {
    Ok(Profile {
        subscription_id: non_blank(raw.subscription_id),
        tenant_id: non_blank(raw.tenant_id),
        resource_group: non_blank(raw.resource_group),
        location: non_blank(raw.location),
        setup: convert_setup(raw.setup)?,
        validate: convert_validate(raw.validate),
    })
}

fn convert_setup(raw: RawSetup) -> Result<SetupProfile, ConfigError> {
    let repository = non_blank(raw.repository)
        .map(|r| GitHubRepo::parse(&r))
        .transpose()?;
    let subject_mode = non_blank(raw.subject_mode)
        .map(|m| m.parse::<SubjectMode>())
        .transpose()?;
    let scope = non_blank(raw.scope)
        .map(|s| s.parse::<ScopeLevel>())
        .transpose()?;

    Ok(SetupProfile {
        display_name: non_blank(raw.display_name),
        repository,
        subject_mode,
        subject_value: raw.subject_value,
        role: non_blank(raw.role),
        scope,
    })
}

fn convert_validate(raw: RawValidate) -> ValidateProfile {
    ValidateProfile { app_id: non_blank(raw.app_id) }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
