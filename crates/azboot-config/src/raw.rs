use serde::Deserialize;

/// Raw YAML representation of a profile file (e.g. `azboot.yml`).
///
/// Every field is optional; command-line flags fill or override them.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProfile {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub setup: RawSetup,
    #[serde(default)]
    pub validate: RawValidate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSetup {
    pub display_name: Option<String>,
    /// `owner/repo`
    pub repository: Option<String>,
    /// "branch", "environment" or "tags".
    pub subject_mode: Option<String>,
    pub subject_value: Option<String>,
    pub role: Option<String>,
    /// "resource-group" or "subscription".
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawValidate {
    pub app_id: Option<String>,
}
