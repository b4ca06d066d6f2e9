use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml parse error in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// `field` is the command-line flag name, without the leading dashes.
    #[error("missing required value: pass --{field} or set it in the profile")]
    Missing { field: String },

    #[error("domain error: {0}")]
    Domain(#[from] azboot_domain::DomainError),
}
