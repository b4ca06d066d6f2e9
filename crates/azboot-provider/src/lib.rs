pub mod azcli;
pub mod error;
pub mod memory;
pub mod provider;
pub mod runner;

pub use azcli::AzCliProvider;
pub use error::ProviderError;
pub use memory::InMemoryProvider;
pub use provider::{empty_deployment_template, Provider, EMPTY_DEPLOYMENT_TEMPLATE_SCHEMA};
pub use runner::{CommandRunner, ProcessRunner};
