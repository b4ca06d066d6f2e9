pub mod error;
pub mod naming;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use naming::federated_credential_name;
pub use types::*;
