mod raw;
mod loader;
pub mod error;

pub use loader::{load_profile, require, Profile, SetupProfile, ValidateProfile};
pub use error::ConfigError;
