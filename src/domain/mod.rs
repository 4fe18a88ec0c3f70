//! Version model - typed, ordered parts and the version file

pub mod part;
pub mod version;

pub use part::{PartConfig, PartKind, PartValue, VersionPart};
pub use version::{Version, VersionMapping};
