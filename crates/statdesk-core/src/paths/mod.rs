//! Backend executable discovery across build and install layouts.
//!
//! The packaged backend can end up in several places depending on how the
//! application was built or installed. Discovery is expressed as an ordered
//! list of [`InstallationLayout`] strategies, each producing candidate paths,
//! evaluated against a [`FileProbe`] until one exists.
//!
//! # Design
//!
//! - Strategies are pure: they only ask the probe about the filesystem
//! - The platform naming rule is data ([`ExecutableNaming`]), not `cfg!` branches
//! - A failed lookup still yields the standard path so errors can name it

mod error;
mod layout;
mod locator;
mod platform;
mod probe;

pub use error::PathError;
pub use layout::{BACKEND_DIR_NAME, InstallRoots, InstallationLayout};
pub use locator::{ExecutableLocator, Location};
pub use platform::{ExecutableNaming, Platform, application_dir, default_log_dir};
pub use probe::{FileProbe, OsFileProbe};

#[cfg(test)]
mod test_utils;
