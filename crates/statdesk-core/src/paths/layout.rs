//! Known installation layouts and the candidate paths each one produces.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::probe::FileProbe;

/// Directory name of the packaged backend in the standard layout.
pub const BACKEND_DIR_NAME: &str = "backend-server";

/// Name of the resources directory next to the application executable.
const RESOURCES_DIR_NAME: &str = "resources";

/// Case-insensitive marker identifying a backend directory.
const BACKEND_MARKER: &str = "backend";

/// Roots the locator searches from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoots {
    /// Primary resource root (packaged resources directory).
    pub primary: PathBuf,
    /// Directory containing the running application executable.
    pub app_dir: PathBuf,
}

impl InstallRoots {
    pub fn new(primary: impl Into<PathBuf>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            app_dir: app_dir.into(),
        }
    }

    /// The layout-1 path, reported when nothing else exists.
    pub fn standard_path(&self, exe_name: &str) -> PathBuf {
        self.primary.join(BACKEND_DIR_NAME).join(exe_name)
    }
}

/// Directory conventions the backend may be installed under, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationLayout {
    /// `<primary>/backend-server/<exe>`
    Standard,
    /// `<primary>/<dir containing "backend">/<exe>`
    BackendNamedEntry,
    /// `<app_dir>/resources/<dir containing "backend">/<exe>`
    AppResources,
    /// `<app_dir>/../backend-server/<exe>`
    SiblingFallback,
}

impl InstallationLayout {
    /// All layouts in the order they are tried.
    pub const PRIORITY: [Self; 4] = [
        Self::Standard,
        Self::BackendNamedEntry,
        Self::AppResources,
        Self::SiblingFallback,
    ];

    /// Candidate executable paths for this layout.
    pub fn candidates(
        self,
        roots: &InstallRoots,
        exe_name: &str,
        probe: &dyn FileProbe,
    ) -> Vec<PathBuf> {
        match self {
            Self::Standard => vec![roots.standard_path(exe_name)],
            Self::BackendNamedEntry => backend_named_entries(&roots.primary, exe_name, probe),
            Self::AppResources => backend_named_entries(
                &roots.app_dir.join(RESOURCES_DIR_NAME),
                exe_name,
                probe,
            ),
            Self::SiblingFallback => vec![
                roots
                    .app_dir
                    .join("..")
                    .join(BACKEND_DIR_NAME)
                    .join(exe_name),
            ],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::BackendNamedEntry => "backend-named entry",
            Self::AppResources => "app resources",
            Self::SiblingFallback => "sibling fallback",
        }
    }
}

fn backend_named_entries(dir: &Path, exe_name: &str, probe: &dyn FileProbe) -> Vec<PathBuf> {
    probe
        .child_dirs(dir)
        .into_iter()
        .filter(|entry| is_backend_dir(entry))
        .map(|entry| entry.join(exe_name))
        .collect()
}

fn is_backend_dir(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().to_lowercase().contains(BACKEND_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::FakeProbe;

    fn roots() -> InstallRoots {
        InstallRoots::new("/opt/app/resources", "/opt/app")
    }

    #[test]
    fn standard_layout_is_single_fixed_candidate() {
        let probe = FakeProbe::default();
        let candidates = InstallationLayout::Standard.candidates(&roots(), "srv", &probe);
        assert_eq!(
            candidates,
            vec![PathBuf::from("/opt/app/resources/backend-server/srv")]
        );
    }

    #[test]
    fn backend_named_entry_matches_case_insensitively() {
        let probe = FakeProbe::default().with_dirs(
            "/opt/app/resources",
            &["/opt/app/resources/assets", "/opt/app/resources/My-BACKEND-v2"],
        );
        let candidates =
            InstallationLayout::BackendNamedEntry.candidates(&roots(), "srv", &probe);
        assert_eq!(
            candidates,
            vec![PathBuf::from("/opt/app/resources/My-BACKEND-v2/srv")]
        );
    }

    #[test]
    fn app_resources_layout_scans_resources_under_app_dir() {
        let mut r = roots();
        r.primary = PathBuf::from("/elsewhere");
        let probe = FakeProbe::default().with_dirs(
            "/opt/app/resources",
            &["/opt/app/resources/backend", "/opt/app/resources/frontend"],
        );
        let candidates = InstallationLayout::AppResources.candidates(&r, "srv", &probe);
        assert_eq!(
            candidates,
            vec![PathBuf::from("/opt/app/resources/backend/srv")]
        );
    }

    #[test]
    fn sibling_fallback_points_above_app_dir() {
        let probe = FakeProbe::default();
        let candidates =
            InstallationLayout::SiblingFallback.candidates(&roots(), "srv", &probe);
        assert_eq!(
            candidates,
            vec![PathBuf::from("/opt/app/../backend-server/srv")]
        );
    }

    #[test]
    fn missing_directories_yield_no_candidates() {
        let probe = FakeProbe::default();
        assert!(
            InstallationLayout::BackendNamedEntry
                .candidates(&roots(), "srv", &probe)
                .is_empty()
        );
        assert!(
            InstallationLayout::AppResources
                .candidates(&roots(), "srv", &probe)
                .is_empty()
        );
    }
}
