//! Ordered evaluation of installation layouts.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use super::layout::{InstallRoots, InstallationLayout};
use super::platform::{ExecutableNaming, Platform};
use super::probe::{FileProbe, OsFileProbe};

/// Result of a backend lookup.
///
/// `layout` is `None` when no candidate existed; `path` is then the
/// standard layout path so that a "missing file" report can name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub layout: Option<InstallationLayout>,
}

impl Location {
    pub const fn is_found(&self) -> bool {
        self.layout.is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layout {
            Some(layout) => write!(f, "{} ({})", self.path.display(), layout.label()),
            None => write!(f, "{} (missing)", self.path.display()),
        }
    }
}

/// Finds the backend executable across the known layouts.
#[derive(Debug, Clone)]
pub struct ExecutableLocator<P = OsFileProbe> {
    naming: ExecutableNaming,
    probe: P,
}

impl ExecutableLocator<OsFileProbe> {
    /// Locator that inspects the real filesystem.
    pub fn new(naming: ExecutableNaming) -> Self {
        Self {
            naming,
            probe: OsFileProbe,
        }
    }
}

impl<P: FileProbe> ExecutableLocator<P> {
    /// Locator using a custom filesystem probe.
    pub fn with_probe(naming: ExecutableNaming, probe: P) -> Self {
        Self { naming, probe }
    }

    pub const fn naming(&self) -> &ExecutableNaming {
        &self.naming
    }

    /// Locate the backend executable for `platform` under `roots`.
    ///
    /// Layouts are tried in [`InstallationLayout::PRIORITY`] order and the
    /// first existing candidate wins.
    pub fn locate(&self, platform: &Platform, roots: &InstallRoots) -> Location {
        let exe_name = self.naming.file_name(platform);

        for layout in InstallationLayout::PRIORITY {
            for candidate in layout.candidates(roots, &exe_name, &self.probe) {
                if self.probe.is_file(&candidate) {
                    debug!(
                        path = %candidate.display(),
                        layout = layout.label(),
                        "Located backend executable"
                    );
                    return Location {
                        path: candidate,
                        layout: Some(layout),
                    };
                }
                debug!(path = %candidate.display(), layout = layout.label(), "Candidate missing");
            }
        }

        Location {
            path: roots.standard_path(&exe_name),
            layout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::FakeProbe;
    use std::fs;
    use tempfile::TempDir;

    const RESOURCES: &str = "/opt/app/resources";
    const APP_DIR: &str = "/opt/app";

    fn roots() -> InstallRoots {
        InstallRoots::new(RESOURCES, APP_DIR)
    }

    fn locate(probe: FakeProbe, platform: &Platform) -> Location {
        ExecutableLocator::with_probe(ExecutableNaming::backend_server(), probe)
            .locate(platform, &roots())
    }

    /// Every layout populated, so each must shadow the ones after it.
    fn full_probe(exe: &str) -> FakeProbe {
        FakeProbe::default()
            .with_file(format!("{RESOURCES}/backend-server/{exe}"))
            .with_dirs(RESOURCES, &["/opt/app/resources/py-backend"])
            .with_file(format!("{RESOURCES}/py-backend/{exe}"))
            .with_file(format!("{APP_DIR}/../backend-server/{exe}"))
    }

    #[test]
    fn standard_layout_wins_when_present() {
        let location = locate(full_probe("backend-server"), &Platform::Linux);
        assert_eq!(location.layout, Some(InstallationLayout::Standard));
        assert_eq!(
            location.path,
            PathBuf::from("/opt/app/resources/backend-server/backend-server")
        );
    }

    #[test]
    fn backend_named_entry_is_second() {
        let probe = FakeProbe::default()
            .with_dirs(RESOURCES, &["/opt/app/resources/Backend_Dist"])
            .with_file("/opt/app/resources/Backend_Dist/backend-server.exe")
            .with_file("/opt/app/../backend-server/backend-server.exe");
        let location = locate(probe, &Platform::Windows);
        assert_eq!(location.layout, Some(InstallationLayout::BackendNamedEntry));
        assert_eq!(
            location.path,
            PathBuf::from("/opt/app/resources/Backend_Dist/backend-server.exe")
        );
    }

    #[test]
    fn app_resources_is_third() {
        let mut r = roots();
        r.primary = PathBuf::from("/srv/primary");
        let probe = FakeProbe::default()
            .with_dirs("/opt/app/resources", &["/opt/app/resources/the-backend"])
            .with_file("/opt/app/resources/the-backend/backend-server")
            .with_file("/opt/app/../backend-server/backend-server");
        let location = ExecutableLocator::with_probe(ExecutableNaming::backend_server(), probe)
            .locate(&Platform::MacOs, &r);
        assert_eq!(location.layout, Some(InstallationLayout::AppResources));
    }

    #[test]
    fn sibling_fallback_is_last() {
        let probe =
            FakeProbe::default().with_file("/opt/app/../backend-server/backend-server");
        let location = locate(probe, &Platform::Linux);
        assert_eq!(location.layout, Some(InstallationLayout::SiblingFallback));
    }

    #[test]
    fn backend_named_dir_without_executable_is_skipped() {
        let probe = FakeProbe::default()
            .with_dirs(
                RESOURCES,
                &["/opt/app/resources/backend-a", "/opt/app/resources/backend-b"],
            )
            .with_file("/opt/app/resources/backend-b/backend-server");
        let location = locate(probe, &Platform::Linux);
        assert_eq!(
            location.path,
            PathBuf::from("/opt/app/resources/backend-b/backend-server")
        );
    }

    #[test]
    fn nothing_found_returns_standard_path() {
        for platform in [Platform::Windows, Platform::Linux, Platform::MacOs] {
            let location = locate(FakeProbe::default(), &platform);
            assert!(!location.is_found());
            let exe = ExecutableNaming::backend_server().file_name(&platform);
            assert_eq!(
                location.path,
                PathBuf::from(RESOURCES).join("backend-server").join(exe)
            );
        }
    }

    #[test]
    fn wrong_platform_suffix_is_not_matched() {
        // Only the Windows executable exists; a Linux lookup must miss it
        let probe = FakeProbe::default()
            .with_file("/opt/app/resources/backend-server/backend-server.exe");
        let location = locate(probe, &Platform::Linux);
        assert!(!location.is_found());
    }

    #[test]
    fn locates_on_real_filesystem() {
        let temp = TempDir::new().unwrap();
        let app_dir = temp.path().join("app");
        let backend_dir = app_dir.join("resources").join("stat-backend");
        fs::create_dir_all(&backend_dir).unwrap();
        fs::write(backend_dir.join("backend-server"), b"bin").unwrap();

        let roots = InstallRoots::new(temp.path().join("missing-primary"), &app_dir);
        let location = ExecutableLocator::new(ExecutableNaming::backend_server())
            .locate(&Platform::Linux, &roots);

        assert_eq!(location.layout, Some(InstallationLayout::AppResources));
        assert_eq!(location.path, backend_dir.join("backend-server"));
    }

    #[test]
    fn display_mentions_missing() {
        let location = locate(FakeProbe::default(), &Platform::Linux);
        assert!(location.to_string().ends_with("(missing)"));
    }
}
