//! Launch plan resolution.
//!
//! A [`LaunchPlan`] is everything needed to spawn the backend: program,
//! arguments, working directory and the environment overlay. Production
//! plans come from the executable locator; development plans run the
//! backend script under a Python interpreter found on `PATH`.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use statdesk_core::{AppConfig, CREDENTIAL_ENV, ExecutableLocator, LaunchMode, Platform};
use tracing::{debug, info, warn};

use super::error::SupervisorError;

/// Interpreters tried in order when no override is configured.
const DEFAULT_INTERPRETERS: [&str; 2] = ["python", "python3"];

/// Program, arguments, working directory and environment for one launch.
///
/// `env` is an overlay: it is applied on top of the inherited environment,
/// never instead of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl LaunchPlan {
    /// Plan that runs `program` with no arguments from `cwd`.
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

/// Variables the backend needs on top of the inherited environment.
///
/// `lookup` reads the parent environment. A missing credential is forwarded
/// as an empty string and logged; the backend still starts without it.
pub fn backend_environment<F>(
    lookup: F,
    mode: LaunchMode,
    backend_root: &Path,
    locale: &str,
) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overlay = BTreeMap::new();

    let credential = lookup(CREDENTIAL_ENV).unwrap_or_default();
    if credential.is_empty() {
        warn!(
            variable = CREDENTIAL_ENV,
            "Credential not set; AI-assisted features of the backend will not work"
        );
    }
    overlay.insert(CREDENTIAL_ENV.to_string(), credential);
    overlay.insert("PYTHONIOENCODING".to_string(), "utf-8".to_string());
    overlay.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
    overlay.insert("LANG".to_string(), locale.to_string());

    if mode.is_development() {
        overlay.insert(
            "PYTHONPATH".to_string(),
            backend_root.to_string_lossy().into_owned(),
        );
    }

    overlay
}

/// Find a Python interpreter on `PATH`.
///
/// An explicit override is the only candidate when given.
pub fn find_interpreter(override_name: Option<&str>) -> Result<PathBuf, SupervisorError> {
    let candidates: Vec<&str> =
        override_name.map_or_else(|| DEFAULT_INTERPRETERS.to_vec(), |name| vec![name]);

    for name in &candidates {
        match which::which(name) {
            Ok(path) => {
                debug!(interpreter = %path.display(), "Using Python interpreter");
                return Ok(path);
            }
            Err(e) => debug!(candidate = %name, error = %e, "Interpreter candidate not found"),
        }
    }

    Err(SupervisorError::InterpreterNotFound {
        tried: candidates.iter().map(ToString::to_string).collect(),
    })
}

/// Resolve how to launch the backend for this run.
///
/// Fails fast, before anything is spawned, when the executable (production)
/// or the entry script (development) does not exist.
pub fn resolve_launch_plan(config: &AppConfig) -> Result<LaunchPlan, SupervisorError> {
    let lookup = |key: &str| env::var(key).ok();

    match config.mode {
        LaunchMode::Production => {
            let locator = ExecutableLocator::new(config.backend.naming.clone());
            let location = locator.locate(&Platform::current(), &config.roots);
            if !location.is_found() {
                return Err(SupervisorError::ExecutableNotFound {
                    path: location.path,
                });
            }
            info!(executable = %location, "Resolved packaged backend");

            let cwd = location
                .path
                .parent()
                .map_or_else(|| config.roots.primary.clone(), Path::to_path_buf);
            let overlay =
                backend_environment(lookup, config.mode, &cwd, &config.backend.locale);
            Ok(LaunchPlan::new(location.path, cwd).with_env(overlay))
        }
        LaunchMode::Development => {
            let interpreter = find_interpreter(config.backend.python.as_deref())?;
            let script = config.backend.dev_script();
            if !script.is_file() {
                return Err(SupervisorError::ExecutableNotFound { path: script });
            }
            info!(
                interpreter = %interpreter.display(),
                script = %script.display(),
                "Resolved development backend"
            );

            let root = config.backend.source_dir.clone();
            let overlay =
                backend_environment(lookup, config.mode, &root, &config.backend.locale);
            Ok(LaunchPlan::new(interpreter, root)
                .with_args([script.to_string_lossy().into_owned()])
                .with_env(overlay))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statdesk_core::InstallRoots;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn overlay_sets_encoding_and_locale() {
        let overlay = backend_environment(
            no_env,
            LaunchMode::Production,
            Path::new("/srv/backend"),
            "zh_CN.UTF-8",
        );
        assert_eq!(overlay.get("PYTHONIOENCODING").map(String::as_str), Some("utf-8"));
        assert_eq!(overlay.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
        assert_eq!(overlay.get("LANG").map(String::as_str), Some("zh_CN.UTF-8"));
        assert!(!overlay.contains_key("PYTHONPATH"));
    }

    #[test]
    fn missing_credential_is_forwarded_empty() {
        let overlay = backend_environment(
            no_env,
            LaunchMode::Production,
            Path::new("/srv/backend"),
            "C.UTF-8",
        );
        assert_eq!(overlay.get(CREDENTIAL_ENV).map(String::as_str), Some(""));
    }

    #[test]
    fn present_credential_is_forwarded() {
        let lookup = |key: &str| (key == CREDENTIAL_ENV).then(|| "sk-test".to_string());
        let overlay = backend_environment(
            lookup,
            LaunchMode::Production,
            Path::new("/srv/backend"),
            "C.UTF-8",
        );
        assert_eq!(overlay.get(CREDENTIAL_ENV).map(String::as_str), Some("sk-test"));
    }

    #[test]
    fn development_overlay_adds_pythonpath() {
        let overlay = backend_environment(
            no_env,
            LaunchMode::Development,
            Path::new("/src/backend"),
            "C.UTF-8",
        );
        assert_eq!(overlay.get("PYTHONPATH").map(String::as_str), Some("/src/backend"));
    }

    #[test]
    fn unknown_interpreter_override_is_reported() {
        let err = find_interpreter(Some("statdesk-no-such-python")).unwrap_err();
        match err {
            SupervisorError::InterpreterNotFound { tried } => {
                assert_eq!(tried, vec!["statdesk-no-such-python".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn layout(temp: &TempDir) -> AppConfig {
        let resources = temp.path().join("resources");
        fs::create_dir_all(&resources).unwrap();
        AppConfig::from_roots(
            LaunchMode::Production,
            InstallRoots::new(&resources, temp.path().join("app")),
        )
    }

    #[test]
    fn production_plan_uses_located_executable() {
        let temp = TempDir::new().unwrap();
        let config = layout(&temp);
        let exe_name = config.backend.naming.file_name(&Platform::current());
        let backend_dir = config.roots.primary.join("backend-server");
        fs::create_dir_all(&backend_dir).unwrap();
        fs::write(backend_dir.join(&exe_name), b"bin").unwrap();

        let plan = resolve_launch_plan(&config).unwrap();
        assert_eq!(plan.program, backend_dir.join(&exe_name));
        assert_eq!(plan.cwd, backend_dir);
        assert!(plan.args.is_empty());
        assert!(plan.env.contains_key("LANG"));
    }

    #[test]
    fn production_plan_fails_fast_with_standard_path() {
        let temp = TempDir::new().unwrap();
        let config = layout(&temp);
        let exe_name = config.backend.naming.file_name(&Platform::current());

        match resolve_launch_plan(&config).unwrap_err() {
            SupervisorError::ExecutableNotFound { path } => {
                assert_eq!(
                    path,
                    config.roots.primary.join("backend-server").join(exe_name)
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn development_plan_requires_entry_script() {
        let temp = TempDir::new().unwrap();
        let mut config = layout(&temp);
        config.mode = LaunchMode::Development;
        config.backend.python = Some("sh".to_string());
        config.backend.source_dir = temp.path().join("backend");
        fs::create_dir_all(&config.backend.source_dir).unwrap();

        match resolve_launch_plan(&config).unwrap_err() {
            SupervisorError::ExecutableNotFound { path } => {
                assert_eq!(path, config.backend.source_dir.join("main.py"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        fs::write(config.backend.source_dir.join("main.py"), b"print('hi')").unwrap();
        let plan = resolve_launch_plan(&config).unwrap();
        assert!(plan.program.ends_with("sh"));
        assert_eq!(plan.cwd, config.backend.source_dir);
        assert_eq!(
            plan.args,
            vec![config.backend.source_dir.join("main.py").to_string_lossy().into_owned()]
        );
        assert!(plan.env.contains_key("PYTHONPATH"));
    }
}
