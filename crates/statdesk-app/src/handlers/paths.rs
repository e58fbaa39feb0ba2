//! Paths command handler.
//!
//! Shows where this run would look for everything, without launching
//! anything. The first place to look when the backend "cannot be found".

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use statdesk_core::{
    AppConfig, ExecutableLocator, InstallationLayout, LaunchMode, Platform, default_log_dir,
};
use statdesk_runtime::find_interpreter;

use crate::error::CliError;

/// Resolved launch locations.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub mode: LaunchMode,
    pub platform: String,
    pub resource_dir: PathBuf,
    pub app_dir: PathBuf,
    pub document_root: PathBuf,
    pub entry_document_present: bool,
    pub backend: BackendReport,
    pub backend_url: String,
    pub asset_port: u16,
    pub log_dir: Option<PathBuf>,
}

/// How the backend would be started.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendReport {
    Packaged {
        path: PathBuf,
        /// `None` when no layout matched and `path` is the standard location.
        layout: Option<InstallationLayout>,
    },
    Source {
        source_dir: PathBuf,
        script: PathBuf,
        script_present: bool,
        interpreter: Option<PathBuf>,
    },
}

impl LaunchReport {
    pub fn collect(config: &AppConfig) -> Self {
        let platform = Platform::current();
        let backend = match config.mode {
            LaunchMode::Production => {
                let location = ExecutableLocator::new(config.backend.naming.clone())
                    .locate(&platform, &config.roots);
                BackendReport::Packaged {
                    path: location.path,
                    layout: location.layout,
                }
            }
            LaunchMode::Development => {
                let script = config.backend.dev_script();
                BackendReport::Source {
                    source_dir: config.backend.source_dir.clone(),
                    script_present: script.is_file(),
                    script,
                    interpreter: find_interpreter(config.backend.python.as_deref()).ok(),
                }
            }
        };

        Self {
            mode: config.mode,
            platform: platform.as_str().to_string(),
            resource_dir: config.roots.primary.clone(),
            app_dir: config.roots.app_dir.clone(),
            document_root: config.assets.document_root.clone(),
            entry_document_present: config.assets.entry_path().is_file(),
            backend,
            backend_url: config.backend.base_url(),
            asset_port: config.assets.port,
            log_dir: default_log_dir().ok(),
        }
    }
}

fn present(flag: bool) -> &'static str {
    if flag { "present" } else { "missing" }
}

impl fmt::Display for LaunchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            LaunchMode::Development => "development",
            LaunchMode::Production => "production",
        };
        writeln!(f, "mode = {mode}")?;
        writeln!(f, "platform = {}", self.platform)?;
        writeln!(f, "resource_dir = {}", self.resource_dir.display())?;
        writeln!(f, "app_dir = {}", self.app_dir.display())?;
        writeln!(
            f,
            "document_root = {} (entry {})",
            self.document_root.display(),
            present(self.entry_document_present)
        )?;
        match &self.backend {
            BackendReport::Packaged { path, layout } => {
                let layout = layout.map_or("missing", InstallationLayout::label);
                writeln!(f, "backend_executable = {} ({layout})", path.display())?;
            }
            BackendReport::Source {
                source_dir,
                script,
                script_present,
                interpreter,
            } => {
                writeln!(f, "backend_source = {}", source_dir.display())?;
                writeln!(
                    f,
                    "backend_script = {} ({})",
                    script.display(),
                    present(*script_present)
                )?;
                match interpreter {
                    Some(path) => writeln!(f, "interpreter = {}", path.display())?,
                    None => writeln!(f, "interpreter = (not found)")?,
                }
            }
        }
        writeln!(f, "backend_url = {}", self.backend_url)?;
        writeln!(f, "asset_port = {}", self.asset_port)?;
        match &self.log_dir {
            Some(dir) => write!(f, "log_dir = {}", dir.display()),
            None => write!(f, "log_dir = (unavailable)"),
        }
    }
}

/// Execute the paths command.
pub fn execute(config: &AppConfig, json: bool) -> Result<(), CliError> {
    let report = LaunchReport::collect(config);
    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Io(format!("Failed to render report: {e}")))?;
        println!("{rendered}");
    } else {
        println!("{report}");
    }
    Ok(())
}
