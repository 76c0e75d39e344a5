use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved filesystem layout for runtime data. Directories are created
/// on construction; failures surface later when the stores open.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
    pub documents_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        let log_dir = user_data_dir.join("logs");
        let db_path = user_data_dir.join("docchat_core.db");
        let documents_dir = user_data_dir.join("documents");

        for dir in [&user_data_dir, &log_dir, &documents_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            db_path,
            documents_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("DOCCHAT_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        manifest_dir
    } else {
        env::current_dir().unwrap_or(manifest_dir)
    }
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("DOCCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    // Dev builds keep data next to the sources.
    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    match env::consts::OS {
        "windows" => {
            let base = env::var("LOCALAPPDATA")
                .or_else(|_| env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".to_string());
            PathBuf::from(base).join("Docchat")
        }
        "macos" => home_dir()
            .join("Library")
            .join("Application Support")
            .join("Docchat"),
        _ => {
            let data_home = env::var("XDG_DATA_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home_dir().join(".local/share"));
            data_home.join("docchat")
        }
    }
}

fn home_dir() -> PathBuf {
    for key in ["HOME", "USERPROFILE"] {
        if let Ok(dir) = env::var(key) {
            return PathBuf::from(dir);
        }
    }
    PathBuf::from(".")
}
