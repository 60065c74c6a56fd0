//! The local `azd` environment file the agent id is recorded in.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// `AZD_ENV_FILE` when set, else `.azure/dev/.env` under the git root, else
/// under the current directory.
pub fn resolve(azd_env_file: Option<String>) -> PathBuf {
    if let Some(path) = azd_env_file.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    let root = git_root()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    root.join(".azure").join("dev").join(".env")
}

fn git_root() -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8(output.stdout).ok()?;
    let root = root.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

/// Append `AZURE_AGENT_ID="<id>"`, creating the file and its directory.
/// Earlier lines are left alone, so repeated runs add more.
pub fn append_agent_id(path: &Path, agent_id: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "AZURE_AGENT_ID=\"{agent_id}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_without_deduplicating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".azure").join("dev").join(".env");

        append_agent_id(&path, "asst_1").unwrap();
        append_agent_id(&path, "asst_1").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "AZURE_AGENT_ID=\"asst_1\"\nAZURE_AGENT_ID=\"asst_1\"\n");
    }

    #[test]
    fn keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "AZURE_ENV_NAME=\"dev\"\n").unwrap();

        append_agent_id(&path, "asst_2").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("AZURE_ENV_NAME=\"dev\"\n"));
        assert!(contents.ends_with("AZURE_AGENT_ID=\"asst_2\"\n"));
    }

    #[test]
    fn explicit_env_file_is_used() {
        assert_eq!(
            resolve(Some("/tmp/globe/.env".into())),
            PathBuf::from("/tmp/globe/.env")
        );
        assert!(resolve(None).ends_with(".azure/dev/.env"));
    }
}
