use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde_yaml::{Mapping, Value};

use openrouter_api::DEFAULT_BASE_URL;

pub const CONFIG_DIR: &str = ".skillchat";
pub const SETTINGS_FILE: &str = "settings.yaml";
pub const SESSIONS_DIR: &str = "sessions";

pub const DEFAULT_MODEL: &str = "moonshotai/kimi-k2.5";
/// Command used to spawn the external tool-execution process.
pub const DEFAULT_TOOL_SERVER: &str = "uvx fastskills";

/// User-editable runtime configuration, persisted as flat YAML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub skills_dir: String,
    pub workdir: String,
    pub tool_server: String,
}

impl Settings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            skills_dir: default_skills_dir(),
            workdir: ".".to_string(),
            tool_server: DEFAULT_TOOL_SERVER.to_string(),
        }
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR))
            .ok_or_else(|| anyhow!("cannot determine home directory"))
    }

    pub fn settings_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(SETTINGS_FILE))
    }

    pub fn sessions_root() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(SESSIONS_DIR))
    }

    /// Loads settings from the per-user location.
    ///
    /// Returns `None` when the file is missing, unparsable, or carries no api
    /// key; callers route all three into the guided entry flow.
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::settings_path().ok()?)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let text = fs::read_to_string(path).ok()?;
        let mapping: Mapping = serde_yaml::from_str(&text).ok()?;

        let api_key = string_key(&mapping, "api_key")?;
        if api_key.trim().is_empty() {
            return None;
        }

        Some(Self {
            api_key,
            model: string_key(&mapping, "model").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: string_key(&mapping, "base_url")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            skills_dir: string_key(&mapping, "skills_dir").unwrap_or_else(default_skills_dir),
            workdir: string_key(&mapping, "workdir").unwrap_or_else(|| ".".to_string()),
            tool_server: string_key(&mapping, "tool_server")
                .unwrap_or_else(|| DEFAULT_TOOL_SERVER.to_string()),
        })
    }

    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::settings_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Writes settings, re-reading the existing file first so keys this
    /// version does not know about survive the rewrite.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let mut mapping = fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_yaml::from_str::<Mapping>(&text).ok())
            .unwrap_or_default();

        set_string(&mut mapping, "api_key", &self.api_key);
        set_string(&mut mapping, "model", &self.model);
        set_string(&mut mapping, "base_url", &self.base_url);
        set_string(&mut mapping, "skills_dir", &self.skills_dir);
        set_string(&mut mapping, "workdir", &self.workdir);
        set_string(&mut mapping, "tool_server", &self.tool_server);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_yaml::to_string(&mapping).context("failed to render settings YAML")?;
        fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Command line for the tool-server child process, tool paths appended.
    pub fn tool_server_command(&self) -> (String, Vec<String>) {
        let mut parts = self.tool_server.split_whitespace();
        let program = parts.next().unwrap_or("uvx").to_string();
        let mut args: Vec<String> = parts.map(str::to_string).collect();
        args.push("--skills-dir".to_string());
        args.push(self.skills_dir.clone());
        args.push("--workdir".to_string());
        args.push(self.workdir.clone());
        (program, args)
    }
}

fn default_skills_dir() -> String {
    dirs::home_dir()
        .map(|home| home.join(".fastskills").join("skills"))
        .unwrap_or_else(|| PathBuf::from("skills"))
        .to_string_lossy()
        .into_owned()
}

fn string_key(mapping: &Mapping, key: &str) -> Option<String> {
    mapping
        .get(&Value::from(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn set_string(mapping: &mut Mapping, key: &str, value: &str) {
    mapping.insert(Value::from(key), Value::from(value));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Settings, DEFAULT_MODEL};

    #[test]
    fn load_from_missing_file_is_none() {
        let dir = TempDir::new().expect("tempdir should be created");
        assert!(Settings::load_from(&dir.path().join("settings.yaml")).is_none());
    }

    #[test]
    fn load_from_requires_api_key() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "model: some/model\n").expect("settings should be written");
        assert!(Settings::load_from(&path).is_none());

        fs::write(&path, "api_key: \"\"\n").expect("settings should be written");
        assert!(Settings::load_from(&path).is_none());
    }

    #[test]
    fn load_from_fills_defaults_for_absent_keys() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "api_key: sk-test\n").expect("settings should be written");

        let settings = Settings::load_from(&path).expect("settings should load");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.workdir, ".");
    }

    #[test]
    fn save_to_preserves_unknown_keys() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "api_key: old\ncustom_flag: kept\n")
            .expect("settings should be written");

        let mut settings = Settings::load_from(&path).expect("settings should load");
        settings.api_key = "sk-new".to_string();
        settings.model = "other/model".to_string();
        settings.save_to(&path).expect("save should succeed");

        let text = fs::read_to_string(&path).expect("settings should be readable");
        assert!(text.contains("custom_flag: kept"));
        assert!(text.contains("api_key: sk-new"));
        assert!(text.contains("model: other/model"));
    }

    #[test]
    fn tool_server_command_splits_program_and_appends_paths() {
        let mut settings = Settings::with_api_key("sk-test");
        settings.tool_server = "uvx fastskills".to_string();
        settings.skills_dir = "/tmp/skills".to_string();
        settings.workdir = "/tmp/work".to_string();

        let (program, args) = settings.tool_server_command();
        assert_eq!(program, "uvx");
        assert_eq!(
            args,
            vec!["fastskills", "--skills-dir", "/tmp/skills", "--workdir", "/tmp/work"]
        );
    }
}
