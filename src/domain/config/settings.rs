// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::infrastructure::constants::{
    APP_DIR_NAME, DEFAULT_API_RELEASE, DEFAULT_PROMPT, DEFAULT_TASK_POLL_INTERVAL_MS, DEFAULT_TEMPLATES_FOLDER,
    DEFAULT_TENANTS_FOLDER, HISTORY_FILE_NAME,
};
use crate::shared::error::VcError;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shell behaviour settings, loaded from an optional TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    pub prompt: String,
    /// Folder whose sub-folders are the tenants
    pub tenants_folder: String,
    /// Folder searched recursively by `list-templates`
    pub templates_folder: String,
    pub task_poll_interval_ms: u64,
    /// Give up waiting on a task after this long; unset waits forever
    pub task_timeout_secs: Option<u64>,
    pub accept_invalid_certs: bool,
    /// vim25 release in the API path, e.g. `8.0.1.0`
    pub api_release: String,
    pub history_file: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            tenants_folder: DEFAULT_TENANTS_FOLDER.to_string(),
            templates_folder: DEFAULT_TEMPLATES_FOLDER.to_string(),
            task_poll_interval_ms: DEFAULT_TASK_POLL_INTERVAL_MS,
            task_timeout_secs: None,
            accept_invalid_certs: true,
            api_release: DEFAULT_API_RELEASE.to_string(),
            history_file: None,
        }
    }
}

impl ShellConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VcError> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            VcError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let conf: Self = toml::from_str(&content)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), VcError> {
        if self.task_poll_interval_ms == 0 {
            return Err(VcError::config_error(
                "task_poll_interval_ms must be > 0",
            ));
        }
        if self.tenants_folder.trim().is_empty() {
            return Err(VcError::config_error("tenants_folder must not be empty"));
        }
        if self.templates_folder.trim().is_empty() {
            return Err(VcError::config_error("templates_folder must not be empty"));
        }
        if self.api_release.trim().is_empty() || self.api_release.contains('/') {
            return Err(VcError::config_error(format!(
                "api_release '{}' is not a release number",
                self.api_release
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.task_poll_interval_ms)
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return path.clone();
        }
        dirs::cache_dir()
            .map(|p| p.join(APP_DIR_NAME).join(HISTORY_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(".vcsh_history"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let conf = ShellConfig::default();
        assert_eq!(conf.tenants_folder, "Tenants");
        assert_eq!(conf.templates_folder, "Templates");
        assert_eq!(conf.poll_interval(), Duration::from_millis(500));
        assert_eq!(conf.api_release, "8.0.1.0");
        assert!(conf.task_timeout().is_none());
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tenants_folder = \"Customers\"\ntask_timeout_secs = 600").unwrap();

        let conf = ShellConfig::from_file(file.path()).unwrap();
        assert_eq!(conf.tenants_folder, "Customers");
        assert_eq!(conf.templates_folder, "Templates");
        assert_eq!(conf.task_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let conf = ShellConfig {
            task_poll_interval_ms: 0,
            ..ShellConfig::default()
        };
        assert!(conf.validate().is_err());
    }
}
