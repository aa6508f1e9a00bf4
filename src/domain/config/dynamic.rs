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

use crate::domain::config::ShellConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Parse `-D key=value` properties
pub fn parse_properties(properties: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for property in properties {
        let parts: Vec<&str> = property.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid config format: '{}'. Expected 'key=value'",
                property
            ));
        }

        // values keep their whitespace: a prompt may end with a space
        let key = parts[0].trim();
        let value = parts[1];

        if key.is_empty() {
            return Err(format!("Empty key in config: '{}'", property));
        }

        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}

pub fn apply_to_shell_config(configs: &HashMap<String, String>, config: &mut ShellConfig) {
    if let Some(prompt) = configs.get("shell.prompt") {
        config.prompt = prompt.clone();
    }

    if let Some(path) = configs.get("shell.history-file") {
        config.history_file = Some(PathBuf::from(path));
    }

    if let Some(folder) = configs.get("inventory.tenants-folder") {
        config.tenants_folder = folder.clone();
    }

    if let Some(folder) = configs.get("inventory.templates-folder") {
        config.templates_folder = folder.clone();
    }

    if let Some(interval) = configs.get("task.poll-interval-ms") {
        match interval.trim().parse::<u64>() {
            Ok(ms) => config.task_poll_interval_ms = ms,
            Err(_) => warn!("ignoring task.poll-interval-ms={}: not a number", interval),
        }
    }

    if let Some(timeout) = configs.get("task.timeout-secs") {
        match timeout.trim().parse::<u64>() {
            Ok(0) => config.task_timeout_secs = None,
            Ok(secs) => config.task_timeout_secs = Some(secs),
            Err(_) => warn!("ignoring task.timeout-secs={}: not a number", timeout),
        }
    }

    if let Some(release) = configs.get("api.release") {
        config.api_release = release.trim().to_string();
    }

    if let Some(flag) = configs.get("tls.accept-invalid-certs") {
        match flag.trim().parse::<bool>() {
            Ok(accept) => config.accept_invalid_certs = accept,
            Err(_) => warn!("ignoring tls.accept-invalid-certs={}: not a boolean", flag),
        }
    }
}
