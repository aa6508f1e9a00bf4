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

//! vCenter credentials file (`.credentials`)
//!
//! JSON by default; a `.toml` extension switches to TOML. Keys follow the
//! `VC_*` naming of the environment the file is usually generated from.

use crate::infrastructure::constants::DEFAULT_VC_PORT;
use crate::shared::error::VcError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "VC_HOST")]
    pub host: String,

    #[serde(rename = "VC_USER")]
    pub user: String,

    #[serde(rename = "VC_PASS")]
    pub password: String,

    #[serde(
        rename = "VC_PORT",
        default = "default_port",
        deserialize_with = "port_from_number_or_string"
    )]
    pub port: u16,

    /// Storage used when a clone request names none
    #[serde(rename = "VC_DATASTORE", default)]
    pub datastore: Option<String>,
}

// Keeps the password out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"********")
            .field("port", &self.port)
            .field("datastore", &self.datastore)
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_VC_PORT
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse::<u16>()
            .map_err(|e| serde::de::Error::custom(format!("invalid VC_PORT '{}': {}", text, e))),
    }
}

impl Credentials {
    /// Load credentials; a missing or unreadable file is a fatal error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VcError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VcError::Credentials(format!(
                "Failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let credentials: Self = if is_toml {
            toml::from_str(&content).map_err(|e| {
                VcError::Credentials(format!("Invalid credentials file {}: {}", path.display(), e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                VcError::Credentials(format!("Invalid credentials file {}: {}", path.display(), e))
            })?
        };

        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<(), VcError> {
        if self.host.trim().is_empty() {
            return Err(VcError::Credentials("VC_HOST must not be empty".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(VcError::Credentials("VC_USER must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(VcError::Credentials("VC_PORT must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_json_credentials() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"VC_HOST":"vc01.example.com","VC_USER":"admin","VC_PASS":"secret","VC_PORT":"443","VC_DATASTORE":"pod01"}}"#
        )
        .unwrap();

        let creds = Credentials::from_file(file.path()).unwrap();
        assert_eq!(creds.host, "vc01.example.com");
        assert_eq!(creds.port, 443);
        assert_eq!(creds.datastore.as_deref(), Some("pod01"));
        assert_eq!(creds.base_url(), "https://vc01.example.com:443");
    }

    #[test]
    fn test_load_toml_credentials_with_numeric_port() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "VC_HOST = \"vc02\"\nVC_USER = \"ops\"\nVC_PASS = \"pw\"\nVC_PORT = 8443"
        )
        .unwrap();

        let creds = Credentials::from_file(file.path()).unwrap();
        assert_eq!(creds.port, 8443);
        assert!(creds.datastore.is_none());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = Credentials::from_file("/nonexistent/.credentials").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials {
            host: "vc".to_string(),
            user: "u".to_string(),
            password: "hunter2".to_string(),
            port: 443,
            datastore: None,
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
