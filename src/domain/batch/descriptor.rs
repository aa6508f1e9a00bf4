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

//! Batch clone descriptors.
//!
//! A descriptor carries a `default` block and a `vms` list. Any field of a
//! VM entry other than `name` may be omitted or set to the literal
//! `default`, in which case the value of the default block is used:
//!
//! ```yaml
//! default:
//!   tenant: acme
//!   template: ubuntu-22.04
//!   cluster: cl01
//!   cpu: 2
//!   ram: 4
//!   hdd: 40
//!   portgroup: pg-web
//! vms:
//!   - name: web01
//!   - name: db01
//!     ram: 16
//!     hdd: default
//! ```

use crate::domain::inventory::model::{CloneRequest, VmSettings};
use crate::domain::inventory::validator::{validate_clone_request, validate_settings};
use crate::shared::error::VcError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Marker {
    #[serde(rename = "default")]
    Inherit,
}

/// A per-VM field: an explicit value or a reference to the default block
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Setting<T> {
    Inherit(Marker),
    Value(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Inherit(Marker::Inherit)
    }
}

impl<T: Clone> Setting<T> {
    pub fn resolve(&self, default: Option<&T>) -> Option<T> {
        match self {
            Setting::Value(value) => Some(value.clone()),
            Setting::Inherit(_) => default.cloned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchDefaults {
    pub tenant: Option<String>,
    pub template: Option<String>,
    pub cluster: Option<String>,
    pub datastore: Option<String>,
    pub cpu: Option<u32>,
    pub ram: Option<u64>,
    pub hdd: Option<u64>,
    pub portgroup: Option<String>,
    pub power_on: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VmEntry {
    pub name: String,
    #[serde(default)]
    pub tenant: Setting<String>,
    #[serde(default)]
    pub template: Setting<String>,
    #[serde(default)]
    pub cluster: Setting<String>,
    #[serde(default)]
    pub datastore: Setting<String>,
    #[serde(default)]
    pub cpu: Setting<u32>,
    #[serde(default)]
    pub ram: Setting<u64>,
    #[serde(default)]
    pub hdd: Setting<u64>,
    #[serde(default)]
    pub portgroup: Setting<String>,
    #[serde(default)]
    pub power_on: Setting<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchDescriptor {
    #[serde(default)]
    pub default: BatchDefaults,
    #[serde(default)]
    pub vms: Vec<VmEntry>,
}

/// Fully resolved clone and reconfigure steps for one VM
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub request: CloneRequest,
    pub settings: VmSettings,
}

/// One descriptor entry after default substitution
#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub plan: Result<BatchPlan, VcError>,
}

impl BatchDescriptor {
    /// Load a descriptor; `.toml` files are read as TOML, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VcError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VcError::config_error(format!(
                "Failed to read batch file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let descriptor = if is_toml {
            Self::from_toml(&content)?
        } else {
            Self::from_yaml(&content)?
        };

        if descriptor.vms.is_empty() {
            return Err(VcError::config_error(format!(
                "Batch file '{}' lists no vms",
                path.display()
            )));
        }
        Ok(descriptor)
    }

    pub fn from_yaml(content: &str) -> Result<Self, VcError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, VcError> {
        Ok(toml::from_str(content)?)
    }

    /// Substitute defaults field by field. An entry with a missing value or a
    /// duplicate name carries its error; the other entries are unaffected.
    pub fn resolve(&self, fallback_datastore: Option<&str>) -> Vec<BatchEntry> {
        let mut seen = HashSet::new();
        self.vms
            .iter()
            .map(|vm| {
                let plan = if seen.insert(vm.name.as_str()) {
                    self.resolve_entry(vm, fallback_datastore)
                } else {
                    Err(VcError::validation(format!(
                        "vm '{}' is listed more than once",
                        vm.name
                    )))
                };
                BatchEntry {
                    name: vm.name.clone(),
                    plan,
                }
            })
            .collect()
    }

    fn resolve_entry(
        &self,
        vm: &VmEntry,
        fallback_datastore: Option<&str>,
    ) -> Result<BatchPlan, VcError> {
        let defaults = &self.default;
        let missing = |field: &str| {
            VcError::validation(format!(
                "vm '{}': no value for '{}' and none in the default block",
                vm.name, field
            ))
        };

        let request = CloneRequest {
            name: vm.name.clone(),
            template: vm
                .template
                .resolve(defaults.template.as_ref())
                .ok_or_else(|| missing("template"))?,
            tenant: vm
                .tenant
                .resolve(defaults.tenant.as_ref())
                .ok_or_else(|| missing("tenant"))?,
            cluster: vm
                .cluster
                .resolve(defaults.cluster.as_ref())
                .ok_or_else(|| missing("cluster"))?,
            datastore: vm
                .datastore
                .resolve(defaults.datastore.as_ref())
                .or_else(|| fallback_datastore.map(str::to_string)),
            power_on: vm
                .power_on
                .resolve(defaults.power_on.as_ref())
                .unwrap_or(false),
        };
        if request.datastore.is_none() {
            return Err(missing("datastore"));
        }

        let settings = VmSettings {
            cpu: vm
                .cpu
                .resolve(defaults.cpu.as_ref())
                .ok_or_else(|| missing("cpu"))?,
            ram_gb: vm
                .ram
                .resolve(defaults.ram.as_ref())
                .ok_or_else(|| missing("ram"))?,
            hdd_gb: vm
                .hdd
                .resolve(defaults.hdd.as_ref())
                .ok_or_else(|| missing("hdd"))?,
            portgroup: vm
                .portgroup
                .resolve(defaults.portgroup.as_ref())
                .ok_or_else(|| missing("portgroup"))?,
        };

        validate_clone_request(&request)?;
        validate_settings(&settings)?;
        Ok(BatchPlan { request, settings })
    }
}
