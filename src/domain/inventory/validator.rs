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

use crate::domain::inventory::model::{CloneRequest, VmSettings};
use crate::infrastructure::constants::{GB, KB_PER_GB, MB_PER_GB};
use crate::shared::error::VcError;
use regex::Regex;

/// vCenter limit on inventory object names
const MAX_VM_NAME_LEN: usize = 80;

pub fn validate_clone_request(request: &CloneRequest) -> Result<(), VcError> {
    if request.name.is_empty() {
        return Err(VcError::validation("no vm name supplied"));
    }
    if !is_valid_vm_name(&request.name) {
        return Err(VcError::validation(format!(
            "Invalid vm name '{}': up to {} characters, no '/', '\\' or '%', no surrounding spaces",
            request.name, MAX_VM_NAME_LEN
        )));
    }

    for (field, value) in [
        ("template", &request.template),
        ("tenant", &request.tenant),
        ("cluster", &request.cluster),
    ] {
        if value.trim().is_empty() {
            return Err(VcError::validation(format!("{} must not be empty", field)));
        }
    }

    Ok(())
}

pub fn validate_settings(settings: &VmSettings) -> Result<(), VcError> {
    if settings.cpu == 0 {
        return Err(VcError::validation("cpu must be > 0"));
    }
    if settings.ram_gb == 0 {
        return Err(VcError::validation("ram must be > 0"));
    }
    if settings.hdd_gb == 0 {
        return Err(VcError::validation("hdd must be > 0"));
    }
    if settings.portgroup.trim().is_empty() {
        return Err(VcError::validation("port group must not be empty"));
    }
    disk_capacity_kb(settings.hdd_gb)?;
    memory_mb(settings.ram_gb)?;
    Ok(())
}

/// Disk size in KB. The byte count must fit the API's signed 64-bit fields.
pub fn disk_capacity_kb(size_gb: u64) -> Result<u64, VcError> {
    size_gb
        .checked_mul(GB)
        .filter(|bytes| i64::try_from(*bytes).is_ok())
        .and_then(|_| size_gb.checked_mul(KB_PER_GB))
        .ok_or_else(|| VcError::validation(format!("disk size of {} GB is too large", size_gb)))
}

pub fn memory_mb(ram_gb: u64) -> Result<u64, VcError> {
    ram_gb
        .checked_mul(MB_PER_GB)
        .filter(|mb| i64::try_from(*mb).is_ok())
        .ok_or_else(|| VcError::validation(format!("ram of {} GB is too large", ram_gb)))
}

pub(crate) fn is_valid_vm_name(name: &str) -> bool {
    if name.chars().count() > MAX_VM_NAME_LEN || name.trim() != name {
        return false;
    }
    match Regex::new(r"^[^/\\%]+$") {
        Ok(re) => re.is_match(name),
        Err(_) => false,
    }
}
