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

use crate::infrastructure::vsphere::types::{PowerState, VmDetails};

/// Where and from what to clone a new VM
#[derive(Debug, Clone, PartialEq)]
pub struct CloneRequest {
    pub name: String,
    pub template: String,
    pub tenant: String,
    pub cluster: String,
    /// Storage pod or datastore; falls back to the credentials default
    pub datastore: Option<String>,
    pub power_on: bool,
}

/// Hardware applied to a VM after cloning
#[derive(Debug, Clone, PartialEq)]
pub struct VmSettings {
    pub cpu: u32,
    pub ram_gb: u64,
    pub hdd_gb: u64,
    pub portgroup: String,
}

/// A child of a tenant folder as listed by `list-vms`
#[derive(Debug, Clone, PartialEq)]
pub enum FolderEntry {
    Vm(VmDetails),
    Folder(String),
}

impl FolderEntry {
    pub fn name(&self) -> &str {
        match self {
            FolderEntry::Vm(vm) => &vm.name,
            FolderEntry::Folder(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOutcome {
    Changed(PowerState),
    /// Nothing submitted: the VM was already in the requested state
    AlreadyInState(PowerState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub powered_off_first: bool,
}
