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

//! Read-only projections of vCenter inventory objects and the specs submitted
//! to mutate them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall health as reported by vCenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Green,
    Yellow,
    Red,
    #[default]
    Gray,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Green => "green",
            EntityStatus::Yellow => "yellow",
            EntityStatus::Red => "red",
            EntityStatus::Gray => "gray",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PowerState {
    #[serde(rename = "poweredOn")]
    PoweredOn,
    #[serde(rename = "poweredOff")]
    #[default]
    PoweredOff,
    #[serde(rename = "suspended")]
    Suspended,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::PoweredOn => "poweredOn",
            PowerState::PoweredOff => "poweredOff",
            PowerState::Suspended => "suspended",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a remote managed object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub name: String,
    pub cpu_cores: Option<u32>,
    pub cpu_threads: Option<u32>,
    pub total_memory_bytes: Option<u64>,
    pub num_hosts: u32,
    pub overall_status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatastoreSummary {
    pub name: String,
    pub capacity_bytes: u64,
    pub free_space_bytes: u64,
    pub overall_status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualDisk {
    pub key: String,
    pub capacity_kb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCard {
    pub key: String,
    pub mac_address: String,
    pub network: Option<String>,
    pub wake_on_lan: bool,
    pub start_connected: bool,
    pub allow_guest_control: bool,
}

/// Configuration and runtime view of one virtual machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmDetails {
    pub name: String,
    pub num_cpu: u32,
    pub cores_per_socket: u32,
    pub memory_mb: u64,
    pub disks: Vec<VirtualDisk>,
    pub nics: Vec<NetworkCard>,
    /// Datastore path of the VM, e.g. `[ds01] web01/web01.vmx`
    pub vm_path_name: String,
    pub guest_full_name: String,
    pub power_state: PowerState,
    pub template: bool,
}

impl VmDetails {
    /// Datastore part of the VM path (`[ds01]`)
    pub fn datastore(&self) -> &str {
        self.vm_path_name.split_whitespace().next().unwrap_or("")
    }

    pub fn mac_addresses(&self) -> Vec<&str> {
        self.nics.iter().map(|n| n.mac_address.as_str()).collect()
    }

    pub fn networks(&self) -> Vec<&str> {
        self.nics.iter().filter_map(|n| n.network.as_deref()).collect()
    }

    pub fn first_disk(&self) -> Option<&VirtualDisk> {
        self.disks.first()
    }

    pub fn first_nic(&self) -> Option<&NetworkCard> {
        self.nics.first()
    }
}

/// A child of an inventory folder
#[derive(Debug, Clone, PartialEq)]
pub enum FolderChild {
    Folder(ObjectRef),
    Vm(ObjectRef),
}

impl FolderChild {
    pub fn name(&self) -> &str {
        match self {
            FolderChild::Folder(r) | FolderChild::Vm(r) => &r.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortGroup {
    pub key: String,
    pub name: String,
    pub switch_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSummary {
    pub name: String,
    pub uuid: String,
    pub portgroups: Vec<String>,
}

/// Storage DRS placement request for a VM about to be created
#[derive(Debug, Clone)]
pub struct PlacementSpec {
    pub storage_pod: ObjectRef,
    pub folder: ObjectRef,
    pub resource_pool: ObjectRef,
}

#[derive(Debug, Clone)]
pub struct CloneSpec {
    pub template: ObjectRef,
    pub name: String,
    pub folder: ObjectRef,
    pub resource_pool: ObjectRef,
    pub datastore: ObjectRef,
    pub power_on: bool,
}

/// One hardware change submitted as a single reconfigure task
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigChange {
    ResizeDisk {
        disk_key: String,
        capacity_kb: u64,
    },
    AddDisk {
        capacity_kb: u64,
        thin: bool,
    },
    CpuMemory {
        num_cpus: u32,
        cores_per_socket: u32,
        memory_mb: u64,
    },
    AttachNic {
        nic_key: String,
        portgroup: PortGroup,
        start_connected: bool,
        allow_guest_control: bool,
        wake_on_lan: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOp {
    On,
    Off,
    Reset,
}

impl PowerOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerOp::On => "power-on",
            PowerOp::Off => "power-off",
            PowerOp::Reset => "reset",
        }
    }
}

/// Handle of an asynchronous remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub id: String,
    pub description: String,
}

impl TaskRef {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Success,
    Error(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Error(_))
    }
}
