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

//! In-memory vCenter seeded from an inventory snapshot.
//!
//! Mutations are applied when submitted and the returned task reports
//! `Running` for `task_polls` polls before reaching its terminal state.
//! Operations vCenter would refuse (powering on a running VM, duplicate
//! names, shrinking a disk) produce a task that ends in `Error`.

use crate::infrastructure::constants::{GB, KB_PER_GB, KIND_FOLDER, KIND_STORAGE_POD, KIND_VM};
use crate::infrastructure::vsphere::client::VsphereClient;
use crate::infrastructure::vsphere::types::{
    CloneSpec, ClusterSummary, ConfigChange, DatastoreSummary, EntityStatus, FolderChild,
    NetworkCard, ObjectRef, PlacementSpec, PortGroup, PowerOp, PowerState, SwitchSummary,
    TaskRef, TaskState, VirtualDisk, VmDetails,
};
use crate::shared::error::VcError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Seed for [`SimulatedVsphere`], loadable from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySnapshot {
    pub clusters: Vec<SnapshotCluster>,
    pub datastores: Vec<SnapshotDatastore>,
    pub storage_pods: Vec<SnapshotStoragePod>,
    pub folders: Vec<SnapshotFolder>,
    pub vms: Vec<SnapshotVm>,
    pub switches: Vec<SnapshotSwitch>,
    /// Polls a task stays `Running` before completing
    pub task_polls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCluster {
    pub name: String,
    #[serde(default)]
    pub cpu_cores: u32,
    #[serde(default)]
    pub cpu_threads: u32,
    #[serde(default)]
    pub memory_gb: u64,
    #[serde(default)]
    pub hosts: u32,
    #[serde(default)]
    pub status: EntityStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDatastore {
    pub name: String,
    pub capacity_gb: u64,
    pub free_gb: u64,
    #[serde(default)]
    pub status: EntityStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotStoragePod {
    pub name: String,
    #[serde(default)]
    pub datastores: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFolder {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotVm {
    pub name: String,
    pub folder: String,
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u64,
    #[serde(default)]
    pub disks_gb: Vec<u64>,
    #[serde(default)]
    pub networks: Vec<String>,
    pub datastore: String,
    #[serde(default)]
    pub guest: String,
    #[serde(default)]
    pub power_state: PowerState,
    #[serde(default)]
    pub template: bool,
}

fn default_cpu() -> u32 {
    1
}

fn default_memory_mb() -> u64 {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSwitch {
    pub name: String,
    #[serde(default)]
    pub portgroups: Vec<String>,
}

impl InventorySnapshot {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VcError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VcError::config_error(format!(
                "Failed to read inventory snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[derive(Debug, Clone)]
struct SimVm {
    id: String,
    folder_id: String,
    details: VmDetails,
}

#[derive(Debug, Clone)]
struct SimFolder {
    id: String,
    name: String,
    parent_id: Option<String>,
}

#[derive(Debug, Clone)]
struct SimTask {
    remaining_polls: u32,
    outcome: TaskState,
}

#[derive(Debug, Default)]
struct SimState {
    clusters: Vec<(ObjectRef, SnapshotCluster)>,
    datastores: Vec<(ObjectRef, SnapshotDatastore)>,
    storage_pods: Vec<(ObjectRef, Vec<String>)>,
    folders: Vec<SimFolder>,
    vms: Vec<SimVm>,
    switches: Vec<SwitchSummary>,
    portgroups: Vec<PortGroup>,
    tasks: HashMap<String, SimTask>,
    task_polls: u32,
    next_id: u64,
    mutations: u64,
}

impl SimState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn next_mac(&mut self) -> String {
        self.next_id += 1;
        format!(
            "00:50:56:{:02x}:{:02x}:{:02x}",
            (self.next_id >> 16) & 0xff,
            (self.next_id >> 8) & 0xff,
            self.next_id & 0xff
        )
    }

    fn submit(&mut self, description: String, outcome: TaskState) -> TaskRef {
        if outcome == TaskState::Success {
            self.mutations += 1;
        }
        let id = self.next_id("task");
        self.tasks.insert(
            id.clone(),
            SimTask {
                remaining_polls: self.task_polls,
                outcome,
            },
        );
        TaskRef::new(id, description)
    }

    fn vm_mut(&mut self, id: &str) -> Result<&mut SimVm, VcError> {
        self.vms
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| VcError::not_found(KIND_VM, id))
    }

    fn build_vm(
        &mut self,
        folder_id: String,
        vm: &SnapshotVm,
    ) -> SimVm {
        let id = self.next_id("vm");
        let disks = vm
            .disks_gb
            .iter()
            .enumerate()
            .map(|(i, gb)| VirtualDisk {
                key: (2000 + i).to_string(),
                capacity_kb: gb.saturating_mul(KB_PER_GB),
            })
            .collect();
        let mut nics = Vec::new();
        for (i, network) in vm.networks.iter().enumerate() {
            nics.push(NetworkCard {
                key: (4000 + i).to_string(),
                mac_address: self.next_mac(),
                network: Some(network.clone()),
                wake_on_lan: false,
                start_connected: true,
                allow_guest_control: false,
            });
        }
        SimVm {
            id,
            folder_id,
            details: VmDetails {
                name: vm.name.clone(),
                num_cpu: vm.cpu,
                cores_per_socket: 1,
                memory_mb: vm.memory_mb,
                disks,
                nics,
                vm_path_name: format!("[{}] {}/{}.vmx", vm.datastore, vm.name, vm.name),
                guest_full_name: vm.guest.clone(),
                power_state: vm.power_state,
                template: vm.template,
            },
        }
    }
}

/// vCenter stand-in backed by process memory
pub struct SimulatedVsphere {
    state: Mutex<SimState>,
}

impl SimulatedVsphere {
    pub fn new(snapshot: InventorySnapshot) -> Result<Self, VcError> {
        let mut state = SimState {
            task_polls: snapshot.task_polls,
            ..SimState::default()
        };

        for cluster in snapshot.clusters {
            let id = state.next_id("domain-c");
            state
                .clusters
                .push((ObjectRef::new(id, &cluster.name), cluster));
        }
        for ds in snapshot.datastores {
            let id = state.next_id("datastore");
            state.datastores.push((ObjectRef::new(id, &ds.name), ds));
        }
        for pod in snapshot.storage_pods {
            let id = state.next_id("group-p");
            state
                .storage_pods
                .push((ObjectRef::new(id, &pod.name), pod.datastores));
        }
        for folder in snapshot.folders {
            let parent_id = match &folder.parent {
                Some(parent) => Some(
                    state
                        .folders
                        .iter()
                        .find(|f| &f.name == parent)
                        .map(|f| f.id.clone())
                        .ok_or_else(|| {
                            VcError::config_error(format!(
                                "Folder '{}' references unknown parent '{}'",
                                folder.name, parent
                            ))
                        })?,
                ),
                None => None,
            };
            let id = state.next_id("group-v");
            state.folders.push(SimFolder {
                id,
                name: folder.name,
                parent_id,
            });
        }
        for vm in &snapshot.vms {
            let folder_id = state
                .folders
                .iter()
                .find(|f| f.name == vm.folder)
                .map(|f| f.id.clone())
                .ok_or_else(|| {
                    VcError::config_error(format!(
                        "VM '{}' references unknown folder '{}'",
                        vm.name, vm.folder
                    ))
                })?;
            let sim_vm = state.build_vm(folder_id, vm);
            state.vms.push(sim_vm);
        }
        for switch in snapshot.switches {
            let uuid = format!("50 2a {:02x} 7c", state.switches.len() + 1);
            for pg in &switch.portgroups {
                let key = state.next_id("dvportgroup");
                state.portgroups.push(PortGroup {
                    key,
                    name: pg.clone(),
                    switch_uuid: uuid.clone(),
                });
            }
            state.switches.push(SwitchSummary {
                name: switch.name,
                uuid,
                portgroups: switch.portgroups,
            });
        }

        Ok(Self {
            state: Mutex::new(state),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VcError> {
        Self::new(InventorySnapshot::from_file(path)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SimState>, VcError> {
        self.state
            .lock()
            .map_err(|_| VcError::Api("simulated inventory lock poisoned".to_string()))
    }

    /// Number of successfully submitted mutations since creation
    pub fn mutation_count(&self) -> u64 {
        self.state.lock().map(|s| s.mutations).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl VsphereClient for SimulatedVsphere {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, VcError> {
        let state = self.lock()?;
        Ok(state
            .clusters
            .iter()
            .map(|(r, c)| ClusterSummary {
                name: r.name.clone(),
                cpu_cores: Some(c.cpu_cores),
                cpu_threads: Some(c.cpu_threads),
                total_memory_bytes: Some(c.memory_gb.saturating_mul(GB)),
                num_hosts: c.hosts,
                overall_status: c.status,
            })
            .collect())
    }

    async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, VcError> {
        let state = self.lock()?;
        Ok(state
            .datastores
            .iter()
            .map(|(r, d)| DatastoreSummary {
                name: r.name.clone(),
                capacity_bytes: d.capacity_gb.saturating_mul(GB),
                free_space_bytes: d.free_gb.saturating_mul(GB),
                overall_status: d.status,
            })
            .collect())
    }

    async fn list_switches(&self) -> Result<Vec<SwitchSummary>, VcError> {
        Ok(self.lock()?.switches.clone())
    }

    async fn find_cluster(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        let state = self.lock()?;
        Ok(state
            .clusters
            .iter()
            .find(|(r, _)| r.name == name)
            .map(|(r, _)| r.clone()))
    }

    async fn cluster_resource_pool(&self, cluster: &ObjectRef) -> Result<ObjectRef, VcError> {
        Ok(ObjectRef::new(
            format!("resgroup-{}", cluster.id),
            "Resources",
        ))
    }

    async fn find_datastore(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        let state = self.lock()?;
        Ok(state
            .datastores
            .iter()
            .find(|(r, _)| r.name == name)
            .map(|(r, _)| r.clone()))
    }

    async fn find_storage_pod(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        let state = self.lock()?;
        Ok(state
            .storage_pods
            .iter()
            .find(|(r, _)| r.name == name)
            .map(|(r, _)| r.clone()))
    }

    async fn find_folder(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        let state = self.lock()?;
        Ok(state
            .folders
            .iter()
            .find(|f| f.name == name)
            .map(|f| ObjectRef::new(&f.id, &f.name)))
    }

    async fn folder_children(&self, folder: &ObjectRef) -> Result<Vec<FolderChild>, VcError> {
        let state = self.lock()?;
        if !state.folders.iter().any(|f| f.id == folder.id) {
            return Err(VcError::not_found(KIND_FOLDER, &folder.name));
        }
        let mut children: Vec<FolderChild> = state
            .folders
            .iter()
            .filter(|f| f.parent_id.as_deref() == Some(folder.id.as_str()))
            .map(|f| FolderChild::Folder(ObjectRef::new(&f.id, &f.name)))
            .collect();
        children.extend(
            state
                .vms
                .iter()
                .filter(|v| v.folder_id == folder.id)
                .map(|v| FolderChild::Vm(ObjectRef::new(&v.id, &v.details.name))),
        );
        Ok(children)
    }

    async fn find_vm(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        let state = self.lock()?;
        Ok(state
            .vms
            .iter()
            .find(|v| v.details.name == name)
            .map(|v| ObjectRef::new(&v.id, &v.details.name)))
    }

    async fn vm_details(&self, vm: &ObjectRef) -> Result<VmDetails, VcError> {
        let state = self.lock()?;
        state
            .vms
            .iter()
            .find(|v| v.id == vm.id)
            .map(|v| v.details.clone())
            .ok_or_else(|| VcError::not_found(KIND_VM, &vm.name))
    }

    async fn vm_datastores(&self, vm: &ObjectRef) -> Result<Vec<ObjectRef>, VcError> {
        let state = self.lock()?;
        let details = state
            .vms
            .iter()
            .find(|v| v.id == vm.id)
            .map(|v| &v.details)
            .ok_or_else(|| VcError::not_found(KIND_VM, &vm.name))?;
        let ds_name = details
            .datastore()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        Ok(state
            .datastores
            .iter()
            .filter(|(r, _)| r.name == ds_name)
            .map(|(r, _)| r.clone())
            .collect())
    }

    async fn find_portgroup(&self, name: &str) -> Result<Option<PortGroup>, VcError> {
        let state = self.lock()?;
        Ok(state.portgroups.iter().find(|p| p.name == name).cloned())
    }

    async fn recommend_datastore(&self, spec: &PlacementSpec) -> Result<ObjectRef, VcError> {
        let state = self.lock()?;
        let members = state
            .storage_pods
            .iter()
            .find(|(r, _)| r.id == spec.storage_pod.id)
            .map(|(_, members)| members)
            .ok_or_else(|| VcError::not_found(KIND_STORAGE_POD, &spec.storage_pod.name))?;

        state
            .datastores
            .iter()
            .filter(|(r, _)| members.contains(&r.name))
            .max_by_key(|(_, d)| d.free_gb)
            .map(|(r, _)| r.clone())
            .ok_or_else(|| {
                VcError::Api(format!(
                    "no storage recommendation for pod '{}'",
                    spec.storage_pod.name
                ))
            })
    }

    async fn clone_vm(&self, spec: &CloneSpec) -> Result<TaskRef, VcError> {
        let mut state = self.lock()?;
        let description = format!("clone {} to {}", spec.template.name, spec.name);

        if state.vms.iter().any(|v| v.details.name == spec.name) {
            let outcome = TaskState::Error(format!("The name '{}' already exists.", spec.name));
            return Ok(state.submit(description, outcome));
        }
        let source = state
            .vms
            .iter()
            .find(|v| v.id == spec.template.id)
            .map(|v| v.details.clone())
            .ok_or_else(|| VcError::not_found(KIND_VM, &spec.template.name))?;

        let id = state.next_id("vm");
        let mut nics = source.nics.clone();
        for nic in nics.iter_mut() {
            nic.mac_address = state.next_mac();
        }
        let clone = SimVm {
            id,
            folder_id: spec.folder.id.clone(),
            details: VmDetails {
                name: spec.name.clone(),
                nics,
                vm_path_name: format!(
                    "[{}] {}/{}.vmx",
                    spec.datastore.name, spec.name, spec.name
                ),
                power_state: if spec.power_on {
                    PowerState::PoweredOn
                } else {
                    PowerState::PoweredOff
                },
                template: false,
                ..source
            },
        };
        state.vms.push(clone);
        Ok(state.submit(description, TaskState::Success))
    }

    async fn reconfigure_vm(
        &self,
        vm: &ObjectRef,
        change: &ConfigChange,
    ) -> Result<TaskRef, VcError> {
        let mut state = self.lock()?;
        let description = format!("reconfigure {}", vm.name);
        let target = state.vm_mut(&vm.id)?;

        let outcome = match change {
            ConfigChange::ResizeDisk {
                disk_key,
                capacity_kb,
            } => match target.details.disks.iter_mut().find(|d| &d.key == disk_key) {
                Some(disk) if *capacity_kb < disk.capacity_kb => TaskState::Error(format!(
                    "Invalid operation for device '{}': disks cannot be shrunk",
                    disk_key
                )),
                Some(disk) => {
                    disk.capacity_kb = *capacity_kb;
                    TaskState::Success
                }
                None => TaskState::Error(format!("Device '{}' not found", disk_key)),
            },
            ConfigChange::AddDisk { capacity_kb, .. } => {
                let key = (2000 + target.details.disks.len()).to_string();
                target.details.disks.push(VirtualDisk {
                    key,
                    capacity_kb: *capacity_kb,
                });
                TaskState::Success
            }
            ConfigChange::CpuMemory {
                num_cpus,
                cores_per_socket,
                memory_mb,
            } => {
                target.details.num_cpu = *num_cpus;
                target.details.cores_per_socket = *cores_per_socket;
                target.details.memory_mb = *memory_mb;
                TaskState::Success
            }
            ConfigChange::AttachNic {
                nic_key,
                portgroup,
                start_connected,
                allow_guest_control,
                wake_on_lan,
            } => match target.details.nics.iter_mut().find(|n| &n.key == nic_key) {
                Some(nic) => {
                    nic.network = Some(portgroup.name.clone());
                    nic.start_connected = *start_connected;
                    nic.allow_guest_control = *allow_guest_control;
                    nic.wake_on_lan = *wake_on_lan;
                    TaskState::Success
                }
                None => TaskState::Error(format!("Device '{}' not found", nic_key)),
            },
        };
        Ok(state.submit(description, outcome))
    }

    async fn power(&self, vm: &ObjectRef, op: PowerOp) -> Result<TaskRef, VcError> {
        let mut state = self.lock()?;
        let description = format!("{} {}", op.as_str(), vm.name);
        let target = state.vm_mut(&vm.id)?;
        let current = target.details.power_state;

        let outcome = match (op, current) {
            (PowerOp::On, PowerState::PoweredOn)
            | (PowerOp::Off, PowerState::PoweredOff)
            | (PowerOp::Reset, PowerState::PoweredOff) => TaskState::Error(format!(
                "The attempted operation cannot be performed in the current state ({}).",
                current
            )),
            (PowerOp::On, _) | (PowerOp::Reset, _) => {
                target.details.power_state = PowerState::PoweredOn;
                TaskState::Success
            }
            (PowerOp::Off, _) => {
                target.details.power_state = PowerState::PoweredOff;
                TaskState::Success
            }
        };
        Ok(state.submit(description, outcome))
    }

    async fn destroy_vm(&self, vm: &ObjectRef) -> Result<TaskRef, VcError> {
        let mut state = self.lock()?;
        let description = format!("destroy {}", vm.name);
        let powered_on = state.vm_mut(&vm.id)?.details.power_state == PowerState::PoweredOn;

        let outcome = if powered_on {
            TaskState::Error(
                "The attempted operation cannot be performed in the current state (Powered on)."
                    .to_string(),
            )
        } else {
            state.vms.retain(|v| v.id != vm.id);
            TaskState::Success
        };
        Ok(state.submit(description, outcome))
    }

    async fn task_state(&self, task: &TaskRef) -> Result<TaskState, VcError> {
        let mut state = self.lock()?;
        let sim_task = state
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| VcError::not_found("Task", &task.id))?;
        if sim_task.remaining_polls > 0 {
            sim_task.remaining_polls -= 1;
            return Ok(TaskState::Running);
        }
        // a terminal state is reported once
        let finished = state.tasks.remove(&task.id);
        Ok(finished.map(|t| t.outcome).unwrap_or(TaskState::Success))
    }

    async fn logout(&self) -> Result<(), VcError> {
        Ok(())
    }
}
