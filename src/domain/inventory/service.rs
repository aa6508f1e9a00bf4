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

use crate::domain::config::{Credentials, ShellConfig};
use crate::domain::inventory::model::{
    CloneRequest, FolderEntry, PowerOutcome, RemoveOutcome, VmSettings,
};
use crate::domain::inventory::validator::{
    disk_capacity_kb, memory_mb, validate_clone_request, validate_settings,
};
use crate::infrastructure::constants::{
    KIND_CLUSTER, KIND_DATASTORE, KIND_FOLDER, KIND_PORTGROUP, KIND_STORAGE_POD,
    KIND_TEMPLATE, KIND_TENANT, KIND_VM,
};
use crate::infrastructure::vsphere::client::VsphereClient;
use crate::infrastructure::vsphere::rest::VsphereRestClient;
use crate::infrastructure::vsphere::types::{
    CloneSpec, ClusterSummary, ConfigChange, DatastoreSummary, FolderChild, ObjectRef,
    PlacementSpec, PowerOp, PowerState, SwitchSummary, TaskRef, TaskState, VmDetails,
};
use crate::shared::error::VcError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Connected view over one vCenter: every call re-queries the remote side.
pub struct VcenterInventory {
    client: Arc<dyn VsphereClient>,
    config: ShellConfig,
    default_datastore: Option<String>,
}

impl VcenterInventory {
    pub fn new(client: Arc<dyn VsphereClient>, config: ShellConfig) -> Self {
        Self {
            client,
            config,
            default_datastore: None,
        }
    }

    pub async fn connect(credentials: &Credentials, config: ShellConfig) -> Result<Self, VcError> {
        let client = VsphereRestClient::connect(
            credentials,
            &config.api_release,
            config.accept_invalid_certs,
        )
        .await?;
        Ok(Self::new(Arc::new(client), config).with_default_datastore(credentials.datastore.clone()))
    }

    pub fn with_default_datastore(mut self, datastore: Option<String>) -> Self {
        self.default_datastore = datastore;
        self
    }

    pub fn default_datastore(&self) -> Option<&str> {
        self.default_datastore.as_deref()
    }

    pub async fn disconnect(&self) -> Result<(), VcError> {
        self.client.logout().await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, VcError> {
        self.client.list_clusters().await
    }

    pub async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, VcError> {
        self.client.list_datastores().await
    }

    /// Sub-folders of the tenants folder; VMs placed directly in it are skipped
    pub async fn list_tenants(&self) -> Result<Vec<String>, VcError> {
        let root = self.folder(&self.config.tenants_folder, KIND_FOLDER).await?;
        Ok(self
            .client
            .folder_children(&root)
            .await?
            .into_iter()
            .filter_map(|child| match child {
                FolderChild::Folder(f) => Some(f.name),
                FolderChild::Vm(_) => None,
            })
            .collect())
    }

    pub async fn list_vms(&self, tenant: &str) -> Result<Vec<FolderEntry>, VcError> {
        let folder = self.folder(tenant, KIND_TENANT).await?;
        let children = self.client.folder_children(&folder).await?;

        let details = futures::future::try_join_all(children.iter().map(|child| async move {
            match child {
                FolderChild::Vm(vm) => self.client.vm_details(vm).await.map(FolderEntry::Vm),
                FolderChild::Folder(f) => Ok(FolderEntry::Folder(f.name.clone())),
            }
        }))
        .await?;
        Ok(details)
    }

    /// Every VM found at any depth under the templates folder, name -> guest OS
    pub async fn list_templates(&self) -> Result<BTreeMap<String, String>, VcError> {
        let root = self
            .folder(&self.config.templates_folder, KIND_FOLDER)
            .await?;
        let mut templates = BTreeMap::new();
        let mut pending = vec![root];

        while let Some(folder) = pending.pop() {
            for child in self.client.folder_children(&folder).await? {
                match child {
                    FolderChild::Folder(sub) => pending.push(sub),
                    FolderChild::Vm(vm) => {
                        let details = self.client.vm_details(&vm).await?;
                        templates.insert(details.name, details.guest_full_name);
                    }
                }
            }
        }
        Ok(templates)
    }

    pub async fn find_vm(&self, name: &str) -> Result<Option<VmDetails>, VcError> {
        match self.client.find_vm(name).await? {
            Some(vm) => Ok(Some(self.client.vm_details(&vm).await?)),
            None => Ok(None),
        }
    }

    pub async fn vm_info(&self, name: &str) -> Result<VmDetails, VcError> {
        let vm = self.vm(name).await?;
        self.client.vm_details(&vm).await
    }

    pub async fn list_switches(&self) -> Result<Vec<String>, VcError> {
        Ok(self
            .client
            .list_switches()
            .await?
            .into_iter()
            .map(|s| s.name)
            .collect())
    }

    pub async fn switch_info(&self, name: &str) -> Result<Option<SwitchSummary>, VcError> {
        Ok(self
            .client
            .list_switches()
            .await?
            .into_iter()
            .find(|s| s.name == name))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn clone_vm(&self, request: &CloneRequest) -> Result<(), VcError> {
        validate_clone_request(request)?;

        let cluster = self
            .client
            .find_cluster(&request.cluster)
            .await?
            .ok_or_else(|| VcError::not_found(KIND_CLUSTER, &request.cluster))?;
        let tenant = self.folder(&request.tenant, KIND_TENANT).await?;
        let template = self
            .client
            .find_vm(&request.template)
            .await?
            .ok_or_else(|| VcError::not_found(KIND_TEMPLATE, &request.template))?;
        let resource_pool = self.client.cluster_resource_pool(&cluster).await?;

        let storage = request
            .datastore
            .clone()
            .or_else(|| self.default_datastore.clone())
            .ok_or_else(|| {
                VcError::validation("no datastore given and no VC_DATASTORE default configured")
            })?;
        let datastore = self
            .place(&storage, &tenant, &resource_pool, &template)
            .await?;

        let spec = CloneSpec {
            template,
            name: request.name.clone(),
            folder: tenant,
            resource_pool,
            datastore,
            power_on: request.power_on,
        };
        info!(
            vm = %spec.name,
            template = %spec.template.name,
            datastore = %spec.datastore.name,
            "submitting clone"
        );
        let task = self.client.clone_vm(&spec).await?;
        self.wait_for_task(&task).await
    }

    /// Resize the first disk, set cpu and memory, then move the first NIC to
    /// the port group. Each step is its own task.
    pub async fn reconfigure_vm(&self, name: &str, settings: &VmSettings) -> Result<(), VcError> {
        validate_settings(settings)?;

        let vm = self.vm(name).await?;
        let details = self.client.vm_details(&vm).await?;
        let portgroup = self
            .client
            .find_portgroup(&settings.portgroup)
            .await?
            .ok_or_else(|| VcError::not_found(KIND_PORTGROUP, &settings.portgroup))?;

        let disk = details
            .first_disk()
            .ok_or_else(|| VcError::validation(format!("Failed to find disk for VM '{}'", name)))?;
        self.submit_change(
            &vm,
            ConfigChange::ResizeDisk {
                disk_key: disk.key.clone(),
                capacity_kb: disk_capacity_kb(settings.hdd_gb)?,
            },
        )
        .await?;

        self.submit_change(
            &vm,
            ConfigChange::CpuMemory {
                num_cpus: settings.cpu,
                cores_per_socket: 1,
                memory_mb: memory_mb(settings.ram_gb)?,
            },
        )
        .await?;

        match details.first_nic() {
            Some(nic) => {
                self.submit_change(
                    &vm,
                    ConfigChange::AttachNic {
                        nic_key: nic.key.clone(),
                        portgroup,
                        start_connected: true,
                        allow_guest_control: true,
                        wake_on_lan: true,
                    },
                )
                .await?
            }
            None => warn!(vm = name, "no network card, port group left unchanged"),
        }
        Ok(())
    }

    pub async fn add_disk(&self, name: &str, size_gb: u64) -> Result<(), VcError> {
        if size_gb == 0 {
            return Err(VcError::validation("disk size must be > 0"));
        }
        let capacity_kb = disk_capacity_kb(size_gb)?;
        let vm = self.vm(name).await?;
        self.submit_change(
            &vm,
            ConfigChange::AddDisk {
                capacity_kb,
                thin: true,
            },
        )
        .await
    }

    pub async fn start_vm(&self, name: &str) -> Result<PowerOutcome, VcError> {
        self.set_power(name, PowerOp::On).await
    }

    pub async fn stop_vm(&self, name: &str) -> Result<PowerOutcome, VcError> {
        self.set_power(name, PowerOp::Off).await
    }

    pub async fn reset_vm(&self, name: &str) -> Result<PowerOutcome, VcError> {
        self.set_power(name, PowerOp::Reset).await
    }

    /// Power off a running VM, then destroy it
    pub async fn remove_vm(&self, name: &str) -> Result<RemoveOutcome, VcError> {
        let vm = self.vm(name).await?;
        let details = self.client.vm_details(&vm).await?;

        let powered_off_first = details.power_state == PowerState::PoweredOn;
        if powered_off_first {
            info!(vm = name, "powering off before destroy");
            let task = self.client.power(&vm, PowerOp::Off).await?;
            self.wait_for_task(&task).await?;
        }

        info!(vm = name, "destroying");
        let task = self.client.destroy_vm(&vm).await?;
        self.wait_for_task(&task).await?;
        Ok(RemoveOutcome { powered_off_first })
    }

    /// Poll until the task reaches a terminal state.
    pub async fn wait_for_task(&self, task: &TaskRef) -> Result<(), VcError> {
        let started = Instant::now();
        loop {
            let state = self.client.task_state(task).await?;
            if state.is_terminal() {
                return match state {
                    TaskState::Error(message) => {
                        warn!(task = %task.id, %message, "task failed");
                        Err(VcError::task_failed(&task.description, message))
                    }
                    _ => {
                        debug!(task = %task.id, "task completed");
                        Ok(())
                    }
                };
            }

            if let Some(timeout) = self.config.task_timeout() {
                if started.elapsed() >= timeout {
                    return Err(VcError::Timeout(format!(
                        "task '{}' did not finish within {:?}",
                        task.description, timeout
                    )));
                }
            }
            sleep(self.config.poll_interval()).await;
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn folder(&self, name: &str, kind: &str) -> Result<ObjectRef, VcError> {
        self.client
            .find_folder(name)
            .await?
            .ok_or_else(|| VcError::not_found(kind, name))
    }

    async fn vm(&self, name: &str) -> Result<ObjectRef, VcError> {
        self.client
            .find_vm(name)
            .await?
            .ok_or_else(|| VcError::not_found(KIND_VM, name))
    }

    async fn submit_change(&self, vm: &ObjectRef, change: ConfigChange) -> Result<(), VcError> {
        debug!(vm = %vm.name, ?change, "submitting reconfigure");
        let task = self.client.reconfigure_vm(vm, &change).await?;
        self.wait_for_task(&task).await
    }

    async fn set_power(&self, name: &str, op: PowerOp) -> Result<PowerOutcome, VcError> {
        let vm = self.vm(name).await?;
        let current = self.client.vm_details(&vm).await?.power_state;

        let target = match (op, current) {
            (PowerOp::On, PowerState::PoweredOn) | (PowerOp::Off, PowerState::PoweredOff) => {
                return Ok(PowerOutcome::AlreadyInState(current));
            }
            (PowerOp::Reset, PowerState::PoweredOff) => {
                return Err(VcError::validation(format!(
                    "cannot reset '{}': it is powered off",
                    name
                )));
            }
            (PowerOp::Off, _) => PowerState::PoweredOff,
            (PowerOp::On, _) | (PowerOp::Reset, _) => PowerState::PoweredOn,
        };

        info!(vm = name, op = op.as_str(), "submitting power operation");
        let task = self.client.power(&vm, op).await?;
        self.wait_for_task(&task).await?;
        Ok(PowerOutcome::Changed(target))
    }

    /// Storage DRS recommendation first; then the named datastore; then the
    /// template's own datastore.
    async fn place(
        &self,
        storage: &str,
        folder: &ObjectRef,
        resource_pool: &ObjectRef,
        template: &ObjectRef,
    ) -> Result<ObjectRef, VcError> {
        match self.recommend(storage, folder, resource_pool).await {
            Ok(datastore) => {
                debug!(pod = storage, datastore = %datastore.name, "storage recommendation");
                return Ok(datastore);
            }
            Err(e) => warn!(
                storage,
                error = %e,
                "storage recommendation unavailable, falling back"
            ),
        }

        if let Some(datastore) = self.client.find_datastore(storage).await? {
            return Ok(datastore);
        }

        self.client
            .vm_datastores(template)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VcError::not_found(KIND_DATASTORE, storage))
    }

    async fn recommend(
        &self,
        storage: &str,
        folder: &ObjectRef,
        resource_pool: &ObjectRef,
    ) -> Result<ObjectRef, VcError> {
        let pod = self
            .client
            .find_storage_pod(storage)
            .await?
            .ok_or_else(|| VcError::not_found(KIND_STORAGE_POD, storage))?;
        self.client
            .recommend_datastore(&PlacementSpec {
                storage_pod: pod,
                folder: folder.clone(),
                resource_pool: resource_pool.clone(),
            })
            .await
    }
}
