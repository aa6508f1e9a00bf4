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

//! Live client speaking the vSphere Web Services API in its JSON binding
//! (`/sdk/vim25/{release}/{ManagedObjectType}/{moId}/{method|property}`).

use crate::domain::config::Credentials;
use crate::infrastructure::constants::{
    CONNECT_MAX_ATTEMPTS, CONNECT_MIN_DELAY_MS, KIND_VM, SESSION_HEADER, VIM_API_PATH,
};
use crate::infrastructure::vsphere::client::VsphereClient;
use crate::infrastructure::vsphere::types::{
    CloneSpec, ClusterSummary, ConfigChange, DatastoreSummary, EntityStatus, FolderChild,
    ObjectRef, PlacementSpec, PortGroup, PowerOp, SwitchSummary, TaskRef, TaskState, VmDetails,
};
use crate::infrastructure::vsphere::wire::{
    self, ClusterSummaryWire, DatastoreSummaryWire, FaultWire, MoRef, ObjectContent,
    RetrieveResult, ServiceContent, StoragePlacementResultWire, SwitchSummaryWire, TaskInfoWire,
    VmSummaryWire,
};
use crate::shared::error::VcError;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const INVALID_LOGIN: &str = "InvalidLogin";

const VM_DETAIL_PATHS: [&str; 4] = [
    "summary",
    "config.hardware.device",
    "config.hardware.numCoresPerSocket",
    "network",
];

pub struct VsphereRestClient {
    http: reqwest::Client,
    /// `https://host:port/sdk/vim25/{release}`
    base_url: String,
    session_id: String,
    content: ServiceContent,
}

impl VsphereRestClient {
    /// Log in to `https://VC_HOST:VC_PORT` using the given API release.
    pub async fn connect(
        credentials: &Credentials,
        release: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self, VcError> {
        let base_url = format!("{}{}/{}", credentials.base_url(), VIM_API_PATH, release);
        Self::connect_url(&base_url, credentials, accept_invalid_certs).await
    }

    /// Log in against an explicit vim25 root URL and keep the session token.
    ///
    /// Transport failures are retried with exponential backoff; answers from
    /// the server, rejected credentials included, are not.
    pub async fn connect_url(
        base_url: &str,
        credentials: &Credentials,
        accept_invalid_certs: bool,
    ) -> Result<Self, VcError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| VcError::Connection(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(CONNECT_MIN_DELAY_MS))
            .with_max_times(CONNECT_MAX_ATTEMPTS);

        let (content, session_id) = {
            let http = &http;
            let base = base_url.as_str();
            (move || async move { login(http, base, credentials).await })
                .retry(backoff)
                .when(|e: &VcError| matches!(e, VcError::Http(_)))
                .notify(|e: &VcError, dur: Duration| {
                    warn!("vCenter login failed ({}), retrying in {:?}", e, dur);
                })
                .await
        }
        .map_err(|e| match e {
            VcError::Credentials(_) => e,
            other => VcError::Connection(other.to_string()),
        })?;

        info!(host = %credentials.host, user = %credentials.user, "connected to vCenter");

        Ok(Self {
            http,
            base_url,
            session_id,
            content,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, VcError> {
        debug!(%method, path, "vCenter request");
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(SESSION_HEADER, &self.session_id);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        check_status(builder.send().await?).await
    }

    /// Read one property: `GET /{type}/{id}/{property}`
    async fn property<T: DeserializeOwned>(&self, obj: &MoRef, name: &str) -> Result<T, VcError> {
        let path = format!("/{}/{}/{}", obj.kind, obj.value, name);
        let resp = self.send(Method::GET, &path, None).await?;
        Ok(resp.json().await?)
    }

    /// Call a method: `POST /{type}/{id}/{method}`
    async fn call(&self, target: &MoRef, method: &str, args: Value) -> Result<Response, VcError> {
        let path = format!("/{}/{}/{}", target.kind, target.value, method);
        self.send(Method::POST, &path, Some(&args)).await
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        target: &MoRef,
        method: &str,
        args: Value,
    ) -> Result<T, VcError> {
        Ok(self.call(target, method, args).await?.json().await?)
    }

    /// Methods that may answer with no content
    async fn invoke_optional<T: DeserializeOwned + Default>(
        &self,
        target: &MoRef,
        method: &str,
        args: Value,
    ) -> Result<T, VcError> {
        let text = self.call(target, method, args).await?.text().await?;
        match text.trim() {
            "" | "null" => Ok(T::default()),
            body => Ok(serde_json::from_str(body)?),
        }
    }

    async fn invoke_task(
        &self,
        target: &MoRef,
        method: &str,
        args: Value,
        description: String,
    ) -> Result<TaskRef, VcError> {
        let task: MoRef = self.invoke(target, method, args).await?;
        info!(task = %task.value, %description, "task submitted");
        Ok(TaskRef::new(task.value, description))
    }

    /// RetrievePropertiesEx, following continuation tokens
    async fn retrieve(&self, filter: Value) -> Result<Vec<ObjectContent>, VcError> {
        let collector = &self.content.property_collector;
        let mut page: RetrieveResult = self
            .invoke_optional(collector, "RetrievePropertiesEx", filter)
            .await?;
        let mut objects = std::mem::take(&mut page.objects);
        while let Some(token) = page.token.take() {
            page = self
                .invoke_optional(collector, "ContinueRetrievePropertiesEx", json!({ "token": token }))
                .await?;
            objects.append(&mut page.objects);
        }
        Ok(objects)
    }

    /// Every object of `kind` below the root folder
    async fn retrieve_all(&self, kind: &str, paths: &[&str]) -> Result<Vec<ObjectContent>, VcError> {
        let view: MoRef = self
            .invoke(
                &self.content.view_manager,
                "CreateContainerView",
                json!({
                    "container": self.content.root_folder.to_json(),
                    "type": [kind],
                    "recursive": true,
                }),
            )
            .await?;

        let result = self.retrieve(wire::view_filter(&view, kind, paths)).await;
        if let Err(e) = self.call(&view, "DestroyView", json!({})).await {
            debug!(view = %view.value, error = %e, "failed to destroy container view");
        }
        result
    }

    async fn find_by_name(&self, kind: &str, name: &str) -> Result<Option<ObjectRef>, VcError> {
        let objects = self.retrieve_all(kind, &["name"]).await?;
        Ok(objects
            .into_iter()
            .find(|o| o.string("name").as_deref() == Some(name))
            .map(|o| ObjectRef::new(o.obj.value, name)))
    }

    /// Names keyed by object id, for any mix of entity types
    async fn names_of(&self, objs: &[MoRef]) -> Result<HashMap<String, String>, VcError> {
        if objs.is_empty() {
            return Ok(HashMap::new());
        }
        let objects = self
            .retrieve(wire::objects_filter(objs, wire::MANAGED_ENTITY, &["name"]))
            .await?;
        Ok(objects
            .into_iter()
            .filter_map(|o| o.string("name").map(|name| (o.obj.value, name)))
            .collect())
    }

    async fn devices(&self, vm: &MoRef) -> Result<Vec<Value>, VcError> {
        let objects = self
            .retrieve(wire::objects_filter(
                std::slice::from_ref(vm),
                wire::VM,
                &["config.hardware.device"],
            ))
            .await?;
        let content = objects
            .into_iter()
            .next()
            .ok_or_else(|| VcError::not_found(KIND_VM, &vm.value))?;
        Ok(content
            .parse("config.hardware.device")?
            .unwrap_or_default())
    }
}

async fn login(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<(ServiceContent, String), VcError> {
    let resp = http
        .get(format!("{}/ServiceInstance/ServiceInstance/content", base_url))
        .send()
        .await?;
    let content: ServiceContent = check_status(resp).await?.json().await?;

    let resp = http
        .post(format!(
            "{}/SessionManager/{}/Login",
            base_url, content.session_manager.value
        ))
        .json(&json!({
            "userName": credentials.user,
            "password": credentials.password,
        }))
        .send()
        .await?;
    let resp = check_status(resp).await?;
    let session_id = resp
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| VcError::Api(format!("login answer carries no {} header", SESSION_HEADER)))?;
    Ok((content, session_id))
}

async fn check_status(resp: Response) -> Result<Response, VcError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(fault_error(status, &body))
}

fn fault_error(status: StatusCode, body: &str) -> VcError {
    match serde_json::from_str::<FaultWire>(body) {
        Ok(fault) if fault.type_name == INVALID_LOGIN => VcError::Credentials(fault.describe()),
        Ok(fault) if !fault.type_name.is_empty() => {
            VcError::Api(format!("{} {}", status, fault.describe()))
        }
        _ if status == StatusCode::UNAUTHORIZED => {
            VcError::Credentials(format!("{} {}", status, body.trim()))
        }
        _ => VcError::Api(format!("{} {}", status, body.trim())),
    }
}

fn vm_ref(vm: &ObjectRef) -> MoRef {
    MoRef::new(wire::VM, &vm.id)
}

#[async_trait::async_trait]
impl VsphereClient for VsphereRestClient {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, VcError> {
        let objects = self.retrieve_all(wire::CLUSTER, &["name", "summary"]).await?;
        objects
            .into_iter()
            .map(|o| {
                let summary: Option<ClusterSummaryWire> = o.parse("summary")?;
                Ok(ClusterSummary {
                    name: o.string("name").unwrap_or_default(),
                    cpu_cores: summary.as_ref().and_then(|s| s.num_cpu_cores),
                    cpu_threads: summary.as_ref().and_then(|s| s.num_cpu_threads),
                    total_memory_bytes: summary.as_ref().and_then(|s| s.total_memory),
                    num_hosts: summary.as_ref().map(|s| s.num_hosts).unwrap_or(0),
                    overall_status: summary.map(|s| s.overall_status).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, VcError> {
        let objects = self
            .retrieve_all(wire::DATASTORE, &["name", "summary", "overallStatus"])
            .await?;
        objects
            .into_iter()
            .map(|o| {
                let summary: Option<DatastoreSummaryWire> = o.parse("summary")?;
                let status: Option<EntityStatus> = o.parse("overallStatus")?;
                Ok(DatastoreSummary {
                    name: o.string("name").unwrap_or_default(),
                    capacity_bytes: summary.as_ref().map(|s| s.capacity).unwrap_or(0),
                    free_space_bytes: summary.as_ref().map(|s| s.free_space).unwrap_or(0),
                    overall_status: status.unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn list_switches(&self) -> Result<Vec<SwitchSummary>, VcError> {
        let objects = self.retrieve_all(wire::SWITCH, &["summary"]).await?;
        let mut switches = Vec::with_capacity(objects.len());
        for o in objects {
            if let Some(summary) = o.parse::<SwitchSummaryWire>("summary")? {
                switches.push(SwitchSummary {
                    name: summary.name,
                    uuid: summary.uuid,
                    portgroups: summary.portgroup_name,
                });
            }
        }
        Ok(switches)
    }

    async fn find_cluster(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        self.find_by_name(wire::CLUSTER, name).await
    }

    async fn cluster_resource_pool(&self, cluster: &ObjectRef) -> Result<ObjectRef, VcError> {
        let cluster = MoRef::new(wire::CLUSTER, &cluster.id);
        let pool: MoRef = self.property(&cluster, "resourcePool").await?;
        let name: String = self.property(&pool, "name").await?;
        Ok(ObjectRef::new(pool.value, name))
    }

    async fn find_datastore(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        self.find_by_name(wire::DATASTORE, name).await
    }

    async fn find_storage_pod(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        self.find_by_name(wire::STORAGE_POD, name).await
    }

    async fn find_folder(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        self.find_by_name(wire::FOLDER, name).await
    }

    async fn folder_children(&self, folder: &ObjectRef) -> Result<Vec<FolderChild>, VcError> {
        let folder = MoRef::new(wire::FOLDER, &folder.id);
        let children: Vec<MoRef> = self.property(&folder, "childEntity").await?;
        let names = self.names_of(&children).await?;

        Ok(children
            .into_iter()
            .filter_map(|child| {
                let name = names.get(&child.value).cloned().unwrap_or_default();
                match child.kind.as_str() {
                    wire::FOLDER => Some(FolderChild::Folder(ObjectRef::new(child.value, name))),
                    wire::VM => Some(FolderChild::Vm(ObjectRef::new(child.value, name))),
                    other => {
                        debug!(kind = other, id = %child.value, "skipping folder child");
                        None
                    }
                }
            })
            .collect())
    }

    async fn find_vm(&self, name: &str) -> Result<Option<ObjectRef>, VcError> {
        // templates are virtual machines too
        self.find_by_name(wire::VM, name).await
    }

    async fn vm_details(&self, vm: &ObjectRef) -> Result<VmDetails, VcError> {
        let moref = vm_ref(vm);
        let objects = self
            .retrieve(wire::objects_filter(
                std::slice::from_ref(&moref),
                wire::VM,
                &VM_DETAIL_PATHS,
            ))
            .await?;
        let content = objects
            .into_iter()
            .next()
            .ok_or_else(|| VcError::not_found(KIND_VM, &vm.name))?;

        let summary: VmSummaryWire = content.parse("summary")?.unwrap_or_default();
        let devices: Vec<Value> = content.parse("config.hardware.device")?.unwrap_or_default();
        let cores: u32 = content
            .parse("config.hardware.numCoresPerSocket")?
            .unwrap_or(1);
        let networks: Vec<MoRef> = content.parse("network")?.unwrap_or_default();
        let names = self.names_of(&networks).await?;

        Ok(wire::vm_details(summary, &devices, cores, &names))
    }

    async fn vm_datastores(&self, vm: &ObjectRef) -> Result<Vec<ObjectRef>, VcError> {
        let datastores: Vec<MoRef> = self.property(&vm_ref(vm), "datastore").await?;
        let names = self.names_of(&datastores).await?;
        Ok(datastores
            .into_iter()
            .filter_map(|ds| {
                names
                    .get(&ds.value)
                    .map(|name| ObjectRef::new(ds.value.clone(), name.clone()))
            })
            .collect())
    }

    async fn find_portgroup(&self, name: &str) -> Result<Option<PortGroup>, VcError> {
        let objects = self
            .retrieve_all(
                wire::PORTGROUP,
                &["name", "key", "config.distributedVirtualSwitch"],
            )
            .await?;
        let Some(found) = objects
            .into_iter()
            .find(|o| o.string("name").as_deref() == Some(name))
        else {
            return Ok(None);
        };

        let switch: Option<MoRef> = found.parse("config.distributedVirtualSwitch")?;
        let switch_uuid = match switch {
            Some(switch) => self.property::<String>(&switch, "uuid").await?,
            None => String::new(),
        };
        Ok(Some(PortGroup {
            key: found.string("key").unwrap_or(found.obj.value),
            name: name.to_string(),
            switch_uuid,
        }))
    }

    async fn recommend_datastore(&self, spec: &PlacementSpec) -> Result<ObjectRef, VcError> {
        let result: StoragePlacementResultWire = self
            .invoke_optional(
                &self.content.storage_resource_manager,
                "RecommendDatastores",
                wire::placement_body(spec),
            )
            .await?;
        let destination = result.destination().ok_or_else(|| {
            VcError::Api(format!(
                "no placement recommendation for storage pod '{}'",
                spec.storage_pod.name
            ))
        })?;
        let name: String = self.property(&destination, "name").await?;
        Ok(ObjectRef::new(destination.value, name))
    }

    async fn clone_vm(&self, spec: &CloneSpec) -> Result<TaskRef, VcError> {
        self.invoke_task(
            &vm_ref(&spec.template),
            "CloneVM_Task",
            wire::clone_body(spec),
            format!("clone {}", spec.name),
        )
        .await
    }

    async fn reconfigure_vm(
        &self,
        vm: &ObjectRef,
        change: &ConfigChange,
    ) -> Result<TaskRef, VcError> {
        let moref = vm_ref(vm);
        let spec = match change {
            ConfigChange::ResizeDisk {
                disk_key,
                capacity_kb,
            } => {
                let devices = self.devices(&moref).await?;
                let disk = wire::device_by_key(&devices, disk_key)
                    .ok_or_else(|| VcError::not_found("Disk", disk_key))?;
                wire::config_spec(vec![wire::device_edit(wire::resized_disk(
                    disk,
                    *capacity_kb,
                )?)])
            }
            ConfigChange::AddDisk { capacity_kb, thin } => {
                let devices = self.devices(&moref).await?;
                wire::config_spec(vec![wire::new_disk(&devices, *capacity_kb, *thin)?])
            }
            ConfigChange::CpuMemory {
                num_cpus,
                cores_per_socket,
                memory_mb,
            } => wire::cpu_memory_spec(*num_cpus, *cores_per_socket, *memory_mb),
            ConfigChange::AttachNic {
                nic_key,
                portgroup,
                start_connected,
                allow_guest_control,
                wake_on_lan,
            } => {
                let devices = self.devices(&moref).await?;
                let nic = wire::device_by_key(&devices, nic_key)
                    .ok_or_else(|| VcError::not_found("Network card", nic_key))?;
                wire::config_spec(vec![wire::device_edit(wire::nic_on_portgroup(
                    nic,
                    portgroup,
                    *start_connected,
                    *allow_guest_control,
                    *wake_on_lan,
                )?)])
            }
        };

        self.invoke_task(
            &moref,
            "ReconfigVM_Task",
            json!({ "spec": spec }),
            format!("reconfigure {}", vm.name),
        )
        .await
    }

    async fn power(&self, vm: &ObjectRef, op: PowerOp) -> Result<TaskRef, VcError> {
        let method = match op {
            PowerOp::On => "PowerOnVM_Task",
            PowerOp::Off => "PowerOffVM_Task",
            PowerOp::Reset => "ResetVM_Task",
        };
        self.invoke_task(
            &vm_ref(vm),
            method,
            json!({}),
            format!("{} {}", op.as_str(), vm.name),
        )
        .await
    }

    async fn destroy_vm(&self, vm: &ObjectRef) -> Result<TaskRef, VcError> {
        self.invoke_task(
            &vm_ref(vm),
            "Destroy_Task",
            json!({}),
            format!("destroy {}", vm.name),
        )
        .await
    }

    async fn task_state(&self, task: &TaskRef) -> Result<TaskState, VcError> {
        let info: TaskInfoWire = self
            .property(&MoRef::new(wire::TASK, &task.id), "info")
            .await?;
        Ok(info.task_state())
    }

    async fn logout(&self) -> Result<(), VcError> {
        self.call(&self.content.session_manager, "Logout", json!({}))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_mapping() {
        let err = fault_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"_typeName": "InvalidLogin", "faultMessage": []}"#,
        );
        assert!(matches!(err, VcError::Credentials(_)));
        assert!(err.is_fatal());

        let err = fault_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"_typeName": "InvalidState", "faultMessage": [{"key": "k", "message": "powered on"}]}"#,
        );
        assert_eq!(
            err.to_string(),
            "vCenter API error: 500 Internal Server Error InvalidState: powered on"
        );

        let err = fault_error(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, VcError::Credentials(_)));

        let err = fault_error(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(err.to_string(), "vCenter API error: 502 Bad Gateway upstream down");
    }

    #[test]
    fn test_vm_ref() {
        let moref = vm_ref(&ObjectRef::new("vm-42", "web01"));
        assert_eq!(moref, MoRef::new("VirtualMachine", "vm-42"));
    }
}
