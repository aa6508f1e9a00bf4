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

//! vim25 JSON wire formats and request bodies.
//!
//! Polymorphic data objects carry a `_typeName` discriminator; primitives
//! and arrays held in `anyType` slots arrive boxed as
//! `{"_typeName": ..., "_value": ...}`.

use crate::infrastructure::vsphere::types::{
    CloneSpec, EntityStatus, NetworkCard, PlacementSpec, PortGroup, PowerState, TaskState,
    VirtualDisk, VmDetails,
};
use crate::shared::error::VcError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const CLUSTER: &str = "ClusterComputeResource";
pub const DATASTORE: &str = "Datastore";
pub const FOLDER: &str = "Folder";
pub const MANAGED_ENTITY: &str = "ManagedEntity";
pub const PORTGROUP: &str = "DistributedVirtualPortgroup";
pub const RESOURCE_POOL: &str = "ResourcePool";
pub const STORAGE_POD: &str = "StoragePod";
pub const SWITCH: &str = "DistributedVirtualSwitch";
pub const TASK: &str = "Task";
pub const VM: &str = "VirtualMachine";

/// Key given to a device that does not exist yet
const NEW_DEVICE_KEY: i64 = -101;
/// SCSI unit reserved for the controller itself
const SCSI_CONTROLLER_UNIT: u64 = 7;
const MAX_UNITS_PER_CONTROLLER: u64 = 16;

/// `ManagedObjectReference`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl MoRef {
    pub fn new(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "_typeName": "ManagedObjectReference",
            "type": self.kind,
            "value": self.value,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContent {
    pub root_folder: MoRef,
    pub property_collector: MoRef,
    pub view_manager: MoRef,
    pub session_manager: MoRef,
    pub storage_resource_manager: MoRef,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrieveResult {
    #[serde(default)]
    pub objects: Vec<ObjectContent>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub obj: MoRef,
    #[serde(default)]
    pub prop_set: Vec<DynamicProperty>,
}

#[derive(Debug, Deserialize)]
pub struct DynamicProperty {
    pub name: String,
    #[serde(default)]
    pub val: Value,
}

impl ObjectContent {
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.prop_set
            .iter()
            .find(|p| p.name == name)
            .map(|p| unbox(&p.val))
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.prop(name).and_then(Value::as_str).map(str::to_string)
    }

    /// Typed property value; `None` when the server left it out
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, VcError> {
        self.prop(name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(VcError::from)
    }
}

pub fn unbox(value: &Value) -> &Value {
    value.get("_value").unwrap_or(value)
}

/// Every object of `kind` in a container view
pub fn view_filter(view: &MoRef, kind: &str, paths: &[&str]) -> Value {
    json!({
        "specSet": [{
            "_typeName": "PropertyFilterSpec",
            "propSet": [{ "_typeName": "PropertySpec", "type": kind, "pathSet": paths }],
            "objectSet": [{
                "_typeName": "ObjectSpec",
                "obj": view.to_json(),
                "skip": true,
                "selectSet": [{
                    "_typeName": "TraversalSpec",
                    "name": "view",
                    "type": "ContainerView",
                    "path": "view",
                    "skip": false,
                }],
            }],
        }],
        "options": { "_typeName": "RetrieveOptions" },
    })
}

/// The given objects only. `kind` may be a base type such as `ManagedEntity`.
pub fn objects_filter(objs: &[MoRef], kind: &str, paths: &[&str]) -> Value {
    let object_set: Vec<Value> = objs
        .iter()
        .map(|obj| json!({ "_typeName": "ObjectSpec", "obj": obj.to_json(), "skip": false }))
        .collect();
    json!({
        "specSet": [{
            "_typeName": "PropertyFilterSpec",
            "propSet": [{ "_typeName": "PropertySpec", "type": kind, "pathSet": paths }],
            "objectSet": object_set,
        }],
        "options": { "_typeName": "RetrieveOptions" },
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummaryWire {
    #[serde(default)]
    pub num_cpu_cores: Option<u32>,
    #[serde(default)]
    pub num_cpu_threads: Option<u32>,
    #[serde(default)]
    pub total_memory: Option<u64>,
    #[serde(default)]
    pub num_hosts: u32,
    #[serde(default)]
    pub overall_status: EntityStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreSummaryWire {
    #[serde(default)]
    pub capacity: u64,
    #[serde(default)]
    pub free_space: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSummaryWire {
    pub name: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub portgroup_name: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VmSummaryWire {
    #[serde(default)]
    pub config: VmConfigSummaryWire,
    #[serde(default)]
    pub runtime: VmRuntimeWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmConfigSummaryWire {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub vm_path_name: String,
    #[serde(rename = "memorySizeMB", default)]
    pub memory_size_mb: u64,
    #[serde(default)]
    pub num_cpu: u32,
    #[serde(default)]
    pub guest_full_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmRuntimeWire {
    #[serde(default)]
    pub power_state: PowerState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfoWire {
    pub state: String,
    #[serde(default)]
    pub error: Option<LocalizedFaultWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedFaultWire {
    #[serde(default)]
    pub localized_message: String,
    #[serde(default)]
    pub fault: Option<Value>,
}

impl TaskInfoWire {
    pub fn task_state(&self) -> TaskState {
        match self.state.as_str() {
            "queued" => TaskState::Queued,
            "running" => TaskState::Running,
            "success" => TaskState::Success,
            _ => {
                let message = self
                    .error
                    .as_ref()
                    .map(|e| {
                        if e.localized_message.is_empty() {
                            e.fault
                                .as_ref()
                                .and_then(|f| f.get("_typeName"))
                                .and_then(Value::as_str)
                                .unwrap_or("unknown fault")
                                .to_string()
                        } else {
                            e.localized_message.clone()
                        }
                    })
                    .unwrap_or_else(|| format!("task ended in state '{}'", self.state));
                TaskState::Error(message)
            }
        }
    }
}

/// Body of a failed call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultWire {
    #[serde(rename = "_typeName", default)]
    pub type_name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fault_message: Vec<LocalizableMessageWire>,
}

#[derive(Debug, Deserialize)]
pub struct LocalizableMessageWire {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl FaultWire {
    pub fn describe(&self) -> String {
        let mut parts: Vec<&str> = self.message.iter().map(String::as_str).collect();
        parts.extend(
            self.fault_message
                .iter()
                .map(|m| m.message.as_deref().unwrap_or(m.key.as_str())),
        );
        if parts.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}: {}", self.type_name, parts.join("; "))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoragePlacementResultWire {
    #[serde(default)]
    pub recommendations: Vec<RecommendationWire>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationWire {
    #[serde(default)]
    pub action: Vec<Value>,
}

impl StoragePlacementResultWire {
    /// Destination of the first recommended action
    pub fn destination(&self) -> Option<MoRef> {
        self.recommendations
            .iter()
            .flat_map(|r| r.action.iter())
            .find_map(|a| a.get("destination"))
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }
}

fn type_name(device: &Value) -> &str {
    device
        .get("_typeName")
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn device_key(device: &Value) -> Option<i64> {
    device.get("key").and_then(Value::as_i64)
}

fn is_disk(device: &Value) -> bool {
    type_name(device) == "VirtualDisk"
}

/// Any ethernet card flavour (vmxnet3, e1000, ...) carries a MAC address
fn is_nic(device: &Value) -> bool {
    device.get("macAddress").is_some()
}

fn bool_at(device: &Value, pointer: &str) -> bool {
    device
        .pointer(pointer)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn disk_capacity_kb(device: &Value) -> u64 {
    device
        .get("capacityInKB")
        .and_then(Value::as_u64)
        .or_else(|| {
            device
                .get("capacityInBytes")
                .and_then(Value::as_u64)
                .map(|bytes| bytes / 1024)
        })
        .unwrap_or(0)
}

/// Network name of a card. Distributed port group keys equal their object ids.
fn nic_network(device: &Value, network_names: &HashMap<String, String>) -> Option<String> {
    if let Some(name) = device.pointer("/backing/deviceName").and_then(Value::as_str) {
        return Some(name.to_string());
    }
    device
        .pointer("/backing/port/portgroupKey")
        .and_then(Value::as_str)
        .and_then(|key| network_names.get(key).cloned())
}

pub fn vm_details(
    summary: VmSummaryWire,
    devices: &[Value],
    cores_per_socket: u32,
    network_names: &HashMap<String, String>,
) -> VmDetails {
    let disks = devices
        .iter()
        .filter(|d| is_disk(d))
        .filter_map(|d| {
            device_key(d).map(|key| VirtualDisk {
                key: key.to_string(),
                capacity_kb: disk_capacity_kb(d),
            })
        })
        .collect();

    let nics = devices
        .iter()
        .filter(|d| is_nic(d))
        .filter_map(|d| {
            device_key(d).map(|key| NetworkCard {
                key: key.to_string(),
                mac_address: d
                    .get("macAddress")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                network: nic_network(d, network_names),
                wake_on_lan: bool_at(d, "/wakeOnLanEnabled"),
                start_connected: bool_at(d, "/connectable/startConnected"),
                allow_guest_control: bool_at(d, "/connectable/allowGuestControl"),
            })
        })
        .collect();

    let config = summary.config;
    VmDetails {
        name: config.name,
        num_cpu: config.num_cpu,
        cores_per_socket: cores_per_socket.max(1),
        memory_mb: config.memory_size_mb,
        disks,
        nics,
        vm_path_name: config.vm_path_name,
        guest_full_name: config.guest_full_name,
        power_state: summary.runtime.power_state,
        template: config.template,
    }
}

pub fn device_by_key(devices: &[Value], key: &str) -> Option<Value> {
    devices
        .iter()
        .find(|d| device_key(d).map(|k| k.to_string()).as_deref() == Some(key))
        .cloned()
}

fn object_mut<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Map<String, Value>, VcError> {
    value
        .as_object_mut()
        .ok_or_else(|| VcError::Api(format!("unexpected {} payload from vCenter", what)))
}

pub fn config_spec(device_change: Vec<Value>) -> Value {
    json!({ "_typeName": "VirtualMachineConfigSpec", "deviceChange": device_change })
}

pub fn device_edit(device: Value) -> Value {
    json!({ "_typeName": "VirtualDeviceConfigSpec", "operation": "edit", "device": device })
}

/// The existing disk with a new size
pub fn resized_disk(mut disk: Value, capacity_kb: u64) -> Result<Value, VcError> {
    let bytes = capacity_kb
        .checked_mul(1024)
        .ok_or_else(|| VcError::validation(format!("disk of {} KB is too large", capacity_kb)))?;
    let fields = object_mut(&mut disk, "disk")?;
    fields.insert("capacityInKB".to_string(), json!(capacity_kb));
    if fields.contains_key("capacityInBytes") {
        fields.insert("capacityInBytes".to_string(), json!(bytes));
    }
    Ok(disk)
}

/// Device change creating a disk on the controller of the first disk
pub fn new_disk(devices: &[Value], capacity_kb: u64, thin: bool) -> Result<Value, VcError> {
    let controller = devices
        .iter()
        .filter(|d| is_disk(d))
        .find_map(|d| d.get("controllerKey").and_then(Value::as_i64))
        .ok_or_else(|| VcError::validation("VM has no disk controller to attach a disk to"))?;

    let used: Vec<u64> = devices
        .iter()
        .filter(|d| d.get("controllerKey").and_then(Value::as_i64) == Some(controller))
        .filter_map(|d| d.get("unitNumber").and_then(Value::as_u64))
        .collect();
    let unit = (0..MAX_UNITS_PER_CONTROLLER)
        .find(|u| *u != SCSI_CONTROLLER_UNIT && !used.contains(u))
        .ok_or_else(|| VcError::validation("disk controller has no free unit"))?;

    Ok(json!({
        "_typeName": "VirtualDeviceConfigSpec",
        "operation": "add",
        "fileOperation": "create",
        "device": {
            "_typeName": "VirtualDisk",
            "key": NEW_DEVICE_KEY,
            "controllerKey": controller,
            "unitNumber": unit,
            "capacityInKB": capacity_kb,
            "backing": {
                "_typeName": "VirtualDiskFlatVer2BackingInfo",
                "fileName": "",
                "diskMode": "persistent",
                "thinProvisioned": thin,
            },
        },
    }))
}

pub fn cpu_memory_spec(num_cpus: u32, cores_per_socket: u32, memory_mb: u64) -> Value {
    json!({
        "_typeName": "VirtualMachineConfigSpec",
        "numCPUs": num_cpus,
        "numCoresPerSocket": cores_per_socket,
        "memoryMB": memory_mb,
    })
}

/// The existing card, backed by a distributed port group
pub fn nic_on_portgroup(
    mut nic: Value,
    portgroup: &PortGroup,
    start_connected: bool,
    allow_guest_control: bool,
    wake_on_lan: bool,
) -> Result<Value, VcError> {
    let fields = object_mut(&mut nic, "network card")?;
    fields.insert("wakeOnLanEnabled".to_string(), json!(wake_on_lan));
    fields.insert(
        "backing".to_string(),
        json!({
            "_typeName": "VirtualEthernetCardDistributedVirtualPortBackingInfo",
            "port": {
                "_typeName": "DistributedVirtualSwitchPortConnection",
                "portgroupKey": portgroup.key,
                "switchUuid": portgroup.switch_uuid,
            },
        }),
    );

    let connectable = fields
        .entry("connectable")
        .or_insert_with(|| json!({ "_typeName": "VirtualDeviceConnectInfo", "connected": false }));
    let connectable = object_mut(connectable, "connect info")?;
    connectable.insert("startConnected".to_string(), json!(start_connected));
    connectable.insert("allowGuestControl".to_string(), json!(allow_guest_control));
    Ok(nic)
}

/// Arguments of `CloneVM_Task`
pub fn clone_body(spec: &CloneSpec) -> Value {
    json!({
        "folder": MoRef::new(FOLDER, &spec.folder.id).to_json(),
        "name": spec.name,
        "spec": {
            "_typeName": "VirtualMachineCloneSpec",
            "location": {
                "_typeName": "VirtualMachineRelocateSpec",
                "datastore": MoRef::new(DATASTORE, &spec.datastore.id).to_json(),
                "pool": MoRef::new(RESOURCE_POOL, &spec.resource_pool.id).to_json(),
            },
            "template": false,
            "powerOn": spec.power_on,
        },
    })
}

/// Arguments of `RecommendDatastores` for a VM about to be created
pub fn placement_body(spec: &PlacementSpec) -> Value {
    json!({
        "storageSpec": {
            "_typeName": "StoragePlacementSpec",
            "type": "create",
            "podSelectionSpec": {
                "_typeName": "StorageDrsPodSelectionSpec",
                "storagePod": MoRef::new(STORAGE_POD, &spec.storage_pod.id).to_json(),
            },
            "folder": MoRef::new(FOLDER, &spec.folder.id).to_json(),
            "resourcePool": MoRef::new(RESOURCE_POOL, &spec.resource_pool.id).to_json(),
            "configSpec": { "_typeName": "VirtualMachineConfigSpec" },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::vsphere::types::ObjectRef;

    fn devices() -> Vec<Value> {
        serde_json::from_str(
            r#"[
            {"_typeName": "ParaVirtualSCSIController", "key": 1000, "busNumber": 0},
            {"_typeName": "VirtualDisk", "key": 2000, "controllerKey": 1000, "unitNumber": 0,
             "capacityInKB": 16777216, "capacityInBytes": 17179869184,
             "backing": {"_typeName": "VirtualDiskFlatVer2BackingInfo",
                         "fileName": "[ds01] web01/web01.vmdk", "diskMode": "persistent"}},
            {"_typeName": "VirtualVmxnet3", "key": 4000, "controllerKey": 100, "unitNumber": 7,
             "macAddress": "00:50:56:aa:bb:cc", "wakeOnLanEnabled": false,
             "connectable": {"_typeName": "VirtualDeviceConnectInfo", "startConnected": true,
                             "allowGuestControl": true, "connected": true},
             "backing": {"_typeName": "VirtualEthernetCardDistributedVirtualPortBackingInfo",
                         "port": {"_typeName": "DistributedVirtualSwitchPortConnection",
                                  "portgroupKey": "dvportgroup-21", "switchUuid": "50 2a"}}},
            {"_typeName": "VirtualE1000", "key": 4001, "macAddress": "00:50:56:aa:bb:cd",
             "backing": {"_typeName": "VirtualEthernetCardNetworkBackingInfo", "deviceName": "VM Network"}}
        ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_unbox_and_typed_properties() {
        let content: ObjectContent = serde_json::from_str(
            r#"{"obj": {"_typeName": "ManagedObjectReference", "type": "Datastore", "value": "datastore-11"},
                "propSet": [
                    {"name": "name", "val": {"_typeName": "string", "_value": "ds01"}},
                    {"name": "overallStatus", "val": {"_typeName": "ManagedEntityStatus", "_value": "yellow"}},
                    {"name": "summary", "val": {"_typeName": "DatastoreSummary", "capacity": 1073741824, "freeSpace": 536870912}}
                ]}"#,
        )
        .unwrap();

        assert_eq!(content.obj, MoRef::new(DATASTORE, "datastore-11"));
        assert_eq!(content.string("name").as_deref(), Some("ds01"));
        let status: Option<EntityStatus> = content.parse("overallStatus").unwrap();
        assert_eq!(status, Some(EntityStatus::Yellow));
        let summary: DatastoreSummaryWire = content.parse("summary").unwrap().unwrap();
        assert_eq!(summary.free_space, 536870912);
        assert!(content.string("missing").is_none());
    }

    #[test]
    fn test_vm_details_from_devices() {
        let summary: VmSummaryWire = serde_json::from_str(
            r#"{"config": {"name": "web01", "template": false, "vmPathName": "[ds01] web01/web01.vmx",
                           "memorySizeMB": 4096, "numCpu": 2, "guestFullName": "Ubuntu Linux (64-bit)"},
                "runtime": {"powerState": "poweredOn"}}"#,
        )
        .unwrap();
        let names = HashMap::from([("dvportgroup-21".to_string(), "pg-web".to_string())]);

        let vm = vm_details(summary, &devices(), 1, &names);
        assert_eq!(vm.name, "web01");
        assert_eq!(vm.datastore(), "[ds01]");
        assert_eq!(vm.power_state, PowerState::PoweredOn);
        assert_eq!(vm.disks.len(), 1);
        assert_eq!(vm.disks[0].key, "2000");
        assert_eq!(vm.disks[0].capacity_kb, 16777216);
        assert_eq!(vm.networks(), vec!["pg-web", "VM Network"]);
        assert!(vm.nics[0].start_connected);
    }

    #[test]
    fn test_template_flag() {
        let summary: VmSummaryWire =
            serde_json::from_str(r#"{"config": {"name": "centos-7", "template": true}}"#).unwrap();
        let vm = vm_details(summary, &[], 0, &HashMap::new());
        assert!(vm.template);
        assert_eq!(vm.cores_per_socket, 1);
        assert_eq!(vm.power_state, PowerState::PoweredOff);
    }

    #[test]
    fn test_resized_disk_keeps_device_and_updates_both_sizes() {
        let disk = device_by_key(&devices(), "2000").unwrap();
        let resized = resized_disk(disk, 41943040).unwrap();
        assert_eq!(resized["capacityInKB"], json!(41943040u64));
        assert_eq!(resized["capacityInBytes"], json!(42949672960u64));
        assert_eq!(resized["backing"]["fileName"], "[ds01] web01/web01.vmdk");

        assert!(resized_disk(json!({"key": 1}), u64::MAX).is_err());
    }

    #[test]
    fn test_new_disk_picks_free_unit() {
        let change = new_disk(&devices(), 104857600, true).unwrap();
        assert_eq!(change["operation"], "add");
        assert_eq!(change["fileOperation"], "create");
        assert_eq!(change["device"]["controllerKey"], 1000);
        assert_eq!(change["device"]["unitNumber"], 1);
        assert_eq!(change["device"]["backing"]["thinProvisioned"], true);

        let no_disks: Vec<Value> = devices().into_iter().filter(|d| !is_disk(d)).collect();
        assert!(new_disk(&no_disks, 1, true).is_err());
    }

    #[test]
    fn test_nic_on_portgroup() {
        let nic = device_by_key(&devices(), "4001").unwrap();
        let portgroup = PortGroup {
            key: "dvportgroup-30".to_string(),
            name: "pg-db".to_string(),
            switch_uuid: "50 2a ff".to_string(),
        };
        let edited = nic_on_portgroup(nic, &portgroup, true, true, true).unwrap();
        assert_eq!(edited["key"], 4001);
        assert_eq!(edited["wakeOnLanEnabled"], true);
        assert_eq!(edited["backing"]["port"]["portgroupKey"], "dvportgroup-30");
        assert_eq!(edited["backing"]["port"]["switchUuid"], "50 2a ff");
        assert_eq!(edited["connectable"]["startConnected"], true);
        assert_eq!(edited["connectable"]["allowGuestControl"], true);
    }

    #[test]
    fn test_task_states() {
        let info: TaskInfoWire = serde_json::from_str(r#"{"state": "running"}"#).unwrap();
        assert_eq!(info.task_state(), TaskState::Running);

        let info: TaskInfoWire = serde_json::from_str(
            r#"{"state": "error", "error": {"_typeName": "LocalizedMethodFault",
                "localizedMessage": "Insufficient disk space on datastore 'ds01'.",
                "fault": {"_typeName": "InsufficientDiskSpace"}}}"#,
        )
        .unwrap();
        assert_eq!(
            info.task_state(),
            TaskState::Error("Insufficient disk space on datastore 'ds01'.".to_string())
        );
    }

    #[test]
    fn test_placement_destination() {
        let result: StoragePlacementResultWire = serde_json::from_str(
            r#"{"_typeName": "StoragePlacementResult", "recommendations": [{
                "_typeName": "ClusterRecommendation", "key": "1", "type": "V1",
                "action": [{"_typeName": "StoragePlacementAction",
                            "destination": {"_typeName": "ManagedObjectReference", "type": "Datastore", "value": "datastore-12"}}]}]}"#,
        )
        .unwrap();
        assert_eq!(result.destination(), Some(MoRef::new(DATASTORE, "datastore-12")));
        assert!(StoragePlacementResultWire::default().destination().is_none());
    }

    #[test]
    fn test_clone_body() {
        let spec = CloneSpec {
            template: ObjectRef::new("vm-7", "centos-7"),
            name: "web01".to_string(),
            folder: ObjectRef::new("group-v20", "acme"),
            resource_pool: ObjectRef::new("resgroup-8", "Resources"),
            datastore: ObjectRef::new("datastore-12", "ds02"),
            power_on: false,
        };
        let body = clone_body(&spec);
        assert_eq!(body["name"], "web01");
        assert_eq!(body["folder"]["type"], "Folder");
        assert_eq!(body["spec"]["location"]["datastore"]["value"], "datastore-12");
        assert_eq!(body["spec"]["location"]["pool"]["type"], "ResourcePool");
        assert_eq!(body["spec"]["powerOn"], false);
    }

    #[test]
    fn test_fault_description() {
        let fault: FaultWire = serde_json::from_str(
            r#"{"_typeName": "InvalidArgument", "faultMessage": [{"key": "msg.x", "message": "bad spec"}]}"#,
        )
        .unwrap();
        assert_eq!(fault.describe(), "InvalidArgument: bad spec");

        let fault: FaultWire = serde_json::from_str(r#"{"_typeName": "NotAuthenticated"}"#).unwrap();
        assert_eq!(fault.describe(), "NotAuthenticated");
    }
}
