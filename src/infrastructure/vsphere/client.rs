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

use crate::infrastructure::vsphere::types::{
    CloneSpec, ClusterSummary, ConfigChange, DatastoreSummary, FolderChild, ObjectRef,
    PlacementSpec, PortGroup, PowerOp, SwitchSummary, TaskRef, TaskState, VmDetails,
};
use crate::shared::error::VcError;

/// Session against a vCenter management endpoint.
///
/// Lookups by name return `Ok(None)` when nothing matches; mutations return a
/// [`TaskRef`] that must be polled with [`VsphereClient::task_state`].
#[async_trait::async_trait]
pub trait VsphereClient: Send + Sync {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, VcError>;

    async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, VcError>;

    async fn list_switches(&self) -> Result<Vec<SwitchSummary>, VcError>;

    async fn find_cluster(&self, name: &str) -> Result<Option<ObjectRef>, VcError>;

    async fn cluster_resource_pool(&self, cluster: &ObjectRef) -> Result<ObjectRef, VcError>;

    async fn find_datastore(&self, name: &str) -> Result<Option<ObjectRef>, VcError>;

    async fn find_storage_pod(&self, name: &str) -> Result<Option<ObjectRef>, VcError>;

    async fn find_folder(&self, name: &str) -> Result<Option<ObjectRef>, VcError>;

    async fn folder_children(&self, folder: &ObjectRef) -> Result<Vec<FolderChild>, VcError>;

    async fn find_vm(&self, name: &str) -> Result<Option<ObjectRef>, VcError>;

    async fn vm_details(&self, vm: &ObjectRef) -> Result<VmDetails, VcError>;

    async fn vm_datastores(&self, vm: &ObjectRef) -> Result<Vec<ObjectRef>, VcError>;

    async fn find_portgroup(&self, name: &str) -> Result<Option<PortGroup>, VcError>;

    async fn recommend_datastore(&self, spec: &PlacementSpec) -> Result<ObjectRef, VcError>;

    async fn clone_vm(&self, spec: &CloneSpec) -> Result<TaskRef, VcError>;

    async fn reconfigure_vm(
        &self,
        vm: &ObjectRef,
        change: &ConfigChange,
    ) -> Result<TaskRef, VcError>;

    async fn power(&self, vm: &ObjectRef, op: PowerOp) -> Result<TaskRef, VcError>;

    async fn destroy_vm(&self, vm: &ObjectRef) -> Result<TaskRef, VcError>;

    async fn task_state(&self, task: &TaskRef) -> Result<TaskState, VcError>;

    async fn logout(&self) -> Result<(), VcError>;
}
