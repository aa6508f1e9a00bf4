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

/// Size units
pub const GB: u64 = 1024 * 1024 * 1024;
pub const KB_PER_GB: u64 = 1024 * 1024;
pub const MB_PER_GB: u64 = 1024;

/// Local files
pub const DEFAULT_CREDENTIALS_FILE: &str = ".credentials";
pub const HISTORY_FILE_NAME: &str = "history.txt";
pub const APP_DIR_NAME: &str = "vcenter-shell";

/// Inventory layout
pub const DEFAULT_TENANTS_FOLDER: &str = "Tenants";
pub const DEFAULT_TEMPLATES_FOLDER: &str = "Templates";

/// vCenter endpoint
pub const DEFAULT_VC_PORT: u16 = 443;
pub const SESSION_HEADER: &str = "vmware-api-session-id";
pub const VIM_API_PATH: &str = "/sdk/vim25";
/// First release serving the vim25 JSON protocol
pub const DEFAULT_API_RELEASE: &str = "8.0.1.0";

/// Task polling
pub const DEFAULT_TASK_POLL_INTERVAL_MS: u64 = 500;

/// Connection retries
pub const CONNECT_MAX_ATTEMPTS: usize = 3;
pub const CONNECT_MIN_DELAY_MS: u64 = 500;

/// Shell
pub const DEFAULT_PROMPT: &str = "[vc001]$ ";

/// Inventory object kinds, used in not-found messages
pub const KIND_CLUSTER: &str = "Cluster";
pub const KIND_DATASTORE: &str = "Datastore";
pub const KIND_FOLDER: &str = "Folder";
pub const KIND_TENANT: &str = "Tenant";
pub const KIND_VM: &str = "Virtual machine";
pub const KIND_TEMPLATE: &str = "Template";
pub const KIND_PORTGROUP: &str = "Port group";
pub const KIND_STORAGE_POD: &str = "Storage pod";
