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

//! Live client against a local vim25 JSON endpoint served by axum.

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::{Request, State};
    use axum::http::StatusCode;
    use axum::response::Response;
    use axum::Router;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use vcenter_shell::infrastructure::vsphere::types::{
        CloneSpec, ConfigChange, ObjectRef, PlacementSpec, PortGroup, PowerOp, PowerState,
        TaskRef, TaskState,
    };
    use vcenter_shell::*;

    const API_ROOT: &str = "/sdk/vim25/8.0.1.0";
    const SESSION: &str = "vmware-api-session-id";
    const RETRIEVE: &str = "POST /PropertyCollector/propertyCollector/RetrievePropertiesEx";

    type Handler = Box<dyn Fn(&Value) -> (StatusCode, Value) + Send + Sync>;

    #[derive(Debug, Clone)]
    struct Recorded {
        route: String,
        session: Option<String>,
        body: Value,
    }

    struct MockVcenter {
        routes: HashMap<String, Handler>,
        requests: Mutex<Vec<Recorded>>,
    }

    impl MockVcenter {
        fn requests(&self, route: &str) -> Vec<Recorded> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.route == route)
                .cloned()
                .collect()
        }

        fn all_requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    struct MockBuilder {
        routes: HashMap<String, Handler>,
    }

    impl MockBuilder {
        fn on(
            mut self,
            route: &str,
            handler: impl Fn(&Value) -> (StatusCode, Value) + Send + Sync + 'static,
        ) -> Self {
            self.routes.insert(route.to_string(), Box::new(handler));
            self
        }

        fn ok(self, route: &str, reply: Value) -> Self {
            self.on(route, move |_| (StatusCode::OK, reply.clone()))
        }

        async fn start(self) -> (Arc<MockVcenter>, String) {
            let mock = Arc::new(MockVcenter {
                routes: self.routes,
                requests: Mutex::new(Vec::new()),
            });
            let app = Router::new().fallback(handle).with_state(mock.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (mock, format!("http://{}{}", addr, API_ROOT))
        }
    }

    async fn handle(State(mock): State<Arc<MockVcenter>>, req: Request) -> Response {
        let path = req
            .uri()
            .path()
            .strip_prefix(API_ROOT)
            .unwrap_or_default()
            .to_string();
        let route = format!("{} {}", req.method(), path);
        let session = req
            .headers()
            .get(SESSION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(req.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        mock.requests.lock().unwrap().push(Recorded {
            route: route.clone(),
            session,
            body: body.clone(),
        });

        let (status, reply) = match mock.routes.get(&route) {
            Some(handler) => handler(&body),
            None => (
                StatusCode::NOT_FOUND,
                json!({ "_typeName": "ManagedObjectNotFound", "faultMessage": [] }),
            ),
        };

        let mut builder = Response::builder()
            .status(status)
            .header("content-type", "application/json");
        if path.ends_with("/Login") && status == StatusCode::OK {
            builder = builder.header(SESSION, "sess-1");
        }
        let text = if reply.is_null() {
            String::new()
        } else {
            reply.to_string()
        };
        builder.body(Body::from(text)).unwrap()
    }

    fn moref(kind: &str, value: &str) -> Value {
        json!({ "_typeName": "ManagedObjectReference", "type": kind, "value": value })
    }

    fn boxed(type_name: &str, value: Value) -> Value {
        json!({ "_typeName": type_name, "_value": value })
    }

    fn object(kind: &str, value: &str, props: Vec<(&str, Value)>) -> Value {
        let prop_set: Vec<Value> = props
            .into_iter()
            .map(|(name, val)| json!({ "_typeName": "DynamicProperty", "name": name, "val": val }))
            .collect();
        json!({ "_typeName": "ObjectContent", "obj": moref(kind, value), "propSet": prop_set })
    }

    fn result(objects: Vec<Value>) -> Value {
        json!({ "_typeName": "RetrieveResult", "objects": objects })
    }

    fn requested_type(body: &Value) -> &str {
        body["specSet"][0]["propSet"][0]["type"].as_str().unwrap_or("")
    }

    fn requested_ids(body: &Value) -> Vec<String> {
        body["specSet"][0]["objectSet"]
            .as_array()
            .map(|set| {
                set.iter()
                    .filter_map(|o| o["obj"]["value"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn name(value: &str) -> Value {
        boxed("string", json!(value))
    }

    /// Endpoint with service content, login, views and logout in place
    fn vcenter() -> MockBuilder {
        MockBuilder {
            routes: HashMap::new(),
        }
        .ok(
            "GET /ServiceInstance/ServiceInstance/content",
            json!({
                "_typeName": "ServiceContent",
                "rootFolder": moref("Folder", "group-d1"),
                "propertyCollector": moref("PropertyCollector", "propertyCollector"),
                "viewManager": moref("ViewManager", "ViewManager"),
                "sessionManager": moref("SessionManager", "SessionManager"),
                "storageResourceManager": moref("StorageResourceManager", "StorageResourceManager"),
            }),
        )
        .ok(
            "POST /SessionManager/SessionManager/Login",
            json!({ "_typeName": "UserSession", "userName": "ops" }),
        )
        .ok(
            "POST /ViewManager/ViewManager/CreateContainerView",
            moref("ContainerView", "view-1"),
        )
        .on("POST /ContainerView/view-1/DestroyView", |_| {
            (StatusCode::NO_CONTENT, Value::Null)
        })
        .on("POST /SessionManager/SessionManager/Logout", |_| {
            (StatusCode::NO_CONTENT, Value::Null)
        })
    }

    fn credentials() -> Credentials {
        Credentials {
            host: "127.0.0.1".to_string(),
            user: "ops".to_string(),
            password: "secret".to_string(),
            port: 443,
            datastore: None,
        }
    }

    async fn connect(builder: MockBuilder) -> (Arc<MockVcenter>, VsphereRestClient) {
        let (mock, url) = builder.start().await;
        let client = VsphereRestClient::connect_url(&url, &credentials(), false)
            .await
            .unwrap();
        (mock, client)
    }

    fn web01_devices() -> Value {
        json!([
            {"_typeName": "ParaVirtualSCSIController", "key": 1000, "busNumber": 0},
            {"_typeName": "VirtualDisk", "key": 2000, "controllerKey": 1000, "unitNumber": 0,
             "capacityInKB": 16777216, "capacityInBytes": 17179869184u64,
             "backing": {"_typeName": "VirtualDiskFlatVer2BackingInfo",
                         "fileName": "[ds01] web01/web01.vmdk", "diskMode": "persistent"}},
            {"_typeName": "VirtualVmxnet3", "key": 4000, "macAddress": "00:50:56:aa:bb:cc",
             "wakeOnLanEnabled": false,
             "connectable": {"_typeName": "VirtualDeviceConnectInfo", "startConnected": false,
                             "allowGuestControl": false, "connected": false},
             "backing": {"_typeName": "VirtualEthernetCardNetworkBackingInfo",
                         "deviceName": "VM Network"}}
        ])
    }

    #[tokio::test]
    async fn test_login_and_cluster_listing() {
        let builder = vcenter().on(RETRIEVE, |body| {
            assert_eq!(requested_type(body), "ClusterComputeResource");
            (
                StatusCode::OK,
                result(vec![object(
                    "ClusterComputeResource",
                    "domain-c7",
                    vec![
                        ("name", name("cl01")),
                        (
                            "summary",
                            json!({"_typeName": "ClusterComputeResourceSummary",
                                   "numCpuCores": 32, "numCpuThreads": 64,
                                   "totalMemory": 549755813888u64, "numHosts": 4,
                                   "overallStatus": "green"}),
                        ),
                    ],
                )]),
            )
        });
        let (mock, client) = connect(builder).await;

        let login = mock.requests("POST /SessionManager/SessionManager/Login");
        assert_eq!(login.len(), 1);
        assert_eq!(login[0].body["userName"], "ops");
        assert_eq!(login[0].body["password"], "secret");

        let clusters = client.list_clusters().await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].name, "cl01");
        assert_eq!(clusters[0].cpu_cores, Some(32));
        assert_eq!(clusters[0].cpu_threads, Some(64));
        assert_eq!(clusters[0].total_memory_bytes, Some(549755813888u64));
        assert_eq!(clusters[0].num_hosts, 4);

        let view = mock.requests("POST /ViewManager/ViewManager/CreateContainerView");
        assert_eq!(view[0].body["container"]["value"], "group-d1");
        assert_eq!(view[0].body["type"], json!(["ClusterComputeResource"]));
        assert_eq!(view[0].body["recursive"], true);
        assert_eq!(mock.requests("POST /ContainerView/view-1/DestroyView").len(), 1);

        let retrieve = mock.requests(RETRIEVE);
        let object_spec = &retrieve[0].body["specSet"][0]["objectSet"][0];
        assert_eq!(object_spec["obj"]["value"], "view-1");
        assert_eq!(object_spec["selectSet"][0]["path"], "view");

        // every call after login carries the session token
        assert!(mock
            .all_requests()
            .iter()
            .filter(|r| !r.route.ends_with("/Login") && !r.route.ends_with("/content"))
            .all(|r| r.session.as_deref() == Some("sess-1")));

        client.logout().await.unwrap();
        assert_eq!(mock.requests("POST /SessionManager/SessionManager/Logout").len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_login_is_not_retried() {
        let (mock, url) = vcenter()
            .on("POST /SessionManager/SessionManager/Login", |_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"_typeName": "InvalidLogin", "faultMessage": []}),
                )
            })
            .start()
            .await;

        let err = VsphereRestClient::connect_url(&url, &credentials(), false)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, VcError::Credentials(_)));
        assert!(err.is_fatal());
        assert_eq!(mock.requests("POST /SessionManager/SessionManager/Login").len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_login_is_not_retried() {
        let (mock, url) = vcenter()
            .on("POST /SessionManager/SessionManager/Login", |_| {
                (StatusCode::UNAUTHORIZED, Value::Null)
            })
            .start()
            .await;

        let err = VsphereRestClient::connect_url(&url, &credentials(), false)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, VcError::Credentials(_)));
        assert_eq!(mock.requests("POST /SessionManager/SessionManager/Login").len(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_follows_continuation_token() {
        let builder = vcenter()
            .ok(
                RETRIEVE,
                json!({
                    "_typeName": "RetrieveResult",
                    "token": "page-2",
                    "objects": [object("Datastore", "datastore-11", vec![
                        ("name", name("ds01")),
                        ("summary", json!({"_typeName": "DatastoreSummary",
                                           "capacity": 1073741824u64, "freeSpace": 536870912u64})),
                        ("overallStatus", boxed("ManagedEntityStatus", json!("yellow"))),
                    ])],
                }),
            )
            .ok(
                "POST /PropertyCollector/propertyCollector/ContinueRetrievePropertiesEx",
                result(vec![object("Datastore", "datastore-12", vec![("name", name("ds02"))])]),
            );
        let (mock, client) = connect(builder).await;

        let datastores = client.list_datastores().await.unwrap();
        let names: Vec<&str> = datastores.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ds01", "ds02"]);
        assert_eq!(datastores[0].free_space_bytes, 536870912);
        assert_eq!(datastores[0].overall_status.as_str(), "yellow");
        assert_eq!(datastores[1].capacity_bytes, 0);

        let next = mock.requests("POST /PropertyCollector/propertyCollector/ContinueRetrievePropertiesEx");
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].body["token"], "page-2");
    }

    #[tokio::test]
    async fn test_switches_and_portgroup_lookup() {
        let builder = vcenter()
            .on(RETRIEVE, |body| {
                let reply = match requested_type(body) {
                    "DistributedVirtualSwitch" => result(vec![object(
                        "VmwareDistributedVirtualSwitch",
                        "dvs-5",
                        vec![(
                            "summary",
                            json!({"_typeName": "DVSSummary", "name": "dvs01",
                                   "uuid": "50 2a ff", "portgroupName": ["pg-web", "pg-db"]}),
                        )],
                    )]),
                    "DistributedVirtualPortgroup" => result(vec![
                        object("DistributedVirtualPortgroup", "dvportgroup-20", vec![
                            ("name", name("pg-db")),
                            ("key", name("dvportgroup-20")),
                        ]),
                        object("DistributedVirtualPortgroup", "dvportgroup-21", vec![
                            ("name", name("pg-web")),
                            ("key", name("dvportgroup-21")),
                            ("config.distributedVirtualSwitch",
                             moref("VmwareDistributedVirtualSwitch", "dvs-5")),
                        ]),
                    ]),
                    other => panic!("unexpected retrieve of {}", other),
                };
                (StatusCode::OK, reply)
            })
            .ok("GET /VmwareDistributedVirtualSwitch/dvs-5/uuid", json!("50 2a ff"));
        let (_, client) = connect(builder).await;

        let switches = client.list_switches().await.unwrap();
        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].name, "dvs01");
        assert_eq!(switches[0].portgroups, vec!["pg-web", "pg-db"]);

        let portgroup = client.find_portgroup("pg-web").await.unwrap().unwrap();
        assert_eq!(
            portgroup,
            PortGroup {
                key: "dvportgroup-21".to_string(),
                name: "pg-web".to_string(),
                switch_uuid: "50 2a ff".to_string(),
            }
        );
        assert!(client.find_portgroup("pg-none").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_templates_are_found_and_flagged() {
        let builder = vcenter().on(RETRIEVE, |body| {
            let reply = match requested_type(body) {
                "VirtualMachine" if requested_ids(body) == vec!["view-1"] => {
                    result(vec![object("VirtualMachine", "vm-7", vec![("name", name("centos-7"))])])
                }
                "VirtualMachine" => result(vec![object("VirtualMachine", "vm-7", vec![
                    ("summary", json!({
                        "_typeName": "VirtualMachineSummary",
                        "config": {"_typeName": "VirtualMachineConfigSummary", "name": "centos-7",
                                   "template": true, "vmPathName": "[ds01] centos-7/centos-7.vmtx",
                                   "memorySizeMB": 2048, "numCpu": 1,
                                   "guestFullName": "CentOS 7 (64-bit)"},
                        "runtime": {"_typeName": "VirtualMachineRuntimeInfo", "powerState": "poweredOff"}
                    })),
                    ("config.hardware.device", boxed("ArrayOfVirtualDevice", web01_devices())),
                    ("network", boxed("ArrayOfManagedObjectReference",
                                      json!([moref("Network", "network-9")]))),
                ])]),
                "ManagedEntity" => {
                    assert_eq!(requested_ids(body), vec!["network-9"]);
                    result(vec![object("Network", "network-9", vec![("name", name("VM Network"))])])
                }
                other => panic!("unexpected retrieve of {}", other),
            };
            (StatusCode::OK, reply)
        });
        let (_, client) = connect(builder).await;

        let template = client.find_vm("centos-7").await.unwrap().unwrap();
        assert_eq!(template, ObjectRef::new("vm-7", "centos-7"));

        let details = client.vm_details(&template).await.unwrap();
        assert!(details.template);
        assert_eq!(details.guest_full_name, "CentOS 7 (64-bit)");
        assert_eq!(details.power_state, PowerState::PoweredOff);
        assert_eq!(details.datastore(), "[ds01]");
        assert_eq!(details.disks[0].capacity_kb, 16777216);
        assert_eq!(details.networks(), vec!["VM Network"]);
    }

    #[tokio::test]
    async fn test_folder_children_keep_order() {
        let builder = vcenter()
            .ok(
                "GET /Folder/group-v20/childEntity",
                json!([
                    moref("VirtualMachine", "vm-31"),
                    moref("Folder", "group-v40"),
                    moref("VirtualApp", "resgroup-v50"),
                ]),
            )
            .ok(
                RETRIEVE,
                result(vec![
                    object("Folder", "group-v40", vec![("name", name("archive"))]),
                    object("VirtualMachine", "vm-31", vec![("name", name("web01"))]),
                    object("VirtualApp", "resgroup-v50", vec![("name", name("stack"))]),
                ]),
            );
        let (_, client) = connect(builder).await;

        let children = client
            .folder_children(&ObjectRef::new("group-v20", "acme"))
            .await
            .unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["web01", "archive"]);
    }

    #[tokio::test]
    async fn test_clone_submits_spec_and_task_is_polled() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let builder = vcenter()
            .ok("POST /VirtualMachine/vm-7/CloneVM_Task", moref("Task", "task-101"))
            .on("GET /Task/task-101/info", move |_| {
                let state = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    "running"
                } else {
                    "success"
                };
                (StatusCode::OK, json!({"_typeName": "TaskInfo", "key": "task-101", "state": state}))
            });
        let (mock, client) = connect(builder).await;

        let task = client
            .clone_vm(&CloneSpec {
                template: ObjectRef::new("vm-7", "centos-7"),
                name: "web01".to_string(),
                folder: ObjectRef::new("group-v20", "acme"),
                resource_pool: ObjectRef::new("resgroup-8", "Resources"),
                datastore: ObjectRef::new("datastore-12", "ds02"),
                power_on: false,
            })
            .await
            .unwrap();
        assert_eq!(task.id, "task-101");

        let sent = &mock.requests("POST /VirtualMachine/vm-7/CloneVM_Task")[0].body;
        assert_eq!(sent["name"], "web01");
        assert_eq!(sent["folder"], moref("Folder", "group-v20"));
        assert_eq!(sent["spec"]["_typeName"], "VirtualMachineCloneSpec");
        assert_eq!(sent["spec"]["location"]["datastore"], moref("Datastore", "datastore-12"));
        assert_eq!(sent["spec"]["location"]["pool"], moref("ResourcePool", "resgroup-8"));
        assert_eq!(sent["spec"]["powerOn"], false);

        assert_eq!(client.task_state(&task).await.unwrap(), TaskState::Running);
        assert_eq!(client.task_state(&task).await.unwrap(), TaskState::Success);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_task_reports_fault_message() {
        let builder = vcenter().ok(
            "GET /Task/task-7/info",
            json!({"_typeName": "TaskInfo", "state": "error",
                   "error": {"_typeName": "LocalizedMethodFault",
                             "localizedMessage": "The name 'web01' already exists."}}),
        );
        let (_, client) = connect(builder).await;

        let state = client
            .task_state(&TaskRef::new("task-7", "clone web01"))
            .await
            .unwrap();
        assert_eq!(
            state,
            TaskState::Error("The name 'web01' already exists.".to_string())
        );
    }

    #[tokio::test]
    async fn test_resize_disk_edits_existing_device() {
        let builder = vcenter()
            .on(RETRIEVE, |body| {
                assert_eq!(body["specSet"][0]["propSet"][0]["pathSet"], json!(["config.hardware.device"]));
                (
                    StatusCode::OK,
                    result(vec![object("VirtualMachine", "vm-31", vec![(
                        "config.hardware.device",
                        boxed("ArrayOfVirtualDevice", web01_devices()),
                    )])]),
                )
            })
            .ok("POST /VirtualMachine/vm-31/ReconfigVM_Task", moref("Task", "task-102"));
        let (mock, client) = connect(builder).await;

        let vm = ObjectRef::new("vm-31", "web01");
        client
            .reconfigure_vm(
                &vm,
                &ConfigChange::ResizeDisk {
                    disk_key: "2000".to_string(),
                    capacity_kb: 40 * 1024 * 1024,
                },
            )
            .await
            .unwrap();

        let sent = &mock.requests("POST /VirtualMachine/vm-31/ReconfigVM_Task")[0].body;
        let change = &sent["spec"]["deviceChange"][0];
        assert_eq!(change["operation"], "edit");
        assert_eq!(change["device"]["key"], 2000);
        assert_eq!(change["device"]["capacityInKB"], json!(41943040u64));
        assert_eq!(change["device"]["capacityInBytes"], json!(42949672960u64));
        assert_eq!(change["device"]["backing"]["fileName"], "[ds01] web01/web01.vmdk");

        let err = client
            .reconfigure_vm(
                &vm,
                &ConfigChange::ResizeDisk {
                    disk_key: "2999".to_string(),
                    capacity_kb: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cpu_memory_nic_and_new_disk_specs() {
        let builder = vcenter()
            .ok(
                RETRIEVE,
                result(vec![object("VirtualMachine", "vm-31", vec![(
                    "config.hardware.device",
                    boxed("ArrayOfVirtualDevice", web01_devices()),
                )])]),
            )
            .ok("POST /VirtualMachine/vm-31/ReconfigVM_Task", moref("Task", "task-103"));
        let (mock, client) = connect(builder).await;
        let vm = ObjectRef::new("vm-31", "web01");

        client
            .reconfigure_vm(
                &vm,
                &ConfigChange::CpuMemory {
                    num_cpus: 4,
                    cores_per_socket: 1,
                    memory_mb: 8192,
                },
            )
            .await
            .unwrap();
        client
            .reconfigure_vm(
                &vm,
                &ConfigChange::AttachNic {
                    nic_key: "4000".to_string(),
                    portgroup: PortGroup {
                        key: "dvportgroup-21".to_string(),
                        name: "pg-web".to_string(),
                        switch_uuid: "50 2a ff".to_string(),
                    },
                    start_connected: true,
                    allow_guest_control: true,
                    wake_on_lan: true,
                },
            )
            .await
            .unwrap();
        client
            .reconfigure_vm(
                &vm,
                &ConfigChange::AddDisk {
                    capacity_kb: 100 * 1024 * 1024,
                    thin: true,
                },
            )
            .await
            .unwrap();

        let sent = mock.requests("POST /VirtualMachine/vm-31/ReconfigVM_Task");
        assert_eq!(sent.len(), 3);

        let cpu = &sent[0].body["spec"];
        assert_eq!(cpu["numCPUs"], 4);
        assert_eq!(cpu["numCoresPerSocket"], 1);
        assert_eq!(cpu["memoryMB"], 8192);

        let nic = &sent[1].body["spec"]["deviceChange"][0]["device"];
        assert_eq!(nic["key"], 4000);
        assert_eq!(nic["wakeOnLanEnabled"], true);
        assert_eq!(nic["backing"]["port"]["portgroupKey"], "dvportgroup-21");
        assert_eq!(nic["backing"]["port"]["switchUuid"], "50 2a ff");
        assert_eq!(nic["connectable"]["startConnected"], true);

        let disk = &sent[2].body["spec"]["deviceChange"][0];
        assert_eq!(disk["operation"], "add");
        assert_eq!(disk["device"]["controllerKey"], 1000);
        assert_eq!(disk["device"]["unitNumber"], 1);
        assert_eq!(disk["device"]["capacityInKB"], json!(104857600u64));
    }

    #[tokio::test]
    async fn test_power_and_destroy_methods() {
        let builder = vcenter()
            .ok("POST /VirtualMachine/vm-31/PowerOnVM_Task", moref("Task", "task-1"))
            .ok("POST /VirtualMachine/vm-31/PowerOffVM_Task", moref("Task", "task-2"))
            .ok("POST /VirtualMachine/vm-31/ResetVM_Task", moref("Task", "task-3"))
            .ok("POST /VirtualMachine/vm-31/Destroy_Task", moref("Task", "task-4"));
        let (_, client) = connect(builder).await;
        let vm = ObjectRef::new("vm-31", "web01");

        assert_eq!(client.power(&vm, PowerOp::On).await.unwrap().id, "task-1");
        assert_eq!(client.power(&vm, PowerOp::Off).await.unwrap().id, "task-2");
        assert_eq!(client.power(&vm, PowerOp::Reset).await.unwrap().id, "task-3");
        let task = client.destroy_vm(&vm).await.unwrap();
        assert_eq!(task.id, "task-4");
        assert_eq!(task.description, "destroy web01");
    }

    #[tokio::test]
    async fn test_server_fault_becomes_api_error() {
        let builder = vcenter().on("POST /VirtualMachine/vm-31/PowerOnVM_Task", |_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"_typeName": "InvalidPowerState",
                       "faultMessage": [{"key": "msg", "message": "already powered on"}]}),
            )
        });
        let (_, client) = connect(builder).await;

        let err = client
            .power(&ObjectRef::new("vm-31", "web01"), PowerOp::On)
            .await
            .unwrap_err();
        assert!(matches!(err, VcError::Api(_)));
        assert!(err.to_string().contains("InvalidPowerState: already powered on"));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_storage_pod_recommendation() {
        let builder = vcenter()
            .ok(
                "POST /StorageResourceManager/StorageResourceManager/RecommendDatastores",
                json!({
                    "_typeName": "StoragePlacementResult",
                    "recommendations": [{
                        "_typeName": "ClusterRecommendation",
                        "action": [{"_typeName": "StoragePlacementAction",
                                    "destination": moref("Datastore", "datastore-12")}]
                    }]
                }),
            )
            .ok("GET /Datastore/datastore-12/name", json!("ds02"));
        let (mock, client) = connect(builder).await;

        let spec = PlacementSpec {
            storage_pod: ObjectRef::new("group-p3", "pod01"),
            folder: ObjectRef::new("group-v20", "acme"),
            resource_pool: ObjectRef::new("resgroup-8", "Resources"),
        };
        let datastore = client.recommend_datastore(&spec).await.unwrap();
        assert_eq!(datastore, ObjectRef::new("datastore-12", "ds02"));

        let sent = &mock.requests(
            "POST /StorageResourceManager/StorageResourceManager/RecommendDatastores",
        )[0]
        .body;
        assert_eq!(sent["storageSpec"]["type"], "create");
        assert_eq!(
            sent["storageSpec"]["podSelectionSpec"]["storagePod"],
            moref("StoragePod", "group-p3")
        );
        assert_eq!(sent["storageSpec"]["resourcePool"], moref("ResourcePool", "resgroup-8"));
    }

    #[tokio::test]
    async fn test_empty_recommendation_is_an_error() {
        let builder = vcenter().ok(
            "POST /StorageResourceManager/StorageResourceManager/RecommendDatastores",
            json!({"_typeName": "StoragePlacementResult"}),
        );
        let (_, client) = connect(builder).await;

        let spec = PlacementSpec {
            storage_pod: ObjectRef::new("group-p4", "empty-pod"),
            folder: ObjectRef::new("group-v20", "acme"),
            resource_pool: ObjectRef::new("resgroup-8", "Resources"),
        };
        let err = client.recommend_datastore(&spec).await.unwrap_err();
        assert!(err.to_string().contains("empty-pod"));
    }
}
