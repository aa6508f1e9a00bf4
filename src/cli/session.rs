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

use super::batch::run_batch;
use super::commands::{help_text, is_unknown_verb, parse_line, CloneArgs, ShellCommand};
use super::display::TableRenderer;
use crate::domain::config::{Credentials, ShellConfig};
use crate::domain::inventory::{CloneRequest, PowerOutcome, VcenterInventory, VmSettings};
use crate::infrastructure::vsphere::SimulatedVsphere;
use crate::shared::error::VcError;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Where `connect` gets its vCenter session from
pub enum Backend {
    /// vSphere REST API, using the credentials file
    Live { credentials: PathBuf },
    /// In-memory inventory snapshot
    Simulated {
        client: Arc<SimulatedVsphere>,
        default_datastore: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// State of one shell invocation: settings plus the optional session
pub struct ShellSession {
    backend: Backend,
    config: ShellConfig,
    inventory: Option<VcenterInventory>,
    renderer: TableRenderer,
    assume_yes: bool,
}

impl ShellSession {
    pub fn new(backend: Backend, config: ShellConfig) -> Self {
        Self {
            backend,
            config,
            inventory: None,
            renderer: TableRenderer::new(),
            assume_yes: false,
        }
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.inventory.is_some()
    }

    pub fn inventory(&self) -> Result<&VcenterInventory, VcError> {
        self.inventory.as_ref().ok_or(VcError::NotConnected)
    }

    /// Open a session, replacing any existing one
    pub async fn connect(&mut self) -> Result<(), VcError> {
        if let Some(previous) = self.inventory.take() {
            previous.disconnect().await?;
        }

        let inventory = match &self.backend {
            Backend::Live { credentials } => {
                let credentials = Credentials::from_file(credentials)?;
                info!(host = %credentials.host, user = %credentials.user, "connecting");
                VcenterInventory::connect(&credentials, self.config.clone()).await?
            }
            Backend::Simulated {
                client,
                default_datastore,
            } => VcenterInventory::new(client.clone(), self.config.clone())
                .with_default_datastore(default_datastore.clone()),
        };
        self.inventory = Some(inventory);
        Ok(())
    }

    /// Parse and run one line typed at the prompt. Parse problems are printed,
    /// never returned.
    pub async fn run_line(&mut self, line: &str) -> Result<Flow, VcError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        match parse_line(words.iter().copied()) {
            Ok(command) => self.execute(command).await,
            Err(e) if is_unknown_verb(&e) => {
                println!("{}: Command not found", line.trim());
                Ok(Flow::Continue)
            }
            Err(e) => {
                print!("{}", e);
                Ok(Flow::Continue)
            }
        }
    }

    pub async fn execute(&mut self, command: ShellCommand) -> Result<Flow, VcError> {
        debug!(?command, "executing");
        match command {
            ShellCommand::Connect => {
                println!("Connecting to vcenter...");
                self.connect().await?;
                println!("{}", "Connected".green());
            }
            ShellCommand::Disconnect => match self.inventory.take() {
                Some(inventory) => {
                    inventory.disconnect().await?;
                    println!("Disconnected");
                }
                None => println!("Not connected"),
            },
            ShellCommand::ListClusters => {
                let clusters = self.inventory()?.list_clusters().await?;
                println!("{}", self.renderer.render_clusters(&clusters));
            }
            ShellCommand::ListDatastores => {
                let datastores = self.inventory()?.list_datastores().await?;
                println!("{}", self.renderer.render_datastores(&datastores));
            }
            ShellCommand::ListTenants => {
                let tenants = self.inventory()?.list_tenants().await?;
                println!("{}", self.renderer.render_numbered("TENANT", &tenants));
            }
            ShellCommand::ListVms { tenant } => {
                let entries = self.inventory()?.list_vms(&tenant).await?;
                println!("{}", self.renderer.render_vms(&tenant, &entries));
            }
            ShellCommand::ListTemplates => {
                let templates = self.inventory()?.list_templates().await?;
                println!("{}", self.renderer.render_templates(&templates));
            }
            ShellCommand::FindVm { name } => match self.inventory()?.find_vm(&name).await? {
                Some(vm) => println!("{}", self.renderer.render_vm(&vm)),
                None => println!("No vm with {} name found", name),
            },
            ShellCommand::ListSwitches => {
                let switches = self.inventory()?.list_switches().await?;
                println!("{}", self.renderer.render_numbered("SWITCH", &switches));
            }
            ShellCommand::SwitchInfo { name } => {
                match self.inventory()?.switch_info(&name).await? {
                    Some(switch) => println!("{}", self.renderer.render_switch(&switch)),
                    None => println!("No dvs with such name found"),
                }
            }
            ShellCommand::Clone(args) => {
                let (request, settings) = clone_plan(args);
                provision(self.inventory()?, &request, &settings).await?;
            }
            ShellCommand::CloneFromFile { file } => {
                run_batch(self.inventory()?, &file, &self.renderer, self.assume_yes).await?;
            }
            ShellCommand::Reconfigure {
                name,
                cpu,
                ram,
                hdd,
                portgroup,
            } => {
                let settings = VmSettings {
                    cpu,
                    ram_gb: ram,
                    hdd_gb: hdd,
                    portgroup,
                };
                println!("Changing {} settings...", name);
                self.inventory()?.reconfigure_vm(&name, &settings).await?;
                println!("{}", "Completed".green());
            }
            ShellCommand::AddDisk { name, size_gb } => {
                println!("Adding {} GB disk to {}...", size_gb, name);
                self.inventory()?.add_disk(&name, size_gb).await?;
                println!("{}", "Completed".green());
            }
            ShellCommand::StartVm { name } => {
                let outcome = self.inventory()?.start_vm(&name).await?;
                report_power(&name, outcome, "Started!");
            }
            ShellCommand::StopVm { name } => {
                let outcome = self.inventory()?.stop_vm(&name).await?;
                report_power(&name, outcome, "Stopped!");
            }
            ShellCommand::ResetVm { name } => {
                let outcome = self.inventory()?.reset_vm(&name).await?;
                report_power(&name, outcome, "Done!");
            }
            ShellCommand::RemoveVm { name } => {
                println!("Destroying {}...", name);
                let outcome = self.inventory()?.remove_vm(&name).await?;
                if outcome.powered_off_first {
                    println!("{} was powered off first", name);
                }
                println!("{}", "Done!".green());
            }
            ShellCommand::VmInfo { name } => {
                let vm = self.inventory()?.vm_info(&name).await?;
                println!("{}", self.renderer.render_vm_info(&vm));
            }
            ShellCommand::Help => {
                println!("{}", help_text());
            }
            ShellCommand::Exit => {
                println!("Exiting...");
                return Ok(Flow::Exit);
            }
            ShellCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                std::io::stdout().flush()?;
            }
        }
        Ok(Flow::Continue)
    }
}

fn clone_plan(args: CloneArgs) -> (CloneRequest, VmSettings) {
    (
        CloneRequest {
            name: args.name,
            template: args.template,
            tenant: args.tenant,
            cluster: args.cluster,
            datastore: Some(args.datastore),
            power_on: false,
        },
        VmSettings {
            cpu: args.cpu,
            ram_gb: args.ram,
            hdd_gb: args.hdd,
            portgroup: args.portgroup,
        },
    )
}

/// Clone, then apply settings. A failed clone skips the settings step.
pub(crate) async fn provision(
    inventory: &VcenterInventory,
    request: &CloneRequest,
    settings: &VmSettings,
) -> Result<(), VcError> {
    println!("Cloning {} to {}...", request.template, request.name);
    if let Err(e) = inventory.clone_vm(request).await {
        println!("{}", format!("Could not clone {}", request.name).red());
        return Err(e);
    }
    println!("{}", "Completed".green());

    println!("Changing {} settings...", request.name);
    if let Err(e) = inventory.reconfigure_vm(&request.name, settings).await {
        println!(
            "{}",
            format!("Could not change settings of {}", request.name).red()
        );
        return Err(e);
    }
    println!("{}", "Completed".green());
    Ok(())
}

fn report_power(name: &str, outcome: PowerOutcome, done: &str) {
    match outcome {
        PowerOutcome::Changed(_) => println!("{} {}", name, done.green()),
        PowerOutcome::AlreadyInState(state) => {
            println!("{} is already {}", name, state.to_string().yellow())
        }
    }
}
