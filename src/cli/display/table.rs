//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::batch::BatchEntry;
use crate::domain::inventory::FolderEntry;
use crate::infrastructure::constants::{GB, KB_PER_GB};
use crate::infrastructure::vsphere::types::{
    ClusterSummary, DatastoreSummary, SwitchSummary, VmDetails,
};
use chrono::{DateTime, Local};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::collections::BTreeMap;

/// Result of replaying one batch entry
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub name: String,
    pub error: Option<String>,
    pub finished_at: DateTime<Local>,
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).set_alignment(CellAlignment::Left))
                .collect::<Vec<_>>(),
        );
    table
}

fn title(name: &str, count: usize, unit: &str) -> String {
    format!(
        "╭─ {} {} ─╮\n",
        name,
        format!("[{} {}]", count, unit).bright_black()
    )
}

fn gb(bytes: u64) -> String {
    format!("{:.0}", bytes as f64 / GB as f64)
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    pub fn render_clusters(&self, clusters: &[ClusterSummary]) -> String {
        if clusters.is_empty() {
            return "No clusters found".to_string();
        }

        let mut sorted: Vec<&ClusterSummary> = clusters.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut table = new_table(&["NAME", "CPU", "THREADS", "MEMORY (GB)", "HOSTS", "STATUS"]);
        for cluster in sorted {
            table.add_row(vec![
                Cell::new(&cluster.name),
                Cell::new(or_dash(cluster.cpu_cores)),
                Cell::new(or_dash(cluster.cpu_threads)),
                Cell::new(or_dash(cluster.total_memory_bytes.map(gb))),
                Cell::new(cluster.num_hosts),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::status_icon(cluster.overall_status),
                    cluster.overall_status
                ))
                .fg(self.theme.status_color(cluster.overall_status)),
            ]);
        }

        let mut output = title("Clusters", clusters.len(), "clusters");
        output.push_str(&table.to_string());
        output
    }

    pub fn render_datastores(&self, datastores: &[DatastoreSummary]) -> String {
        if datastores.is_empty() {
            return "No datastores found".to_string();
        }

        let mut sorted: Vec<&DatastoreSummary> = datastores.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut table = new_table(&["NAME", "CAPACITY (GB)", "FREE (GB)", "STATUS"]);
        for ds in sorted {
            table.add_row(vec![
                Cell::new(&ds.name),
                Cell::new(gb(ds.capacity_bytes)),
                Cell::new(gb(ds.free_space_bytes))
                    .fg(self.theme.free_space_color(ds.free_space_bytes, ds.capacity_bytes)),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::status_icon(ds.overall_status),
                    ds.overall_status
                ))
                .fg(self.theme.status_color(ds.overall_status)),
            ]);
        }

        let mut output = title("Datastores", datastores.len(), "datastores");
        output.push_str(&table.to_string());
        output
    }

    /// Numbered list, starting at 1
    pub fn render_numbered(&self, heading: &str, names: &[String]) -> String {
        if names.is_empty() {
            return format!("No {} found", heading.to_lowercase());
        }
        let mut table = new_table(&["#", heading]);
        for (i, name) in names.iter().enumerate() {
            table.add_row(vec![Cell::new(i + 1).fg(self.theme.muted), Cell::new(name)]);
        }
        table.to_string()
    }

    /// Children of a tenant folder, sorted by name
    pub fn render_vms(&self, tenant: &str, entries: &[FolderEntry]) -> String {
        if entries.is_empty() {
            return format!("Tenant '{}' is empty", tenant);
        }

        let mut sorted: Vec<&FolderEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.name().cmp(b.name()));

        let mut table = new_table(&[
            "", "NAME", "CPU", "RAM (MB)", "DISKS (GB)", "DATASTORE", "MAC", "NETWORK", "POWER",
        ]);
        for entry in sorted {
            match entry {
                FolderEntry::Folder(name) => {
                    table.add_row(vec![
                        Cell::new(StatusIcon::entry_kind(true, false)).fg(self.theme.info),
                        Cell::new(name).fg(self.theme.info),
                    ]);
                }
                FolderEntry::Vm(vm) => {
                    table.add_row(self.vm_row(vm));
                }
            }
        }

        let mut output = title(&format!("Tenant {}", tenant), entries.len(), "entries");
        output.push_str(&table.to_string());
        output
    }

    /// Single-row table in the `list-vms` layout
    pub fn render_vm(&self, vm: &VmDetails) -> String {
        let mut table = new_table(&[
            "", "NAME", "CPU", "RAM (MB)", "DISKS (GB)", "DATASTORE", "MAC", "NETWORK", "POWER",
        ]);
        table.add_row(self.vm_row(vm));
        table.to_string()
    }

    fn vm_row(&self, vm: &VmDetails) -> Vec<Cell> {
        let disks = vm
            .disks
            .iter()
            .map(|d| (d.capacity_kb / KB_PER_GB).to_string())
            .collect::<Vec<_>>()
            .join(",");
        vec![
            Cell::new(StatusIcon::entry_kind(false, vm.template)),
            Cell::new(&vm.name),
            Cell::new(vm.num_cpu),
            Cell::new(vm.memory_mb),
            Cell::new(disks),
            Cell::new(vm.datastore()),
            Cell::new(vm.mac_addresses().join("\n")),
            Cell::new(vm.networks().join("\n")),
            Cell::new(format!(
                "{} {}",
                StatusIcon::power_icon(vm.power_state),
                vm.power_state
            ))
            .fg(self.theme.power_color(vm.power_state)),
        ]
    }

    pub fn render_templates(&self, templates: &BTreeMap<String, String>) -> String {
        if templates.is_empty() {
            return "No templates found".to_string();
        }
        let mut table = new_table(&["", "NAME", "GUEST"]);
        for (name, guest) in templates {
            table.add_row(vec![
                Cell::new(StatusIcon::entry_kind(false, true)),
                Cell::new(name),
                Cell::new(guest).fg(self.theme.muted),
            ]);
        }
        let mut output = title("Templates", templates.len(), "templates");
        output.push_str(&table.to_string());
        output
    }

    /// Hardware and configuration of one VM as key/value rows
    pub fn render_vm_info(&self, vm: &VmDetails) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let disks = vm
            .disks
            .iter()
            .map(|d| format!("{}: {} GB", d.key, d.capacity_kb / KB_PER_GB))
            .collect::<Vec<_>>()
            .join("\n");
        let nics = vm
            .nics
            .iter()
            .map(|n| {
                format!(
                    "{} -> {}",
                    n.mac_address,
                    n.network.as_deref().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let rows: Vec<(&str, Cell)> = vec![
            ("Name", Cell::new(&vm.name)),
            (
                "Power",
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::power_icon(vm.power_state),
                    vm.power_state
                ))
                .fg(self.theme.power_color(vm.power_state)),
            ),
            ("Template", Cell::new(if vm.template { "yes" } else { "no" })),
            ("Guest", Cell::new(&vm.guest_full_name)),
            ("CPU", Cell::new(vm.num_cpu)),
            ("Cores per socket", Cell::new(vm.cores_per_socket)),
            ("Memory (MB)", Cell::new(vm.memory_mb)),
            ("Disks", Cell::new(disks)),
            ("Network", Cell::new(nics)),
            ("Datastore", Cell::new(vm.datastore())),
            ("Path", Cell::new(&vm.vm_path_name).fg(self.theme.muted)),
        ];
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key).fg(self.theme.info), value]);
        }
        table.to_string()
    }

    pub fn render_switch(&self, switch: &SwitchSummary) -> String {
        let mut table = new_table(&["PORT GROUP"]);
        for pg in &switch.portgroups {
            table.add_row(vec![Cell::new(pg)]);
        }
        let mut output = format!(
            "{} {}\n",
            switch.name.bold(),
            format!("({})", switch.uuid).bright_black()
        );
        output.push_str(&table.to_string());
        output
    }

    /// Confirmation summary shown before a batch is replayed
    pub fn render_batch_plan(&self, entries: &[BatchEntry]) -> String {
        let mut table = new_table(&[
            "NAME", "TEMPLATE", "TENANT", "CLUSTER", "DATASTORE", "CPU", "RAM", "HDD", "PORT GROUP",
        ]);
        for entry in entries {
            match &entry.plan {
                Ok(plan) => {
                    table.add_row(vec![
                        Cell::new(&plan.request.name),
                        Cell::new(&plan.request.template),
                        Cell::new(&plan.request.tenant),
                        Cell::new(&plan.request.cluster),
                        Cell::new(plan.request.datastore.as_deref().unwrap_or("-")),
                        Cell::new(plan.settings.cpu),
                        Cell::new(plan.settings.ram_gb),
                        Cell::new(plan.settings.hdd_gb),
                        Cell::new(&plan.settings.portgroup),
                    ]);
                }
                Err(e) => {
                    table.add_row(vec![
                        Cell::new(&entry.name).fg(Color::Red),
                        Cell::new(format!("{} {}", StatusIcon::ERROR, e)).fg(Color::Red),
                    ]);
                }
            }
        }

        let mut output = title("Batch", entries.len(), "vms");
        output.push_str(&table.to_string());
        output
    }

    pub fn render_batch_report(&self, outcomes: &[BatchOutcome]) -> String {
        let mut table = new_table(&["NAME", "RESULT", "FINISHED"]);
        for outcome in outcomes {
            let result = match &outcome.error {
                None => Cell::new(format!("{} Completed", StatusIcon::SUCCESS))
                    .fg(self.theme.success),
                Some(e) => Cell::new(format!("{} {}", StatusIcon::ERROR, e)).fg(self.theme.error),
            };
            table.add_row(vec![
                Cell::new(&outcome.name),
                result,
                Cell::new(outcome.finished_at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .fg(self.theme.muted),
            ]);
        }

        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "{} succeeded, {} failed\n",
            (outcomes.len() - failed).to_string().green(),
            failed.to_string().red()
        ));
        output
    }
}
