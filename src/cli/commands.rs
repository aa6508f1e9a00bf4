// CLI command definitions

use crate::infrastructure::constants::DEFAULT_CREDENTIALS_FILE;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vcsh",
    version,
    about = "Interactive shell for VMware vCenter",
    long_about = "List and manage vCenter inventory: clusters, datastores, tenants, VMs and \
                  templates. Clone VMs from templates one by one or from a batch file.\n\n\
                  Without a command the interactive shell is started."
)]
pub struct CliArgs {
    /// Credentials file (JSON, or TOML by extension) with VC_HOST, VC_USER, VC_PASS, VC_PORT
    #[arg(long, default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials: PathBuf,

    /// Shell settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve commands from a local inventory snapshot (YAML) instead of vCenter
    #[arg(long)]
    pub inventory: Option<PathBuf>,

    /// Connect at startup
    #[arg(long)]
    pub connect: bool,

    /// Settings overrides (format: key=value, can be specified multiple times)
    /// Examples: -D task.timeout-secs=600 -D inventory.tenants-folder=Customers
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Answer yes to batch confirmations
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Run a single shell command and exit, e.g. `vcsh list-tenants`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// One line typed at the shell prompt
#[derive(Parser, Debug)]
#[command(
    name = "vcsh",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Connect to the vCenter API
    #[command(alias = "connect_to_api")]
    Connect,

    /// Close the vCenter session
    Disconnect,

    /// List clusters with cpu, memory, host count and status
    #[command(alias = "list_clusters")]
    ListClusters,

    /// List datastores with capacity and free space
    #[command(alias = "list_datastores")]
    ListDatastores,

    /// List tenants (sub-folders of the tenants folder)
    #[command(alias = "list_tenants")]
    ListTenants,

    /// List VMs, templates and folders of a tenant
    #[command(alias = "list_vms")]
    ListVms { tenant: String },

    /// List templates at any depth of the templates folder
    #[command(alias = "list_templates")]
    ListTemplates,

    /// Find a VM by name
    #[command(alias = "find_vm")]
    FindVm { name: String },

    /// List distributed switches
    #[command(aliases = ["list_dvs", "list-dvs", "list_switches"])]
    ListSwitches,

    /// Show the port groups of a distributed switch
    #[command(aliases = ["dvs_info", "dvs-info", "switch_info"])]
    SwitchInfo { name: String },

    /// Clone a VM from a template, then apply cpu/ram/disk/port group
    Clone(CloneArgs),

    /// Clone every VM described in a batch file (YAML or TOML)
    #[command(alias = "clone_from_file")]
    CloneFromFile { file: PathBuf },

    /// Change cpu, ram (GB), first disk size (GB) and port group of a VM
    Reconfigure {
        name: String,
        cpu: u32,
        ram: u64,
        hdd: u64,
        portgroup: String,
    },

    /// Add a thin-provisioned disk to a VM
    #[command(alias = "add_disk")]
    AddDisk { name: String, size_gb: u64 },

    /// Power on a VM
    #[command(alias = "start_vm")]
    StartVm { name: String },

    /// Power off a VM
    #[command(alias = "stop_vm")]
    StopVm { name: String },

    /// Reset a running VM
    #[command(alias = "reset_vm")]
    ResetVm { name: String },

    /// Power off (if needed) and destroy a VM
    #[command(alias = "remove_vm")]
    RemoveVm { name: String },

    /// Show hardware and configuration of a VM
    #[command(alias = "vm_info")]
    VmInfo { name: String },

    /// Show available commands
    Help,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,

    /// Clear the screen
    Clear,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct CloneArgs {
    pub name: String,
    pub template: String,
    pub tenant: String,
    pub cluster: String,
    /// Storage pod or datastore
    pub datastore: String,
    pub cpu: u32,
    /// Memory in GB
    pub ram: u64,
    /// First disk size in GB
    pub hdd: u64,
    pub portgroup: String,
}

impl ShellCommand {
    /// Whether the command talks to vCenter
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            ShellCommand::Connect
                | ShellCommand::Disconnect
                | ShellCommand::Help
                | ShellCommand::Exit
                | ShellCommand::Clear
        )
    }
}

/// Parse the words of one shell line into a command
pub fn parse_line<I, T>(words: I) -> Result<ShellCommand, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    ShellLine::try_parse_from(words).map(|line| line.command)
}

/// Whether a parse error means the verb itself is unknown
pub fn is_unknown_verb(err: &clap::Error) -> bool {
    err.kind() == clap::error::ErrorKind::InvalidSubcommand
}

/// Primary verb names, for completion
pub fn verb_names() -> Vec<String> {
    ShellLine::command()
        .get_subcommands()
        .map(|c| c.get_name().to_string())
        .collect()
}

pub fn help_text() -> String {
    ShellLine::command()
        .help_template("Commands:\n{subcommands}")
        .render_help()
        .to_string()
}
