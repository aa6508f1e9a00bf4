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

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vcenter_shell::cli::commands::{is_unknown_verb, parse_line};
use vcenter_shell::cli::{run_shell, Backend, CliArgs, ShellSession};
use vcenter_shell::domain::config::{apply_to_shell_config, parse_properties};
use vcenter_shell::{Credentials, ShellConfig, SimulatedVsphere};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => ShellConfig::from_file(path)?,
        None => ShellConfig::default(),
    };
    if !args.properties.is_empty() {
        let overrides = parse_properties(&args.properties)
            .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
        apply_to_shell_config(&overrides, &mut config);
        config.validate()?;
    }

    let backend = match &args.inventory {
        Some(path) => {
            let client = SimulatedVsphere::from_file(path)
                .with_context(|| format!("loading inventory {}", path.display()))?;
            // the credentials file is optional here; it only supplies VC_DATASTORE
            let default_datastore = Credentials::from_file(&args.credentials)
                .ok()
                .and_then(|c| c.datastore);
            Backend::Simulated {
                client: Arc::new(client),
                default_datastore,
            }
        }
        None => Backend::Live {
            credentials: args.credentials.clone(),
        },
    };
    let mut session = ShellSession::new(backend, config).assume_yes(args.yes);

    if !args.command.is_empty() {
        let command = parse_line(&args.command).map_err(|e| {
            if is_unknown_verb(&e) {
                anyhow::anyhow!("{}: Command not found", args.command.join(" "))
            } else {
                anyhow::anyhow!("{}", e)
            }
        })?;
        if command.needs_session() {
            session.connect().await?;
        }
        session.execute(command).await?;
        return Ok(());
    }

    if args.connect {
        println!("Connecting to vcenter...");
        session.connect().await?;
        println!("Connected");
    }
    run_shell(&mut session).await?;
    Ok(())
}
