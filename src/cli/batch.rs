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

use super::display::{BatchOutcome, TableRenderer};
use super::session::provision;
use crate::domain::batch::BatchDescriptor;
use crate::domain::inventory::VcenterInventory;
use crate::shared::error::VcError;
use chrono::Local;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

/// Replay a batch file: summary, confirmation, then clone + reconfigure per
/// entry. Returns one outcome per replayed entry; empty when not confirmed.
pub async fn run_batch(
    inventory: &VcenterInventory,
    file: &Path,
    renderer: &TableRenderer,
    assume_yes: bool,
) -> Result<Vec<BatchOutcome>, VcError> {
    let descriptor = BatchDescriptor::from_file(file)?;
    let entries = descriptor.resolve(inventory.default_datastore());

    println!("{}", renderer.render_batch_plan(&entries));
    if !assume_yes && !confirm(&format!("Clone {} vms? [y/N] ", entries.len()))? {
        println!("Aborted");
        return Ok(Vec::new());
    }

    let mut outcomes = Vec::with_capacity(entries.len());
    for entry in entries {
        let result = match entry.plan {
            Ok(plan) => provision(inventory, &plan.request, &plan.settings).await,
            Err(e) => {
                println!("{}", format!("Skipping {}: {}", entry.name, e).yellow());
                Err(e)
            }
        };

        if let Err(e) = &result {
            warn!(vm = %entry.name, error = %e, "batch entry failed");
        }
        outcomes.push(BatchOutcome {
            name: entry.name,
            error: result.err().map(|e| e.to_string()),
            finished_at: Local::now(),
        });
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    info!(total = outcomes.len(), failed, "batch finished");
    println!("{}", renderer.render_batch_report(&outcomes));
    Ok(outcomes)
}

fn confirm(prompt: &str) -> Result<bool, VcError> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_confirmation(&answer))
}

/// `y` or `yes`, any case
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
