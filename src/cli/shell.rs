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

//! Interactive shell

use super::commands::verb_names;
use super::session::{Flow, ShellSession};
use crate::shared::error::VcError;
use colored::Colorize;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{error::ReadlineError, history::FileHistory, Editor};
use rustyline_derive::Helper;
use tracing::{debug, warn};

const INTRO: &str = "####\n#### Welcome to vcenter shell. Type help to list commands. ####\n####";

#[derive(Helper)]
struct ShellHelper {
    completer: FilenameCompleter,
    verbs: Vec<String>,
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let words: Vec<&str> = line.split_whitespace().collect();

        if words.is_empty() || (words.len() == 1 && !line.ends_with(' ')) {
            let prefix = words.first().copied().unwrap_or("");
            let matches: Vec<Pair> = self
                .verbs
                .iter()
                .filter(|verb| verb.starts_with(prefix))
                .map(|verb| Pair {
                    display: verb.clone(),
                    replacement: verb.clone(),
                })
                .collect();

            if !matches.is_empty() {
                return Ok((0, matches));
            }
        }

        // batch files for clone-from-file
        self.completer.complete(line, pos, ctx)
    }
}

impl Highlighter for ShellHelper {}
impl Hinter for ShellHelper {
    type Hint = String;
}
impl Validator for ShellHelper {}

/// Read-eval loop until `exit`, end of input or a fatal error
pub async fn run_shell(session: &mut ShellSession) -> Result<(), VcError> {
    println!("{}", INTRO);

    let helper = ShellHelper {
        completer: FilenameCompleter::new(),
        verbs: verb_names(),
    };

    let history_path = session.config().history_path();
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let mut rl: Editor<ShellHelper, FileHistory> = Editor::new()?;
    rl.set_helper(Some(helper));
    if rl.load_history(&history_path).is_err() {
        debug!(path = %history_path.display(), "no previous history");
    }

    let prompt = session.config().prompt.clone();
    let result = loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match session.run_line(line).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit) => break Ok(()),
                    Err(e) if e.is_fatal() => {
                        eprintln!("{} {}", "Error:".red().bold(), e);
                        break Err(e);
                    }
                    Err(e) => eprintln!("{} {}", "Error:".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' to quit");
            }
            Err(ReadlineError::Eof) => {
                println!("Exiting...");
                break Ok(());
            }
            Err(err) => break Err(err.into()),
        }
    };

    if let Err(e) = rl.save_history(&history_path) {
        warn!(path = %history_path.display(), error = %e, "failed to save history");
    }
    result
}
