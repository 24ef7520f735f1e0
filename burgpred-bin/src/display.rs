// Copyright 2025- burgpred developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A module for a fancy output for "burgpred-bin".

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use termcolor::Color;
use termcolor::ColorChoice;
use termcolor::ColorSpec;
use termcolor::StandardStream;
use termcolor::WriteColor;

const CRATE_VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
    Some(v) => v,
    None => "unknown",
};
const DEFAULT_CONFIG_NAME: &str = "[default]";
const UNKNOWN_CONFIG_NAME: &str = "[unknown]";
const UNKNOWN_INPUT_NAME: &str = "[unknown]";
const STDOUT_NAME: &str = "[stdout]";

pub struct IoArgs {
    config_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

impl IoArgs {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        config_path: &Option<P>,
        output_path: &Option<Q>,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().map(|x| x.as_ref().to_path_buf()),
            output_path: output_path.as_ref().map(|x| x.as_ref().to_path_buf()),
        }
    }

    pub fn output_name(&self) -> String {
        self.output_path.as_ref().map_or_else(
            || STDOUT_NAME.to_owned(),
            |p| {
                p.file_name().map_or_else(
                    || UNKNOWN_INPUT_NAME.to_owned(),
                    |s| s.to_string_lossy().to_string(),
                )
            },
        )
    }

    pub fn config_name(&self) -> String {
        self.config_path.as_ref().map_or_else(
            || DEFAULT_CONFIG_NAME.to_owned(),
            |p| {
                p.file_stem().map_or_else(
                    || UNKNOWN_CONFIG_NAME.to_owned(),
                    |n| n.to_string_lossy().to_string(),
                )
            },
        )
    }
}

fn input_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || UNKNOWN_INPUT_NAME.to_owned(),
        |s| s.to_string_lossy().to_string(),
    )
}

pub enum Progress<'a> {
    Started {
        total_files: usize,
    },
    Evaluating {
        index: usize,
        path: &'a Path,
        duration_secs: f32,
    },
    Evaluated {
        index: usize,
        path: &'a Path,
        elapsed: Duration,
    },
    Failed {
        index: usize,
        path: &'a Path,
        reason: String,
    },
    Done {
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    },
    Swept {
        cases: usize,
        elapsed: Duration,
    },
}

fn terminal_output() -> Arc<termcolor::StandardStream> {
    Arc::new(StandardStream::stderr(ColorChoice::Auto))
}

/// Show the initial banner.
pub fn show_banner() -> Result<(), std::io::Error> {
    let termout = terminal_output();
    let mut termout = termout.lock();
    termout.set_color(ColorSpec::new().set_bold(true))?;
    write!(termout, "\n{:>10} ", "burgpred")?;
    termout.reset()?;
    writeln!(
        termout,
        "(engine v{}, CLI v{})",
        burgpred::constant::build_info::CRATE_VERSION,
        CRATE_VERSION
    )
}

fn write_status<W: WriteColor>(termout: &mut W, color: Color, status: &str) -> std::io::Result<()> {
    termout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(termout, "{status:>10} ")?;
    termout.reset()
}

pub fn show_progress(io: &IoArgs, progress: &Progress) -> Result<(), std::io::Error> {
    let termout = terminal_output();
    let mut termout = termout.lock();
    match progress {
        Progress::Started { total_files } => {
            write_status(&mut termout, Color::Cyan, "Starting")?;
            writeln!(
                termout,
                "{} file(s) => {} [{}]",
                total_files,
                io.output_name(),
                io.config_name()
            )
        }
        Progress::Evaluating {
            index,
            path,
            duration_secs,
        } => {
            write_status(&mut termout, Color::Cyan, "Evaluating")?;
            writeln!(
                termout,
                "#{} {} [{:.1} secs]",
                index,
                input_name(path),
                duration_secs
            )
        }
        Progress::Evaluated {
            index,
            path,
            elapsed,
        } => {
            write_status(&mut termout, Color::Green, "Evaluated")?;
            writeln!(
                termout,
                "#{} {} in {:.2} secs",
                index,
                input_name(path),
                elapsed.as_secs_f32()
            )
        }
        Progress::Failed {
            index,
            path,
            reason,
        } => {
            write_status(&mut termout, Color::Red, "Skipped")?;
            writeln!(termout, "#{} {}: {}", index, input_name(path), reason)
        }
        Progress::Done {
            succeeded,
            failed,
            elapsed,
        } => {
            write_status(&mut termout, Color::Green, "Finished")?;
            writeln!(
                termout,
                "{} evaluated, {} skipped in {:.2} secs",
                succeeded,
                failed,
                elapsed.as_secs_f32()
            )?;
            writeln!(termout)
        }
        Progress::Swept { cases, elapsed } => {
            write_status(&mut termout, Color::Green, "Finished")?;
            writeln!(
                termout,
                "{} tone case(s) => {} [{}] in {:.2} secs",
                cases,
                io.output_name(),
                io.config_name(),
                elapsed.as_secs_f32()
            )?;
            writeln!(termout)
        }
    }
}
