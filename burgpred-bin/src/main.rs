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

// Note that clippy attributes should be in sync with those declared in "lib.rs"
#![warn(clippy::all, clippy::nursery, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate
)]
// Some from restriction lint-group
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::if_then_some_else_none,
    clippy::impl_trait_in_params,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::multiple_inherent_impl,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::separated_literal_suffix,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_to_string,
    clippy::try_err,
    clippy::unnecessary_self_imports,
    clippy::wildcard_enum_match_arm
)]

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;
use log::warn;
#[cfg(feature = "pprof")]
use pprof::protos::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;

use burgpred::config;
use burgpred::error::EvalError;
use burgpred::error::Verify;
use burgpred::eval;
use burgpred::eval::ChannelReport;
use burgpred::eval::ToneReport;

mod display;
mod source;

use display::Progress;
use source::HoundSource;

/// Prediction benchmark for Burg AR models.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// WAV files, or directories that are searched recursively for WAV files.
    #[clap(required_unless_present = "tone")]
    inputs: Vec<String>,
    /// If set, run the synthetic tone sweep instead of evaluating inputs.
    /// The config file is then read as a tone config.
    #[clap(long, conflicts_with = "inputs")]
    tone: bool,
    /// Path for the JSON-lines output. Results go to stdout if unset.
    #[clap(short, long)]
    output: Option<String>,
    /// If set, load config from the specified file.
    #[clap(short, long)]
    config: Option<String>,
    /// If set, dump the config used to the specified path.
    #[clap(long)]
    dump_config: Option<String>,
    /// Channel to evaluate in each file.
    #[clap(long, default_value_t = 0)]
    channel: usize,
    /// If set, dump profiler output to the specified path.
    #[cfg(feature = "pprof")]
    #[clap(long)]
    pprof_output: Option<String>,
}

/// Exit codes of the benchmark process.
enum ExitCode {
    #[allow(dead_code)]
    Normal = 0,
    InvalidConfig = -1,
    OutputFailed = -2,
}

/// One line of the output.
#[derive(Serialize)]
struct ResultLine<'a> {
    index: usize,
    file: String,
    report: &'a ChannelReport,
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Expands directories in `inputs` into the WAV files under them.
///
/// Files found in a directory are sorted by path. Paths that are not
/// directories are kept as they are, so that unreadable inputs are reported
/// by the evaluation loop.
fn collect_inputs<P: AsRef<Path>>(inputs: &[P]) -> Vec<PathBuf> {
    let mut files = vec![];
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(input)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && is_wav(e.path()))
                .map(walkdir::DirEntry::into_path)
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.to_path_buf());
        }
    }
    files
}

fn load_config<C>(path: Option<&str>, component: &str) -> Result<C, String>
where
    C: Default + DeserializeOwned + Verify,
{
    let config: C = match path {
        None => C::default(),
        Some(path) => {
            let conf_str = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config file \"{path}\": {e}"))?;
            toml::from_str(&conf_str).map_err(|e| format!("config file syntax error: {e}"))?
        }
    };
    config
        .verify()
        .map_err(|e| e.within(component).to_string())?;
    Ok(config)
}

#[allow(clippy::needless_pass_by_value)]
fn invalid_config(msg: String) -> i32 {
    eprintln!("Error: {msg}");
    ExitCode::InvalidConfig as i32
}

fn dump_config<C: Serialize>(config: &C, path: Option<&str>) -> Result<(), i32> {
    let Some(path) = path else {
        return Ok(());
    };
    let dumped = toml::to_string(config)
        .map_err(|e| e.to_string())
        .and_then(|s| std::fs::write(path, s).map_err(|e| e.to_string()));
    dumped.map_err(|msg| {
        eprintln!("Error: failed to dump config to \"{path}\": {msg}");
        ExitCode::OutputFailed as i32
    })
}

#[allow(clippy::let_underscore_must_use)]
fn evaluate_file(
    config: &config::Evaluation,
    path: &Path,
    channel: usize,
    io_info: &display::IoArgs,
    index: usize,
) -> Result<ChannelReport, EvalError> {
    let src = HoundSource::from_path(path)?;
    info!(
        target: "burgpred-bin::input::jsonl",
        "{{ index: {}, file: {:?}, channels: {}, sample_rate: {}, samples: {}, file_size: {:?} }}",
        index,
        path,
        src.source().channels(),
        src.source().sample_rate(),
        src.source().len(),
        src.file_size(),
    );
    let _ = display::show_progress(
        io_info,
        &Progress::Evaluating {
            index,
            path,
            duration_secs: src.duration_as_secs(),
        },
    );
    eval::evaluate_source(config, src.source(), channel)
}

/// Evaluates every file and writes one JSON line per successful file.
///
/// Returns the numbers of evaluated and skipped files. Only I/O errors on
/// `out` abort the loop.
#[allow(clippy::let_underscore_must_use)]
fn process_files<W: Write>(
    config: &config::Evaluation,
    files: &[PathBuf],
    channel: usize,
    io_info: &display::IoArgs,
    out: &mut W,
) -> std::io::Result<(usize, usize)> {
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for (index, path) in files.iter().enumerate() {
        let start = Instant::now();
        match evaluate_file(config, path, channel, io_info, index) {
            Ok(report) => {
                let line = ResultLine {
                    index,
                    file: path.to_string_lossy().to_string(),
                    report: &report,
                };
                serde_json::to_writer(&mut *out, &line)?;
                writeln!(out)?;
                succeeded += 1;
                let _ = display::show_progress(
                    io_info,
                    &Progress::Evaluated {
                        index,
                        path,
                        elapsed: start.elapsed(),
                    },
                );
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                failed += 1;
                let _ = display::show_progress(
                    io_info,
                    &Progress::Failed {
                        index,
                        path,
                        reason: e.to_string(),
                    },
                );
            }
        }
    }
    out.flush()?;
    Ok((succeeded, failed))
}

fn write_json_line<W: Write, S: Serialize>(out: &mut W, value: &S) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()
}

/// Runs the tone sweep and writes its report as a single JSON line.
fn process_tone<W: Write>(config: &config::Tone, out: &mut W) -> Result<ToneReport, String> {
    let report = eval::evaluate_tone(config).map_err(|e| e.to_string())?;
    write_json_line(out, &report).map_err(|e| format!("failed to write results: {e}"))?;
    Ok(report)
}

#[allow(clippy::let_underscore_must_use)]
fn run_tone(args: &Args, io_info: &display::IoArgs) -> Result<(), i32> {
    let tone_config: config::Tone =
        load_config(args.config.as_deref(), "tone_config").map_err(invalid_config)?;
    dump_config(&tone_config, args.dump_config.as_deref())?;

    let start = Instant::now();
    let result = match args.output {
        Some(ref path) => File::create(path)
            .map_err(|e| format!("failed to create \"{path}\": {e}"))
            .and_then(|f| process_tone(&tone_config, &mut BufWriter::new(f))),
        None => process_tone(&tone_config, &mut std::io::stdout().lock()),
    };
    let report = result.map_err(|msg| {
        eprintln!("Error: {msg}");
        ExitCode::OutputFailed as i32
    })?;
    let _ = display::show_progress(
        io_info,
        &Progress::Swept {
            cases: report.cases.len(),
            elapsed: start.elapsed(),
        },
    );
    Ok(())
}

fn log_build_constants() {
    info!(
        target: "burgpred-bin::build_info::jsonl",
        "{{ version: \"{}\", features: \"{}\", profile: \"{}\", rustc: \"{}\" }}",
        burgpred::constant::build_info::CRATE_VERSION,
        burgpred::constant::build_info::FEATURES,
        burgpred::constant::build_info::BUILD_PROFILE,
        burgpred::constant::build_info::RUSTC_VERSION,
    );
}

#[allow(clippy::let_underscore_must_use)]
fn main_body(args: Args) -> Result<(), i32> {
    let io_info = display::IoArgs::new(&args.config, &args.output);
    let _ = display::show_banner();
    log_build_constants();
    if args.tone {
        return run_tone(&args, &io_info);
    }
    let eval_config: config::Evaluation =
        load_config(args.config.as_deref(), "eval_config").map_err(invalid_config)?;
    dump_config(&eval_config, args.dump_config.as_deref())?;

    let files = collect_inputs(&args.inputs);
    let _ = display::show_progress(
        &io_info,
        &Progress::Started {
            total_files: files.len(),
        },
    );

    let start = Instant::now();
    let result = match args.output {
        Some(ref path) => File::create(path).and_then(|f| {
            process_files(
                &eval_config,
                &files,
                args.channel,
                &io_info,
                &mut BufWriter::new(f),
            )
        }),
        None => process_files(
            &eval_config,
            &files,
            args.channel,
            &io_info,
            &mut std::io::stdout().lock(),
        ),
    };
    let (succeeded, failed) = result.map_err(|e| {
        eprintln!("Error: failed to write results: {e}");
        ExitCode::OutputFailed as i32
    })?;

    let _ = display::show_progress(
        &io_info,
        &Progress::Done {
            succeeded,
            failed,
            elapsed: start.elapsed(),
        },
    );
    Ok(())
}

#[cfg(feature = "pprof")]
fn run_with_profiler_if_requested<F>(args: Args, body: F) -> Result<(), i32>
where
    F: FnOnce(Args) -> Result<(), i32>,
{
    if let Some(ref profiler_out) = args.pprof_output {
        let profiler_out = profiler_out.clone();
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(1000)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .unwrap();
        let result = body(args);
        if let Ok(report) = guard.report().build() {
            let mut file = File::create(&profiler_out).unwrap();
            let profile = report.pprof().unwrap();

            let mut content = Vec::new();
            profile.write_to_vec(&mut content).unwrap();
            file.write_all(&content).unwrap();
        };
        result
    } else {
        body(args)
    }
}

#[cfg(not(feature = "pprof"))]
#[inline]
fn run_with_profiler_if_requested<F>(args: Args, body: F) -> Result<(), i32>
where
    F: FnOnce(Args) -> Result<(), i32>,
{
    body(args)
}

fn main() -> Result<(), i32> {
    env_logger::Builder::from_env("BURGPRED_LOG")
        .format_timestamp(None)
        .init();
    run_with_profiler_if_requested(Args::parse(), main_body)
}
