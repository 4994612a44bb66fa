// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Drives a single [`compiler_service::CompilerService`] task from the
//! command line and waits for it to finish. Not part of the library's
//! public interface — a worked example of wiring up the facade.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use compiler_service::{BuildProfile, CompilerService, Event, GlobalSettings, HostPlatform, Mode, Observer, SceneRef, Task};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Compile,
    Link,
}

#[derive(Debug, Parser)]
#[command(about = "Submit one compile/link task to compiler-service and print the result")]
struct Cli {
    /// Toolchain root; header dirs and the compiler binary are resolved
    /// relative to this.
    #[clap(long, env = "COMPILE_SHELL_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Directory object/binary outputs are written to.
    #[clap(long, env = "COMPILE_SHELL_OUTPUT_DIR", default_value = "./out")]
    output_dir: PathBuf,

    #[clap(long, value_enum, default_value_t = CliHostPlatform::Linux)]
    platform: CliHostPlatform,

    #[clap(long, value_enum, default_value_t = CliBuildProfile::Debug)]
    profile: CliBuildProfile,

    #[clap(value_enum)]
    mode: CliMode,

    input: PathBuf,
    output: PathBuf,

    #[clap(long, default_value_t = 0)]
    scene: u64,

    #[clap(long)]
    optimize: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliHostPlatform {
    Windows,
    Linux,
    Macos,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBuildProfile {
    Debug,
    Dev,
    Release,
}

// `mpsc::Sender` is `Send` but not `Sync`; `Observer` requires both.
struct ChannelObserver(parking_lot::Mutex<mpsc::Sender<Event>>);

impl Observer for ChannelObserver {
    fn notify(&self, event: &Event) {
        self.0.lock().send(event.clone()).ok();
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let platform = match cli.platform {
        CliHostPlatform::Windows => HostPlatform::Windows,
        CliHostPlatform::Linux => HostPlatform::Linux,
        CliHostPlatform::Macos => HostPlatform::MacOs,
    };
    let profile = match cli.profile {
        CliBuildProfile::Debug => BuildProfile::Debug,
        CliBuildProfile::Dev => BuildProfile::Dev,
        CliBuildProfile::Release => BuildProfile::Release,
    };
    let mode = match cli.mode {
        CliMode::Compile => Mode::Compile,
        CliMode::Link => Mode::Link,
    };

    let mut settings = GlobalSettings::new(platform, cli.base_dir, cli.output_dir.clone());
    if let Err(err) = settings.set_output_dir(cli.output_dir) {
        eprintln!("failed to prepare output directory: {err}");
        return ExitCode::FAILURE;
    }

    let service = CompilerService::new(settings, profile);
    let (tx, rx) = mpsc::channel();
    service.subscribe(Arc::new(ChannelObserver(parking_lot::Mutex::new(tx))));

    let scene = SceneRef::new(cli.scene);
    let task = Task::new(scene, mode, cli.input, cli.output).with_optimize(cli.optimize);
    service.add_task(task);

    loop {
        match rx.recv() {
            Ok(Event::Finished { scene: s, succeeded, messages }) if s == scene => {
                if !messages.is_empty() {
                    println!("{messages}");
                }
                return if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE };
            }
            Ok(_) => continue,
            Err(_) => {
                eprintln!("compiler-service shut down before the task finished");
                return ExitCode::FAILURE;
            }
        }
    }
}
