// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Pure `(task, settings, profile, platform) -> argv` translation.
//!
//! No branch here ever inspects `cfg!`/target information: every
//! platform- or profile-conditioned value comes out of the small lookup
//! tables at the bottom of this file, selected once by the caller-supplied
//! [`HostPlatform`]/[`BuildProfile`] and threaded through as data.

use crate::settings::{BuildProfile, GlobalSettings, HostPlatform};
use crate::task::{Mode, Task};

/// Build the argument vector for `task`, in the exact order a linker-
/// sensitive invocation requires. Order is part of the contract.
pub fn build_args(task: &Task, settings: &GlobalSettings, profile: BuildProfile) -> Vec<String> {
    let mut args = Vec::new();

    args.push("-o".to_string());
    args.push(task.output_path.display().to_string());
    args.push("-w".to_string());
    args.push(format!("-B{}", settings.toolchain_bin_dir().display()));
    if task.optimize {
        args.push("-O1".to_string());
    }

    match task.mode {
        Mode::Compile => build_compile_args(&mut args, task, settings, profile),
        Mode::Link => build_link_args(&mut args, task, settings, profile),
    }

    args
}

fn build_compile_args(args: &mut Vec<String>, task: &Task, settings: &GlobalSettings, profile: BuildProfile) {
    args.push("-include".to_string());
    args.push(settings.fixed_header_path().display().to_string());

    args.push("-c".to_string());
    args.push(task.input_path.display().to_string());

    args.extend(settings.header_dirs().iter().cloned());

    args.push("-nostdinc++".to_string());
    for dir in &task.extra_header_dirs {
        args.push(format!("-I{}", dir.display()));
    }

    if !task.for_runtime {
        args.push("-DGD_IDE_ONLY".to_string());
    }

    args.extend(platform_api_macros(settings.platform()));
    args.extend(profile_macros(profile).into_iter().map(str::to_string));
}

fn build_link_args(args: &mut Vec<String>, task: &Task, settings: &GlobalSettings, profile: BuildProfile) {
    args.push("-shared".to_string());
    args.push(task.input_path.display().to_string());

    for obj in &task.extra_object_paths {
        args.push(obj.display().to_string());
    }

    let base = settings.base_dir();
    if settings.platform() == HostPlatform::Windows {
        args.push(format!("-L{}", base.join("CppPlatform").join("MinGW32").join("lib").display()));
    }
    if task.for_runtime {
        args.push(format!("-L{}", base.join("Runtime").display()));
        args.push(format!(
            "-L{}",
            base.join("CppPlatform").join("Extensions").join("Runtime").display()
        ));
    } else {
        args.push(format!("-L{}", base.display()));
        args.push(format!("-L{}", base.join("CppPlatform").join("Extensions").display()));
    }

    args.push("-lgdl".to_string());
    args.push("-lstdc++".to_string());
    if !task.for_runtime {
        args.push("-lGDCore".to_string());
    }

    args.extend(sfml_libs(profile));

    for lib in &task.extra_lib_names {
        args.push(format!("-l{lib}"));
    }
}

/// `GD_CORE_API`/`GD_API`/`GD_EXTENSION_API`: Windows expands them to an
/// import attribute, other platforms leave the macro empty.
fn platform_api_macros(platform: HostPlatform) -> Vec<String> {
    let value = match platform {
        HostPlatform::Windows => "__declspec(dllimport)",
        HostPlatform::Linux | HostPlatform::MacOs => "",
    };
    ["GD_CORE_API", "GD_API", "GD_EXTENSION_API"]
        .into_iter()
        .map(|name| format!("-D{name}={value}"))
        .collect()
}

fn profile_macros(profile: BuildProfile) -> Vec<&'static str> {
    match profile {
        BuildProfile::Release => vec!["-DRELEASE", "-DNDEBUG", "-DBOOST_DISABLE_ASSERTS"],
        BuildProfile::Dev => vec!["-DDEV", "-DNDEBUG", "-DBOOST_DISABLE_ASSERTS"],
        BuildProfile::Debug => vec!["-DDEBUG"],
    }
}

fn sfml_libs(profile: BuildProfile) -> Vec<String> {
    let suffix = if matches!(profile, BuildProfile::Debug) { "-d" } else { "" };
    ["audio", "network", "graphics", "window", "system"]
        .into_iter()
        .map(|module| format!("-lsfml-{module}{suffix}"))
        .collect()
}
