// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Service-wide settings and the platform/build-profile tables
//! [`ArgumentBuilder`](crate::argbuilder) reads from.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Host platform the bundled toolchain targets.
///
/// Selected once, at [`crate::CompilerService`] construction. [`crate::argbuilder`]
/// never branches on `cfg!`/conditional compilation — it only ever matches
/// on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Windows,
    Linux,
    MacOs,
}

/// Build profile the bundled toolchain was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    Debug,
    Dev,
    Release,
}

/// Toolchain paths, output location, and the include-directory set used to
/// build compiler/linker argument vectors.
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    platform: HostPlatform,
    base_dir: PathBuf,
    output_dir: PathBuf,
    fixed_header_path: Option<PathBuf>,
    header_dirs: BTreeSet<String>,
}

/// On-disk shape of a [`GlobalSettings`]; validated and expanded into one.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawSettings {
    platform: HostPlatform,
    base_dir: PathBuf,
    output_dir: PathBuf,
    #[serde(default)]
    fixed_header_path: Option<PathBuf>,
    #[serde(default)]
    extra_header_dirs: Vec<PathBuf>,
}

impl GlobalSettings {
    pub fn new(platform: HostPlatform, base_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let mut this = Self {
            platform,
            base_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            fixed_header_path: None,
            header_dirs: BTreeSet::new(),
        };
        this.set_base_dir(base_dir);
        this.output_dir = normalize_dir(output_dir.into());
        this
    }

    /// Load settings from a TOML file (see [`RawSettings`] for the schema).
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawSettings = toml::from_str(&contents)?;

        let mut this = Self::new(raw.platform, raw.base_dir, raw.output_dir);
        if let Some(header_path) = raw.fixed_header_path {
            this.set_fixed_header_path(header_path);
        }
        for dir in raw.extra_header_dirs {
            this.add_header_dir(&dir);
        }
        Ok(this)
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Force-included header resolved to a fixed, settable path rather than
    /// the original hard-coded per-developer path (see DESIGN.md open
    /// questions). Defaults to `<base_dir>/scripts/events.h`.
    pub fn fixed_header_path(&self) -> PathBuf {
        self.fixed_header_path
            .clone()
            .unwrap_or_else(|| self.base_dir.join("scripts").join("events.h"))
    }

    pub fn set_fixed_header_path(&mut self, path: impl Into<PathBuf>) {
        self.fixed_header_path = Some(path.into());
    }

    /// Every `-I<dir>`-shaped flag currently registered, in sorted order
    /// (mirrors the original's `std::set<std::string>`).
    pub fn header_dirs(&self) -> &BTreeSet<String> {
        &self.header_dirs
    }

    /// Resolve `dir` to an absolute path against `base_dir` and register it.
    /// Idempotent.
    pub fn add_header_dir(&mut self, dir: impl AsRef<Path>) {
        let resolved = resolve_against(&self.base_dir, dir.as_ref());
        self.header_dirs.insert(format!("-I{}", resolved.display()));
    }

    /// Rebase the toolchain root, removing every standard include-dir entry
    /// derived from the previous base and inserting the set derived from
    /// the new one, so the header-dirs set never accumulates stale paths
    /// (spec P4).
    pub fn set_base_dir(&mut self, new_base: impl Into<PathBuf>) {
        let new_base = normalize_dir(new_base.into());
        let old_base = std::mem::replace(&mut self.base_dir, new_base.clone());

        for suffix in standard_include_dirs(self.platform) {
            self.header_dirs.remove(&format!("-I{}", old_base.join(suffix).display()));
        }
        for suffix in standard_include_dirs(self.platform) {
            self.header_dirs.insert(format!("-I{}", new_base.join(suffix).display()));
        }
    }

    /// Set the output directory, normalizing it and creating it if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutputDirCreation`] if directory creation fails.
    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) -> Result<(), crate::Error> {
        let dir = normalize_dir(dir.into());
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| crate::Error::OutputDirCreation {
                path: dir.clone(),
                source,
            })?;
        }
        self.output_dir = dir;
        Ok(())
    }

    /// Absolute path to the `g++`/linker binary for this platform.
    pub fn compiler_binary(&self) -> PathBuf {
        let bin_dir = self.base_dir.join("CppPlatform").join("MinGW32").join("bin");
        match self.platform {
            HostPlatform::Windows => bin_dir.join("g++.exe"),
            HostPlatform::Linux | HostPlatform::MacOs => bin_dir.join("g++"),
        }
    }

    pub fn toolchain_bin_dir(&self) -> PathBuf {
        self.base_dir.join("CppPlatform").join("MinGW32").join("bin")
    }
}

fn standard_include_dirs(platform: HostPlatform) -> Vec<&'static str> {
    let mut dirs = match platform {
        HostPlatform::Windows => vec![
            "CppPlatform/MinGW32/include",
            "CppPlatform/MinGW32/lib/gcc/mingw32/4.5.2/include/c++",
            "CppPlatform/MinGW32/lib/gcc/mingw32/4.5.2/include/c++/mingw32",
        ],
        HostPlatform::Linux => vec![
            "CppPlatform/include/linux/usr/include/i386-linux-gnu",
            "CppPlatform/include/linux/usr/include",
            "CppPlatform/include/linux/usr/include/c++/4.6",
            "CppPlatform/include/linux/usr/include/c++/4.6/i686-linux-gnu",
            "CppPlatform/include/linux/usr/include/c++/4.6/backward",
        ],
        HostPlatform::MacOs => vec![],
    };
    dirs.extend([
        "CppPlatform/include/GDL",
        "CppPlatform/include/Core",
        "CppPlatform/include/boost",
        "CppPlatform/include/SFML/include",
        "CppPlatform/include/wxwidgets/include",
        "CppPlatform/include/wxwidgets/lib/gcc_dll/msw",
        "CppPlatform/Extensions/include",
    ]);
    dirs
}

fn normalize_dir(mut dir: PathBuf) -> PathBuf {
    if dir.as_os_str().is_empty() {
        dir = PathBuf::from(".");
    }
    dir
}

fn resolve_against(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebasing_drops_stale_standard_dirs() {
        // scenario 6: SetBaseDir("/x/"); AddHeaderDir("inc"); SetBaseDir("/y/")
        let mut settings = GlobalSettings::new(HostPlatform::Linux, "/x", "/out");
        settings.add_header_dir("inc"); // resolved against /x at add-time
        settings.set_base_dir("/y");

        let standard = standard_include_dirs(HostPlatform::Linux);
        for suffix in &standard {
            assert!(settings.header_dirs().iter().any(|d| d.contains(&format!("/y/{suffix}"))));
            assert!(!settings.header_dirs().iter().any(|d| d.contains(&format!("/x/{suffix}"))));
        }
        // the explicitly added header dir is resolved at AddHeaderDir time and
        // is not retroactively rebased.
        assert!(settings.header_dirs().contains("-I/x/inc"));
    }

    #[test]
    fn double_rebase_matches_single_rebase() {
        // P4: SetBaseDir(a); SetBaseDir(b) == SetBaseDir(b) alone.
        let mut a_then_b = GlobalSettings::new(HostPlatform::Linux, "/a", "/out");
        a_then_b.set_base_dir("/b");

        let just_b = GlobalSettings::new(HostPlatform::Linux, "/b", "/out");

        assert_eq!(a_then_b.header_dirs(), just_b.header_dirs());
    }

    #[test]
    fn add_header_dir_is_idempotent() {
        let mut s = GlobalSettings::new(HostPlatform::Linux, "/base", "/out");
        s.add_header_dir("inc");
        s.add_header_dir("inc");
        assert_eq!(s.header_dirs().len(), standard_include_dirs(HostPlatform::Linux).len() + 1);
    }
}
