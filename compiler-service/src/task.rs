// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Units of compile/link work submitted by the editor.

use std::path::PathBuf;

/// Stable identity of the scene that owns a [`Task`].
///
/// The host editor hands these out; the scheduler never interprets them
/// beyond equality, using them only for gating and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SceneRef(pub u64);

impl SceneRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Mode {
    Compile,
    Link,
}

/// Context a pre-hook is run with, immediately before argv construction.
pub struct PreHookContext<'a> {
    pub task: &'a Task,
}

/// What a pre-hook decided should happen to the task it was run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreHookOutcome {
    /// Build the command line and run the compiler.
    Proceed,
    /// Drop the task silently; it is not an error.
    Skip,
    /// Append the task to the tail of pending and try another task now.
    Requeue,
}

/// Context a post-hook is run with, immediately after the subprocess ends.
pub struct PostHookContext<'a> {
    pub task: &'a Task,
    pub compilation_succeeded: bool,
    pub exit_code: Option<i32>,
    pub messages: &'a str,
}

/// `true` requests that the task be appended to the tail of pending again.
pub type PreHook = Box<dyn FnMut(&PreHookContext) -> PreHookOutcome + Send>;
pub type PostHook = Box<dyn FnMut(&PostHookContext) -> bool + Send>;

/// One compile or link request submitted by the editor.
///
/// `pre_hook`/`post_hook` are owned, moved into the task at construction;
/// there is no shared mutable "requeue" flag — requeueing is communicated
/// purely through the hook's return value (see [`PreHookOutcome`] and
/// [`PostHook`]).
pub struct Task {
    pub scene: SceneRef,
    pub user_name: String,
    pub mode: Mode,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub extra_object_paths: Vec<PathBuf>,
    pub extra_lib_names: Vec<String>,
    pub extra_header_dirs: Vec<PathBuf>,
    pub optimize: bool,
    pub for_runtime: bool,
    pub pre_hook: Option<PreHook>,
    pub post_hook: Option<PostHook>,
}

impl Task {
    pub fn new(scene: SceneRef, mode: Mode, input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            scene,
            user_name: String::new(),
            mode,
            input_path: input_path.into(),
            output_path: output_path.into(),
            extra_object_paths: Vec::new(),
            extra_lib_names: Vec::new(),
            extra_header_dirs: Vec::new(),
            optimize: false,
            for_runtime: false,
            pre_hook: None,
            post_hook: None,
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_for_runtime(mut self, for_runtime: bool) -> Self {
        self.for_runtime = for_runtime;
        self
    }

    pub fn with_extra_object_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.extra_object_paths = paths;
        self
    }

    pub fn with_extra_lib_names(mut self, names: Vec<String>) -> Self {
        self.extra_lib_names = names;
        self
    }

    pub fn with_extra_header_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.extra_header_dirs = dirs;
        self
    }

    pub fn with_pre_hook(mut self, hook: PreHook) -> Self {
        self.pre_hook = Some(hook);
        self
    }

    pub fn with_post_hook(mut self, hook: PostHook) -> Self {
        self.post_hook = Some(hook);
        self
    }

    /// Structural equivalence used for deduplication (spec: `IsSameTaskAs`).
    ///
    /// Two tasks are equivalent iff they would produce identical argument
    /// vectors and outputs — `user_name` and the hooks are deliberately
    /// excluded.
    pub fn is_same_as(&self, other: &Task) -> bool {
        self.scene == other.scene
            && self.mode == other.mode
            && self.input_path == other.input_path
            && self.output_path == other.output_path
            && self.extra_object_paths == other.extra_object_paths
            && self.extra_lib_names == other.extra_lib_names
            && self.extra_header_dirs == other.extra_header_dirs
            && self.optimize == other.optimize
            && self.for_runtime == other.for_runtime
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("scene", &self.scene)
            .field("user_name", &self.user_name)
            .field("mode", &self.mode)
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("extra_object_paths", &self.extra_object_paths)
            .field("extra_lib_names", &self.extra_lib_names)
            .field("extra_header_dirs", &self.extra_header_dirs)
            .field("optimize", &self.optimize)
            .field("for_runtime", &self.for_runtime)
            .field("pre_hook", &self.pre_hook.is_some())
            .field("post_hook", &self.post_hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(scene: u64, input: &str) -> Task {
        Task::new(SceneRef::new(scene), Mode::Compile, input, "out.o")
    }

    #[test]
    fn same_scene_and_paths_are_equivalent() {
        let a = task(1, "a.cpp").with_user_name("a");
        let b = task(1, "a.cpp").with_user_name("b");
        assert!(a.is_same_as(&b));
    }

    #[test]
    fn different_scene_is_not_equivalent() {
        let a = task(1, "a.cpp");
        let b = task(2, "a.cpp");
        assert!(!a.is_same_as(&b));
    }

    #[test]
    fn different_optimize_is_not_equivalent() {
        let a = task(1, "a.cpp").with_optimize(true);
        let b = task(1, "a.cpp").with_optimize(false);
        assert!(!a.is_same_as(&b));
    }
}
