// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Per-scene compilation gate.

use std::collections::HashSet;

use crate::task::SceneRef;

/// Scenes currently disabled for compilation.
///
/// `disable`/`enable` are both idempotent. Callers that re-enable a scene
/// and thereby unblock previously-ineligible work are responsible for
/// kicking the scheduler afterwards — this type only tracks membership.
#[derive(Debug, Default)]
pub struct GateSet {
    disabled: HashSet<SceneRef>,
}

impl GateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block `scene`. Returns `true` if this changed the set.
    pub fn disable(&mut self, scene: SceneRef) -> bool {
        self.disabled.insert(scene)
    }

    /// Unblock `scene`. Returns `true` if this changed the set (i.e. the
    /// caller should give the scheduler a chance to run).
    pub fn enable(&mut self, scene: SceneRef) -> bool {
        self.disabled.remove(&scene)
    }

    pub fn is_disabled(&self, scene: SceneRef) -> bool {
        self.disabled.contains(&scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_then_enable_round_trips() {
        let mut gates = GateSet::new();
        let scene = SceneRef::new(1);
        assert!(!gates.is_disabled(scene));

        assert!(gates.disable(scene));
        assert!(gates.is_disabled(scene));

        assert!(gates.enable(scene));
        assert!(!gates.is_disabled(scene));
    }

    #[test]
    fn disable_is_idempotent() {
        let mut gates = GateSet::new();
        let scene = SceneRef::new(1);
        assert!(gates.disable(scene));
        assert!(!gates.disable(scene));
    }

    #[test]
    fn enable_of_never_disabled_scene_is_a_no_op() {
        let mut gates = GateSet::new();
        assert!(!gates.enable(SceneRef::new(1)));
    }

    proptest::proptest! {
        // L1: disabling then re-enabling a scene always restores its
        // original gating state, whatever that was.
        #[test]
        fn disable_then_enable_is_always_a_no_op(scene in 0u64..100) {
            let scene = SceneRef::new(scene);
            let mut gates = GateSet::new();
            let before = gates.is_disabled(scene);
            gates.disable(scene);
            gates.enable(scene);
            proptest::prop_assert_eq!(gates.is_disabled(scene), before);
        }
    }
}
