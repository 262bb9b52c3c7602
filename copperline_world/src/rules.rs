// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pluggable clearance rules.

use crate::item::Item;

/// Clearance between two items when no resolver is configured, in
/// nanometres.
pub const DEFAULT_CLEARANCE: i32 = 100_000;

/// Supplies the required clearance between pairs of items.
///
/// The resolver is an external collaborator (a design-rule engine in the
/// host application); the world only asks for pairwise distances.
pub trait RuleResolver {
    /// Minimum gap required between `a` and `b`, in nanometres.
    fn clearance(&self, a: &Item, b: &Item) -> i32;
}

/// Constant-clearance fallback used when the host supplies no rules.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultRules;

impl RuleResolver for DefaultRules {
    fn clearance(&self, _a: &Item, _b: &Item) -> i32 {
        DEFAULT_CLEARANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperline_geom::{LayerRange, Seg, VecI};

    #[test]
    fn default_rules_are_constant() {
        let a = Item::segment(
            Seg::new(VecI::new(0, 0), VecI::new(1, 0)),
            1,
            LayerRange::single(0),
            1,
        );
        assert_eq!(DefaultRules.clearance(&a, &a), DEFAULT_CLEARANCE);
    }
}
