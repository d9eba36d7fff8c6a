// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability descriptors and pure-function view selection.

use bitflags::bitflags;

bitflags! {
    /// What a model variant can do, as an explicit descriptor.
    ///
    /// Each model variant carries one of these instead of implementing marker
    /// traits; view selection reads the descriptor and nothing else.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Has input/output pins and participates in wiring.
        const PINS = 1 << 0;
        /// Body can be collapsed to its header.
        const COLLAPSIBLE = 1 << 1;
        /// Free-floating annotation, not part of the graph flow.
        const ANNOTATION = 1 << 2;
        /// Carries a diagnostic to surface prominently.
        const DIAGNOSTIC = 1 << 3;
        /// Can be resized by the user.
        const RESIZABLE = 1 << 4;
    }
}

/// The concrete view shape chosen for a model variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewVariant {
    /// Full node with pin rows and an optional collapse affordance.
    Node,
    /// Node collapsed to a header-only representation.
    CompactNode,
    /// Free-floating annotation (comment box, sticky).
    Annotation,
    /// Error/warning marker riding the same pipeline as ordinary elements.
    Marker,
    /// Featureless fallback.
    Plain,
}

/// Chooses a view shape from a capability descriptor.
///
/// This is a pure function: same descriptor, same answer. The match order is
/// the selection precedence — diagnostics outrank annotations, which outrank
/// node-ness.
#[must_use]
pub fn select_variant(caps: Capabilities) -> ViewVariant {
    if caps.contains(Capabilities::DIAGNOSTIC) {
        ViewVariant::Marker
    } else if caps.contains(Capabilities::ANNOTATION) {
        ViewVariant::Annotation
    } else if caps.contains(Capabilities::PINS) {
        if caps.contains(Capabilities::COLLAPSIBLE) {
            ViewVariant::Node
        } else {
            ViewVariant::CompactNode
        }
    } else {
        ViewVariant::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_diagnostic_first() {
        let caps = Capabilities::DIAGNOSTIC | Capabilities::PINS | Capabilities::ANNOTATION;
        assert_eq!(select_variant(caps), ViewVariant::Marker);
    }

    #[test]
    fn annotation_outranks_pins() {
        let caps = Capabilities::ANNOTATION | Capabilities::PINS;
        assert_eq!(select_variant(caps), ViewVariant::Annotation);
    }

    #[test]
    fn node_shapes() {
        assert_eq!(
            select_variant(Capabilities::PINS | Capabilities::COLLAPSIBLE),
            ViewVariant::Node
        );
        assert_eq!(select_variant(Capabilities::PINS), ViewVariant::CompactNode);
        assert_eq!(select_variant(Capabilities::empty()), ViewVariant::Plain);
    }
}
