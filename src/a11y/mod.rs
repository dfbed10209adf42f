//! Keyboard focus and textual descriptions over the render set.

mod describe;
mod focus;

pub use describe::{
    describe_node, describe_relationship, describe_render_set, keyboard_help, no_results,
    selection_changed, view_reset,
};
pub use focus::{FocusEntry, FocusKind, FocusManager, FocusState, FocusTarget, NeighborDirection};
