//! Interactive knowledge graph of supplements, neurotransmitters, brain
//! regions and the mechanisms connecting them.
//!
//! Raw records are assembled into a bounded render set ([`knowledge`]), held
//! in a reactive store ([`state`]), laid out and drawn by a budgeted engine
//! ([`engine`]) and made navigable from the keyboard ([`a11y`]). [`session`]
//! ties them together one frame at a time; [`app`] is the eframe shell.

pub mod a11y;
pub mod app;
pub mod engine;
pub mod headless;
pub mod knowledge;
pub mod session;
pub mod state;
pub mod util;
