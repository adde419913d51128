//! Terminal output for a built tree.

mod listing;

pub use listing::{render_listing, render_stat};
