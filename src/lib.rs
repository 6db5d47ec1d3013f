pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod render;
pub mod word_list;

pub use backtracking_search::{
    find_fill, Assignment, FillFailure, FillOptions, FillSuccess, SearchMode, Statistics,
};
pub use domains::Domains;
pub use grid_config::{Direction, GridConfig, GridError, Slot, SlotId};
pub use render::render_grid;
pub use word_list::{WordId, WordList};

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
