//! Reusable UI components for the admin TUI

pub mod data_table;
pub mod filter_bar;
pub mod form_view;
pub mod status_display;

pub use data_table::DataTable;
pub use filter_bar::FilterBar;
pub use form_view::FormView;
pub use status_display::StatusDisplay;
