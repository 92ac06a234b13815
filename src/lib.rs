pub mod admin_tui;
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod form;
pub mod models;
pub mod notify;
pub mod page;
pub mod prefs;
pub mod table;
