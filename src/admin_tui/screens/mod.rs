//! Screen modules for the admin TUI

pub mod dashboard;
pub mod help;
pub mod login;
pub mod main_menu;
pub mod resource;

pub use dashboard::DashboardScreen;
pub use help::HelpScreen;
pub use login::LoginScreen;
pub use main_menu::MainMenuScreen;
pub use resource::{open as open_resource, ResourceScreen};
