//! Extensions for the installer-package toolchain
//!
//! Each extension owns one XML namespace, contributes its tables and
//! messages, and may check cross-row rules at bind time:
//! - `bal`: bootstrapper application options, conditions and prerequisites
//! - `difxapp`: driver installation flags
//! - `firewall`: firewall exceptions
//! - `http`: URL namespace reservations
//! - `powershell`: snap-in registration

pub mod bal;
pub mod difxapp;
pub mod firewall;
pub mod http;
pub mod powershell;

pub use bal::BalExtension;
pub use difxapp::DifxAppExtension;
pub use firewall::FirewallExtension;
pub use http::HttpExtension;
pub use powershell::PowerShellExtension;

use pkgext_core::Extension;

/// Short names of every extension, in registration order
pub const NAMES: [&str; 5] = ["bal", "difxapp", "firewall", "http", "powershell"];

/// Every extension
pub fn all() -> Vec<Box<dyn Extension>> {
    NAMES.iter().filter_map(|name| by_name(name)).collect()
}

/// Extension by its short name
pub fn by_name(name: &str) -> Option<Box<dyn Extension>> {
    let extension: Box<dyn Extension> = match name {
        "bal" => Box::new(BalExtension::new()),
        "difxapp" => Box::new(DifxAppExtension::new()),
        "firewall" => Box::new(FirewallExtension::new()),
        "http" => Box::new(HttpExtension::new()),
        "powershell" => Box::new(PowerShellExtension::new()),
        _ => return None,
    };
    Some(extension)
}
