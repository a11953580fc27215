pub mod browser;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod login;
pub mod probes;
pub mod random;
pub mod simulator;
pub mod store;
pub mod testing;

pub use browser::{BrowserSession, PageSurface};
pub use config::Config;
pub use cookies::{ExportedCookie, InjectionReport, SessionCookie};
pub use errors::{Result, SessionError};
pub use simulator::Simulator;
