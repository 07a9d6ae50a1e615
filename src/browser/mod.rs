mod discovery;
mod launcher;
mod session;

pub use discovery::{discover_all_browsers, discover_browser, BrowserInfo, BrowserType};
pub use session::{Session, SessionConfig};
