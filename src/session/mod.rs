//! Authenticated browser sessions
//!
//! Session credentials are the site's cookies, persisted as a JSON array in the
//! configured session file. The `auth` command creates that file through an
//! interactive login; `scrape` restores it into a fresh browser and writes the
//! refreshed cookies back when the run ends.

mod login;
mod store;

pub use login::{login_interactive, wait_for_url_suffix, AuthenticatedSession};
pub use store::{load_cookies, save_cookies, StoredCookie};
