//! Browser backends.

pub mod chromium;

pub use chromium::ChromiumLauncher;
