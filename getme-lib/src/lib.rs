pub mod appveyor;
pub mod download;
pub mod error;
pub mod github;
pub mod headers;
pub mod logging;
pub mod probe;
pub mod provider;
mod s3;

pub use download::{Downloader, Options};
pub use error::{DownloadError, Result};
