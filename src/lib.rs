pub mod config;
pub mod downloader;
pub mod error;
pub mod freshness;
pub mod process;
pub mod scanner;
pub mod store;

pub use config::Config;
pub use downloader::{Downloader, LocalDownloader};
pub use error::CleanupError;
pub use process::{ProcessObserver, ProcessOutcome, ProcessRunner, ScanCommand};
pub use scanner::Scanner;
pub use store::ScanResult;
