pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::registry::HttpCountSource;
pub use app::commands::{Command, CommandDispatcher, IncomingCommand};
pub use config::{catalog::CatalogConfig, BotConfig};
pub use core::{aggregator::Aggregator, credential::CredentialStore};
pub use domain::model::{Credential, FetchOutcome, Report, ReportEntry, RequestDescriptor};
pub use utils::error::{BotError, Result};
