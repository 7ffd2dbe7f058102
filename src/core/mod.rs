pub mod aggregator;
pub mod credential;

pub use crate::domain::model::{Credential, FetchOutcome, Report, ReportEntry, RequestDescriptor};
pub use crate::domain::ports::{ChatTransport, CountSource};
pub use crate::utils::error::Result;
