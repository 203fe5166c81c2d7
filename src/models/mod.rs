pub mod backup;
pub mod rate_limit;

pub use backup::{BackupRecord, NewBackup, UpsertOutcome, UpsertRequest};
pub use rate_limit::{RateLimitEvent, RateLimitPolicy};
