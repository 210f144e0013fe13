//! Command implementations.

pub mod edit;
pub mod extract;
pub mod history;
pub mod ingest;
pub mod items;
pub mod jobs;
pub mod status;

pub use self::edit::execute_edit;
pub use self::extract::execute_extract;
pub use self::history::execute_history;
pub use self::ingest::execute_ingest;
pub use self::items::execute_items;
pub use self::jobs::execute_jobs;
pub use self::status::execute_status;
