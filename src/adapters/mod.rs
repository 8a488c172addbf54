// Adapters layer: one gateway per backing source plus the file storage they share.

pub mod csv;
pub mod jira;
pub mod sqlite;
pub mod storage;

pub use self::csv::CsvTestCaseGateway;
pub use self::jira::JiraTestCaseGateway;
pub use self::sqlite::SqliteTestCaseGateway;
pub use self::storage::LocalStorage;
