/*!
 * SQLite persistence for the translation history.
 *
 * Every finished translation can be appended as an immutable record holding
 * the original text, the per-provider results and the optional evaluation.
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DatabaseConnection;
pub use models::HistoryRecord;
pub use repository::HistoryRepository;
