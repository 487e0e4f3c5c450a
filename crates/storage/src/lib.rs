pub mod persister;
pub mod recorder;
pub mod visited;

pub use persister::Persister;
pub use recorder::RunRecorder;
pub use visited::SqliteVisitedStore;
