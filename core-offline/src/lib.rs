//! # Core Offline
//!
//! Offline mode for the quiz application: a catalog snapshot the user can
//! take quizzes from without a connection, a queue of results recorded
//! meanwhile, and the sync that empties it again.
//!
//! All state is persisted through [`core_storage::EnhancedStore`] under the
//! `offline_quizzes` and `offline_results` keys. The offline flag itself lives
//! on the [`OfflineOrchestrator`] instance.

pub mod catalog;
pub mod error;
pub mod orchestrator;
pub mod results;
pub mod sync;

pub use catalog::{OfflineQuiz, Quiz, QuizCatalog, StaticQuizCatalog};
pub use error::{OfflineError, Result};
pub use orchestrator::OfflineOrchestrator;
pub use results::QueuedResult;
pub use sync::{NoopResultSink, ResultSink};
