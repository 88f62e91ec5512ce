//! Quiz catalog access and the offline snapshot format

use crate::error::Result;
use bridge_traits::PlatformSendSync;
use serde::{Deserialize, Serialize};

/// A quiz as the catalog provides it. Question content is opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub questions: Vec<serde_json::Value>,
}

/// A quiz saved for offline use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQuiz {
    pub id: String,
    pub title: String,
    pub category: String,
    pub questions: Vec<serde_json::Value>,
    /// When the snapshot was taken, Unix milliseconds
    pub saved_at: i64,
}

impl OfflineQuiz {
    pub fn from_quiz(quiz: Quiz, saved_at: i64) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            category: quiz.category,
            questions: quiz.questions,
            saved_at,
        }
    }
}

/// Read-only source of the quizzes available to the user.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait QuizCatalog: PlatformSendSync {
    /// Every quiz currently known to the application.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>>;
}

/// Catalog backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticQuizCatalog {
    quizzes: Vec<Quiz>,
}

impl StaticQuizCatalog {
    pub fn new(quizzes: Vec<Quiz>) -> Self {
        Self { quizzes }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl QuizCatalog for StaticQuizCatalog {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        Ok(self.quizzes.clone())
    }
}
