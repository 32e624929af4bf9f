use async_trait::async_trait;
use feedback::{
    FeedbackPatch, FeedbackPoint, FeedbackRound, GeneralFeedback, filter_page, filter_rounds,
};
use tokio::sync::RwLock;

use super::{FeedbackStore, StorageError, position_of};

/// Volatile lists owned by the server state.
#[derive(Default)]
pub struct MemoryStorage {
    feedback: RwLock<Vec<FeedbackPoint>>,
    rounds: RwLock<Vec<FeedbackRound>>,
    general: RwLock<Vec<GeneralFeedback>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rounds have no write route, so they are seeded up front.
    pub fn with_rounds(rounds: Vec<FeedbackRound>) -> Self {
        Self {
            rounds: RwLock::new(rounds),
            ..Self::default()
        }
    }
}

#[async_trait]
impl FeedbackStore for MemoryStorage {
    async fn get_feedback(&self, page: Option<&str>) -> Result<Vec<FeedbackPoint>, StorageError> {
        let feedback = self.feedback.read().await.clone();
        Ok(filter_page(feedback, page))
    }

    async fn save_feedback(&self, point: FeedbackPoint) -> Result<FeedbackPoint, StorageError> {
        self.feedback.write().await.push(point.clone());
        Ok(point)
    }

    async fn update_feedback(
        &self,
        id: &str,
        patch: FeedbackPatch,
    ) -> Result<Option<FeedbackPoint>, StorageError> {
        let mut feedback = self.feedback.write().await;

        let Some(index) = position_of(&feedback, id, |p| p.id.as_str()) else {
            return Ok(None);
        };

        patch.apply(&mut feedback[index]);
        Ok(Some(feedback[index].clone()))
    }

    async fn delete_feedback(&self, id: &str) -> Result<bool, StorageError> {
        let mut feedback = self.feedback.write().await;

        match position_of(&feedback, id, |p| p.id.as_str()) {
            Some(index) => {
                feedback.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_rounds(&self, page: Option<&str>) -> Result<Vec<FeedbackRound>, StorageError> {
        let rounds = self.rounds.read().await.clone();
        Ok(filter_rounds(rounds, page))
    }

    async fn get_general_feedback(
        &self,
        page: Option<&str>,
    ) -> Result<Vec<GeneralFeedback>, StorageError> {
        let general = self.general.read().await.clone();
        Ok(filter_page(general, page))
    }

    async fn save_general_feedback(
        &self,
        feedback: GeneralFeedback,
    ) -> Result<GeneralFeedback, StorageError> {
        self.general.write().await.insert(0, feedback.clone());
        Ok(feedback)
    }

    async fn delete_general_feedback(&self, id: &str) -> Result<bool, StorageError> {
        let mut general = self.general.write().await;

        match position_of(&general, id, |f| f.id.as_str()) {
            Some(index) => {
                general.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
