//! Story generation orchestration.
//!
//! `StoryGenerator::generate` drives one attempt end to end: model
//! call, draft decoding, then a single transaction covering the story
//! row and its whole node tree. `run_job` wraps an attempt in job
//! status bookkeeping; status writes are independent of the generation
//! transaction, so a rolled-back tree still leaves a `failed` record.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use fabula_core::models::{JobStatus, Story, StoryDraft, UpdateJobInput};
use fabula_core::Database;

use crate::llm::{strip_code_fence, ChatModel, ModelError};
use crate::prompts;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Story(#[from] fabula_core::Error),
}

#[derive(Clone)]
pub struct StoryGenerator {
    db: Database,
    model: Arc<dyn ChatModel>,
}

impl StoryGenerator {
    pub fn new(db: Database, model: Arc<dyn ChatModel>) -> Self {
        Self { db, model }
    }

    /// Generate a story for `theme` and persist the full tree.
    ///
    /// The model call completes before the storage transaction opens,
    /// so the one long-lived operation never holds the write lock.
    pub async fn generate(
        &self,
        session_id: &str,
        theme: &str,
    ) -> Result<Story, GenerationError> {
        let text = self
            .model
            .complete(prompts::STORY_SYSTEM_PROMPT, &prompts::user_prompt(theme))
            .await?;

        let draft: StoryDraft = serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| fabula_core::Error::ModelResponseParse(e.to_string()))?;

        let story = self.db.create_story_with_tree(session_id, &draft)?;
        info!(story_id = %story.id, theme, "generated story");
        Ok(story)
    }

    /// Run one generation job to completion, recording the outcome.
    pub async fn run_job(&self, job_id: Uuid, session_id: &str, theme: &str) {
        self.update_job(
            job_id,
            UpdateJobInput {
                status: Some(JobStatus::Processing),
                ..Default::default()
            },
        );

        match self.generate(session_id, theme).await {
            Ok(story) => {
                info!(%job_id, story_id = %story.id, "story generation completed");
                self.update_job(
                    job_id,
                    UpdateJobInput {
                        status: Some(JobStatus::Completed),
                        story_id: Some(story.id),
                        completed_at: Some(Utc::now()),
                        ..Default::default()
                    },
                );
            }
            Err(e) => {
                warn!(%job_id, error = %e, "story generation failed");
                self.update_job(
                    job_id,
                    UpdateJobInput {
                        status: Some(JobStatus::Failed),
                        error: Some(e.to_string()),
                        completed_at: Some(Utc::now()),
                        ..Default::default()
                    },
                );
            }
        }
    }

    fn update_job(&self, job_id: Uuid, input: UpdateJobInput) {
        match self.db.update_job(job_id, input) {
            Ok(true) => {}
            Ok(false) => warn!(%job_id, "job vanished before status update"),
            Err(e) => warn!(%job_id, error = %e, "failed to update job status"),
        }
    }
}
