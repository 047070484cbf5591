//! SQLite-backed storage for stories, nodes, and generation jobs.
//!
//! A single connection behind a mutex serves all callers. Stories and
//! their node trees are written inside one transaction and become
//! visible atomically; job status updates are independent writes.

pub mod schema;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    CompleteStory, CreateJobInput, JobStatus, Story, StoryDraft, StoryJob, StoryNode, StoryOption,
    UpdateJobInput,
};
use crate::tree;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open the database at the platform data directory, creating it
    /// if needed.
    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "fabula")
            .ok_or_else(|| Error::Config("could not determine platform data directory".into()))?;
        std::fs::create_dir_all(dirs.data_dir())?;
        Self::open(dirs.data_dir().join("fabula.db"))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    pub fn create_job(&self, input: CreateJobInput) -> Result<StoryJob> {
        let job = StoryJob {
            job_id: Uuid::new_v4(),
            session_id: input.session_id,
            theme: input.theme,
            status: JobStatus::Pending,
            story_id: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO story_jobs (job_id, session_id, theme, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                job.job_id.to_string(),
                job.session_id,
                job.theme,
                job.status.as_str(),
                job.created_at.to_rfc3339(),
            ],
        )?;

        Ok(job)
    }

    pub fn get_job(&self, job_id: Uuid) -> Result<Option<StoryJob>> {
        let conn = self.conn.lock().unwrap();
        let job = conn
            .query_row(
                "SELECT job_id, session_id, theme, status, story_id, error, created_at, completed_at
                 FROM story_jobs WHERE job_id = ?1",
                params![job_id.to_string()],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    /// Apply the non-`None` fields of `input` to a job. Returns whether
    /// the job existed.
    pub fn update_job(&self, job_id: Uuid, input: UpdateJobInput) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE story_jobs SET
                status = COALESCE(?2, status),
                story_id = COALESCE(?3, story_id),
                error = COALESCE(?4, error),
                completed_at = COALESCE(?5, completed_at)
             WHERE job_id = ?1",
            params![
                job_id.to_string(),
                input.status.map(|s| s.as_str()),
                input.story_id.map(|id| id.to_string()),
                input.error,
                input.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn get_story(&self, story_id: Uuid) -> Result<Option<Story>> {
        let conn = self.conn.lock().unwrap();
        let story = conn
            .query_row(
                "SELECT id, title, session_id, created_at FROM stories WHERE id = ?1",
                params![story_id.to_string()],
                story_from_row,
            )
            .optional()?;
        Ok(story)
    }

    pub fn get_story_nodes(&self, story_id: Uuid) -> Result<Vec<StoryNode>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, story_id, content, is_root, is_ending, is_winning_ending, options
             FROM story_nodes WHERE story_id = ?1",
        )?;
        let nodes = stmt
            .query_map(params![story_id.to_string()], node_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    /// Persist a generated story and its whole node tree in one
    /// transaction. Either every row commits or none do.
    pub fn create_story_with_tree(&self, session_id: &str, draft: &StoryDraft) -> Result<Story> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let story = Story {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            session_id: session_id.to_string(),
            created_at: Utc::now(),
        };
        tx.execute(
            "INSERT INTO stories (id, title, session_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                story.id.to_string(),
                story.title,
                story.session_id,
                story.created_at.to_rfc3339(),
            ],
        )?;

        tree::ingest_node(&tx, story.id, &draft.root_node, true)?;

        tx.commit()?;
        tracing::debug!(story_id = %story.id, "committed story tree");
        Ok(story)
    }

    /// Fetch a story and reassemble its full navigable tree.
    pub fn complete_story(&self, story_id: Uuid) -> Result<CompleteStory> {
        let story = self.get_story(story_id)?.ok_or(Error::NotFound("story"))?;
        let nodes = self.get_story_nodes(story_id)?;
        tree::assemble(story, nodes)
    }
}

fn job_from_row(row: &Row) -> rusqlite::Result<StoryJob> {
    let job_id: String = row.get(0)?;
    let status: String = row.get(3)?;
    let story_id: Option<String> = row.get(4)?;
    let created_at: String = row.get(6)?;
    let completed_at: Option<String> = row.get(7)?;

    Ok(StoryJob {
        job_id: parse_uuid(&job_id, 0)?,
        session_id: row.get(1)?,
        theme: row.get(2)?,
        status: parse_status(&status, 3)?,
        story_id: story_id.map(|id| parse_uuid(&id, 4)).transpose()?,
        error: row.get(5)?,
        created_at: parse_timestamp(&created_at, 6)?,
        completed_at: completed_at.map(|t| parse_timestamp(&t, 7)).transpose()?,
    })
}

fn story_from_row(row: &Row) -> rusqlite::Result<Story> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;

    Ok(Story {
        id: parse_uuid(&id, 0)?,
        title: row.get(1)?,
        session_id: row.get(2)?,
        created_at: parse_timestamp(&created_at, 3)?,
    })
}

fn node_from_row(row: &Row) -> rusqlite::Result<StoryNode> {
    let id: String = row.get(0)?;
    let story_id: String = row.get(1)?;
    let options: String = row.get(6)?;

    Ok(StoryNode {
        id: parse_uuid(&id, 0)?,
        story_id: parse_uuid(&story_id, 1)?,
        content: row.get(2)?,
        is_root: row.get(3)?,
        is_ending: row.get(4)?,
        is_winning_ending: row.get(5)?,
        options: parse_options(&options, 6)?,
    })
}

fn parse_uuid(s: &str, idx: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| conversion_error(idx, e))
}

fn parse_timestamp(s: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_status(s: &str, idx: usize) -> rusqlite::Result<JobStatus> {
    JobStatus::from_str(s).ok_or_else(|| {
        conversion_error(
            idx,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown job status '{s}'"),
            ),
        )
    })
}

fn parse_options(s: &str, idx: usize) -> rusqlite::Result<Vec<StoryOption>> {
    serde_json::from_str(s).map_err(|e| conversion_error(idx, e))
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}
