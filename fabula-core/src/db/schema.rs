pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    session_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS story_nodes (
    id TEXT PRIMARY KEY,
    story_id TEXT NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    is_root INTEGER NOT NULL DEFAULT 0,
    is_ending INTEGER NOT NULL DEFAULT 0,
    is_winning_ending INTEGER NOT NULL DEFAULT 0,
    options JSON NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS story_jobs (
    job_id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    theme TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
    story_id TEXT REFERENCES stories(id),
    error TEXT,
    created_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_story_nodes_story ON story_nodes(story_id);
CREATE INDEX IF NOT EXISTS idx_story_jobs_session ON story_jobs(session_id);

-- Only one root node per story
CREATE UNIQUE INDEX IF NOT EXISTS idx_one_root_node
    ON story_nodes(story_id) WHERE is_root = 1;
"#;
