use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

/// One persisted narrative beat. Ending nodes carry no options; every
/// other node carries at least one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: Uuid,
    pub story_id: Uuid,
    pub content: String,
    pub is_root: bool,
    pub is_ending: bool,
    pub is_winning_ending: bool,
    pub options: Vec<StoryOption>,
}

/// A labeled choice, pointing at the node reached by selecting it.
/// Stored in presentation order on the parent node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOption {
    pub text: String,
    pub node_id: Uuid,
}

/// A node as served to clients: options stay shallow, consumers resolve
/// targets through the story's node map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeView {
    pub id: Uuid,
    pub content: String,
    pub is_ending: bool,
    pub is_winning_ending: bool,
    pub options: Vec<StoryOption>,
}

/// A fully reassembled story tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStory {
    pub id: Uuid,
    pub title: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub root_node: NodeView,
    pub all_nodes: HashMap<Uuid, NodeView>,
}
