use serde::Deserialize;

/// A model-authored story as decoded from the completion text, before
/// any row exists. This is the single normalized form the ingestion
/// engine consumes; field aliases absorb both camelCase and snake_case
/// spellings from upstream decoders.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    #[serde(rename = "rootNode", alias = "root_node")]
    pub root_node: DraftNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftNode {
    pub content: String,
    #[serde(rename = "isEnding", alias = "is_ending")]
    pub is_ending: bool,
    #[serde(rename = "isWinningEnding", alias = "is_winning_ending")]
    pub is_winning_ending: bool,
    #[serde(default)]
    pub options: Option<Vec<DraftOption>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftOption {
    pub text: String,
    #[serde(rename = "nextNode", alias = "next_node")]
    pub next_node: DraftNode,
}
