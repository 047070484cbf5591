//! Story tree materialization and reconstruction.
//!
//! A generated story arrives as a nested tree of draft nodes.
//! Persistence flattens it: each node becomes one row, and a parent
//! references its children by id inside its options column. Reading
//! reverses this with a single flat fetch and an id lookup map.

use rusqlite::{params, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{CompleteStory, DraftNode, NodeView, Story, StoryNode, StoryOption};

/// Hard ceiling on story depth. Generation targets 5-7 levels; anything
/// past this bound is a runaway or adversarial upstream response.
pub const MAX_TREE_DEPTH: usize = 64;

/// Persist `node` and its entire subtree as rows owned by `story_id`,
/// returning the id assigned to `node`.
///
/// Each node's id is allocated and its row inserted before any child is
/// visited, so children can be linked back from the parent's options
/// list. The options list itself is written once per node, after every
/// child id is known, so no reader in a later transaction can observe a
/// partially linked node.
///
/// A non-ending node without options aborts the whole ingestion with
/// [`Error::MalformedTree`]. Options supplied on an ending node are
/// dropped; endings persist as leaves.
pub fn ingest_node(
    tx: &Transaction<'_>,
    story_id: Uuid,
    node: &DraftNode,
    is_root: bool,
) -> Result<Uuid> {
    ingest_at_depth(tx, story_id, node, is_root, 0)
}

fn ingest_at_depth(
    tx: &Transaction<'_>,
    story_id: Uuid,
    node: &DraftNode,
    is_root: bool,
    depth: usize,
) -> Result<Uuid> {
    if depth >= MAX_TREE_DEPTH {
        return Err(Error::MalformedTree(format!(
            "story tree exceeds maximum depth of {MAX_TREE_DEPTH}"
        )));
    }

    let node_id = Uuid::new_v4();
    tx.execute(
        "INSERT INTO story_nodes (id, story_id, content, is_root, is_ending, is_winning_ending, options)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, '[]')",
        params![
            node_id.to_string(),
            story_id.to_string(),
            node.content,
            is_root,
            node.is_ending,
            node.is_winning_ending,
        ],
    )?;

    if node.is_ending {
        return Ok(node_id);
    }

    let draft_options = node.options.as_deref().unwrap_or_default();
    if draft_options.is_empty() {
        return Err(Error::MalformedTree(
            "non-ending node has an empty options list".into(),
        ));
    }

    let mut options = Vec::with_capacity(draft_options.len());
    for draft in draft_options {
        let child_id = ingest_at_depth(tx, story_id, &draft.next_node, false, depth + 1)?;
        options.push(StoryOption {
            text: draft.text.clone(),
            node_id: child_id,
        });
    }

    tx.execute(
        "UPDATE story_nodes SET options = ?2 WHERE id = ?1",
        params![node_id.to_string(), serde_json::to_string(&options)?],
    )?;

    Ok(node_id)
}

/// Rebuild the navigable tree for one story from its flat rows.
///
/// Options stay shallow: each carries the id of its target node, and
/// consumers resolve targets through `all_nodes`. Exactly one root must
/// be present; zero (including a story with no rows at all) or several
/// is [`Error::StructuralIntegrity`].
pub fn assemble(story: Story, nodes: Vec<StoryNode>) -> Result<CompleteStory> {
    let mut root_id = None;
    let mut all_nodes = HashMap::with_capacity(nodes.len());

    for node in nodes {
        if node.is_root && root_id.replace(node.id).is_some() {
            return Err(Error::StructuralIntegrity(format!(
                "story {} has multiple root nodes",
                story.id
            )));
        }
        all_nodes.insert(
            node.id,
            NodeView {
                id: node.id,
                content: node.content,
                is_ending: node.is_ending,
                is_winning_ending: node.is_winning_ending,
                options: node.options,
            },
        );
    }

    let root_id = root_id.ok_or_else(|| {
        Error::StructuralIntegrity(format!("story {} has no root node", story.id))
    })?;
    let root_node = all_nodes
        .get(&root_id)
        .cloned()
        .ok_or_else(|| Error::StructuralIntegrity(format!("story {} has no root node", story.id)))?;

    Ok(CompleteStory {
        id: story.id,
        title: story.title,
        session_id: story.session_id,
        created_at: story.created_at,
        root_node,
        all_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::SCHEMA;
    use chrono::Utc;
    use rusqlite::Connection;
    use serde_json::json;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        insert_story(&conn, Uuid::nil());
        conn
    }

    fn insert_story(conn: &Connection, id: Uuid) {
        conn.execute(
            "INSERT INTO stories (id, title, session_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                "Test",
                "session-1",
                Utc::now().to_rfc3339()
            ],
        )
        .unwrap();
    }

    fn draft(value: serde_json::Value) -> DraftNode {
        serde_json::from_value(value).unwrap()
    }

    fn ingest(conn: &mut Connection, story_id: Uuid, node: &DraftNode) -> Result<Uuid> {
        let tx = conn.transaction().unwrap();
        let id = ingest_node(&tx, story_id, node, true)?;
        tx.commit().unwrap();
        Ok(id)
    }

    fn load_nodes(conn: &Connection, story_id: Uuid) -> Vec<StoryNode> {
        let mut stmt = conn
            .prepare(
                "SELECT id, story_id, content, is_root, is_ending, is_winning_ending, options
                 FROM story_nodes WHERE story_id = ?1",
            )
            .unwrap();
        let nodes = stmt
            .query_map(params![story_id.to_string()], |row| {
                let id: String = row.get(0)?;
                let story_id: String = row.get(1)?;
                let options: String = row.get(6)?;
                Ok(StoryNode {
                    id: Uuid::parse_str(&id).unwrap(),
                    story_id: Uuid::parse_str(&story_id).unwrap(),
                    content: row.get(2)?,
                    is_root: row.get(3)?,
                    is_ending: row.get(4)?,
                    is_winning_ending: row.get(5)?,
                    options: serde_json::from_str(&options).unwrap(),
                })
            })
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        nodes
    }

    fn test_story() -> Story {
        Story {
            id: Uuid::nil(),
            title: "Test".into(),
            session_id: "session-1".into(),
            created_at: Utc::now(),
        }
    }

    fn two_choice_draft() -> DraftNode {
        draft(json!({
            "content": "Start",
            "isEnding": false,
            "isWinningEnding": false,
            "options": [
                {
                    "text": "Go left",
                    "nextNode": {
                        "content": "Win",
                        "isEnding": true,
                        "isWinningEnding": true
                    }
                },
                {
                    "text": "Go right",
                    "nextNode": {
                        "content": "Lose",
                        "isEnding": true,
                        "isWinningEnding": false
                    }
                }
            ]
        }))
    }

    #[test]
    fn ingest_then_assemble_is_isomorphic() {
        let mut conn = test_conn();
        let root_id = ingest(&mut conn, Uuid::nil(), &two_choice_draft()).unwrap();

        let nodes = load_nodes(&conn, Uuid::nil());
        assert_eq!(nodes.len(), 3);

        let complete = assemble(test_story(), nodes).unwrap();
        assert_eq!(complete.root_node.id, root_id);
        assert_eq!(complete.root_node.content, "Start");
        assert!(!complete.root_node.is_ending);
        assert_eq!(complete.root_node.options.len(), 2);
        assert_eq!(complete.root_node.options[0].text, "Go left");
        assert_eq!(complete.root_node.options[1].text, "Go right");

        let win = &complete.all_nodes[&complete.root_node.options[0].node_id];
        assert_eq!(win.content, "Win");
        assert!(win.is_ending);
        assert!(win.is_winning_ending);
        assert!(win.options.is_empty());

        let lose = &complete.all_nodes[&complete.root_node.options[1].node_id];
        assert_eq!(lose.content, "Lose");
        assert!(lose.is_ending);
        assert!(!lose.is_winning_ending);
        assert!(lose.options.is_empty());
    }

    #[test]
    fn every_option_targets_a_stored_node() {
        let mut conn = test_conn();
        ingest(&mut conn, Uuid::nil(), &two_choice_draft()).unwrap();

        let complete = assemble(test_story(), load_nodes(&conn, Uuid::nil())).unwrap();
        for node in complete.all_nodes.values() {
            for option in &node.options {
                assert!(complete.all_nodes.contains_key(&option.node_id));
            }
        }
    }

    #[test]
    fn exactly_one_root_is_persisted() {
        let mut conn = test_conn();
        ingest(&mut conn, Uuid::nil(), &two_choice_draft()).unwrap();

        let nodes = load_nodes(&conn, Uuid::nil());
        assert_eq!(nodes.iter().filter(|node| node.is_root).count(), 1);
    }

    #[test]
    fn option_order_survives_round_trip() {
        let mut conn = test_conn();
        let node = draft(json!({
            "content": "Crossroads",
            "isEnding": false,
            "isWinningEnding": false,
            "options": [
                {"text": "North", "nextNode": {"content": "A", "isEnding": true, "isWinningEnding": false}},
                {"text": "East", "nextNode": {"content": "B", "isEnding": true, "isWinningEnding": false}},
                {"text": "South", "nextNode": {"content": "C", "isEnding": true, "isWinningEnding": true}}
            ]
        }));
        ingest(&mut conn, Uuid::nil(), &node).unwrap();

        let complete = assemble(test_story(), load_nodes(&conn, Uuid::nil())).unwrap();
        let texts: Vec<&str> = complete
            .root_node
            .options
            .iter()
            .map(|option| option.text.as_str())
            .collect();
        assert_eq!(texts, ["North", "East", "South"]);
    }

    #[test]
    fn non_ending_node_without_options_is_rejected() {
        let mut conn = test_conn();
        let node = draft(json!({
            "content": "Dead end",
            "isEnding": false,
            "isWinningEnding": false
        }));

        let err = ingest(&mut conn, Uuid::nil(), &node).unwrap_err();
        assert!(matches!(err, Error::MalformedTree(_)));
    }

    #[test]
    fn options_on_an_ending_node_are_dropped() {
        let mut conn = test_conn();
        let node = draft(json!({
            "content": "The end",
            "isEnding": true,
            "isWinningEnding": true,
            "options": [
                {"text": "Keep going", "nextNode": {"content": "X", "isEnding": true, "isWinningEnding": false}}
            ]
        }));
        ingest(&mut conn, Uuid::nil(), &node).unwrap();

        let nodes = load_nodes(&conn, Uuid::nil());
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].options.is_empty());
    }

    #[test]
    fn snake_case_draft_fields_are_accepted() {
        let mut conn = test_conn();
        let node = draft(json!({
            "content": "Start",
            "is_ending": false,
            "is_winning_ending": false,
            "options": [
                {"text": "Onward", "next_node": {"content": "End", "is_ending": true, "is_winning_ending": true}}
            ]
        }));
        ingest(&mut conn, Uuid::nil(), &node).unwrap();
        assert_eq!(load_nodes(&conn, Uuid::nil()).len(), 2);
    }

    #[test]
    fn runaway_depth_is_rejected() {
        let mut chain = json!({"content": "End", "isEnding": true, "isWinningEnding": false});
        for level in 0..MAX_TREE_DEPTH + 1 {
            chain = json!({
                "content": format!("Level {level}"),
                "isEnding": false,
                "isWinningEnding": false,
                "options": [{"text": "Down", "nextNode": chain}]
            });
        }

        let mut conn = test_conn();
        let err = ingest(&mut conn, Uuid::nil(), &draft(chain)).unwrap_err();
        assert!(matches!(err, Error::MalformedTree(_)));
    }

    #[test]
    fn deep_linear_story_round_trips() {
        let mut chain = json!({"content": "Victory", "isEnding": true, "isWinningEnding": true});
        for level in (0..6).rev() {
            chain = json!({
                "content": format!("Level {level}"),
                "isEnding": false,
                "isWinningEnding": false,
                "options": [{"text": format!("Continue from {level}"), "nextNode": chain}]
            });
        }

        let mut conn = test_conn();
        ingest(&mut conn, Uuid::nil(), &draft(chain)).unwrap();

        let complete = assemble(test_story(), load_nodes(&conn, Uuid::nil())).unwrap();
        assert_eq!(complete.all_nodes.len(), 7);

        // Walk the chain from the root down to the single ending.
        let mut current = complete.root_node.clone();
        let mut depth = 0;
        while !current.is_ending {
            assert_eq!(current.options.len(), 1);
            current = complete.all_nodes[&current.options[0].node_id].clone();
            depth += 1;
        }
        assert_eq!(depth, 6);
        assert!(current.is_winning_ending);
    }

    #[test]
    fn assemble_without_nodes_fails() {
        let err = assemble(test_story(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::StructuralIntegrity(_)));
    }

    #[test]
    fn assemble_with_two_roots_fails() {
        let make_root = |content: &str| StoryNode {
            id: Uuid::new_v4(),
            story_id: Uuid::nil(),
            content: content.into(),
            is_root: true,
            is_ending: true,
            is_winning_ending: false,
            options: Vec::new(),
        };

        let err = assemble(test_story(), vec![make_root("A"), make_root("B")]).unwrap_err();
        assert!(matches!(err, Error::StructuralIntegrity(_)));
    }

    #[test]
    fn assemble_is_read_only_and_repeatable() {
        let mut conn = test_conn();
        ingest(&mut conn, Uuid::nil(), &two_choice_draft()).unwrap();

        let first = assemble(test_story(), load_nodes(&conn, Uuid::nil())).unwrap();
        let second = assemble(test_story(), load_nodes(&conn, Uuid::nil())).unwrap();

        assert_eq!(first.root_node.id, second.root_node.id);
        assert_eq!(first.all_nodes.len(), second.all_nodes.len());
        for (id, view) in &first.all_nodes {
            let other = &second.all_nodes[id];
            assert_eq!(view.content, other.content);
            assert_eq!(view.options, other.options);
        }
    }
}
