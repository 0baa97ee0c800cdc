use convo_msg::{Direction, PostRecord};
use convo_ref::RecordId;
use serde::Serialize;

use crate::{
    node::ThreadNode,
    reactions::{Reactions, TargetReactions},
};

/// The assembled trees of one call plus their reaction buckets.
#[derive(Clone, Debug, Default)]
pub struct Conversation {
    pub roots: Vec<ThreadNode>,
    pub reactions: Reactions,
}

/// One node in display order. The node keeps its children, so the flat list
/// and the nested trees describe the same nodes.
#[derive(Clone, Debug, Serialize)]
pub struct FlatEntry<'a> {
    #[serde(skip)]
    pub node: &'a ThreadNode,
    #[serde(flatten)]
    pub record: &'a PostRecord,
    pub thread_level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_comments: Option<usize>,
    pub muted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<&'a TargetReactions>,
    pub children: Vec<RecordId>,
}

impl Conversation {
    /// Every node of every root, depth first, parents before their
    /// descendants.
    pub fn flat(&self) -> Vec<FlatEntry<'_>> {
        let mut entries = Vec::new();
        for root in &self.roots {
            self.push_entries(root, 1, &mut entries);
        }
        entries
    }

    pub fn flat_ids(&self) -> Vec<RecordId> {
        self.flat().iter().map(|entry| entry.record.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn push_entries<'a>(
        &'a self,
        node: &'a ThreadNode,
        thread_level: usize,
        entries: &mut Vec<FlatEntry<'a>>,
    ) {
        entries.push(FlatEntry {
            node,
            record: &node.record,
            thread_level,
            total_comments: (thread_level == 1).then(|| node.count_descendants()),
            muted: node.muted,
            direction: node.record.direction(),
            reactions: self.reactions.get(node.id()),
            children: node.child_ids(),
        });
        for child in &node.children {
            self.push_entries(child, thread_level + 1, entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::fixtures::{post, with};

    fn conversation() -> Conversation {
        Conversation {
            roots: vec![
                with(
                    post(1, 1, 0),
                    vec![with(post(2, 1, 1), vec![post(4, 1, 2)]), post(3, 1, 1)],
                ),
                post(9, 9, 0),
            ],
            reactions: Reactions::default(),
        }
    }

    #[test]
    fn test_pre_order_across_roots() {
        let conversation = conversation();
        assert_eq!(
            conversation.flat_ids(),
            [1, 2, 4, 3, 9].into_iter().map(RecordId::new).collect::<Vec<_>>()
        );
        assert_eq!(conversation.flat_ids(), conversation.flat_ids());
    }

    #[test]
    fn test_levels_and_counts() {
        let conversation = conversation();
        let flat = conversation.flat();
        let levels: Vec<usize> = flat.iter().map(|entry| entry.thread_level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2, 1]);
        assert_eq!(flat[0].total_comments, Some(3));
        assert_eq!(flat[1].total_comments, None);
        assert_eq!(flat[4].total_comments, Some(0));
        assert_eq!(flat[0].node.children.len(), 2);
    }

    #[test]
    fn test_entry_json() {
        let conversation = conversation();
        let flat = conversation.flat();
        let value = serde_json::to_value(&flat[1]).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["thread_level"], 2);
        assert_eq!(value["children"], serde_json::json!([4]));
        assert!(value.get("total_comments").is_none());
    }
}
