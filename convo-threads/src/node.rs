use convo_msg::PostRecord;
use convo_ref::RecordId;

/// A record placed in a conversation tree.
#[derive(Clone, Debug)]
pub struct ThreadNode {
    pub record: PostRecord,
    pub children: Vec<ThreadNode>,
    /// Kept for display although its author or owner is blocked or ignored.
    pub muted: bool,
}

impl ThreadNode {
    pub fn new(record: PostRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
            muted: false,
        }
    }

    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// Replies count, reactions do not.
    pub fn is_post(&self) -> bool {
        self.record.is_post()
    }

    pub fn count_descendants(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.count_descendants())
            .sum()
    }

    pub fn child_ids(&self) -> Vec<RecordId> {
        self.children.iter().map(ThreadNode::id).collect()
    }
}

pub(crate) fn count_posts(nodes: &[ThreadNode]) -> usize {
    nodes.iter().filter(|node| node.is_post()).count()
}
