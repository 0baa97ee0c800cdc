use std::collections::VecDeque;

use log::trace;

use crate::node::{count_posts, ThreadNode};

/// Removes the "staircase" of lone reply chains: when a child is the last
/// one with replies and has exactly one reply post, that reply moves up to
/// the end of this node's children. Moved nodes are visited too. Reactions
/// never count and never move.
pub fn flatten(node: &mut ThreadNode) {
    if node.children.is_empty() {
        return;
    }

    let mut pending: VecDeque<usize> = (0..node.children.len()).collect();
    while let Some(index) = pending.pop_front() {
        if node.children[index].children.is_empty() {
            continue;
        }

        let child_posts = count_posts(&node.children[index].children);
        let remaining_posts = count_posts(&node.children[index..]);

        if child_posts == 1 && remaining_posts == 1 {
            let parent_id = node.id();
            let child = &mut node.children[index];
            if let Some(position) = child.children.iter().position(ThreadNode::is_post) {
                let moved = child.children.remove(position);
                trace!("Promote {} from {} to {}", moved.id(), child.id(), parent_id);
                node.children.push(moved);
                pending.push_back(node.children.len() - 1);
            }
        } else {
            flatten(&mut node.children[index]);
        }
    }
}

/// Drops reactions that are rendered as reaction buckets instead of nodes.
pub fn prune_hidden_activities(node: &mut ThreadNode) {
    node.children
        .retain(|child| !child.record.is_hidden_activity());
    for child in node.children.iter_mut() {
        prune_hidden_activities(child);
    }
}
