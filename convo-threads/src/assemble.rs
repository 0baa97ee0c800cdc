use std::collections::{HashMap, HashSet};

use convo_msg::{Gravity, PostRecord};
use convo_ref::RecordId;
use log::{debug, trace};

use crate::{
    filter::{Filters, Verdict},
    node::ThreadNode,
};

struct Slot {
    record: PostRecord,
    muted: bool,
}

/// Deduplicated, filtered and capped thread rows, waiting to be plucked into
/// trees. A row plucked once is gone for every other root.
pub struct WorkingSet {
    slots: Vec<Option<Slot>>,
    by_parent: HashMap<RecordId, Vec<usize>>,
    by_root: HashMap<RecordId, Vec<usize>>,
}

impl WorkingSet {
    /// Rows must arrive with the per-user copy of an id ahead of the public
    /// copy: the first row seen for an id is the one kept.
    pub fn build(
        records: impl IntoIterator<Item = PostRecord>,
        filters: &Filters,
        cap: usize,
    ) -> Self {
        let mut seen: HashSet<RecordId> = HashSet::new();
        let mut comments: HashMap<RecordId, usize> = HashMap::new();
        let mut activities: HashMap<RecordId, usize> = HashMap::new();
        let mut set = Self {
            slots: Vec::new(),
            by_parent: HashMap::new(),
            by_root: HashMap::new(),
        };

        for record in records {
            if !seen.insert(record.id) {
                trace!("Drop duplicate of {} for uid {}", record.id, record.owner_uid);
                continue;
            }

            let muted = match filters.verdict(&record) {
                Verdict::Drop => {
                    trace!("Drop filtered record {}", record.id);
                    continue;
                }
                Verdict::Mute => true,
                Verdict::Keep => false,
            };

            if cap > 0 {
                let counter = match record.gravity {
                    Gravity::Comment => Some(&mut comments),
                    Gravity::Activity => Some(&mut activities),
                    Gravity::Root => None,
                };
                if let Some(counter) = counter {
                    let count = counter.entry(record.root_id).or_insert(0);
                    *count += 1;
                    if *count > cap {
                        trace!("Drop record {} over the cap of root {}", record.id, record.root_id);
                        continue;
                    }
                }
            }

            let index = set.slots.len();
            if record.gravity != Gravity::Root {
                set.by_parent
                    .entry(record.thread_parent_id())
                    .or_default()
                    .push(index);
                set.by_root.entry(record.root_id).or_default().push(index);
            }
            set.slots.push(Some(Slot { record, muted }));
        }

        set
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the root rows out, in input order. With no requested ids every
    /// root row is taken.
    pub fn take_roots(&mut self, requested: &[RecordId]) -> Vec<ThreadNode> {
        let mut roots = Vec::new();
        for slot in self.slots.iter_mut() {
            let wanted = match slot {
                Some(Slot { record, .. }) => {
                    record.gravity == Gravity::Root
                        && (requested.is_empty() || requested.contains(&record.id))
                }
                None => false,
            };
            if wanted {
                if let Some(slot) = slot.take() {
                    roots.push(into_node(slot));
                }
            }
        }
        roots
    }

    /// Attaches everything below `root`: first by direct parent, recursively,
    /// then any leftover row of the same thread straight under the root.
    pub fn attach_children(&mut self, root: &mut ThreadNode) {
        let mut children = self.pluck_replies(root.id());
        children.extend(self.pluck_orphans(root.id()));
        root.children = children;
    }

    fn pluck_replies(&mut self, parent: RecordId) -> Vec<ThreadNode> {
        let indexes = match self.by_parent.get(&parent) {
            Some(indexes) => indexes.clone(),
            None => return Vec::new(),
        };

        let mut children = Vec::new();
        for index in indexes {
            if let Some(slot) = self.slots[index].take() {
                let mut node = into_node(slot);
                node.children = self.pluck_replies(node.id());
                children.push(node);
            }
        }
        children
    }

    fn pluck_orphans(&mut self, root: RecordId) -> Vec<ThreadNode> {
        let indexes = match self.by_root.get(&root) {
            Some(indexes) => indexes.clone(),
            None => return Vec::new(),
        };

        indexes
            .into_iter()
            .filter_map(|index| self.slots[index].take())
            .map(|slot| {
                trace!("Attach orphan {} to root {}", slot.record.id, root);
                into_node(slot)
            })
            .collect()
    }

    /// Rows no root claimed. They are left out of the output.
    pub fn unattached(&self) -> Vec<RecordId> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| slot.record.id)
            .collect()
    }
}

fn into_node(slot: Slot) -> ThreadNode {
    let mut node = ThreadNode::new(slot.record);
    node.muted = slot.muted;
    node
}

/// Builds one tree per requested root. Rows that fit under no root are
/// dropped.
pub fn assemble_trees(mut set: WorkingSet, requested: &[RecordId]) -> Vec<ThreadNode> {
    let mut roots = set.take_roots(requested);
    for root in roots.iter_mut() {
        set.attach_children(root);
    }

    let unattached = set.unattached();
    if !unattached.is_empty() {
        debug!("{} records left unattached: {:?}", unattached.len(), unattached);
    }
    debug!("Assembled {} roots", roots.len());

    roots
}
