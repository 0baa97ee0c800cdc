use std::collections::HashMap;

use convo_msg::{Gravity, PostReason, PostRecord, Verb};
use convo_ref::{ActorId, RecordId, Timestamp};
use log::trace;

/// Why a root surfaced in the feed when it came in through a reshare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReshareContext {
    pub causer_id: ActorId,
    pub causer_name: String,
    pub causer_link: String,
    pub received: Option<Timestamp>,
    pub commented: Option<Timestamp>,
    pub created: Option<Timestamp>,
}

impl ReshareContext {
    fn from_announce(entry: &PostRecord) -> Self {
        let set = |timestamp: &Timestamp| (!timestamp.is_null()).then(|| timestamp.clone());
        Self {
            causer_id: entry.author_id,
            causer_name: entry.author_name.clone(),
            causer_link: entry.author_link.clone(),
            received: set(&entry.ordering.received),
            commented: set(&entry.ordering.commented),
            created: set(&entry.ordering.created),
        }
    }
}

/// The roots a feed page asks for, in feed order.
#[derive(Clone, Debug, Default)]
pub struct FeedRoots {
    ids: Vec<RecordId>,
    reshares: HashMap<RecordId, ReshareContext>,
}

impl FeedRoots {
    pub fn new(ids: Vec<RecordId>) -> Self {
        Self {
            ids,
            reshares: HashMap::new(),
        }
    }

    /// Feed entries are roots, or Announce activities standing for the root
    /// they reshare.
    pub fn from_entries(entries: &[PostRecord]) -> Self {
        let mut roots = Self::default();
        for entry in entries {
            let id = if entry.gravity == Gravity::Activity {
                let root = entry.thread_parent_id();
                if !entry.author_id.is_empty() {
                    roots
                        .reshares
                        .insert(root, ReshareContext::from_announce(entry));
                }
                root
            } else {
                entry.id
            };
            if !roots.ids.contains(&id) {
                roots.ids.push(id);
            }
        }
        roots
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn reshare(&self, root: RecordId) -> Option<&ReshareContext> {
        self.reshares.get(&root)
    }

    /// Adds causer, post reason and resharer details to a thread row.
    pub fn annotate(&self, record: &mut PostRecord, display_resharer: bool) {
        let context = match self.reshares.get(&record.root_id) {
            Some(context) => Some(context),
            None => self.reshares.get(&record.id),
        };

        if let Some(context) = context {
            if record.gravity == Gravity::Root && record.id == record.root_id {
                trace!("Root {} reshared by {}", record.id, context.causer_id);
                record.post_reason = PostReason::Announcement;
                record.causer_id = Some(context.causer_id);
                record.causer_name = context.causer_name.clone();
                record.causer_link = context.causer_link.clone();
                if let Some(received) = &context.received {
                    record.ordering.received = received.clone();
                }
                if let Some(commented) = &context.commented {
                    record.ordering.commented = commented.clone();
                }
                if let Some(created) = &context.created {
                    record.ordering.created = created.clone();
                }
            } else if record.gravity == Gravity::Activity
                && record.verb == Verb::Announce
                && record.author_id == context.causer_id
            {
                return;
            }
        }

        if display_resharer && record.post_reason == PostReason::Announcement {
            if let Some(causer) = record.causer().filter(|causer| !causer.id.is_empty()) {
                record.owner_id = causer.id;
                record.owner_name = causer.name;
                record.owner_link = causer.url;
                record.owner_server = record.causer_server;
            }
        }
    }
}
