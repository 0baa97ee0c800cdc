use std::collections::{BTreeMap, HashMap};

use convo_msg::{EmojiAggregate, Gravity, PostRecord, QuoteShare, Verb};
use convo_ref::{ActorId, RecordId};
use log::trace;
use serde::Serialize;

use crate::{config::ViewerPrefs, source::LinkResolver};

/// One first-class reaction verb and the verbs folded into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseRule {
    pub verb: Verb,
    pub aliases: Vec<Verb>,
}

impl ResponseRule {
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: Verb) -> Self {
        self.aliases.push(alias);
        self
    }

    pub fn matches(&self, verb: &Verb) -> bool {
        self.verb == *verb || self.aliases.contains(verb)
    }
}

/// Ordered reaction rules. A record lands in the first rule that matches it
/// and in no other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerbTable {
    rules: Vec<ResponseRule>,
}

impl Default for VerbTable {
    fn default() -> Self {
        Self::new(
            [
                Verb::Like,
                Verb::Dislike,
                Verb::AttendYes,
                Verb::AttendNo,
                Verb::AttendMaybe,
                Verb::Announce,
            ]
            .into_iter()
            .map(ResponseRule::new)
            .collect(),
        )
    }
}

impl VerbTable {
    pub fn new(rules: Vec<ResponseRule>) -> Self {
        Self { rules }
    }

    pub fn for_prefs(prefs: &ViewerPrefs) -> Self {
        let table = Self::default();
        if prefs.hide_dislike {
            table.without(&Verb::Dislike)
        } else {
            table
        }
    }

    pub fn without(mut self, verb: &Verb) -> Self {
        self.rules.retain(|rule| rule.verb != *verb);
        self
    }

    pub fn matching(&self, verb: &Verb) -> Option<&Verb> {
        self.rules
            .iter()
            .find(|rule| rule.matches(verb))
            .map(|rule| &rule.verb)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReactionBucket {
    pub verb: Verb,
    /// Rendered actor links, first seen first, each at most once.
    pub actors: Vec<String>,
    #[serde(rename = "self")]
    pub is_self: bool,
    pub total: usize,
}

impl ReactionBucket {
    fn new(verb: Verb) -> Self {
        Self {
            verb,
            actors: Vec::new(),
            is_self: false,
            total: 0,
        }
    }
}

/// Reaction counted elsewhere, keyed by its emoji.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmojiBucket {
    pub verb: Verb,
    pub emoji: String,
    pub total: usize,
    pub actors: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TargetReactions {
    pub buckets: Vec<ReactionBucket>,
    pub emojis: Vec<EmojiBucket>,
}

impl TargetReactions {
    pub fn bucket(&self, verb: &Verb) -> Option<&ReactionBucket> {
        self.buckets.iter().find(|bucket| bucket.verb == *verb)
    }

    fn bucket_mut(&mut self, verb: &Verb) -> Option<&mut ReactionBucket> {
        self.buckets.iter_mut().find(|bucket| bucket.verb == *verb)
    }

    fn bucket_or_insert(&mut self, verb: &Verb) -> &mut ReactionBucket {
        let index = match self.buckets.iter().position(|bucket| bucket.verb == *verb) {
            Some(index) => index,
            None => {
                self.buckets.push(ReactionBucket::new(verb.clone()));
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[index]
    }
}

/// Every reaction bucket of one assembly call, by target record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Reactions {
    targets: BTreeMap<RecordId, TargetReactions>,
}

impl Reactions {
    pub fn get(&self, target: RecordId) -> Option<&TargetReactions> {
        self.targets.get(&target)
    }

    pub fn bucket(&self, target: RecordId, verb: &Verb) -> Option<&ReactionBucket> {
        self.get(target).and_then(|reactions| reactions.bucket(verb))
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &TargetReactions)> {
        self.targets.iter()
    }
}

pub struct ReactionAggregator<'a> {
    table: &'a VerbTable,
    resolver: &'a dyn LinkResolver,
    viewer: ActorId,
    parent_causers: HashMap<RecordId, ActorId>,
    reactions: Reactions,
}

impl<'a> ReactionAggregator<'a> {
    pub fn new(table: &'a VerbTable, resolver: &'a dyn LinkResolver, viewer: ActorId) -> Self {
        Self {
            table,
            resolver,
            viewer,
            parent_causers: HashMap::new(),
            reactions: Reactions::default(),
        }
    }

    /// Who made each root show up, for dropping reshares of reshares.
    pub fn with_parent_causers(
        mut self,
        causers: impl IntoIterator<Item = (RecordId, ActorId)>,
    ) -> Self {
        for (id, causer) in causers {
            if !causer.is_empty() {
                self.parent_causers.entry(id).or_insert(causer);
            }
        }
        self
    }

    pub fn pull(&mut self, activity: &PostRecord) {
        let link = self.resolver.display_link(&activity.author());
        self.fold(activity, link);
    }

    /// Folds a reshare-with-quote into the Announce bucket of the quoted record.
    pub fn pull_quote_share(&mut self, share: &QuoteShare, quoted: Option<&PostRecord>) {
        let activity = quote_share_activity(share, quoted);
        let link = match &share.display_link {
            Some(link) => link.clone(),
            None => self.resolver.display_link(&share.author),
        };
        self.fold(&activity, link);
    }

    pub fn merge_emoji(&mut self, aggregate: &EmojiAggregate) {
        let target = self.reactions.targets.entry(aggregate.target).or_default();

        if let Some(verb) = self.table.matching(&aggregate.verb) {
            if let Some(bucket) = target.bucket_mut(verb) {
                bucket.total = bucket.total.max(aggregate.total);
                return;
            }
        }

        match target
            .emojis
            .iter_mut()
            .find(|emoji| emoji.verb == aggregate.verb && emoji.emoji == aggregate.emoji)
        {
            Some(existing) => {
                existing.total = existing.total.max(aggregate.total);
                for actor in &aggregate.actors {
                    if !existing.actors.contains(actor) {
                        existing.actors.push(actor.clone());
                    }
                }
            }
            None => target.emojis.push(EmojiBucket {
                verb: aggregate.verb.clone(),
                emoji: aggregate.emoji.clone(),
                total: aggregate.total,
                actors: aggregate.actors.clone(),
            }),
        }
    }

    pub fn finish(self) -> Reactions {
        self.reactions
    }

    fn fold(&mut self, activity: &PostRecord, link: String) {
        if activity.gravity == Gravity::Root {
            return;
        }
        let verb = match self.table.matching(activity.effective_verb()) {
            Some(verb) => verb.clone(),
            None => return,
        };
        let target = activity.thread_parent_id();

        if verb == Verb::Announce && self.is_reshare_of_reshare(activity, target) {
            trace!("Skip announce {} by the causer of {}", activity.id, target);
            return;
        }

        let bucket = self
            .reactions
            .targets
            .entry(target)
            .or_default()
            .bucket_or_insert(&verb);

        if bucket.actors.contains(&link) {
            return;
        }
        if !self.viewer.is_empty() && activity.author_id == self.viewer {
            bucket.is_self = true;
        }
        bucket.actors.push(link);
        bucket.total = bucket.total.max(bucket.actors.len());
    }

    fn is_reshare_of_reshare(&self, activity: &PostRecord, target: RecordId) -> bool {
        match self.parent_causers.get(&target) {
            Some(causer) => activity.causer_id == Some(*causer) || activity.author_id == *causer,
            None => false,
        }
    }
}

/// The Announce a quote share stands for, placed where the quoted record is.
pub fn quote_share_activity(share: &QuoteShare, quoted: Option<&PostRecord>) -> PostRecord {
    let (parent, root) = match quoted {
        Some(quoted) => (quoted.id, quoted.root_id),
        None => (share.quoted_id, share.quoted_id),
    };

    let mut activity = PostRecord::new(RecordId::default(), root, Gravity::Activity);
    activity.direct_parent_id = Some(parent);
    activity.verb = Verb::Announce;
    activity.author_id = share.author.id;
    activity.author_name = share.author.name.clone();
    activity.author_link = share.author.url.clone();
    activity
}

/// A stored record that only quotes another one, seen as a quote share.
pub fn quote_share_of(record: &PostRecord) -> Option<QuoteShare> {
    if !record.is_quote_share() {
        return None;
    }
    record.quoted_id.map(|quoted_id| QuoteShare {
        quoted_id,
        author: record.author(),
        display_link: None,
    })
}
