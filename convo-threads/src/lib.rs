use std::collections::HashMap;

use convo_msg::{Gravity, PostRecord, Verb};
use convo_ref::{ActorId, RecordId, Uid};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub mod assemble;
pub mod config;
pub mod feed;
pub mod filter;
pub mod flatten;
pub mod node;
pub mod phrase;
pub mod reactions;
pub mod serialize;
pub mod sort;
pub mod source;

pub use assemble::WorkingSet;
pub use config::{EngineConfig, ViewerPrefs};
pub use feed::{FeedRoots, ReshareContext};
pub use filter::{FilterMode, Filters, Verdict};
pub use node::ThreadNode;
pub use phrase::{EnglishPhrasebook, Phrase, Phrasebook};
pub use reactions::{
    EmojiBucket, ReactionAggregator, ReactionBucket, Reactions, ResponseRule, TargetReactions,
    VerbTable,
};
pub use serialize::{Conversation, FlatEntry};
pub use sort::OrderKey;
pub use source::{LinkResolver, ProfileLinkResolver, ReactionInputs, RecordSource};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Cannot phrase {verb} reactions without actors")]
    NoActors { verb: Verb },
    #[error("Unknown ordering key: {0}")]
    UnknownOrder(String),
    #[error("Invalid config for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("Failed to fetch records, cause: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Who is looking, and how they like threads shown.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Viewer {
    pub uid: Uid,
    /// The viewer's public contact id, for the `self` flag of reactions.
    pub actor_id: ActorId,
    pub prefs: ViewerPrefs,
}

/// Everything one call works on, already fetched.
#[derive(Clone, Debug, Default)]
pub struct AssembleRequest {
    /// Thread rows ordered by id descending, then owner uid descending.
    pub records: Vec<PostRecord>,
    pub roots: FeedRoots,
    pub reactions: ReactionInputs,
    pub order: OrderKey,
    pub filters: Filters,
    pub viewer: Viewer,
}

pub struct Engine<R = ProfileLinkResolver, P = EnglishPhrasebook> {
    config: EngineConfig,
    resolver: R,
    phrasebook: P,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, Error> {
        Self::with_collaborators(config, ProfileLinkResolver::default(), EnglishPhrasebook)
    }
}

impl<R: LinkResolver, P: Phrasebook> Engine<R, P> {
    pub fn with_collaborators(
        config: EngineConfig,
        resolver: R,
        phrasebook: P,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            resolver,
            phrasebook,
        })
    }

    /// Fetches the roots' rows and reactions from `source`, then assembles.
    pub fn load<S: RecordSource>(
        &self,
        source: &S,
        roots: FeedRoots,
        order: OrderKey,
        filters: Filters,
        viewer: Viewer,
    ) -> Result<Conversation, Error> {
        let ids = roots.ids().to_vec();
        let records = source
            .fetch_candidate_records(&ids, viewer.uid, &filters)
            .map_err(source_error)?;
        let reactions = ReactionInputs {
            activities: source
                .fetch_reaction_source_records(&ids)
                .map_err(source_error)?,
            quote_shares: source.fetch_quote_share_records(&ids).map_err(source_error)?,
            emojis: source.fetch_emoji_aggregates(&ids).map_err(source_error)?,
        };

        Ok(self.assemble(AssembleRequest {
            records,
            roots,
            reactions,
            order,
            filters,
            viewer,
        }))
    }

    /// Turns thread rows into sorted, optionally flattened trees with their
    /// reactions. Rows that cannot be placed are left out, never reported.
    pub fn assemble(&self, request: AssembleRequest) -> Conversation {
        let AssembleRequest {
            mut records,
            roots,
            reactions: reaction_inputs,
            order,
            filters,
            viewer,
        } = request;

        for record in records.iter_mut() {
            roots.annotate(record, viewer.prefs.display_resharer);
        }

        let reactions = self.aggregate(&records, &reaction_inputs, &filters, &viewer);

        let root_count = if roots.is_empty() {
            records
                .iter()
                .filter(|record| record.gravity == Gravity::Root)
                .map(|record| record.id)
                .unique()
                .count()
        } else {
            roots.len()
        };
        let cap = self.config.cap_for(root_count);

        let set = WorkingSet::build(records, &filters, cap);
        let mut trees = assemble::assemble_trees(set, roots.ids());

        sort::sort_roots(&mut trees, order);
        for tree in trees.iter_mut() {
            sort::sort_children(&mut tree.children);
            if viewer.prefs.smart_flatten {
                flatten::flatten(tree);
            }
            flatten::prune_hidden_activities(tree);
        }

        info!("Assembled {} conversations ordered by {}", trees.len(), order);

        Conversation {
            roots: trees,
            reactions,
        }
    }

    /// Reaction phrases for every bucket of `target`, in verb table order.
    pub fn phrases(
        &self,
        conversation: &Conversation,
        target: RecordId,
    ) -> Result<Vec<Phrase>, Error> {
        let reactions = match conversation.reactions.get(target) {
            Some(reactions) => reactions,
            None => return Ok(Vec::new()),
        };

        reactions
            .buckets
            .iter()
            .map(|bucket| {
                phrase::phrase_for(
                    &self.phrasebook,
                    &bucket.verb,
                    target,
                    &bucket.actors,
                    bucket.total,
                    self.config.max_likers,
                )
            })
            .collect()
    }

    fn aggregate(
        &self,
        records: &[PostRecord],
        inputs: &ReactionInputs,
        filters: &Filters,
        viewer: &Viewer,
    ) -> Reactions {
        let table = VerbTable::for_prefs(&viewer.prefs);

        let mut causers: HashMap<RecordId, ActorId> = HashMap::new();
        let mut known: HashMap<RecordId, &PostRecord> = HashMap::new();
        for record in records {
            known.entry(record.id).or_insert(record);
            if record.gravity != Gravity::Root {
                continue;
            }
            if let Some(causer) = record.causer_id {
                causers.entry(record.id).or_insert(causer);
            }
        }

        let mut aggregator = ReactionAggregator::new(&table, &self.resolver, viewer.actor_id)
            .with_parent_causers(causers);

        let visible = |record: &&PostRecord| filters.verdict(record) != Verdict::Drop;

        for activity in records
            .iter()
            .chain(inputs.activities.iter())
            .filter(|record| record.gravity == Gravity::Activity)
            .filter(visible)
        {
            aggregator.pull(activity);
        }

        for share in records
            .iter()
            .filter(visible)
            .filter_map(crate::reactions::quote_share_of)
            .chain(inputs.quote_shares.iter().cloned())
        {
            let quoted = known.get(&share.quoted_id).copied();
            aggregator.pull_quote_share(&share, quoted);
        }

        for emoji in &inputs.emojis {
            aggregator.merge_emoji(emoji);
        }

        let reactions = aggregator.finish();
        debug!("Aggregated reactions for {} targets", reactions.iter().count());
        reactions
    }
}

fn source_error<E: std::error::Error + Send + Sync + 'static>(error: E) -> Error {
    Error::Source(Box::new(error))
}
