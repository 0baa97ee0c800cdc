use std::convert::Infallible;

use convo_msg::{EmojiAggregate, PostRecord, QuoteShare};
use convo_ref::{RecordId, Uid};
use convo_threads::{FeedRoots, Filters, OrderKey, RecordSource, Viewer};
use serde::Deserialize;

/// A captured page request: the rows storage would return plus who asked.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub viewer: Viewer,
    pub order: OrderKey,
    pub filters: Filters,
    /// Root ids to show, used when `feed` is empty.
    pub roots: Vec<RecordId>,
    /// Feed entries: roots, or reshares standing for their root.
    pub feed: Vec<PostRecord>,
    pub records: Vec<PostRecord>,
    pub reactions: Vec<PostRecord>,
    pub quote_shares: Vec<QuoteShare>,
    pub emojis: Vec<EmojiAggregate>,
}

impl Fixture {
    pub fn feed_roots(&self) -> FeedRoots {
        if self.feed.is_empty() {
            FeedRoots::new(self.roots.clone())
        } else {
            FeedRoots::from_entries(&self.feed)
        }
    }
}

fn in_roots(root_ids: &[RecordId], root: RecordId) -> bool {
    root_ids.is_empty() || root_ids.contains(&root)
}

impl RecordSource for Fixture {
    type Error = Infallible;

    fn fetch_candidate_records(
        &self,
        root_ids: &[RecordId],
        viewer_uid: Uid,
        _filters: &Filters,
    ) -> Result<Vec<PostRecord>, Self::Error> {
        let mut records: Vec<PostRecord> = self
            .records
            .iter()
            .filter(|record| in_roots(root_ids, record.root_id))
            .filter(|record| record.owner_uid.is_public() || record.owner_uid == viewer_uid)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id).then(b.owner_uid.cmp(&a.owner_uid)));
        Ok(records)
    }

    fn fetch_reaction_source_records(
        &self,
        root_ids: &[RecordId],
    ) -> Result<Vec<PostRecord>, Self::Error> {
        Ok(self
            .reactions
            .iter()
            .filter(|record| in_roots(root_ids, record.root_id))
            .cloned()
            .collect())
    }

    fn fetch_quote_share_records(
        &self,
        _root_ids: &[RecordId],
    ) -> Result<Vec<QuoteShare>, Self::Error> {
        Ok(self.quote_shares.clone())
    }

    fn fetch_emoji_aggregates(
        &self,
        _root_ids: &[RecordId],
    ) -> Result<Vec<EmojiAggregate>, Self::Error> {
        Ok(self.emojis.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidates_scoped_and_ordered() {
        let fixture: Fixture = serde_json::from_value(json!({
            "viewer": { "uid": 7 },
            "roots": [1],
            "records": [
                { "uri-id": 1, "parent-uri-id": 1, "gravity": 0 },
                { "uri-id": 2, "parent-uri-id": 1, "gravity": 6, "uid": 0 },
                { "uri-id": 2, "parent-uri-id": 1, "gravity": 6, "uid": 7 },
                { "uri-id": 3, "parent-uri-id": 1, "gravity": 6, "uid": 8 },
                { "uri-id": 5, "parent-uri-id": 4, "gravity": 6 }
            ]
        }))
        .unwrap();

        let roots = fixture.feed_roots();
        let records = fixture
            .fetch_candidate_records(roots.ids(), fixture.viewer.uid, &fixture.filters)
            .unwrap();
        let keys: Vec<(u64, u64)> = records
            .iter()
            .map(|record| (record.id.value(), record.owner_uid.value()))
            .collect();
        assert_eq!(keys, vec![(2, 7), (2, 0), (1, 0)]);
    }

    #[test]
    fn test_demo_thread() {
        let fixture: Fixture =
            serde_json::from_str(include_str!("../../demos/thread.json")).unwrap();
        let engine = convo_threads::Engine::new(Default::default()).unwrap();
        let conversation = engine
            .load(
                &fixture,
                fixture.feed_roots(),
                fixture.order,
                fixture.filters.clone(),
                fixture.viewer.clone(),
            )
            .unwrap();

        assert_eq!(conversation.flat_ids(), [1, 2, 3].map(RecordId::new).to_vec());
        let likes = conversation
            .reactions
            .bucket(RecordId::new(3), &convo_msg::Verb::Like)
            .unwrap();
        assert!(likes.is_self);
        let walk = &conversation.reactions.get(RecordId::new(1)).unwrap().emojis[0];
        assert_eq!(walk.total, 4);
    }
}
