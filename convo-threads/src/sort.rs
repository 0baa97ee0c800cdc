use std::{cmp::Ordering, convert::TryFrom, fmt, str::FromStr};

use convo_msg::PostRecord;
use convo_ref::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{node::ThreadNode, Error};

/// How thread roots are ranked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderKey {
    Received,
    Commented,
    Created,
    PinnedReceived,
    PinnedCommented,
    PinnedCreated,
}

impl OrderKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKey::Received => "received",
            OrderKey::Commented => "commented",
            OrderKey::Created => "created",
            OrderKey::PinnedReceived => "pinned_received",
            OrderKey::PinnedCommented => "pinned_commented",
            OrderKey::PinnedCreated => "pinned_created",
        }
    }

    pub fn is_pinned_first(&self) -> bool {
        matches!(
            self,
            OrderKey::PinnedReceived | OrderKey::PinnedCommented | OrderKey::PinnedCreated
        )
    }

    fn timestamp<'a>(&self, record: &'a PostRecord) -> &'a Timestamp {
        match self {
            OrderKey::Received | OrderKey::PinnedReceived => &record.ordering.received,
            OrderKey::Commented | OrderKey::PinnedCommented => &record.ordering.commented,
            OrderKey::Created | OrderKey::PinnedCreated => &record.ordering.created,
        }
    }

    /// Most recent first, ties broken by id so the order is total.
    pub fn compare(&self, a: &PostRecord, b: &PostRecord) -> Ordering {
        let pinned = if self.is_pinned_first() {
            b.featured.cmp(&a.featured)
        } else {
            Ordering::Equal
        };
        pinned
            .then_with(|| self.timestamp(b).cmp(self.timestamp(a)))
            .then_with(|| b.id.cmp(&a.id))
    }
}

impl Default for OrderKey {
    fn default() -> Self {
        OrderKey::Commented
    }
}

impl FromStr for OrderKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(OrderKey::Received),
            "commented" => Ok(OrderKey::Commented),
            "created" => Ok(OrderKey::Created),
            "pinned_received" => Ok(OrderKey::PinnedReceived),
            "pinned_commented" => Ok(OrderKey::PinnedCommented),
            "pinned_created" => Ok(OrderKey::PinnedCreated),
            _ => Err(Error::UnknownOrder(s.to_string())),
        }
    }
}

impl TryFrom<String> for OrderKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderKey> for String {
    fn from(value: OrderKey) -> String {
        value.as_str().to_string()
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn sort_roots(roots: &mut [ThreadNode], order: OrderKey) {
    roots.sort_by(|a, b| order.compare(&a.record, &b.record));
}

/// Oldest received first at every depth.
pub fn sort_children(nodes: &mut [ThreadNode]) {
    nodes.sort_by(|a, b| compare_replies(&a.record, &b.record));
    for node in nodes.iter_mut() {
        sort_children(&mut node.children);
    }
}

fn compare_replies(a: &PostRecord, b: &PostRecord) -> Ordering {
    a.ordering
        .received
        .cmp(&b.ordering.received)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::fixtures::{post, with};
    use convo_ref::RecordId;

    fn root(id: u64, received: &str, featured: bool) -> ThreadNode {
        let mut node = post(id, id, 0);
        node.record.ordering.received = received.parse().unwrap();
        node.record.ordering.commented = received.parse().unwrap();
        node.record.featured = featured;
        node
    }

    fn ids(nodes: &[ThreadNode]) -> Vec<u64> {
        nodes.iter().map(|node| node.id().value()).collect()
    }

    #[test]
    fn test_parse_order_keys() {
        assert_eq!("pinned_created".parse::<OrderKey>().unwrap(), OrderKey::PinnedCreated);
        assert_eq!(OrderKey::PinnedCommented.to_string(), "pinned_commented");
        assert!(matches!(
            "newest".parse::<OrderKey>(),
            Err(Error::UnknownOrder(key)) if key == "newest"
        ));
    }

    #[test]
    fn test_roots_most_recent_first_with_id_tie_break() {
        let mut roots = vec![
            root(1, "2021-01-01 10:00:00", false),
            root(2, "2021-01-02 10:00:00", false),
            root(3, "2021-01-01 10:00:00", false),
        ];
        sort_roots(&mut roots, OrderKey::Received);
        assert_eq!(ids(&roots), vec![2, 3, 1]);

        sort_roots(&mut roots, OrderKey::Received);
        assert_eq!(ids(&roots), vec![2, 3, 1]);
    }

    #[test]
    fn test_pinned_roots_first() {
        let mut roots = vec![
            root(1, "2021-01-03 10:00:00", false),
            root(2, "2020-01-01 10:00:00", true),
            root(3, "2021-01-02 10:00:00", false),
        ];
        sort_roots(&mut roots, OrderKey::PinnedCommented);
        assert_eq!(ids(&roots), vec![2, 1, 3]);

        sort_roots(&mut roots, OrderKey::Commented);
        assert_eq!(ids(&roots), vec![1, 3, 2]);
    }

    #[test]
    fn test_children_oldest_first_at_every_depth() {
        let mut tree = vec![with(
            post(1, 1, 0),
            vec![
                with(post(5, 1, 1), vec![post(9, 1, 5), post(7, 1, 5)]),
                post(3, 1, 1),
            ],
        )];
        sort_children(&mut tree[0].children);
        assert_eq!(tree[0].child_ids(), vec![RecordId::new(3), RecordId::new(5)]);
        assert_eq!(
            tree[0].children[1].child_ids(),
            vec![RecordId::new(7), RecordId::new(9)]
        );
    }
}
