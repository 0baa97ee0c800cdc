use convo_ref::{ActorId, RecordId, ServerId, Timestamp, Uid};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};
use std::{convert::TryFrom, fmt};
use thiserror::Error as ThisError;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MsgError {
    #[error("Unknown gravity: {0}")]
    UnknownGravity(String),
}

/// Structural role of a record inside its thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "GravityRepr", rename_all = "lowercase")]
pub enum Gravity {
    Root,
    Comment,
    Activity,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum GravityRepr {
    Code(u8),
    Name(String),
}

impl Gravity {
    // storage codes
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Gravity::Root),
            3 => Some(Gravity::Activity),
            6 => Some(Gravity::Comment),
            _ => None,
        }
    }
}

impl TryFrom<GravityRepr> for Gravity {
    type Error = MsgError;

    fn try_from(value: GravityRepr) -> Result<Self, Self::Error> {
        match value {
            GravityRepr::Code(code) => {
                Gravity::from_code(code).ok_or_else(|| MsgError::UnknownGravity(code.to_string()))
            }
            GravityRepr::Name(name) => match name.to_lowercase().as_str() {
                "root" | "parent" => Ok(Gravity::Root),
                "comment" => Ok(Gravity::Comment),
                "activity" => Ok(Gravity::Activity),
                _ => Err(MsgError::UnknownGravity(name)),
            },
        }
    }
}

/// Semantic action of a record. Parsed from bare names (`like`), canonical
/// names (`AttendYes`) or namespaced activity URIs, by their final segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Verb {
    #[default]
    Post,
    Like,
    Dislike,
    AttendYes,
    AttendNo,
    AttendMaybe,
    Announce,
    EmojiReact,
    View,
    Follow,
    Other(String),
}

static POST_VERB: Verb = Verb::Post;

impl Verb {
    pub fn from_name(name: &str) -> Self {
        let segment = name
            .rsplit(|c: char| c == '/' || c == '#')
            .next()
            .unwrap_or(name)
            .to_lowercase();

        match segment.as_str() {
            "post" | "note" => Verb::Post,
            "like" => Verb::Like,
            "dislike" => Verb::Dislike,
            "attendyes" | "attend" => Verb::AttendYes,
            "attendno" => Verb::AttendNo,
            "attendmaybe" => Verb::AttendMaybe,
            "announce" | "share" => Verb::Announce,
            "emojireact" | "emojireaction" => Verb::EmojiReact,
            "view" => Verb::View,
            "follow" => Verb::Follow,
            _ => Verb::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Verb::Post => "Post",
            Verb::Like => "Like",
            Verb::Dislike => "Dislike",
            Verb::AttendYes => "AttendYes",
            Verb::AttendNo => "AttendNo",
            Verb::AttendMaybe => "AttendMaybe",
            Verb::Announce => "Announce",
            Verb::EmojiReact => "EmojiReact",
            Verb::View => "View",
            Verb::Follow => "Follow",
            Verb::Other(name) => name.as_str(),
        }
    }

    /// Activities that are shown folded into their target instead of as a
    /// node of their own.
    pub fn is_hidden_activity(&self) -> bool {
        !matches!(self, Verb::Post | Verb::Other(_))
    }
}

impl From<String> for Verb {
    fn from(value: String) -> Self {
        Verb::from_name(value.as_str())
    }
}

impl From<Verb> for String {
    fn from(value: Verb) -> String {
        value.name().to_string()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderingKeys {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub received: Timestamp,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub commented: Timestamp,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub created: Timestamp,
}

/// Why a record reached the viewer's stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostReason {
    To,
    Cc,
    Bto,
    Bcc,
    Follower,
    Tag,
    Announcement,
    Comment,
    Stored,
    Global,
    Relay,
    Fetched,
    #[default]
    #[serde(other)]
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Direction {
    pub code: u8,
    pub kind: PostReason,
}

impl PostReason {
    pub fn direction(&self) -> Option<Direction> {
        let code = match self {
            PostReason::None => return None,
            PostReason::To | PostReason::Cc | PostReason::Bto | PostReason::Bcc => 7,
            PostReason::Follower => 6,
            PostReason::Tag => 4,
            PostReason::Announcement => 3,
            PostReason::Comment => 5,
            PostReason::Stored => 8,
            PostReason::Global => 9,
            PostReason::Relay => 10,
            PostReason::Fetched => 2,
        };
        Some(Direction {
            code,
            kind: *self,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActorRef {
    pub id: ActorId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// One post or activity as materialized for a viewer.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PostRecord {
    #[serde(alias = "uri-id")]
    pub id: RecordId,
    #[serde(alias = "parent-uri-id")]
    pub root_id: RecordId,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "thr-parent-id")]
    pub direct_parent_id: Option<RecordId>,
    pub gravity: Gravity,
    #[serde(default)]
    pub verb: Verb,

    #[serde(default, alias = "author-id")]
    pub author_id: ActorId,
    #[serde(default, alias = "author-name")]
    pub author_name: String,
    #[serde(default, alias = "author-link")]
    pub author_link: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "author-gsid")]
    pub author_server: Option<ServerId>,

    #[serde(default, alias = "owner-id")]
    pub owner_id: ActorId,
    #[serde(default, alias = "owner-name")]
    pub owner_name: String,
    #[serde(default, alias = "owner-link")]
    pub owner_link: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "owner-gsid")]
    pub owner_server: Option<ServerId>,

    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "causer-id")]
    pub causer_id: Option<ActorId>,
    #[serde(default, alias = "causer-name")]
    pub causer_name: String,
    #[serde(default, alias = "causer-link")]
    pub causer_link: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "causer-gsid")]
    pub causer_server: Option<ServerId>,

    #[serde(flatten)]
    pub ordering: OrderingKeys,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "pinned")]
    pub featured: bool,
    #[serde(default, alias = "uid")]
    pub owner_uid: Uid,
    #[serde(default, alias = "post-reason")]
    pub post_reason: PostReason,

    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "quote-uri-id")]
    pub quoted_id: Option<RecordId>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub payload: Value,
}

impl PostRecord {
    pub fn new(id: RecordId, root_id: RecordId, gravity: Gravity) -> Self {
        Self {
            id,
            root_id,
            direct_parent_id: None,
            gravity,
            verb: Verb::Post,
            author_id: ActorId::default(),
            author_name: String::new(),
            author_link: String::new(),
            author_server: None,
            owner_id: ActorId::default(),
            owner_name: String::new(),
            owner_link: String::new(),
            owner_server: None,
            causer_id: None,
            causer_name: String::new(),
            causer_link: String::new(),
            causer_server: None,
            ordering: OrderingKeys::default(),
            featured: false,
            owner_uid: Uid::default(),
            post_reason: PostReason::None,
            quoted_id: None,
            body: String::new(),
            payload: Value::Null,
        }
    }

    /// The record this one replies or reacts to, falling back to the root.
    pub fn thread_parent_id(&self) -> RecordId {
        match self.direct_parent_id {
            Some(id) if !id.is_empty() => id,
            _ => self.root_id,
        }
    }

    /// The verb is only meaningful for activities; anything else is a post.
    pub fn effective_verb(&self) -> &Verb {
        match self.gravity {
            Gravity::Activity => &self.verb,
            _ => &POST_VERB,
        }
    }

    pub fn is_post(&self) -> bool {
        *self.effective_verb() == Verb::Post
    }

    pub fn is_hidden_activity(&self) -> bool {
        self.gravity == Gravity::Activity && self.verb.is_hidden_activity()
    }

    pub fn is_quote_share(&self) -> bool {
        matches!(self.quoted_id, Some(id) if !id.is_empty()) && self.body.trim().is_empty()
    }

    pub fn author(&self) -> ActorRef {
        ActorRef {
            id: self.author_id,
            name: self.author_name.clone(),
            url: self.author_link.clone(),
        }
    }

    pub fn causer(&self) -> Option<ActorRef> {
        self.causer_id.map(|id| ActorRef {
            id,
            name: self.causer_name.clone(),
            url: self.causer_link.clone(),
        })
    }

    pub fn direction(&self) -> Option<Direction> {
        self.post_reason.direction()
    }
}

/// A reshare-with-comment surfaced by a separate query instead of as a row.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuoteShare {
    #[serde(alias = "quote-uri-id")]
    pub quoted_id: RecordId,
    #[serde(flatten)]
    pub author: ActorRef,
    #[serde(default)]
    pub display_link: Option<String>,
}

/// Pre-counted reactions for one target, possibly counted on remote servers.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EmojiAggregate {
    #[serde(alias = "thr-parent-id")]
    pub target: RecordId,
    #[serde(default = "emoji_react")]
    pub verb: Verb,
    #[serde(default)]
    pub emoji: String,
    pub total: usize,
    #[serde(default, alias = "title")]
    pub actors: Vec<String>,
}

fn emoji_react() -> Verb {
    Verb::EmojiReact
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment_json() -> Value {
        json!({
            "uri-id": 12,
            "parent-uri-id": 10,
            "thr-parent-id": 11,
            "gravity": 6,
            "author-id": 3,
            "author-name": "bob",
            "owner-id": "3",
            "received": "2021-03-04 12:00:00",
            "commented": "2021-03-04 12:00:00",
            "created": "2021-03-04 11:59:00",
            "uid": 7,
            "body": "hi"
        })
    }

    #[test]
    fn test_parse_storage_names() {
        let record: PostRecord = serde_json::from_value(comment_json()).unwrap();
        assert_eq!(record.id, RecordId::new(12));
        assert_eq!(record.root_id, RecordId::new(10));
        assert_eq!(record.thread_parent_id(), RecordId::new(11));
        assert_eq!(record.gravity, Gravity::Comment);
        assert_eq!(record.owner_uid, Uid::new(7));
        assert_eq!(record.owner_id, ActorId::new(3));
        assert_eq!(record.ordering.created.as_str(), "2021-03-04 11:59:00");
        assert!(record.is_post());
    }

    #[test]
    fn test_thread_parent_falls_back_to_root() {
        let mut value = comment_json();
        value["thr-parent-id"] = json!(0);
        let record: PostRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.thread_parent_id(), RecordId::new(10));

        value["thr-parent-id"] = json!("not a number");
        let record: PostRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.direct_parent_id, None);
        assert_eq!(record.thread_parent_id(), RecordId::new(10));
    }

    #[test]
    fn test_malformed_timestamp_is_null() {
        let mut value = comment_json();
        value["received"] = json!("yesterday");
        let record: PostRecord = serde_json::from_value(value).unwrap();
        assert!(record.ordering.received.is_null());
    }

    #[test]
    fn test_verb_from_activity_uri() {
        assert_eq!(
            Verb::from_name("http://activitystrea.ms/schema/1.0/like"),
            Verb::Like
        );
        assert_eq!(
            Verb::from_name("http://activitystrea.ms/schema/1.0/share"),
            Verb::Announce
        );
        assert_eq!(
            Verb::from_name("http://purl.org/zot/activity/attendmaybe"),
            Verb::AttendMaybe
        );
        assert_eq!(
            Verb::from_name("https://www.w3.org/ns/activitystreams#Announce"),
            Verb::Announce
        );
        assert_eq!(Verb::from_name("AttendNo"), Verb::AttendNo);
        assert_eq!(
            Verb::from_name("http://example.org/poke"),
            Verb::Other("http://example.org/poke".to_string())
        );
    }

    #[test]
    fn test_verb_only_counts_for_activities() {
        let mut value = comment_json();
        value["verb"] = json!("like");
        let record: PostRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.effective_verb(), &Verb::Post);
        assert!(!record.is_hidden_activity());

        value["gravity"] = json!("activity");
        let record: PostRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.effective_verb(), &Verb::Like);
        assert!(record.is_hidden_activity());
        assert!(!record.is_post());
    }

    #[test]
    fn test_unknown_gravity() {
        let mut value = comment_json();
        value["gravity"] = json!(4);
        assert!(serde_json::from_value::<PostRecord>(value).is_err());
    }

    #[test]
    fn test_quote_share() {
        let mut value = comment_json();
        value["quote-uri-id"] = json!(99);
        value["body"] = json!("  ");
        let record: PostRecord = serde_json::from_value(value.clone()).unwrap();
        assert!(record.is_quote_share());

        value["body"] = json!("look at this");
        let record: PostRecord = serde_json::from_value(value).unwrap();
        assert!(!record.is_quote_share());
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(PostReason::None.direction(), None);
        assert_eq!(PostReason::Bcc.direction().unwrap().code, 7);
        assert_eq!(PostReason::Announcement.direction().unwrap().code, 3);
        assert_eq!(PostReason::Fetched.direction().unwrap().code, 2);

        let reason: PostReason = serde_json::from_value(json!("something-new")).unwrap();
        assert_eq!(reason, PostReason::None);
    }

    #[test]
    fn test_post_reason_names() {
        assert_eq!(PostReason::default(), PostReason::None);
        assert_eq!(serde_json::to_value(PostReason::None).unwrap(), json!("none"));
        assert_eq!(
            serde_json::to_value(PostReason::Announcement).unwrap(),
            json!("announcement")
        );
        let reason: PostReason = serde_json::from_value(json!("none")).unwrap();
        assert_eq!(reason, PostReason::None);
        let reason: PostReason = serde_json::from_value(json!("tag")).unwrap();
        assert_eq!(reason, PostReason::Tag);
    }
}
