use convo_msg::{ActorRef, EmojiAggregate, PostRecord, QuoteShare};
use convo_ref::{RecordId, Uid};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::filter::Filters;

/// Where the engine's input comes from. Implementations return candidate
/// records already restricted to what the viewer may see, ordered by id
/// descending and then owner uid descending.
pub trait RecordSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_candidate_records(
        &self,
        root_ids: &[RecordId],
        viewer_uid: Uid,
        filters: &Filters,
    ) -> Result<Vec<PostRecord>, Self::Error>;

    fn fetch_reaction_source_records(
        &self,
        root_ids: &[RecordId],
    ) -> Result<Vec<PostRecord>, Self::Error>;

    fn fetch_quote_share_records(
        &self,
        root_ids: &[RecordId],
    ) -> Result<Vec<QuoteShare>, Self::Error>;

    fn fetch_emoji_aggregates(
        &self,
        root_ids: &[RecordId],
    ) -> Result<Vec<EmojiAggregate>, Self::Error>;
}

/// Inputs of the reaction aggregator that do not come from the thread rows.
#[derive(Clone, Debug, Default)]
pub struct ReactionInputs {
    pub activities: Vec<PostRecord>,
    pub quote_shares: Vec<QuoteShare>,
    pub emojis: Vec<EmojiAggregate>,
}

/// Renders an actor as the string shown in reaction lists. The engine only
/// compares the result, it never looks inside.
pub trait LinkResolver {
    fn display_link(&self, actor: &ActorRef) -> String;
}

#[derive(Clone, Debug, Default)]
pub struct ProfileLinkResolver {
    pub base_url: String,
}

impl ProfileLinkResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl LinkResolver for ProfileLinkResolver {
    fn display_link(&self, actor: &ActorRef) -> String {
        let name = encode_text(&actor.name);
        if actor.id.is_empty() {
            format!(
                r#"<a href="{}">{}</a>"#,
                encode_double_quoted_attribute(&actor.url),
                name
            )
        } else {
            format!(
                r#"<a href="{}{}" class="sparkle">{}</a>"#,
                self.base_url,
                encode_double_quoted_attribute(&actor.id.to_redir_url(&actor.url)),
                name
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_ref::ActorId;

    #[test]
    fn test_profile_link() {
        let resolver = ProfileLinkResolver::new("https://local.example/");
        let actor = ActorRef {
            id: ActorId::new(5),
            name: "Alice & <Bob>".to_string(),
            url: "https://remote.example/u/alice".to_string(),
        };
        assert_eq!(
            resolver.display_link(&actor),
            "<a href=\"https://local.example/contact/redir/5?url=https%3A%2F%2Fremote.example%2Fu%2Falice\" class=\"sparkle\">Alice &amp; &lt;Bob&gt;</a>"
        );
    }

    #[test]
    fn test_link_without_contact() {
        let resolver = ProfileLinkResolver::default();
        let actor = ActorRef {
            id: ActorId::default(),
            name: "carol".to_string(),
            url: "https://remote.example/@carol".to_string(),
        };
        assert_eq!(
            resolver.display_link(&actor),
            "<a href=\"https://remote.example/@carol\">carol</a>"
        );
    }

    #[test]
    fn test_link_quotes_escaped() {
        let actor = ActorRef {
            id: ActorId::default(),
            name: "\"erin\"".to_string(),
            url: "https://remote.example/?u=\"erin\"&x=1".to_string(),
        };
        assert_eq!(
            ProfileLinkResolver::default().display_link(&actor),
            "<a href=\"https://remote.example/?u=&quot;erin&quot;&amp;x=1\">\"erin\"</a>"
        );
    }
}
