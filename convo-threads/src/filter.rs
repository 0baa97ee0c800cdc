use std::collections::HashSet;

use convo_msg::PostRecord;
use convo_ref::{ActorId, ServerId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Network and community feeds: blocked or ignored actors disappear.
    #[default]
    Feed,
    /// A contact's own history: their posts stay, muted.
    AlwaysDisplay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Mute,
    Drop,
}

/// Actor and server sets resolved by the caller before assembly.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Filters {
    pub ignored_servers: HashSet<ServerId>,
    pub blocked_actors: HashSet<ActorId>,
    pub ignored_actors: HashSet<ActorId>,
    pub mode: FilterMode,
}

impl Filters {
    pub fn verdict(&self, record: &PostRecord) -> Verdict {
        let servers = [
            record.author_server,
            record.owner_server,
            record.causer_server,
        ];
        if servers
            .iter()
            .flatten()
            .any(|server| self.ignored_servers.contains(server))
        {
            return Verdict::Drop;
        }

        if self.is_hidden_actor(record.author_id) || self.is_hidden_actor(record.owner_id) {
            return match self.mode {
                FilterMode::Feed => Verdict::Drop,
                FilterMode::AlwaysDisplay => Verdict::Mute,
            };
        }

        Verdict::Keep
    }

    fn is_hidden_actor(&self, actor: ActorId) -> bool {
        !actor.is_empty()
            && (self.blocked_actors.contains(&actor) || self.ignored_actors.contains(&actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_msg::Gravity;
    use convo_ref::RecordId;

    fn record(author: u64, owner: u64) -> PostRecord {
        let mut record = PostRecord::new(RecordId::new(2), RecordId::new(1), Gravity::Comment);
        record.author_id = ActorId::new(author);
        record.owner_id = ActorId::new(owner);
        record
    }

    #[test]
    fn test_blocked_author_dropped_in_feed() {
        let filters = Filters {
            blocked_actors: [ActorId::new(3)].into_iter().collect(),
            ..Filters::default()
        };
        assert_eq!(filters.verdict(&record(3, 4)), Verdict::Drop);
        assert_eq!(filters.verdict(&record(4, 4)), Verdict::Keep);
    }

    #[test]
    fn test_ignored_owner_muted_when_always_displayed() {
        let filters = Filters {
            ignored_actors: [ActorId::new(4)].into_iter().collect(),
            mode: FilterMode::AlwaysDisplay,
            ..Filters::default()
        };
        assert_eq!(filters.verdict(&record(3, 4)), Verdict::Mute);
    }

    #[test]
    fn test_ignored_server_always_dropped() {
        let filters = Filters {
            ignored_servers: [ServerId::new(8)].into_iter().collect(),
            mode: FilterMode::AlwaysDisplay,
            ..Filters::default()
        };
        let mut causer_on_server = record(3, 3);
        causer_on_server.causer_server = Some(ServerId::new(8));
        assert_eq!(filters.verdict(&causer_on_server), Verdict::Drop);
        assert_eq!(filters.verdict(&record(3, 3)), Verdict::Keep);
    }
}
