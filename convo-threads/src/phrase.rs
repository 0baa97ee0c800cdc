use convo_msg::Verb;
use convo_ref::RecordId;
use itertools::Itertools;
use serde::Serialize;

use crate::Error;

/// Sentence fragments for reaction phrases. Actor lists arrive already
/// rendered and joined.
pub trait Phrasebook {
    /// "%s likes this."
    fn singular(&self, verb: &Verb, actor: &str) -> String;
    /// "%s like this."
    fn plural(&self, verb: &Verb, actors: &str) -> String;
    /// "%d people like this" without the count, e.g. "like this".
    fn plural_tail(&self, verb: &Verb) -> String;
    fn and(&self) -> String;
    fn others(&self, count: usize) -> String;
    fn people(&self, count: usize) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishPhrasebook;

impl Phrasebook for EnglishPhrasebook {
    fn singular(&self, verb: &Verb, actor: &str) -> String {
        match verb {
            Verb::Like => format!("{} likes this.", actor),
            Verb::Dislike => format!("{} doesn't like this.", actor),
            Verb::AttendYes => format!("{} attends.", actor),
            Verb::AttendNo => format!("{} doesn't attend.", actor),
            Verb::AttendMaybe => format!("{} attends maybe.", actor),
            Verb::Announce => format!("{} reshared this.", actor),
            _ => format!("{} reacted to this.", actor),
        }
    }

    fn plural(&self, verb: &Verb, actors: &str) -> String {
        format!("{} {}.", actors, self.plural_tail(verb))
    }

    fn plural_tail(&self, verb: &Verb) -> String {
        match verb {
            Verb::Like => "like this",
            Verb::Dislike => "don't like this",
            Verb::AttendYes => "attend",
            Verb::AttendNo => "don't attend",
            Verb::AttendMaybe => "attend maybe",
            Verb::Announce => "reshared this",
            _ => "reacted to this",
        }
        .to_string()
    }

    fn and(&self) -> String {
        "and".to_string()
    }

    fn others(&self, count: usize) -> String {
        format!("and {} other people", count)
    }

    fn people(&self, count: usize) -> String {
        format!("{} people", count)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Phrase {
    pub verb: Verb,
    /// Shown inline: the sentence itself, or a toggle for the expanded list.
    pub summary: String,
    /// Hidden full list, present when more than one actor reacted.
    pub expanded: Option<String>,
}

/// Builds the reaction sentence for one bucket. `external_total` is a count
/// reported from elsewhere that may exceed the locally known actors.
pub fn phrase_for(
    book: &dyn Phrasebook,
    verb: &Verb,
    target: RecordId,
    actors: &[String],
    external_total: usize,
    max_likers: usize,
) -> Result<Phrase, Error> {
    if actors.is_empty() {
        return Err(Error::NoActors { verb: verb.clone() });
    }

    let total = actors.len().max(external_total);
    if total == 1 {
        return Ok(Phrase {
            verb: verb.clone(),
            summary: book.singular(verb, &actors[0]),
            expanded: None,
        });
    }

    let listed = list_actors(book, actors, total, max_likers);

    let kind = verb.name().to_lowercase();
    let list_id = format!("{}list-{}", kind, target);
    let summary = format!(
        r#"<span class="fakelink" onclick="openClose('{}');">{}</span> {}"#,
        list_id,
        book.people(total),
        book.plural_tail(verb)
    );
    let expanded = format!(
        r#"<p class="wall-item-{}-expanded" id="{}" style="display: none;">{}</p>"#,
        kind,
        list_id,
        book.plural(verb, &listed)
    );

    Ok(Phrase {
        verb: verb.clone(),
        summary,
        expanded: Some(expanded),
    })
}

fn list_actors(book: &dyn Phrasebook, actors: &[String], total: usize, max_likers: usize) -> String {
    let shown = if total > max_likers {
        max_likers.saturating_sub(1)
    } else {
        actors.len()
    }
    .min(actors.len());

    if shown == total {
        let (last, rest) = match actors[..shown].split_last() {
            Some(split) => split,
            None => return String::new(),
        };
        format!("{} {} {}", rest.iter().join(", "), book.and(), last)
    } else {
        format!(
            "{} {}",
            actors[..shown].iter().join(", "),
            book.others(total - shown)
        )
    }
}
