/*!
Weighted, per-field relevance scoring.

The catalog's default ordering is purely temporal. The scorer here measures
how well a query token matches each of an event's fields, favoring matches in
the college and event names over matches in sub-events. It backs
`Ranking::Relevance`, which reorders search results within each category.
*/

use crate::record::EventRecord;
use crate::similarity::{similarity, threshold};

/// The field of an event that a token matched.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Field {
    /// The name of the hosting college.
    College,
    /// The name of the fest.
    Event,
    /// The city or venue.
    City,
    /// The event type.
    Type,
    /// The competition class.
    Competition,
    /// The name of a sub-event.
    SubEventName,
    /// The type of a sub-event.
    SubEventType,
}

impl Field {
    /// The weight applied to matches in this field.
    pub fn weight(&self) -> f64 {
        match *self {
            Field::College | Field::Event => 1.2,
            Field::City => 1.0,
            Field::Type => 0.9,
            Field::Competition => 0.8,
            Field::SubEventName | Field::SubEventType => 0.7,
        }
    }
}

/// Returns every non-empty searchable field of the given record.
pub fn fields(record: &EventRecord) -> Vec<(Field, &str)> {
    let [college, event, city, kind, comp] = record.text_fields();
    let mut fields = vec![
        (Field::College, college),
        (Field::Event, event),
        (Field::City, city),
        (Field::Type, kind),
        (Field::Competition, comp),
    ];
    for sub in &record.sub_events {
        fields.push((Field::SubEventType, sub.kind()));
        fields.push((Field::SubEventName, sub.name()));
    }
    fields.retain(|&(_, value)| !value.trim().is_empty());
    fields
}

/// Score how relevant the given record is to a single query token.
///
/// Each field is scored separately and the best weighted score wins. A field
/// equal to the token scores `1.0`, a field containing the token scores `0.9`
/// and otherwise the field scores the best similarity of any of its words
/// that fuzzily match the token. Words are split on anything that isn't
/// alphanumeric.
///
/// If no field matches the token, then `None` is returned.
pub fn score(token: &str, record: &EventRecord) -> Option<f64> {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return None;
    }
    let min_sim = threshold(&token);
    let mut best: Option<f64> = None;
    for (field, value) in fields(record) {
        let value = value.trim().to_lowercase();
        let sim = if value == token {
            1.0
        } else if value.contains(&*token) {
            0.9
        } else {
            let best_word = value
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(|w| similarity(&token, w))
                .filter(|&sim| sim >= min_sim)
                .fold(None, |acc: Option<f64>, sim| {
                    Some(acc.map_or(sim, |a| a.max(sim)))
                });
            match best_word {
                None => continue,
                Some(sim) => sim,
            }
        };
        let weighted = sim * field.weight();
        best = Some(best.map_or(weighted, |b| b.max(weighted)));
    }
    best
}

/// Score a record against every token, summing the per-token scores.
///
/// Tokens that don't match any field contribute nothing.
pub fn score_all<S: AsRef<str>>(tokens: &[S], record: &EventRecord) -> f64 {
    tokens.iter().filter_map(|t| score(t.as_ref(), record)).sum()
}
