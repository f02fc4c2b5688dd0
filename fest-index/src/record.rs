use serde::{Deserialize, Serialize};

/// A single fest event as supplied by the event store.
///
/// Event records are user entered, so every text field is optional. An absent
/// field behaves exactly like an empty string: it contributes nothing to
/// matching and is never an error.
///
/// The serde implementation accepts both the field names used here (in
/// camelCase) and the shorter names used by the event store, e.g., `college`,
/// `location`, `dates` and `events`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// An opaque unique identifier.
    pub id: String,
    /// The name of the college hosting the fest.
    #[serde(default, alias = "college")]
    pub college_name: Option<String>,
    /// The name of the fest itself.
    #[serde(default)]
    pub event_name: Option<String>,
    /// The city or venue.
    #[serde(default, alias = "location", alias = "city")]
    pub city_or_location: Option<String>,
    /// The kind of event, e.g., "Cultural" or "Technical".
    #[serde(default, rename = "eventType", alias = "type")]
    pub event_type: Option<String>,
    /// The competition class, e.g., "Inter College".
    #[serde(default, alias = "competition")]
    pub competition_class: Option<String>,
    /// A human readable date or date range, e.g., `25th to 26th Nov 25`.
    #[serde(default, alias = "dates")]
    pub date_range_text: String,
    /// A creation timestamp used to break ties when ordering.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// The sub-events (individual competitions) of this fest, in order.
    #[serde(default, alias = "events")]
    pub sub_events: Vec<SubEvent>,
}

/// A single competition or activity within a fest.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubEvent {
    /// The name of the sub-event, e.g., "Battle of Bands".
    #[serde(default)]
    pub name: Option<String>,
    /// The kind of sub-event, e.g., "Music".
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl EventRecord {
    /// Create a new record with the given identifier and date text. All other
    /// fields are empty.
    pub fn new(id: &str, date_range_text: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            date_range_text: date_range_text.to_string(),
            ..EventRecord::default()
        }
    }

    /// Set the college name.
    pub fn college(mut self, name: &str) -> EventRecord {
        self.college_name = Some(name.to_string());
        self
    }

    /// Set the event name.
    pub fn event(mut self, name: &str) -> EventRecord {
        self.event_name = Some(name.to_string());
        self
    }

    /// Set the city or location.
    pub fn city(mut self, city: &str) -> EventRecord {
        self.city_or_location = Some(city.to_string());
        self
    }

    /// Set the event type.
    pub fn kind(mut self, kind: &str) -> EventRecord {
        self.event_type = Some(kind.to_string());
        self
    }

    /// Set the competition class.
    pub fn competition(mut self, class: &str) -> EventRecord {
        self.competition_class = Some(class.to_string());
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, created_at: i64) -> EventRecord {
        self.created_at = Some(created_at);
        self
    }

    /// Append a sub-event.
    pub fn sub_event(mut self, name: &str, kind: &str) -> EventRecord {
        self.sub_events.push(SubEvent {
            name: Some(name.to_string()),
            kind: Some(kind.to_string()),
        });
        self
    }

    /// The creation timestamp, where an absent timestamp is `0`.
    pub fn created_at_or_zero(&self) -> i64 {
        self.created_at.unwrap_or(0)
    }

    /// Return the searchable top-level text fields of this record, in
    /// priority order: college, event, city, type and competition.
    ///
    /// Absent fields are returned as empty strings.
    pub fn text_fields(&self) -> [&str; 5] {
        [
            field(&self.college_name),
            field(&self.event_name),
            field(&self.city_or_location),
            field(&self.event_type),
            field(&self.competition_class),
        ]
    }
}

impl SubEvent {
    /// The name of this sub-event, or an empty string if absent.
    pub fn name(&self) -> &str {
        field(&self.name)
    }

    /// The kind of this sub-event, or an empty string if absent.
    pub fn kind(&self) -> &str {
        field(&self.kind)
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_ref().map_or("", |s| s.as_str())
}
