use crate::diners::{Diner, Reservation};
use crate::time_util::format_profile_date;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PRIORITY_VIP: &str = "VIP";
pub const PRIORITY_REGULAR: &str = "Regular";
pub const PRIORITY_FIRST_TIME: &str = "First-time";

const ALLERGY_KEYWORDS: [&str; 2] = ["allergy", "allergic"];

/// Staff-facing insights for one upcoming reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,
    pub date: String,
    pub people: u32,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    // The dashboard reads this key with its original spelling.
    #[serde(rename = "special_occassion")]
    pub special_occasion: String,
    pub priority: String,
    pub special_requests: Vec<String>,
    pub staff_notes: String,
    pub conversation: Vec<String>,
}

impl Profile {
    pub fn is_vip(&self) -> bool {
        self.priority == PRIORITY_VIP
    }

    pub fn has_dietary_needs(&self) -> bool {
        !self.dietary_restrictions.is_empty() || !self.allergies.is_empty()
    }

    pub fn has_special_occasion(&self) -> bool {
        !self.special_occasion.is_empty()
    }
}

#[derive(Debug)]
pub enum ProfileParseError {
    /// The reply had no `{ ... }` span to parse.
    MissingObject,
    InvalidJson(String),
}

impl std::fmt::Display for ProfileParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProfileParseError::MissingObject => {
                write!(f, "No JSON object found in model response")
            }
            ProfileParseError::InvalidJson(msg) => {
                write!(f, "Invalid JSON in model response: {}", msg)
            }
        }
    }
}

impl std::error::Error for ProfileParseError {}

// Values in the reply are taken as the model wrote them. Absent or null
// keys take defaults; anything else is coerced to the profile's shape.
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(other) => vec![other.to_string()],
    }
}

/// Turn a free-text model reply into a profile for `reservation`.
///
/// The span from the first `{` to the last `}` is parsed as a JSON object;
/// anything around it is ignored. This is the only place that knows about
/// the shape of the model's reply.
pub fn parse_model_response(
    response: &str,
    diner: &Diner,
    reservation: &Reservation,
) -> Result<Profile, ProfileParseError> {
    let start = response.find('{').ok_or(ProfileParseError::MissingObject)?;
    let end = response.rfind('}').ok_or(ProfileParseError::MissingObject)?;
    let json = response
        .get(start..=end)
        .ok_or(ProfileParseError::MissingObject)?;

    let insights: Map<String, Value> = serde_json::from_str(json)
        .map_err(|e| ProfileParseError::InvalidJson(e.to_string()))?;

    Ok(Profile {
        name: diner.name.clone(),
        date: format_profile_date(reservation.date.date()),
        people: reservation.number_of_people,
        dietary_restrictions: list_field(insights.get("dietary_restrictions")),
        allergies: list_field(insights.get("allergies")),
        special_occasion: text_field(insights.get("special_occassion"))
            .unwrap_or_default(),
        priority: text_field(insights.get("priority"))
            .unwrap_or_else(|| PRIORITY_REGULAR.to_string()),
        special_requests: list_field(insights.get("special_requests")),
        staff_notes: text_field(insights.get("staff_notes")).unwrap_or_default(),
        conversation: list_field(insights.get("conversation")),
    })
}

/// Best-effort profile built without the model.
///
/// Dietary restrictions come from the target reservation's own orders.
/// Allergies are the word right before every `allergy`/`allergic` token in
/// the lower-cased email threads, taken as-is.
pub fn fallback_profile(diner: &Diner, reservation: &Reservation) -> Profile {
    let mut dietary_restrictions: Vec<String> = Vec::new();
    for tag in reservation.orders.iter().flat_map(|o| &o.dietary_tags) {
        if !dietary_restrictions.contains(tag) {
            dietary_restrictions.push(tag.clone());
        }
    }

    let mut allergies = Vec::new();
    for email in &diner.emails {
        let content = email.combined_thread.to_lowercase();
        let words: Vec<&str> = content.split_whitespace().collect();
        for pair in words.windows(2) {
            if ALLERGY_KEYWORDS.contains(&pair[1]) {
                allergies.push(pair[0].to_string());
            }
        }
    }

    Profile {
        name: diner.name.clone(),
        date: format_profile_date(reservation.date.date()),
        people: reservation.number_of_people,
        dietary_restrictions,
        allergies,
        special_occasion: String::new(),
        priority: PRIORITY_REGULAR.to_string(),
        special_requests: Vec::new(),
        staff_notes: String::new(),
        conversation: Vec::new(),
    }
}
