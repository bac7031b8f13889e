// Itinerary Generation Adapter
// Turns TripPreferences into one schema-constrained model call and the reply into a GeneratedItinerary

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Operation};
use crate::ids::{generate_id, IdPrefix};
use crate::llm::{GenerateRequest, GenerativeModel};
use crate::model::{
    Activity, ActivityCategory, Confidence, Currency, DayPlan, GeneratedItinerary, PublicProfile,
    TripPreferences, TripStatus,
};
use crate::schema::itinerary_response_schema;

/// Why a model reply could not become an itinerary. Logged, never shown to users.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponseError {
    #[error("JSON parse error: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("itinerary has no days")]
    NoDays,

    #[error("{got} days returned for a {allowed}-day trip")]
    TooManyDays { got: usize, allowed: i64 },

    #[error("day {0} is outside the trip dates")]
    DateOutOfRange(NaiveDate),

    #[error("day {0} appears more than once")]
    DuplicateDate(NaiveDate),

    #[error("activity '{title}' on {date} ends before it starts")]
    InvalidTimeWindow { date: NaiveDate, title: String },
}

// Shape of the model reply before ids are assigned
#[derive(Debug, Deserialize)]
struct RawItinerary {
    trip_name: String,
    #[serde(default)]
    est_total_cost: f64,
    #[serde(default)]
    currency: Currency,
    days: Vec<RawDay>,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    date: NaiveDate,
    #[serde(default)]
    day_summary: String,
    #[serde(default)]
    activities: Vec<RawActivity>,
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    title: String,
    #[serde(with = "crate::model::hhmm")]
    start_time: NaiveTime,
    #[serde(with = "crate::model::hhmm")]
    end_time: NaiveTime,
    duration_minutes: u32,
    cost: f64,
    currency: Currency,
    location: String,
    notes: String,
    confidence: Confidence,
    category: ActivityCategory,
}

pub fn build_itinerary_prompt(preferences: &TripPreferences) -> String {
    format!(
        "You are GlobeTrotter's Trip Concierge. Your task is to create a detailed travel itinerary based on user preferences.
Produce a JSON object that strictly follows the provided schema. Do not include any extra text or markdown formatting.
Ensure the dates in the response fall exactly between the start and end dates provided.
The plan should be practical, logical, and reflect the specified pace and interests.
Keep the plan concise and useful.

User Preferences:
- Trip Name: {}
- Trip Duration: {} to {}
- Destination(s): {}
- Key Interests: {}
- Travel Pace: {}
- Budget per Person: {} USD
- Number of Travelers: {}
- Must-Visit Places: {}

Return JSON only.",
        preferences.trip_name,
        preferences.start_date.format("%Y-%m-%d"),
        preferences.end_date.format("%Y-%m-%d"),
        preferences.locations,
        preferences.interests,
        preferences.pace.as_str(),
        preferences.budget_per_person,
        preferences.num_travelers,
        preferences.must_visits,
    )
}

// Models sometimes wrap JSON in a ```json fence despite the mime type
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_open = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return trimmed,
    };
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn parse_itinerary_response(text: &str) -> Result<RawItinerary, ResponseError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ResponseError::InvalidJson(e.to_string()))?;

    let has_name = value
        .get("trip_name")
        .and_then(Value::as_str)
        .map_or(false, |name| !name.trim().is_empty());
    if !has_name {
        return Err(ResponseError::MissingRequiredField("trip_name"));
    }
    if !value.get("days").map_or(false, Value::is_array) {
        return Err(ResponseError::MissingRequiredField("days"));
    }

    serde_json::from_value(value).map_err(|e| ResponseError::InvalidFormat(e.to_string()))
}

fn normalize_days(
    preferences: &TripPreferences,
    mut days: Vec<RawDay>,
) -> Result<Vec<DayPlan>, ResponseError> {
    if days.is_empty() {
        return Err(ResponseError::NoDays);
    }
    let allowed = preferences.trip_length_days();
    if days.len() as i64 > allowed {
        return Err(ResponseError::TooManyDays {
            got: days.len(),
            allowed,
        });
    }

    days.sort_by_key(|day| day.date);

    let mut plans = Vec::with_capacity(days.len());
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        if !preferences.contains_date(day.date) {
            return Err(ResponseError::DateOutOfRange(day.date));
        }
        if previous == Some(day.date) {
            return Err(ResponseError::DuplicateDate(day.date));
        }
        previous = Some(day.date);

        let mut activities = Vec::with_capacity(day.activities.len());
        for raw in day.activities {
            let activity = Activity {
                id: generate_id(IdPrefix::Activity),
                title: raw.title,
                start_time: raw.start_time,
                end_time: raw.end_time,
                duration_minutes: raw.duration_minutes,
                cost: raw.cost,
                currency: raw.currency,
                location: raw.location,
                notes: raw.notes,
                confidence: raw.confidence,
                category: raw.category,
            };
            if !activity.has_valid_window() {
                return Err(ResponseError::InvalidTimeWindow {
                    date: day.date,
                    title: activity.title,
                });
            }
            activities.push(activity);
        }

        plans.push(DayPlan {
            id: generate_id(IdPrefix::Day),
            date: day.date,
            day_summary: day.day_summary,
            activities,
        });
    }
    Ok(plans)
}

/// Validates a model reply and merges it with the preferences that produced it.
///
/// Generated fields (trip name, cost estimate, currency, days) win over the
/// preferences; every other preference field is carried over as entered.
pub fn assemble_itinerary(
    preferences: &TripPreferences,
    author: PublicProfile,
    response_text: &str,
) -> Result<GeneratedItinerary, ResponseError> {
    let raw = parse_itinerary_response(response_text)?;
    let days = normalize_days(preferences, raw.days)?;

    Ok(GeneratedItinerary {
        id: generate_id(IdPrefix::Trip),
        preferences: TripPreferences {
            trip_name: raw.trip_name,
            start_date: preferences.start_date,
            end_date: preferences.end_date,
            locations: preferences.locations.clone(),
            interests: preferences.interests.clone(),
            pace: preferences.pace,
            budget_per_person: preferences.budget_per_person,
            num_travelers: preferences.num_travelers,
            must_visits: preferences.must_visits.clone(),
            description: preferences.description.clone(),
            cover_photo_url: preferences.cover_photo_url.clone(),
        },
        est_total_cost: raw.est_total_cost,
        currency: raw.currency,
        days,
        status: TripStatus::Upcoming,
        is_public: false,
        author,
        likes: 0,
        shares: 0,
    })
}

pub struct ItineraryGenerator {
    model: Arc<dyn GenerativeModel>,
    config: GenerationConfig,
}

impl ItineraryGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub async fn generate(
        &self,
        preferences: &TripPreferences,
        author: PublicProfile,
    ) -> Result<GeneratedItinerary, GenerationError> {
        let op = Operation::Itinerary;

        let problems = preferences.validate();
        if !problems.is_empty() {
            return Err(op.invalid_request(problems.join("; ")));
        }

        let request = GenerateRequest::json(
            self.config.model.as_str(),
            build_itinerary_prompt(preferences),
            self.config.itinerary_temperature,
            itinerary_response_schema(),
        );

        info!(
            trip_name = %preferences.trip_name,
            trip_days = preferences.trip_length_days(),
            "generating itinerary"
        );
        let text = self.model.generate(request).await.map_err(|e| {
            error!(operation = op.name(), error = %e, "itinerary generation failed");
            op.classify(&e)
        })?;

        let itinerary = assemble_itinerary(preferences, author, &text).map_err(|e| {
            warn!(operation = op.name(), problem = %e, "model returned an unusable itinerary");
            op.data()
        })?;

        info!(
            trip_id = %itinerary.id,
            days = itinerary.days.len(),
            activities = itinerary.activity_count(),
            "itinerary generated"
        );
        Ok(itinerary)
    }
}
