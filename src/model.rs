// Trip domain types shared by the generators, the stores and the HTTP layer

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{generate_id, IdPrefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    Normal,
    Packed,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Relaxed => "relaxed",
            Pace::Normal => "normal",
            Pace::Packed => "packed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "INR")]
    Inr,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    Attraction,
    Transportation,
    Accommodation,
    Shopping,
    Other,
    Activity,
    #[serde(rename = "Hidden Gem")]
    HiddenGem,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 8] = [
        ActivityCategory::FoodAndDining,
        ActivityCategory::Attraction,
        ActivityCategory::Transportation,
        ActivityCategory::Accommodation,
        ActivityCategory::Shopping,
        ActivityCategory::Other,
        ActivityCategory::Activity,
        ActivityCategory::HiddenGem,
    ];

    // Categories the search adapter is allowed to return
    pub const SEARCHABLE: [ActivityCategory; 5] = [
        ActivityCategory::Attraction,
        ActivityCategory::FoodAndDining,
        ActivityCategory::Shopping,
        ActivityCategory::Activity,
        ActivityCategory::HiddenGem,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityCategory::FoodAndDining => "Food & Dining",
            ActivityCategory::Attraction => "Attraction",
            ActivityCategory::Transportation => "Transportation",
            ActivityCategory::Accommodation => "Accommodation",
            ActivityCategory::Shopping => "Shopping",
            ActivityCategory::Other => "Other",
            ActivityCategory::Activity => "Activity",
            ActivityCategory::HiddenGem => "Hidden Gem",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Upcoming,
    Ongoing,
    Completed,
}

/// Parameters a user enters before asking for an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    pub trip_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub locations: String,
    pub interests: String,
    pub pace: Pace,
    pub budget_per_person: f64,
    pub num_travelers: u32,
    pub must_visits: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_photo_url: String,
}

impl TripPreferences {
    /// Number of calendar days covered by the trip, both ends included.
    pub fn trip_length_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns the list of problems with these preferences, empty when usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.trip_name.trim().is_empty() {
            problems.push("trip_name must not be empty".to_string());
        }
        if self.locations.trim().is_empty() {
            problems.push("locations must not be empty".to_string());
        }
        if self.end_date < self.start_date {
            problems.push(format!(
                "end_date {} is before start_date {}",
                self.end_date, self.start_date
            ));
        }
        if self.num_travelers == 0 {
            problems.push("num_travelers must be at least 1".to_string());
        }
        if !self.budget_per_person.is_finite() || self.budget_per_person < 0.0 {
            problems.push("budget_per_person must be a non-negative amount".to_string());
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    #[serde(rename = "profilePhotoUrl", default)]
    pub profile_photo_url: String,
}

impl PublicProfile {
    pub fn anonymous() -> Self {
        Self {
            id: "anonymous".to_string(),
            name: "Anonymous Traveler".to_string(),
            profile_photo_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub title: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub cost: f64,
    pub currency: Currency,
    pub location: String,
    pub notes: String,
    pub confidence: Confidence,
    pub category: ActivityCategory,
}

impl Activity {
    /// Blank activity the editor starts from.
    pub fn new_default() -> Self {
        Self {
            id: generate_id(IdPrefix::Activity),
            title: String::new(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            duration_minutes: 60,
            cost: 0.0,
            currency: Currency::Usd,
            location: String::new(),
            notes: String::new(),
            confidence: Confidence::Medium,
            category: ActivityCategory::Other,
        }
    }

    // The window must not wrap past midnight
    pub fn has_valid_window(&self) -> bool {
        self.start_time <= self.end_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub id: String,
    pub date: NaiveDate,
    pub day_summary: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedItinerary {
    pub id: String,
    #[serde(flatten)]
    pub preferences: TripPreferences,
    pub est_total_cost: f64,
    pub currency: Currency,
    pub days: Vec<DayPlan>,
    pub status: TripStatus,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    pub author: PublicProfile,
    pub likes: u32,
    pub shares: u32,
}

impl GeneratedItinerary {
    pub fn day(&self, day_id: &str) -> Option<&DayPlan> {
        self.days.iter().find(|day| day.id == day_id)
    }

    pub fn day_mut(&mut self, day_id: &str) -> Option<&mut DayPlan> {
        self.days.iter_mut().find(|day| day.id == day_id)
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|day| day.activities.len()).sum()
    }
}

/// A point of interest returned by the search adapter, before presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Input of the free-text markdown flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub stops: Option<String>,
    pub duration: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A markdown itinerary as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItinerary {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub stops: Option<String>,
    pub duration: String,
    pub notes: Option<String>,
    pub generated_content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewItinerary {
    pub request: TravelRequest,
    pub generated_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

// "HH:MM" wire format for activity times
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", raw, e)))
    }
}
