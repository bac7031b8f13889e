// In-memory persistence for users, markdown itineraries and saved trips
// Single process, non-durable; keyed by generated id

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::ids::{generate_id, IdPrefix};
use crate::model::{
    Activity, GeneratedItinerary, NewItinerary, NewUser, StoredItinerary, User,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("trip not found: {0}")]
    TripNotFound(String),

    #[error("day {day_id} not found in trip {trip_id}")]
    DayNotFound { trip_id: String, day_id: String },

    #[error("activity not found: {0}")]
    ActivityNotFound(String),

    #[error("invalid activity: {0}")]
    InvalidActivity(String),

    #[error("invalid trip: {0}")]
    InvalidTrip(String),

    #[error("username already taken: {0}")]
    UsernameTaken(String),
}

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn get_user(&self, id: &str) -> Option<User>;

    async fn get_user_by_username(&self, username: &str) -> Option<User>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_itinerary(&self, id: &str) -> Option<StoredItinerary>;

    async fn create_itinerary(&self, itinerary: NewItinerary) -> StoredItinerary;
}

#[derive(Default)]
pub struct MemStorage {
    users: DashMap<String, User>,
    // username -> user id
    usernames: DashMap<String, String>,
    itineraries: DashMap<String, StoredItinerary>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

// Optional text that is blank counts as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|entry| entry.value().clone())
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        let id = self.usernames.get(username)?.value().clone();
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    // The username slot stays locked until the user is inserted
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::UsernameTaken(user.username)),
            Entry::Vacant(slot) => {
                let user = User {
                    id: generate_id(IdPrefix::User),
                    username: user.username,
                    password: user.password,
                };
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    async fn get_itinerary(&self, id: &str) -> Option<StoredItinerary> {
        self.itineraries.get(id).map(|entry| entry.value().clone())
    }

    async fn create_itinerary(&self, itinerary: NewItinerary) -> StoredItinerary {
        let NewItinerary {
            request,
            generated_content,
        } = itinerary;
        let stored = StoredItinerary {
            id: generate_id(IdPrefix::Itinerary),
            origin: request.origin,
            destination: request.destination,
            stops: non_blank(request.stops),
            duration: request.duration,
            notes: non_blank(request.notes),
            generated_content,
            created_at: Utc::now(),
        };
        self.itineraries.insert(stored.id.clone(), stored.clone());
        debug!(itinerary_id = %stored.id, "stored markdown itinerary");
        stored
    }
}

struct SavedTrip {
    saved_seq: u64,
    trip: GeneratedItinerary,
}

/// Saved structured trips and the edits made to them.
#[derive(Default)]
pub struct TripStore {
    trips: DashMap<String, SavedTrip>,
    sequence: AtomicU64,
}

fn check_activity(activity: &Activity) -> Result<(), StoreError> {
    if activity.has_valid_window() {
        Ok(())
    } else {
        Err(StoreError::InvalidActivity(format!(
            "'{}' ends at {} before it starts at {}",
            activity.title,
            activity.end_time.format("%H:%M"),
            activity.start_time.format("%H:%M")
        )))
    }
}

// Holds a replacement trip to the same rules a generated one obeys. Days are
// left sorted by date.
fn normalize_trip(trip: &mut GeneratedItinerary) -> Result<(), StoreError> {
    let problems = trip.preferences.validate();
    if !problems.is_empty() {
        return Err(StoreError::InvalidTrip(problems.join("; ")));
    }

    trip.days.sort_by_key(|day| day.date);

    let mut day_ids = HashSet::new();
    let mut activity_ids = HashSet::new();
    let mut previous: Option<NaiveDate> = None;
    for day in &trip.days {
        if !trip.preferences.contains_date(day.date) {
            return Err(StoreError::InvalidTrip(format!(
                "day {} is outside {} to {}",
                day.date, trip.preferences.start_date, trip.preferences.end_date
            )));
        }
        if previous == Some(day.date) {
            return Err(StoreError::InvalidTrip(format!("day {} appears more than once", day.date)));
        }
        previous = Some(day.date);

        if day.id.trim().is_empty() {
            return Err(StoreError::InvalidTrip(format!("day {} has no id", day.date)));
        }
        if !day_ids.insert(day.id.as_str()) {
            return Err(StoreError::InvalidTrip(format!("day id {} is used twice", day.id)));
        }

        for activity in &day.activities {
            check_activity(activity).map_err(|e| StoreError::InvalidTrip(e.to_string()))?;
            if activity.id.trim().is_empty() {
                return Err(StoreError::InvalidTrip(format!("'{}' has no id", activity.title)));
            }
            if !activity_ids.insert(activity.id.as_str()) {
                return Err(StoreError::InvalidTrip(format!(
                    "activity id {} is used twice",
                    activity.id
                )));
            }
        }
    }
    Ok(())
}

impl TripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn save(&self, trip: GeneratedItinerary) -> GeneratedItinerary {
        let saved_seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.trips.insert(
            trip.id.clone(),
            SavedTrip {
                saved_seq,
                trip: trip.clone(),
            },
        );
        debug!(trip_id = %trip.id, "saved trip");
        trip
    }

    pub fn get(&self, id: &str) -> Option<GeneratedItinerary> {
        self.trips.get(id).map(|entry| entry.trip.clone())
    }

    // Most recently saved first
    pub fn list(&self) -> Vec<GeneratedItinerary> {
        let mut saved: Vec<(u64, GeneratedItinerary)> = self
            .trips
            .iter()
            .map(|entry| (entry.saved_seq, entry.trip.clone()))
            .collect();
        saved.sort_by(|a, b| b.0.cmp(&a.0));
        saved.into_iter().map(|(_, trip)| trip).collect()
    }

    pub fn update(&self, mut trip: GeneratedItinerary) -> Result<GeneratedItinerary, StoreError> {
        normalize_trip(&mut trip)?;
        let mut entry = self
            .trips
            .get_mut(&trip.id)
            .ok_or_else(|| StoreError::TripNotFound(trip.id.clone()))?;
        entry.trip = trip.clone();
        Ok(trip)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.trips
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::TripNotFound(id.to_string()))
    }

    /// Replaces the activity with the same id, or appends it to the day.
    /// A blank id gets a fresh one.
    pub fn upsert_activity(
        &self,
        trip_id: &str,
        day_id: &str,
        mut activity: Activity,
    ) -> Result<Activity, StoreError> {
        check_activity(&activity)?;
        if activity.id.trim().is_empty() {
            activity.id = generate_id(IdPrefix::Activity);
        }

        let mut entry = self
            .trips
            .get_mut(trip_id)
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_string()))?;
        let trip = &mut entry.trip;
        if trip.day(day_id).is_none() {
            return Err(StoreError::DayNotFound {
                trip_id: trip_id.to_string(),
                day_id: day_id.to_string(),
            });
        }
        let elsewhere = trip
            .days
            .iter()
            .filter(|day| day.id != day_id)
            .any(|day| day.activities.iter().any(|a| a.id == activity.id));
        if elsewhere {
            return Err(StoreError::InvalidActivity(format!(
                "activity {} already belongs to another day",
                activity.id
            )));
        }

        if let Some(day) = trip.day_mut(day_id) {
            match day.activities.iter_mut().find(|a| a.id == activity.id) {
                Some(existing) => *existing = activity.clone(),
                None => day.activities.push(activity.clone()),
            }
        }
        Ok(activity)
    }

    pub fn delete_activity(
        &self,
        trip_id: &str,
        day_id: &str,
        activity_id: &str,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .trips
            .get_mut(trip_id)
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_string()))?;
        let day = entry
            .trip
            .day_mut(day_id)
            .ok_or_else(|| StoreError::DayNotFound {
                trip_id: trip_id.to_string(),
                day_id: day_id.to_string(),
            })?;

        let before = day.activities.len();
        day.activities.retain(|a| a.id != activity_id);
        if day.activities.len() == before {
            return Err(StoreError::ActivityNotFound(activity_id.to_string()));
        }
        Ok(())
    }

    /// Blank activity for the editor, not yet attached to any day.
    pub fn new_activity(&self) -> Activity {
        Activity::new_default()
    }
}
