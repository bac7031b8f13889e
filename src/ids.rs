// Identifier generation for trips, days, activities and stored records

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Trip,
    Day,
    Activity,
    Search,
    Itinerary,
    User,
}

impl IdPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Trip => "trip",
            IdPrefix::Day => "day",
            IdPrefix::Activity => "activity",
            IdPrefix::Search => "search",
            IdPrefix::Itinerary => "itinerary",
            IdPrefix::User => "user",
        }
    }
}

/// Produces `<prefix>-<unix millis>-<sequence>-<random>`.
///
/// The process-wide sequence keeps ids unique inside one process even when
/// many are minted in the same millisecond; the random suffix separates
/// processes.
pub fn generate_id(prefix: IdPrefix) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let salt = rand::random::<u32>();
    format!("{}-{}-{}-{:08x}", prefix.as_str(), millis, sequence, salt)
}
