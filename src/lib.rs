// Main library file for the Globe Trotter travel planner

// Domain types and the adapters that fill them from the generative model
pub mod budget;
pub mod config;
pub mod error;
pub mod ids;
pub mod itinerary;
pub mod llm;
pub mod markdown;
pub mod model;
pub mod schema;
pub mod search;
pub mod server;
pub mod storage;

// Re-export key types for convenience
pub use budget::{BudgetSummary, DailyCost};
pub use config::{AppConfig, ClientConfig, GenerationConfig};
pub use error::{ErrorKind, GenerationError, Operation};
pub use ids::{generate_id, IdPrefix};
pub use itinerary::{assemble_itinerary, ItineraryGenerator, ResponseError};
pub use llm::{ClientError, GeminiClient, GenerateRequest, GenerativeModel, ModelError};
pub use markdown::MarkdownGenerator;
pub use model::{
    Activity, ActivityCategory, Confidence, Currency, DayPlan, GeneratedItinerary, Pace,
    PublicProfile, SearchResult, SearchResultItem, StoredItinerary, TravelRequest, TripPreferences,
    TripStatus,
};
pub use search::{attach_presentation, ActivitySearch};
pub use server::{router, ApiError, AppState};
pub use storage::{MemStorage, Storage, StoreError, TripStore};
