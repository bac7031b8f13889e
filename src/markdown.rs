// Markdown Itinerary Generation
// Free-text "quick itinerary": one prompt in, markdown out, no schema

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Operation};
use crate::llm::{GenerateRequest, GenerativeModel};
use crate::model::TravelRequest;

pub const DAY_HEADING: &str = "### Day";

const SYSTEM_PROMPT: &str = "You are 'Globe Trotter', a friendly and expert AI travel agent. Your job is to create a simple, exciting, and well-structured day-by-day travel itinerary based on user input.

RULES:

Always use Markdown for formatting.

Start with a trip title and a one-sentence \"Vibe Check\" that summarizes the trip's feel.

For each day, create a clear heading (e.g., \"### Day 1: Title\").

Use emojis for key categories: ✈️ (Travel), 🏨 (Lodging), 😋 (Food), 🏛️ (Activities).

Suggest 1-2 key activities per day. Keep descriptions short, fun, and engaging.

The output must be easy to read and visually attractive.";

const EXAMPLE_FORMAT: &str = "Your Trip: Hackathon & Blessings
Vibe Check: A spiritual and focused journey that balances a sacred temple visit with intense coding and much-needed rest.

### Day 1: Spiritual Beginnings

✈️ Travel: Take an early morning train from Bhopal to Ujjain.

🏛️ Activity: Visit the Mahakaleshwar Temple for blessings in the afternoon.

✈️ Travel: Board an overnight train from Ujjain to Ahmedabad to maximize rest.

### Day 2: Recharge & Prepare

🏨 Lodging: Arrive in Ahmedabad and travel to your pre-booked hotel in Gandhinagar.

😋 Activity: Rest up for the hackathon. We suggest ordering in from a top-rated local restaurant.

### Day 3: Hackathon Day 1

🏛️ Activity: Time to shine at the Odoo Hackathon 2025! We've pinned a nearby 24/7 coffee shop for you. Good luck!

### Day 4: Victory & Recovery

🏛️ Activity: Complete the final stretch of the hackathon.

🏨 Lodging: Your room is booked for tonight. Get some well-deserved sleep!

### Day 5: Homeward Bound

😋 Food: Enjoy a final Gujarati breakfast.

✈️ Travel: Take a comfortable afternoon train from Ahmedabad back to Bhopal.";

fn optional_line(label: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => format!("{}: {}", label, v),
        None => format!("{}: None", label),
    }
}

pub fn build_markdown_prompt(request: &TravelRequest) -> String {
    let user_input = format!(
        "Origin: {}\n\nDestination: {}\n\n{}\n\nDuration: {}\n\n{}",
        request.origin,
        request.destination,
        optional_line("Stops", request.stops.as_deref()),
        request.duration,
        optional_line("Notes", request.notes.as_deref()),
    );

    format!(
        "{}\n\nHere's an example of the perfect format:\n\n{}\n\nNow create an itinerary for this request:\n\n{}",
        SYSTEM_PROMPT, EXAMPLE_FORMAT, user_input
    )
}

/// Number of days in a duration such as "3 Days" or "2 Weeks".
pub fn parse_duration_days(duration: &str) -> Option<u32> {
    let mut words = duration.split_whitespace();
    let count: u32 = words.next()?.parse().ok()?;
    let unit = words.next()?.to_ascii_lowercase();
    match unit.trim_end_matches('s') {
        "day" => Some(count),
        "week" => count.checked_mul(7),
        _ => None,
    }
}

pub fn count_day_headings(markdown: &str) -> usize {
    markdown
        .lines()
        .filter(|line| line.trim_start().starts_with(DAY_HEADING))
        .count()
}

pub struct MarkdownGenerator {
    model: Arc<dyn GenerativeModel>,
    config: GenerationConfig,
}

impl MarkdownGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub async fn generate(&self, request: &TravelRequest) -> Result<String, GenerationError> {
        let op = Operation::Markdown;

        let model_request = GenerateRequest::text(
            self.config.model.as_str(),
            build_markdown_prompt(request),
            self.config.markdown_temperature,
        )
        .with_max_output_tokens(self.config.markdown_max_output_tokens);

        info!(
            origin = %request.origin,
            destination = %request.destination,
            duration = %request.duration,
            "generating markdown itinerary"
        );
        let text = self.model.generate(model_request).await.map_err(|e| {
            error!(operation = op.name(), error = %e, "markdown generation failed");
            op.classify(&e)
        })?;

        let content = text.trim();
        if content.is_empty() {
            warn!(operation = op.name(), "model returned empty text");
            return Err(op.transport());
        }

        if let Some(expected) = parse_duration_days(&request.duration) {
            let found = count_day_headings(content);
            if found < expected as usize {
                warn!(operation = op.name(), expected, found, "itinerary is missing day headings");
                return Err(op.transport());
            }
        }

        Ok(content.to_string())
    }
}
