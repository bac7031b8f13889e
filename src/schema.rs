// Output schemas handed to the model for the structured flows

use serde_json::{json, Value};

use crate::model::ActivityCategory;

const CURRENCIES: [&str; 3] = ["USD", "EUR", "INR"];

fn category_labels(categories: &[ActivityCategory]) -> Vec<&'static str> {
    categories.iter().map(ActivityCategory::label).collect()
}

pub fn itinerary_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "trip_name": {
                "type": "STRING",
                "description": "A creative and fitting name for the trip. This should reflect the user's stated trip name if provided, but can be enhanced."
            },
            "est_total_cost": {
                "type": "NUMBER",
                "description": "Estimated total cost for the trip for all travelers, in the specified currency."
            },
            "currency": {
                "type": "STRING",
                "enum": CURRENCIES,
                "description": "The currency for all monetary values."
            },
            "days": {
                "type": "ARRAY",
                "description": "An array of daily plans.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": {
                            "type": "STRING",
                            "description": "The date for this day's plan in YYYY-MM-DD format."
                        },
                        "day_summary": {
                            "type": "STRING",
                            "description": "A one-sentence summary of the day's theme or key activities."
                        },
                        "activities": {
                            "type": "ARRAY",
                            "description": "A list of activities for the day.",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "title": { "type": "STRING", "description": "The name of the activity." },
                                    "start_time": { "type": "STRING", "description": "Suggested start time in HH:MM format." },
                                    "end_time": { "type": "STRING", "description": "Suggested end time in HH:MM format." },
                                    "duration_minutes": { "type": "INTEGER", "description": "Estimated duration in minutes." },
                                    "cost": { "type": "NUMBER", "description": "Estimated cost per person for this activity." },
                                    "currency": { "type": "STRING", "enum": CURRENCIES },
                                    "location": { "type": "STRING", "description": "The specific location or area for the activity." },
                                    "notes": { "type": "STRING", "description": "Brief, helpful notes or tips about the activity." },
                                    "confidence": {
                                        "type": "STRING",
                                        "enum": ["low", "medium", "high"],
                                        "description": "Confidence level in the suggestion's quality and feasibility."
                                    },
                                    "category": {
                                        "type": "STRING",
                                        "enum": category_labels(&ActivityCategory::ALL),
                                        "description": "The category of the activity."
                                    }
                                },
                                "required": [
                                    "title", "start_time", "end_time", "duration_minutes", "cost",
                                    "currency", "location", "notes", "confidence", "category"
                                ]
                            }
                        }
                    },
                    "required": ["date", "day_summary", "activities"]
                }
            }
        },
        "required": ["trip_name", "est_total_cost", "currency", "days"]
    })
}

pub fn search_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "results": {
                "type": "ARRAY",
                "description": "A list of activites, points of interest, or restaurants.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "The name of the place or activity." },
                        "description": { "type": "STRING", "description": "A short, compelling description (20-30 words)." },
                        "category": {
                            "type": "STRING",
                            "enum": category_labels(&ActivityCategory::SEARCHABLE),
                            "description": "The category of the result."
                        }
                    },
                    "required": ["title", "description", "category"]
                }
            }
        },
        "required": ["results"]
    })
}
