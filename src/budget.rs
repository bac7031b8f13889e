// Cost breakdown of a generated itinerary

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{ActivityCategory, GeneratedItinerary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCost {
    pub date: NaiveDate,
    pub cost: f64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub est_total_cost: f64,
    pub total_traveler_cost: f64,
    pub category_costs: BTreeMap<ActivityCategory, f64>,
    pub daily_costs: Vec<DailyCost>,
    pub average_daily_cost: f64,
}

impl BudgetSummary {
    // Activity costs are per person, so every figure is scaled by the party size
    pub fn from_itinerary(itinerary: &GeneratedItinerary) -> Self {
        let travelers = f64::from(itinerary.preferences.num_travelers);
        let mut category_costs = BTreeMap::new();
        let mut daily_costs = Vec::with_capacity(itinerary.days.len());

        for day in &itinerary.days {
            let mut day_total = 0.0;
            for activity in &day.activities {
                let cost = activity.cost * travelers;
                *category_costs.entry(activity.category).or_insert(0.0) += cost;
                day_total += cost;
            }
            daily_costs.push(DailyCost {
                date: day.date,
                cost: day_total,
                summary: day.day_summary.clone(),
            });
        }

        let total_traveler_cost = daily_costs.iter().map(|d| d.cost).sum();
        let average_daily_cost = if itinerary.days.is_empty() {
            0.0
        } else {
            itinerary.est_total_cost / itinerary.days.len() as f64
        };

        Self {
            est_total_cost: itinerary.est_total_cost,
            total_traveler_cost,
            category_costs,
            daily_costs,
            average_daily_cost,
        }
    }
}
