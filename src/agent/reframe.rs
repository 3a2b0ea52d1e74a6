//! Rewrites a user query into a date-explicit form that embeds well.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::generation::GenerationProvider;

pub(crate) const REFRAME_PROMPT_HEADER: &str = "You rewrite search queries for a personal knowledge base.";

pub struct QueryReframer {
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
}

impl QueryReframer {
    pub fn new(generator: Arc<dyn GenerationProvider>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    pub fn reframe(&self, query: &str) -> String {
        self.reframe_at(query, Local::now())
    }

    /// Reframe relative to `now`. The original query comes back on any failure.
    pub fn reframe_at(&self, query: &str, now: DateTime<Local>) -> String {
        match self
            .generator
            .generate(&reframe_prompt(query, now), self.temperature)
        {
            Ok(reframed) if !reframed.trim().is_empty() => {
                debug!(original = %query, reframed = %reframed, "reframed query");
                reframed
            }
            Ok(_) => {
                warn!("reframer returned nothing; searching with the original query");
                query.to_string()
            }
            Err(e) => {
                warn!(error = %e, "reframing failed; searching with the original query");
                query.to_string()
            }
        }
    }
}

fn reframe_prompt(query: &str, now: DateTime<Local>) -> String {
    format!(
        "{REFRAME_PROMPT_HEADER}\n\n\
         Today is {date} ({weekday}, {month} {year}).\n\n\
         Query: \"{query}\"\n\n\
         Rewrite the query so it retrieves well by semantic similarity:\n\
         - replace relative time references (today, yesterday, last week, next month) with absolute dates\n\
         - expand abbreviations and implicit references\n\
         - state it clearly and concisely\n\
         - keep every piece of information in the original\n\n\
         Reply with the rewritten query only.",
        date = now.format("%Y-%m-%d"),
        weekday = now.format("%A"),
        month = now.format("%B"),
        year = now.format("%Y"),
    )
}
