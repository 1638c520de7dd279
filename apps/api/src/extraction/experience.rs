//! Years-of-experience requirement as stated (or implied) by a job posting.
//!
//! The model is asked for an integer but may answer `">0"` for postings that only
//! imply seniority, or echo the posting's own wording (`"5+"`, `"3-5 years"`).
//! Every form collapses into one of three variants.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum ExperienceRequirement {
    /// An exact figure: "3 years of experience".
    Exact(u32),
    /// A floor: "5+ years", or some experience implied by seniority (`AtLeast(1)`).
    AtLeast(u32),
    /// No experience requirement stated.
    #[default]
    Unspecified,
}

impl ExperienceRequirement {
    /// Interprets whatever the model put in `experience_years`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)) {
                Some(0) | None => ExperienceRequirement::Unspecified,
                Some(years) => ExperienceRequirement::Exact(clamp_years(years)),
            },
            Value::String(s) => parse_text(s),
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
            _ => ExperienceRequirement::Unspecified,
        }
    }
}

impl fmt::Display for ExperienceRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceRequirement::Exact(n) => write!(f, "{n} {}", plural_years(*n)),
            ExperienceRequirement::AtLeast(n) => write!(f, "at least {n} {}", plural_years(*n)),
            ExperienceRequirement::Unspecified => f.write_str("unspecified"),
        }
    }
}

/// `deserialize_with` hook for LLM output.
pub fn from_llm<'de, D>(deserializer: D) -> Result<ExperienceRequirement, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(ExperienceRequirement::from_value(&value))
}

fn parse_text(raw: &str) -> ExperienceRequirement {
    let text = raw.trim().to_lowercase();

    let (floor_prefix, rest) = if let Some(rest) = text.strip_prefix(">=") {
        (Some(0), rest)
    } else if let Some(rest) = text.strip_prefix('>') {
        (Some(1), rest)
    } else if let Some(rest) = text.strip_prefix("at least") {
        (Some(0), rest)
    } else {
        (None, text.as_str())
    };

    let rest = rest.trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let Ok(years) = digits.parse::<u64>() else {
        return ExperienceRequirement::Unspecified;
    };
    let years = clamp_years(years);

    if let Some(bump) = floor_prefix {
        return ExperienceRequirement::AtLeast(years.saturating_add(bump));
    }

    match rest[digits.len()..].trim_start().chars().next() {
        Some('+') | Some('-') => ExperienceRequirement::AtLeast(years),
        _ if years == 0 => ExperienceRequirement::Unspecified,
        _ => ExperienceRequirement::Exact(years),
    }
}

fn clamp_years(years: u64) -> u32 {
    u32::try_from(years).unwrap_or(u32::MAX)
}

fn plural_years(n: u32) -> &'static str {
    if n == 1 {
        "year"
    } else {
        "years"
    }
}
