//! Report payload normalization
//!
//! Model output drifts: fenced JSON, capitalized or snake_case keys, legacy
//! `desc` and `now`/`next`/`future` names, Spanish impact labels. Everything
//! is folded into one `Report` shape here.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::{
    Dimension, DimensionAssessment, Dimensions, Horizon, ImpactTier, Initiative, Report, Roadmap,
};

type Object = Map<String, Value>;

/// Parse a raw report payload, stripping code fences if plain parsing fails
pub fn parse_report(raw: &str) -> Result<Report> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(strip_code_fences(raw).trim()).map_err(|e| {
            Error::MalformedReport(format!("payload is not JSON: {}", e))
        })?,
    };

    normalize(&value)
}

/// Remove markdown code fences around a payload
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```JSON", "").replace("```", "")
}

/// Fold a parsed payload into a `Report`
pub fn normalize(value: &Value) -> Result<Report> {
    let root = value
        .as_object()
        .ok_or_else(|| Error::MalformedReport("payload is not an object".to_string()))?;

    let dims = field(root, &["dimensions"])
        .and_then(Value::as_object)
        .ok_or_else(|| Error::MalformedReport("missing dimensions".to_string()))?;

    let dimensions = Dimensions {
        strategy: dimension(dims, Dimension::Strategy)?,
        culture: dimension(dims, Dimension::Culture)?,
        processes: dimension(dims, Dimension::Processes)?,
        data: dimension(dims, Dimension::Data)?,
        analytics: dimension(dims, Dimension::Analytics)?,
        technology: dimension(dims, Dimension::Technology)?,
        governance: dimension(dims, Dimension::Governance)?,
    };

    let overall_score = match field(root, &["overallscore", "overall"]).and_then(number) {
        Some(score) => score.clamp(0.0, 5.0),
        None => dimensions.mean_score(),
    };

    let strongest_area = field(root, &["strongestarea", "strongest"])
        .map(text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| extreme(&dimensions, |a, b| a > b).key().to_string());

    let main_opportunity = field(root, &["mainopportunity", "opportunity"])
        .map(text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| extreme(&dimensions, |a, b| a < b).key().to_string());

    let executive_summary = field(root, &["executivesummary", "summary"])
        .map(text)
        .unwrap_or_default();

    let roadmap = match field(root, &["roadmap"]) {
        Some(Value::Object(roadmap)) => Roadmap {
            short_term: horizon(roadmap, Horizon::ShortTerm)?,
            medium_term: horizon(roadmap, Horizon::MediumTerm)?,
            long_term: horizon(roadmap, Horizon::LongTerm)?,
        },
        Some(Value::Null) | None => Roadmap::default(),
        Some(_) => return Err(Error::MalformedReport("roadmap is not an object".to_string())),
    };

    Ok(Report {
        overall_score,
        strongest_area,
        main_opportunity,
        executive_summary,
        dimensions,
        roadmap,
    })
}

/// Lower-case and drop everything but letters and digits
fn canonical(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First value whose key canonicalizes to one of `names`, in `names` order
fn field<'a>(object: &'a Object, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        object
            .iter()
            .find(|(key, _)| canonical(key) == *name)
            .map(|(_, value)| value)
    })
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn level_for(score: u8) -> &'static str {
    match score {
        1 => "Initial",
        2 => "Basic",
        3 => "Intermediate",
        4 => "Advanced",
        _ => "Optimized",
    }
}

fn dimension(dims: &Object, dimension: Dimension) -> Result<DimensionAssessment> {
    let entry = field(dims, &[dimension.key()])
        .and_then(Value::as_object)
        .ok_or_else(|| Error::MalformedReport(format!("missing dimension {}", dimension.key())))?;

    let score = field(entry, &["score"])
        .and_then(number)
        .ok_or_else(|| Error::MalformedReport(format!("dimension {} has no score", dimension.key())))?
        .round()
        .clamp(1.0, 5.0) as u8;

    let level = field(entry, &["level"])
        .map(text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| level_for(score).to_string());

    Ok(DimensionAssessment {
        score,
        level,
        analysis: field(entry, &["analysis"]).map(text).unwrap_or_default(),
        recommendation: field(entry, &["recommendation"])
            .map(text)
            .unwrap_or_default(),
    })
}

/// Strongest or weakest dimension; ties go to the first in canonical order
fn extreme(dimensions: &Dimensions, better: impl Fn(u8, u8) -> bool) -> Dimension {
    let mut best = Dimension::Strategy;
    for (dimension, assessment) in dimensions.iter() {
        if better(assessment.score, dimensions.get(best).score) {
            best = dimension;
        }
    }
    best
}

fn impact(value: Option<&Value>) -> ImpactTier {
    let label = value.map(text).unwrap_or_default().to_lowercase();
    if label.contains("alta") || label.contains("high") {
        ImpactTier::High
    } else if label.contains("media") || label.contains("medium") {
        ImpactTier::Medium
    } else {
        ImpactTier::Low
    }
}

fn horizon(roadmap: &Object, horizon: Horizon) -> Result<Vec<Initiative>> {
    let names: &[&str] = match horizon {
        Horizon::ShortTerm => &["shortterm", "now"],
        Horizon::MediumTerm => &["mediumterm", "next"],
        Horizon::LongTerm => &["longterm", "future"],
    };

    let items = match field(roadmap, names) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => {
            return Err(Error::MalformedReport(format!(
                "roadmap {} is not a list",
                horizon.key()
            )))
        }
    };

    items
        .iter()
        .map(|item| {
            let item = item.as_object().ok_or_else(|| {
                Error::MalformedReport(format!("roadmap {} entry is not an object", horizon.key()))
            })?;

            let steps = match field(item, &["steps"]) {
                Some(Value::Array(steps)) => steps
                    .iter()
                    .map(text)
                    .filter(|s| !s.is_empty())
                    .collect(),
                _ => Vec::new(),
            };

            Ok(Initiative {
                title: field(item, &["title"]).map(text).unwrap_or_default(),
                impact: impact(field(item, &["impact"])),
                description: field(item, &["description", "desc"])
                    .map(text)
                    .unwrap_or_default(),
                objective: field(item, &["objective"]).map(text).unwrap_or_default(),
                steps,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ignores_case_and_separators() {
        assert_eq!(canonical("Overall_Score"), "overallscore");
        assert_eq!(canonical("short-term"), "shortterm");
    }

    #[test]
    fn test_impact_accepts_spanish_labels() {
        assert_eq!(impact(Some(&Value::from("Alta"))), ImpactTier::High);
        assert_eq!(impact(Some(&Value::from("media"))), ImpactTier::Medium);
        assert_eq!(impact(None), ImpactTier::Low);
    }
}
