//! Evaluation scoring: weighted averages over template items and grade bands.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HrError, HrResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    S,
    A,
    B,
    C,
    D,
}

impl GradeBand {
    pub fn for_score(score: Decimal) -> Self {
        if score >= Decimal::new(45, 1) {
            GradeBand::S
        } else if score >= Decimal::new(35, 1) {
            GradeBand::A
        } else if score >= Decimal::new(25, 1) {
            GradeBand::B
        } else if score >= Decimal::new(15, 1) {
            GradeBand::C
        } else {
            GradeBand::D
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GradeBand::S => "S",
            GradeBand::A => "A",
            GradeBand::B => "B",
            GradeBand::C => "C",
            GradeBand::D => "D",
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade for an optional score; no score keeps whatever grade was stored.
pub fn determine_grade(score: Option<Decimal>) -> Option<GradeBand> {
    score.map(GradeBand::for_score)
}

/// One scored item of an evaluation template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateItem {
    pub id: String,
    pub name: String,
    pub weight: Decimal,
}

/// Read `[{id, name, weight}]`. Ids may be numbers or strings; they are
/// compared as text. A missing weight counts as 1.
pub fn parse_items(items: &Value) -> HrResult<Vec<TemplateItem>> {
    let Some(list) = items.as_array() else {
        return Err(HrError::Validation(
            "evaluation items must be a list".into(),
        ));
    };
    list.iter()
        .map(|item| {
            let id = item
                .get("id")
                .and_then(json_key)
                .ok_or_else(|| HrError::Validation("evaluation item is missing an id".into()))?;
            let name = item
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let weight = match item.get("weight") {
                None | Some(Value::Null) => Decimal::ONE,
                Some(raw) => json_decimal(raw).ok_or_else(|| {
                    HrError::Validation(format!("weight of item {} is not a number", id))
                })?,
            };
            Ok(TemplateItem { id, name, weight })
        })
        .collect()
}

/// Read `{itemId: score}`.
pub fn parse_scores(scores: &Value) -> HrResult<HashMap<String, Decimal>> {
    match scores {
        Value::Null => Ok(HashMap::new()),
        Value::Object(map) => map
            .iter()
            .map(|(id, raw)| {
                json_decimal(raw)
                    .map(|score| (id.clone(), score))
                    .ok_or_else(|| {
                        HrError::Validation(format!("score for item {} is not a number", id))
                    })
            })
            .collect(),
        _ => Err(HrError::Validation(
            "evaluation scores must be an object".into(),
        )),
    }
}

/// Reject scores outside the template's `[min, max]`.
pub fn validate_scores(scores: &Value, min: Decimal, max: Decimal) -> HrResult<()> {
    for (id, score) in parse_scores(scores)? {
        if score < min || score > max {
            return Err(HrError::out_of_range(&format!("score for item {}", id), min, max));
        }
    }
    Ok(())
}

/// Σ score × weight / Σ weight over items present in both the template and the
/// scores, to one decimal. `None` when nothing can be averaged.
pub fn weighted_score(items: &Value, scores: &Value) -> HrResult<Option<Decimal>> {
    let scores = parse_scores(scores)?;
    if scores.is_empty() {
        return Ok(None);
    }
    let mut weighted = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;
    for item in parse_items(items)? {
        if let Some(score) = scores.get(&item.id) {
            weighted += *score * item.weight;
            total_weight += item.weight;
        }
    }
    if total_weight.is_zero() {
        return Ok(None);
    }
    Ok(Some((weighted / total_weight).round_dp(1)))
}

fn json_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings.
pub fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
