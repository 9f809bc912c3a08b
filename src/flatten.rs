use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::{debug, warn};

pub const MONEYLINE_LABEL: &str = "Moneyline";
pub const MONEYLINE_LINE: &str = "Win";

#[derive(Debug, Deserialize)]
struct EventGroupEnvelope {
    #[serde(rename = "eventGroup")]
    event_group: EventGroup,
}

#[derive(Debug, Deserialize)]
pub struct EventGroup {
    #[serde(rename = "offerCategories")]
    pub offer_categories: Vec<OfferCategory>,
    pub events: Vec<DkEvent>,
}

#[derive(Debug, Deserialize)]
pub struct OfferCategory {
    #[serde(rename = "offerSubcategoryDescriptors")]
    pub descriptors: Vec<SubcategoryDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct SubcategoryDescriptor {
    #[serde(rename = "offerSubcategory")]
    pub offer_subcategory: OfferSubcategory,
}

#[derive(Debug, Deserialize)]
pub struct OfferSubcategory {
    /// One entry per event; each holds that event's offers, one per market.
    pub offers: Vec<Option<Vec<Option<DkOffer>>>>,
}

#[derive(Debug, Deserialize)]
pub struct DkOffer {
    pub label: Option<String>,
    #[serde(rename = "isSuspended")]
    pub is_suspended: Option<Value>,
    #[serde(rename = "isOpen")]
    pub is_open: Option<Value>,
    #[serde(rename = "eventId")]
    pub event_id: Option<Value>,
    #[serde(rename = "providerOfferId")]
    pub provider_offer_id: Option<Value>,
    pub outcomes: Vec<Option<DkOutcome>>,
}

#[derive(Debug, Deserialize)]
pub struct DkOutcome {
    pub label: Option<String>,
    pub line: Option<Value>,
    #[serde(rename = "oddsAmerican")]
    pub odds_american: Option<Value>,
    #[serde(rename = "providerOfferId")]
    pub provider_offer_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DkEvent {
    #[serde(rename = "eventId")]
    pub event_id: Option<Value>,
    #[serde(rename = "displayGroupId")]
    pub display_group_id: Option<Value>,
    #[serde(rename = "eventGroupId")]
    pub event_group_id: Option<Value>,
    #[serde(rename = "eventGroupName")]
    pub event_group_name: Option<Value>,
    #[serde(rename = "nameIdentifier")]
    pub name_identifier: Option<Value>,
    #[serde(rename = "startDate")]
    pub start_date: Option<Value>,
    #[serde(rename = "teamName1")]
    pub team_name1: Option<Value>,
    #[serde(rename = "teamName2")]
    pub team_name2: Option<Value>,
    #[serde(rename = "teamShortName1")]
    pub team_short_name1: Option<Value>,
    #[serde(rename = "teamShortName2")]
    pub team_short_name2: Option<Value>,
}

impl EventGroup {
    /// `offerCategories[0].offerSubcategoryDescriptors[0].offerSubcategory.offers`
    pub fn offer_slots(&self) -> Result<&[Option<Vec<Option<DkOffer>>>]> {
        let category = self
            .offer_categories
            .first()
            .ok_or_else(|| anyhow!("eventGroup.offerCategories is empty"))?;
        let descriptor = category.descriptors.first().ok_or_else(|| {
            anyhow!("eventGroup.offerCategories[0].offerSubcategoryDescriptors is empty")
        })?;
        Ok(&descriptor.offer_subcategory.offers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub label: Option<String>,
    pub line: Option<String>,
    pub odds_american: Option<String>,
    pub provider_offer_id: Option<String>,
}

// `label` becomes `bet_type` so it does not collide with the outcome label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRecord {
    pub bet_type: Option<String>,
    pub is_suspended: Option<String>,
    pub is_open: Option<String>,
    pub event_id: Option<String>,
    pub provider_offer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOutcome {
    pub label: Option<String>,
    pub line: Option<String>,
    pub odds_american: Option<String>,
    pub provider_offer_id: Option<String>,
    pub bet_type: Option<String>,
    pub is_suspended: Option<String>,
    pub is_open: Option<String>,
    pub event_id: Option<String>,
}

pub fn parse_event_group_json(raw: &str) -> Result<EventGroup> {
    let envelope: EventGroupEnvelope =
        serde_json::from_str(raw.trim()).context("invalid event group json")?;
    Ok(envelope.event_group)
}

/// Walks every offer group (the offers sharing a position across events) and
/// emits one record per outcome, grouped by outcome position then event.
pub fn flatten_offers(group: &EventGroup) -> Result<Vec<OfferOutcome>> {
    let slots = group.offer_slots()?;
    let slot_count = slots
        .iter()
        .map(|offers| offers.as_ref().map_or(0, Vec::len))
        .max()
        .unwrap_or(0);

    let mut offers = Vec::new();
    let mut outcomes = Vec::new();

    for slot in 0..slot_count {
        let group_offers: Vec<&DkOffer> = slots
            .iter()
            .filter_map(|event_offers| event_offers.as_ref()?.get(slot)?.as_ref())
            .collect();

        // Applies to the whole group, not only the offer labelled Moneyline.
        let moneyline = group_offers
            .iter()
            .any(|offer| offer.label.as_deref() == Some(MONEYLINE_LABEL));

        offers.extend(group_offers.iter().map(|offer| offer_record(offer)));

        let width = group_offers
            .iter()
            .map(|offer| offer.outcomes.len())
            .max()
            .unwrap_or(0);
        for pos in 0..width {
            for offer in &group_offers {
                let Some(Some(outcome)) = offer.outcomes.get(pos) else {
                    continue;
                };
                outcomes.push(outcome_record(outcome, moneyline));
            }
        }
    }

    debug!(
        offers = offers.len(),
        outcomes = outcomes.len(),
        groups = slot_count,
        "flattened offer groups"
    );
    Ok(join_outcomes_to_offers(outcomes, &offers))
}

pub fn join_outcomes_to_offers(
    outcomes: Vec<OutcomeRecord>,
    offers: &[OfferRecord],
) -> Vec<OfferOutcome> {
    let mut by_id: HashMap<&str, &OfferRecord> = HashMap::with_capacity(offers.len());
    for offer in offers {
        let Some(id) = offer.provider_offer_id.as_deref() else {
            continue;
        };
        if by_id.contains_key(id) {
            warn!(provider_offer_id = id, "duplicate offer id, keeping the first");
            continue;
        }
        by_id.insert(id, offer);
    }

    outcomes
        .into_iter()
        .map(|outcome| {
            let offer = outcome
                .provider_offer_id
                .as_deref()
                .and_then(|id| by_id.get(id).copied());
            OfferOutcome {
                bet_type: offer.and_then(|o| o.bet_type.clone()),
                is_suspended: offer.and_then(|o| o.is_suspended.clone()),
                is_open: offer.and_then(|o| o.is_open.clone()),
                event_id: offer.and_then(|o| o.event_id.clone()),
                label: outcome.label,
                line: outcome.line,
                odds_american: outcome.odds_american,
                provider_offer_id: outcome.provider_offer_id,
            }
        })
        .collect()
}

fn offer_record(offer: &DkOffer) -> OfferRecord {
    OfferRecord {
        bet_type: offer.label.clone(),
        is_suspended: render_opt(offer.is_suspended.as_ref()),
        is_open: render_opt(offer.is_open.as_ref()),
        event_id: render_opt(offer.event_id.as_ref()),
        provider_offer_id: render_opt(offer.provider_offer_id.as_ref()),
    }
}

fn outcome_record(outcome: &DkOutcome, moneyline: bool) -> OutcomeRecord {
    OutcomeRecord {
        label: outcome.label.clone(),
        line: normalize_line(outcome.line.as_ref(), moneyline),
        odds_american: render_opt(outcome.odds_american.as_ref()),
        provider_offer_id: render_opt(outcome.provider_offer_id.as_ref()),
    }
}

pub fn normalize_line(line: Option<&Value>, moneyline: bool) -> Option<String> {
    if moneyline {
        return Some(MONEYLINE_LINE.to_string());
    }
    match line? {
        Value::Number(n) => Some(signed_number(n)),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<f64>() {
                Ok(v) if v > 0.0 && !s.starts_with('+') => Some(format!("+{s}")),
                _ => Some(s.to_string()),
            }
        }
        other => render_scalar(other),
    }
}

fn signed_number(n: &Number) -> String {
    let rendered = render_number(n);
    if n.as_f64().is_some_and(|v| v > 0.0) {
        format!("+{rendered}")
    } else {
        rendered
    }
}

pub fn render_opt(value: Option<&Value>) -> Option<String> {
    value.and_then(render_scalar)
}

pub fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(render_number(n)),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => format!("{f:.1}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
