use crate::EngineResult;
use crate::constants::{EMPTY_HEALTH, RECENT_ACTIVITY};
use crate::policy::{keyword_score, matched_keywords};
use crate::service::{Domain, soft_error, to_json};
use chrono::{DateTime, Utc};
use neuromesh_macros::{MessageKind, standard, standard_enum};
use neuromesh_store::{Entity, EntityStore};
use neuromesh_types::{OutboundIntent, Payload, PayloadExt, Value, to_payload};
use serde_json::json;
use std::collections::BTreeMap;

/// Messages handled by the market service
#[derive(Debug, Clone, Copy, PartialEq, Eq, MessageKind)]
pub enum MarketMessage {
    AnalyzeTrends,
    IdentifyOpportunities,
    PursueOpportunity,
    GetMarketStatus,
    SyncMarketIntel,
}

/// Catalog entry for a market trend
struct TrendTemplate {
    name: &'static str,
    tags: &'static [&'static str],
    relevance: f64,
    growth: f64,
}

/// Catalog entry for an opportunity
struct OpportunityTemplate {
    name: &'static str,
    segment: &'static str,
    tags: &'static [&'static str],
    score: f64,
    value: f64,
}

static TRENDS: [TrendTemplate; 5] = [
    TrendTemplate {
        name: "adaptive-automation",
        tags: &["automation", "ai", "operations"],
        relevance: 0.7,
        growth: 0.12,
    },
    TrendTemplate {
        name: "edge-cognition",
        tags: &["edge", "ai", "latency"],
        relevance: 0.6,
        growth: 0.18,
    },
    TrendTemplate {
        name: "self-healing-infrastructure",
        tags: &["reliability", "operations", "maintenance"],
        relevance: 0.65,
        growth: 0.09,
    },
    TrendTemplate {
        name: "privacy-preserving-analytics",
        tags: &["privacy", "analytics", "data"],
        relevance: 0.55,
        growth: 0.07,
    },
    TrendTemplate {
        name: "energy-aware-compute",
        tags: &["energy", "efficiency", "infrastructure"],
        relevance: 0.5,
        growth: 0.11,
    },
];

static OPPORTUNITIES: [OpportunityTemplate; 5] = [
    OpportunityTemplate {
        name: "predictive-maintenance-suite",
        segment: "industrial",
        tags: &["maintenance", "reliability", "ai"],
        score: 0.72,
        value: 250_000.0,
    },
    OpportunityTemplate {
        name: "autonomous-ops-assistant",
        segment: "enterprise",
        tags: &["automation", "operations", "ai"],
        score: 0.68,
        value: 180_000.0,
    },
    OpportunityTemplate {
        name: "edge-inference-kit",
        segment: "devices",
        tags: &["edge", "latency", "ai"],
        score: 0.6,
        value: 120_000.0,
    },
    OpportunityTemplate {
        name: "secure-insight-platform",
        segment: "finance",
        tags: &["privacy", "analytics", "data"],
        score: 0.55,
        value: 300_000.0,
    },
    OpportunityTemplate {
        name: "green-scheduling-service",
        segment: "cloud",
        tags: &["energy", "efficiency", "infrastructure"],
        score: 0.5,
        value: 90_000.0,
    },
];

const SEEDED_OPPORTUNITIES: usize = 2;
const DEFAULT_LIMIT: u64 = 5;
const SALES: &str = "sales";

#[standard]
pub struct TrendSignal {
    pub name: String,
    pub relevance: f64,
    pub growth: f64,
    pub matched: Vec<String>,
}

#[standard]
pub struct TrendAnalysis {
    pub id: String,
    pub keywords: Vec<String>,
    pub trends: Vec<TrendSignal>,
    pub analyzed_at: DateTime<Utc>,
}

impl Entity for TrendAnalysis {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Opportunity lifecycle: `identified -> pursuing -> closed`
#[standard_enum]
pub enum OpportunityStatus {
    Identified,
    Pursuing,
    Closed,
}

#[standard]
pub struct Opportunity {
    pub id: String,
    pub name: String,
    pub segment: String,
    pub score: f64,
    pub potential_value: f64,
    pub status: OpportunityStatus,
    pub identified_at: DateTime<Utc>,
    pub pursued_at: Option<DateTime<Utc>>,
}

impl Entity for Opportunity {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Catalog entries scored against keywords, best first
///
/// Without keywords every entry is kept at its base score. With keywords
/// only matching entries are kept.
fn rank<'a, T>(
    catalog: &'a [T],
    keywords: &[String],
    describe: impl Fn(&T) -> (&'static str, &'static [&'static str], f64),
) -> Vec<(&'a T, f64, Vec<String>)> {
    let mut ranked: Vec<_> = catalog
        .iter()
        .filter_map(|entry| {
            let (name, tags, base) = describe(entry);
            let matches = matched_keywords(name, tags, keywords);
            if !keywords.is_empty() && matches.is_empty() {
                return None;
            }
            Some((entry, keyword_score(base, matches.len()), matches))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Market intelligence: trend analysis and opportunity tracking
pub struct MarketService {
    analyses: EntityStore<TrendAnalysis>,
    opportunities: EntityStore<Opportunity>,
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketService {
    pub fn new() -> Self {
        Self {
            analyses: EntityStore::new("analysis"),
            opportunities: EntityStore::new("opportunity"),
        }
    }

    pub fn opportunities(&self) -> &EntityStore<Opportunity> {
        &self.opportunities
    }

    fn record_opportunity(&mut self, template: &OpportunityTemplate, score: f64) -> &Opportunity {
        let opportunity = Opportunity {
            id: self.opportunities.next_id(None),
            name: template.name.to_string(),
            segment: template.segment.to_string(),
            score,
            potential_value: template.value,
            status: OpportunityStatus::Identified,
            identified_at: Utc::now(),
            pursued_at: None,
        };
        self.opportunities.insert(opportunity)
    }

    fn analyze_trends(&mut self, payload: &Payload) -> EngineResult<Value> {
        let keywords = payload.text_list("keywords");
        let trends = rank(&TRENDS, &keywords, |t| (t.name, t.tags, t.relevance))
            .into_iter()
            .map(|(trend, relevance, matched)| TrendSignal {
                name: trend.name.to_string(),
                relevance,
                growth: trend.growth,
                matched,
            })
            .collect();

        let analysis = TrendAnalysis {
            id: self.analyses.next_id(payload.text("id")),
            keywords,
            trends,
            analyzed_at: Utc::now(),
        };
        let analysis = self.analyses.insert(analysis);
        Ok(json!({
            "analysis": to_json(analysis)?,
            "trendCount": analysis.trends.len(),
        }))
    }

    fn identify_opportunities(&mut self, payload: &Payload) -> EngineResult<Value> {
        let keywords = payload.text_list("keywords");
        let limit = usize::try_from(payload.count_or("limit", DEFAULT_LIMIT)).unwrap_or(usize::MAX);

        let ranked: Vec<(&OpportunityTemplate, f64)> =
            rank(&OPPORTUNITIES, &keywords, |o| (o.name, o.tags, o.score))
                .into_iter()
                .take(limit)
                .map(|(template, score, _)| (template, score))
                .collect();

        let mut identified = Vec::with_capacity(ranked.len());
        for (template, score) in ranked {
            identified.push(self.record_opportunity(template, score).clone());
        }

        Ok(json!({
            "count": identified.len(),
            "opportunities": to_json(&identified)?,
        }))
    }

    fn pursue_opportunity(&mut self, payload: &Payload) -> EngineResult<Value> {
        let opportunity_id = payload.text_or("opportunityId", "");
        let Some(opportunity) = self.opportunities.get_mut(&opportunity_id) else {
            return Ok(soft_error(
                "Opportunity not found",
                "opportunityId",
                &opportunity_id,
            ));
        };

        if opportunity.status != OpportunityStatus::Identified {
            let mut body = soft_error("Opportunity not available", "opportunityId", &opportunity_id);
            if let Value::Object(map) = &mut body {
                map.insert("status".to_string(), json!(opportunity.status));
            }
            return Ok(body);
        }

        opportunity.status = OpportunityStatus::Pursuing;
        opportunity.pursued_at = Some(Utc::now());
        Ok(json!({ "pursuing": true, "opportunity": to_json(&*opportunity)? }))
    }

    fn get_market_status(&self) -> EngineResult<Value> {
        Ok(json!({
            "analyses": self.analyses.len(),
            "opportunities": self.opportunities.len(),
            "opportunitiesByStatus": self.opportunities.count_by(|o| o.status),
            "averageScore": self.opportunities.average(|o| o.score).unwrap_or(0.0),
            "pipelineValue": self
                .opportunities
                .iter()
                .filter(|o| o.status == OpportunityStatus::Pursuing)
                .map(|o| o.potential_value)
                .sum::<f64>(),
            "recentAnalyses": to_json(&self.analyses.recent(RECENT_ACTIVITY))?,
        }))
    }

    fn sync_market_intel(&self) -> EngineResult<Value> {
        let pursuing: Vec<&Opportunity> = self
            .opportunities
            .iter()
            .filter(|o| o.status == OpportunityStatus::Pursuing)
            .collect();
        let latest_trends = self
            .analyses
            .recent(1)
            .first()
            .map(|a| a.trends.clone())
            .unwrap_or_default();

        let intent = OutboundIntent::new(
            SALES,
            "MARKET_INTEL",
            to_payload(json!({
                "opportunities": to_json(&pursuing)?,
                "trends": to_json(&latest_trends)?,
            })),
        );
        Ok(json!({ "intent": to_json(&intent)? }))
    }
}

impl Domain for MarketService {
    type Kind = MarketMessage;

    const NAME: &'static str = "market";
    const DESCRIPTION: &'static str = "Market intelligence: trends and opportunities";

    fn seed(&mut self) {
        for template in OPPORTUNITIES.iter().take(SEEDED_OPPORTUNITIES) {
            let opportunity = self.record_opportunity(template, template.score);
            tracing::info!("  ✓ Opportunity {}: {}", opportunity.id, opportunity.name);
        }
    }

    fn handle(&mut self, kind: MarketMessage, payload: &Payload) -> EngineResult<Value> {
        match kind {
            MarketMessage::AnalyzeTrends => self.analyze_trends(payload),
            MarketMessage::IdentifyOpportunities => self.identify_opportunities(payload),
            MarketMessage::PursueOpportunity => self.pursue_opportunity(payload),
            MarketMessage::GetMarketStatus => self.get_market_status(),
            MarketMessage::SyncMarketIntel => self.sync_market_intel(),
        }
    }

    fn retire(&mut self) {
        self.opportunities
            .iter_mut()
            .filter(|o| o.status == OpportunityStatus::Pursuing)
            .for_each(|o| o.status = OpportunityStatus::Closed);
    }

    fn health_score(&self) -> f64 {
        self.opportunities
            .average(|o| o.score)
            .unwrap_or(EMPTY_HEALTH)
    }

    fn entity_counts(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("analyses".to_string(), self.analyses.len()),
            ("opportunities".to_string(), self.opportunities.len()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_trends_filters_by_keyword() {
        let mut service = MarketService::new();

        let all = service
            .handle(MarketMessage::AnalyzeTrends, &Payload::new())
            .unwrap();
        assert_eq!(all["trendCount"], TRENDS.len());

        let filtered = service
            .handle(
                MarketMessage::AnalyzeTrends,
                &to_payload(json!({"keywords": "AI, latency"})),
            )
            .unwrap();
        let trends = filtered["analysis"]["trends"].as_array().unwrap();
        assert_eq!(trends.len(), 2);
        let edge = trends
            .iter()
            .find(|t| t["name"] == "edge-cognition")
            .unwrap();
        assert_eq!(edge["matched"], json!(["ai", "latency"]));
        // 0.6 base + two keyword matches
        assert!((edge["relevance"].as_f64().unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_opportunity_lifecycle() {
        let mut service = MarketService::new();
        service.seed();
        assert_eq!(service.opportunities().len(), 2);

        let found = service
            .handle(
                MarketMessage::IdentifyOpportunities,
                &to_payload(json!({"keywords": ["privacy"], "limit": 3})),
            )
            .unwrap();
        assert_eq!(found["count"], 1);
        let id = found["opportunities"][0]["id"].as_str().unwrap().to_string();

        let pursue = to_payload(json!({"opportunityId": id}));
        let result = service
            .handle(MarketMessage::PursueOpportunity, &pursue)
            .unwrap();
        assert_eq!(result["opportunity"]["status"], "pursuing");

        let again = service
            .handle(MarketMessage::PursueOpportunity, &pursue)
            .unwrap();
        assert_eq!(again["error"], "Opportunity not available");

        service.retire();
        assert_eq!(
            service.opportunities().get(&id).unwrap().status,
            OpportunityStatus::Closed
        );
    }
}
