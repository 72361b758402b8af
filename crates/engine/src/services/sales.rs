use crate::constants::EMPTY_HEALTH;
use crate::policy::{PROMOTION_GAIN, PROMOTION_LOSS, adjust_unit, promotion_succeeds};
use crate::service::{Domain, soft_error, to_json};
use crate::{EngineResult, RandomSource};
use chrono::{DateTime, Utc};
use neuromesh_macros::{MessageKind, standard, standard_enum};
use neuromesh_store::{Entity, EntityStore};
use neuromesh_types::{Payload, PayloadExt, Value, to_payload};
use serde_json::json;
use std::collections::BTreeMap;

/// Messages handled by the sales service
#[derive(Debug, Clone, Copy, PartialEq, Eq, MessageKind)]
pub enum SalesMessage {
    CreateLead,
    AdvanceLead,
    LaunchCampaign,
    RecordConversion,
    GetPipeline,
}

/// Lead pipeline: `prospect -> qualified -> proposal -> won`, or `lost`
#[standard_enum]
pub enum LeadStage {
    Prospect,
    Qualified,
    Proposal,
    Won,
    Lost,
}

impl LeadStage {
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    const fn next(self) -> Self {
        match self {
            Self::Prospect => Self::Qualified,
            Self::Qualified => Self::Proposal,
            Self::Proposal | Self::Won => Self::Won,
            Self::Lost => Self::Lost,
        }
    }
}

#[standard]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub segment: String,
    pub value: f64,
    pub probability: f64,
    pub stage: LeadStage,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Entity for Lead {
    fn id(&self) -> &str {
        &self.id
    }
}

#[standard_enum]
pub enum CampaignStatus {
    Running,
    Completed,
}

#[standard]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub channel: String,
    pub reach: u64,
    pub conversions: u64,
    pub status: CampaignStatus,
    pub launched_at: DateTime<Utc>,
}

impl Campaign {
    pub fn conversion_rate(&self) -> f64 {
        if self.reach == 0 {
            0.0
        } else {
            self.conversions as f64 / self.reach as f64
        }
    }
}

impl Entity for Campaign {
    fn id(&self) -> &str {
        &self.id
    }
}

const DEFAULT_LEAD_NAME: &str = "unnamed-lead";
const DEFAULT_SEGMENT: &str = "general";
const DEFAULT_PROBABILITY: f64 = 0.3;
const DEFAULT_CAMPAIGN_NAME: &str = "unnamed-campaign";
const DEFAULT_CHANNEL: &str = "direct";
const DEFAULT_REACH: u64 = 1_000;
const SEED_CAMPAIGN: &str = "baseline-outreach";

/// Sales pipeline: leads and campaigns
pub struct SalesService {
    leads: EntityStore<Lead>,
    campaigns: EntityStore<Campaign>,
    random: Box<dyn RandomSource>,
}

impl SalesService {
    pub fn new(random: Box<dyn RandomSource>) -> Self {
        Self {
            leads: EntityStore::new("lead"),
            campaigns: EntityStore::new("campaign"),
            random,
        }
    }

    pub fn leads(&self) -> &EntityStore<Lead> {
        &self.leads
    }

    pub fn campaigns(&self) -> &EntityStore<Campaign> {
        &self.campaigns
    }

    fn create_lead(&mut self, payload: &Payload) -> EngineResult<Value> {
        let lead = Lead {
            id: self.leads.next_id(payload.text("id")),
            name: payload.text_or("name", DEFAULT_LEAD_NAME),
            segment: payload.text_or("segment", DEFAULT_SEGMENT),
            value: payload.number_or("value", 0.0).max(0.0),
            probability: payload.unit_or("probability", DEFAULT_PROBABILITY),
            stage: LeadStage::Prospect,
            created_at: Utc::now(),
            closed_at: None,
        };
        let lead = self.leads.insert(lead);
        Ok(json!({ "created": true, "lead": to_json(lead)? }))
    }

    fn advance_lead(&mut self, payload: &Payload) -> EngineResult<Value> {
        let lead_id = payload.text_or("leadId", "");
        let Some(lead) = self.leads.get_mut(&lead_id) else {
            return Ok(soft_error("Lead not found", "leadId", &lead_id));
        };

        if lead.stage.is_closed() {
            let mut body = soft_error("Lead already closed", "leadId", &lead_id);
            if let Value::Object(map) = &mut body {
                map.insert("stage".to_string(), json!(lead.stage));
            }
            return Ok(body);
        }

        let previous = lead.stage;
        let promoted = promotion_succeeds(lead.probability, self.random.as_mut());
        if promoted {
            lead.stage = lead.stage.next();
            lead.probability = adjust_unit(lead.probability, PROMOTION_GAIN);
        } else {
            lead.probability = adjust_unit(lead.probability, -PROMOTION_LOSS);
            if lead.probability <= 0.0 {
                lead.stage = LeadStage::Lost;
            }
        }
        if lead.stage.is_closed() {
            lead.closed_at = Some(Utc::now());
        }

        tracing::debug!(lead = %lead.id, from = ?previous, to = ?lead.stage, "lead advanced");

        Ok(json!({
            "advanced": promoted,
            "previousStage": previous,
            "lead": to_json(&*lead)?,
        }))
    }

    fn insert_campaign(&mut self, payload: &Payload) -> &Campaign {
        let campaign = Campaign {
            id: self.campaigns.next_id(payload.text("id")),
            name: payload.text_or("name", DEFAULT_CAMPAIGN_NAME),
            channel: payload.text_or("channel", DEFAULT_CHANNEL),
            reach: payload.count_or("reach", DEFAULT_REACH),
            conversions: 0,
            status: CampaignStatus::Running,
            launched_at: Utc::now(),
        };
        self.campaigns.insert(campaign)
    }

    fn launch_campaign(&mut self, payload: &Payload) -> EngineResult<Value> {
        let campaign = self.insert_campaign(payload);
        Ok(json!({ "launched": true, "campaign": to_json(campaign)? }))
    }

    fn record_conversion(&mut self, payload: &Payload) -> EngineResult<Value> {
        let campaign_id = payload.text_or("campaignId", "");
        let Some(campaign) = self.campaigns.get_mut(&campaign_id) else {
            return Ok(soft_error("Campaign not found", "campaignId", &campaign_id));
        };
        if campaign.status != CampaignStatus::Running {
            return Ok(soft_error("Campaign not running", "campaignId", &campaign_id));
        }

        // Conversions never exceed reach
        let count = payload.count_or("count", 1);
        campaign.conversions = campaign
            .conversions
            .saturating_add(count)
            .min(campaign.reach);

        Ok(json!({
            "campaign": to_json(&*campaign)?,
            "conversionRate": campaign.conversion_rate(),
        }))
    }

    fn get_pipeline(&self) -> EngineResult<Value> {
        let open = || self.leads.iter().filter(|l| !l.stage.is_closed());
        let won = self
            .leads
            .iter()
            .filter(|l| l.stage == LeadStage::Won)
            .count();
        let lost = self
            .leads
            .iter()
            .filter(|l| l.stage == LeadStage::Lost)
            .count();
        let conversion_rate = if won + lost == 0 {
            0.0
        } else {
            won as f64 / (won + lost) as f64
        };

        let (reach, conversions) = self
            .campaigns
            .iter()
            .fold((0u64, 0u64), |(r, c), campaign| {
                (r.saturating_add(campaign.reach), c.saturating_add(campaign.conversions))
            });

        Ok(json!({
            "leads": self.leads.len(),
            "openLeads": open().count(),
            "byStage": self.leads.count_by(|l| l.stage),
            "weightedForecast": open().map(|l| l.value * l.probability).sum::<f64>(),
            "conversionRate": conversion_rate,
            "campaigns": self.campaigns.len(),
            "campaignConversionRate": if reach == 0 { 0.0 } else { conversions as f64 / reach as f64 },
        }))
    }
}

impl Domain for SalesService {
    type Kind = SalesMessage;

    const NAME: &'static str = "sales";
    const DESCRIPTION: &'static str = "Sales pipeline: leads and campaigns";

    fn seed(&mut self) {
        let campaign = self.insert_campaign(&to_payload(json!({ "name": SEED_CAMPAIGN })));
        tracing::info!("  ✓ Campaign {}: {}", campaign.id, campaign.name);
    }

    fn handle(&mut self, kind: SalesMessage, payload: &Payload) -> EngineResult<Value> {
        match kind {
            SalesMessage::CreateLead => self.create_lead(payload),
            SalesMessage::AdvanceLead => self.advance_lead(payload),
            SalesMessage::LaunchCampaign => self.launch_campaign(payload),
            SalesMessage::RecordConversion => self.record_conversion(payload),
            SalesMessage::GetPipeline => self.get_pipeline(),
        }
    }

    fn retire(&mut self) {
        self.campaigns
            .iter_mut()
            .filter(|c| c.status == CampaignStatus::Running)
            .for_each(|c| c.status = CampaignStatus::Completed);
    }

    fn health_score(&self) -> f64 {
        let open: Vec<f64> = self
            .leads
            .iter()
            .filter(|l| !l.stage.is_closed())
            .map(|l| l.probability)
            .collect();
        if open.is_empty() {
            EMPTY_HEALTH
        } else {
            open.iter().sum::<f64>() / open.len() as f64
        }
    }

    fn entity_counts(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("leads".to_string(), self.leads.len()),
            ("campaigns".to_string(), self.campaigns.len()),
        ])
    }
}
