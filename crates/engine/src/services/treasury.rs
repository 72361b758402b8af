use crate::constants::{EMPTY_HEALTH, RECENT_ACCESSES, STATE_MANAGEMENT};
use crate::policy::{
    INTEGRATION_THRESHOLD, adjust_unit, clamp_unit, integration_compatibility,
    proficiency_after_feedback,
};
use crate::service::{Domain, soft_error, to_json};
use crate::{EngineResult, RandomSource};
use chrono::{DateTime, Utc};
use neuromesh_macros::{MessageKind, standard, standard_enum};
use neuromesh_store::{BoundedLog, Entity, EntityStore, LogConfig};
use neuromesh_types::{OutboundIntent, Payload, PayloadExt, Value, to_payload};
use serde_json::json;
use std::collections::BTreeMap;

/// Messages handled by the treasury (motor memory) service
#[derive(Debug, Clone, Copy, PartialEq, Eq, MessageKind)]
pub enum TreasuryMessage {
    StoreMotorMemory,
    RetrieveMotorMemory,
    UpdateProficiency,
    RecordFeedback,
    GetSkillInventory,
    IntegrateSkill,
    SyncState,
}

/// A stored motor skill
#[standard]
pub struct MotorMemory {
    pub id: String,
    pub skill_name: String,
    #[serde(rename = "type")]
    pub skill_type: String,
    pub proficiency: f64,
    pub pattern: Payload,
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl Entity for MotorMemory {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One successful retrieval
#[standard]
pub struct AccessRecord {
    pub skill_id: String,
    pub skill_name: String,
    pub accessed_at: DateTime<Utc>,
}

/// One execution feedback record
#[standard]
pub struct FeedbackRecord {
    pub skill_id: Option<String>,
    pub success: bool,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Integration lifecycle
#[standard_enum]
pub enum IntegrationStatus {
    Pending,
    Active,
    Failed,
    Retired,
}

/// A skill offered to another service
#[standard]
pub struct SkillIntegration {
    pub id: String,
    pub skill_id: String,
    pub target_service: String,
    pub compatibility: f64,
    pub status: IntegrationStatus,
    pub created_at: DateTime<Utc>,
}

impl SkillIntegration {
    /// Leave `pending` for `active` or `failed` by compatibility
    fn resolve(&mut self) {
        if self.status == IntegrationStatus::Pending {
            self.status = if self.compatibility >= INTEGRATION_THRESHOLD {
                IntegrationStatus::Active
            } else {
                IntegrationStatus::Failed
            };
        }
    }
}

impl Entity for SkillIntegration {
    fn id(&self) -> &str {
        &self.id
    }
}

// Payload defaults
const DEFAULT_SKILL_NAME: &str = "unnamed-skill";
const DEFAULT_SKILL_TYPE: &str = "motor";
const DEFAULT_PROFICIENCY: f64 = 0.5;
const DEFAULT_FEEDBACK_SCORE: f64 = 0.5;
const DEFAULT_TARGET_SERVICE: &str = "organization";

/// Seeded motor skills: (name, proficiency)
const DEFAULT_SKILLS: [(&str, f64); 3] = [
    ("balance-maintenance", 0.8),
    ("fine-coordination", 0.7),
    ("reflex-response", 0.85),
];

/// Motor memory repository: stores skills, tracks proficiency and feedback
pub struct TreasuryService {
    memories: EntityStore<MotorMemory>,
    integrations: EntityStore<SkillIntegration>,
    access_log: BoundedLog<AccessRecord>,
    feedback: BoundedLog<FeedbackRecord>,
    random: Box<dyn RandomSource>,
}

impl TreasuryService {
    /// Create a treasury with the default history bounds
    pub fn new(random: Box<dyn RandomSource>) -> Self {
        Self {
            memories: EntityStore::new("skill"),
            integrations: EntityStore::new("integration"),
            access_log: BoundedLog::default(),
            feedback: BoundedLog::default(),
            random,
        }
    }

    /// Create a treasury with custom history bounds
    pub fn with_history(random: Box<dyn RandomSource>, history: LogConfig) -> EngineResult<Self> {
        Ok(Self {
            access_log: BoundedLog::with_config(history)?,
            feedback: BoundedLog::with_config(history)?,
            ..Self::new(random)
        })
    }

    pub fn memories(&self) -> &EntityStore<MotorMemory> {
        &self.memories
    }

    pub fn feedback_len(&self) -> usize {
        self.feedback.len()
    }

    pub fn access_log_len(&self) -> usize {
        self.access_log.len()
    }

    fn create_memory(&mut self, payload: &Payload) -> MotorMemory {
        let memory = MotorMemory {
            id: self.memories.next_id(payload.text("id")),
            skill_name: payload.text_or("skillName", DEFAULT_SKILL_NAME),
            skill_type: payload.text_or("type", DEFAULT_SKILL_TYPE),
            proficiency: payload.unit_or("proficiency", DEFAULT_PROFICIENCY),
            pattern: payload.object_or_empty("pattern"),
            access_count: 0,
            created_at: Utc::now(),
            last_accessed: None,
        };
        self.memories.insert(memory).clone()
    }

    /// Resolve a skill id from `skillId`, falling back to an exact `skillName`
    fn locate(&self, payload: &Payload) -> Option<String> {
        if let Some(id) = payload.text("skillId")
            && self.memories.contains(&id)
        {
            return Some(id);
        }
        let name = payload.text("skillName")?;
        self.memories
            .find(|m| m.skill_name == name)
            .map(|m| m.id.clone())
    }

    /// Exact name match first, else first case-insensitive substring match
    fn search(&self, query: &str) -> Option<String> {
        let needle = query.to_lowercase();
        self.memories
            .find(|m| m.skill_name == query)
            .or_else(|| {
                self.memories
                    .find(|m| m.skill_name.to_lowercase().contains(&needle))
            })
            .map(|m| m.id.clone())
    }

    fn store_motor_memory(&mut self, payload: &Payload) -> EngineResult<Value> {
        let memory = self.create_memory(payload);
        tracing::debug!(skill = %memory.skill_name, id = %memory.id, "stored motor memory");
        Ok(json!({ "stored": true, "memory": to_json(&memory)? }))
    }

    fn retrieve_motor_memory(&mut self, payload: &Payload) -> EngineResult<Value> {
        let query = payload.text_or("skillName", "");
        let found = payload
            .text("skillId")
            .filter(|id| self.memories.contains(id))
            .or_else(|| (!query.is_empty()).then(|| self.search(&query)).flatten());

        let Some(memory) = found.and_then(|id| self.memories.get_mut(&id)) else {
            let mut body = soft_error("Motor memory not found", "skillName", &query);
            if let (Some(id), Value::Object(map)) = (payload.text("skillId"), &mut body) {
                map.insert("skillId".to_string(), json!(id));
            }
            return Ok(body);
        };

        let now = Utc::now();
        memory.access_count += 1;
        memory.last_accessed = Some(now);
        let memory = memory.clone();

        self.access_log.push(AccessRecord {
            skill_id: memory.id.clone(),
            skill_name: memory.skill_name.clone(),
            accessed_at: now,
        });

        Ok(json!({
            "found": true,
            "confidence": memory.proficiency,
            "skill": to_json(&memory)?,
        }))
    }

    fn update_proficiency(&mut self, payload: &Payload) -> EngineResult<Value> {
        let requested = payload
            .text("skillId")
            .or_else(|| payload.text("skillName"))
            .unwrap_or_default();
        let Some(memory) = self
            .locate(payload)
            .and_then(|id| self.memories.get_mut(&id))
        else {
            return Ok(soft_error("Skill not found", "skillId", &requested));
        };

        let previous = memory.proficiency;
        memory.proficiency = match payload.number("newProficiency") {
            Some(target) => clamp_unit(target),
            None => adjust_unit(previous, payload.number_or("delta", 0.0)),
        };

        Ok(json!({
            "updated": true,
            "previousProficiency": previous,
            "skill": to_json(&*memory)?,
        }))
    }

    fn record_feedback(&mut self, payload: &Payload) -> EngineResult<Value> {
        // An explicit `records` list is a batch, even when empty
        let items = if payload.field("records").is_some_and(|v| !v.is_null()) {
            payload.object_list("records")
        } else {
            vec![payload.clone()]
        };

        let now = Utc::now();
        let mut adjusted = 0usize;
        let records: Vec<FeedbackRecord> = items
            .iter()
            .map(|item| {
                let record = FeedbackRecord {
                    skill_id: item.text("skillId"),
                    success: item.flag_or("success", true),
                    score: item.unit_or("score", DEFAULT_FEEDBACK_SCORE),
                    recorded_at: now,
                };
                if let Some(memory) = record
                    .skill_id
                    .as_deref()
                    .and_then(|id| self.memories.get_mut(id))
                {
                    memory.proficiency =
                        proficiency_after_feedback(memory.proficiency, record.success);
                    adjusted += 1;
                }
                record
            })
            .collect();

        let recorded = records.len();
        let truncated = self.feedback.extend(records);
        if truncated {
            tracing::debug!(retained = self.feedback.len(), "feedback history truncated");
        }

        Ok(json!({
            "recorded": recorded,
            "skillsAdjusted": adjusted,
            "historySize": self.feedback.len(),
            "truncated": truncated,
        }))
    }

    fn get_skill_inventory(&self) -> EngineResult<Value> {
        let by_type = self.memories.count_by(|m| m.skill_type.clone());
        let skills: Vec<&MotorMemory> = self.memories.iter().collect();
        let recent: Vec<&AccessRecord> = self.access_log.recent(RECENT_ACCESSES).collect();
        let successes = self.feedback.iter().filter(|f| f.success).count();
        let success_rate = if self.feedback.is_empty() {
            EMPTY_HEALTH
        } else {
            successes as f64 / self.feedback.len() as f64
        };

        Ok(json!({
            "totalSkills": self.memories.len(),
            "byType": by_type,
            "averageProficiency": self.memories.average(|m| m.proficiency).unwrap_or(0.0),
            "skills": to_json(&skills)?,
            "recentAccesses": to_json(&recent)?,
            "feedbackCount": self.feedback.len(),
            "feedbackSuccessRate": success_rate,
        }))
    }

    fn integrate_skill(&mut self, payload: &Payload) -> EngineResult<Value> {
        let requested = payload.text_or("skillId", "");
        let Some(memory) = self
            .locate(payload)
            .and_then(|id| self.memories.get(&id))
            .cloned()
        else {
            return Ok(soft_error("Skill not found", "skillId", &requested));
        };

        let target = payload.text_or("targetService", DEFAULT_TARGET_SERVICE);
        let mut integration = SkillIntegration {
            id: self.integrations.next_id(payload.text("integrationId")),
            skill_id: memory.id.clone(),
            target_service: target.clone(),
            compatibility: integration_compatibility(memory.proficiency, self.random.as_mut()),
            status: IntegrationStatus::Pending,
            created_at: Utc::now(),
        };
        integration.resolve();
        let integration = self.integrations.insert(integration).clone();

        let intent = (integration.status == IntegrationStatus::Active).then(|| {
            OutboundIntent::new(
                target,
                "SKILL_INTEGRATION",
                to_payload(json!({
                    "integrationId": integration.id,
                    "skillId": memory.id,
                    "skillName": memory.skill_name,
                    "proficiency": memory.proficiency,
                    "pattern": memory.pattern,
                })),
            )
        });

        Ok(json!({
            "integration": to_json(&integration)?,
            "intent": to_json(&intent)?,
        }))
    }

    fn sync_state(&self) -> EngineResult<Value> {
        let intent = OutboundIntent::new(
            STATE_MANAGEMENT,
            "STATE_SYNC",
            to_payload(json!({
                "service": Self::NAME,
                "skills": self.memories.len(),
                "integrations": self.integrations.len(),
                "averageProficiency": self.memories.average(|m| m.proficiency).unwrap_or(0.0),
                "feedbackHistory": self.feedback.len(),
            })),
        );
        Ok(json!({ "intent": to_json(&intent)? }))
    }
}

impl Domain for TreasuryService {
    type Kind = TreasuryMessage;

    const NAME: &'static str = "treasury";
    const DESCRIPTION: &'static str = "Motor memory repository: skills, proficiency and feedback";

    fn seed(&mut self) {
        for (name, proficiency) in DEFAULT_SKILLS {
            let seeded = self.create_memory(&to_payload(json!({
                "skillName": name,
                "type": DEFAULT_SKILL_TYPE,
                "proficiency": proficiency,
            })));
            tracing::info!("  ✓ Skill {}: {} ({:.2})", seeded.id, name, proficiency);
        }
    }

    fn handle(&mut self, kind: TreasuryMessage, payload: &Payload) -> EngineResult<Value> {
        match kind {
            TreasuryMessage::StoreMotorMemory => self.store_motor_memory(payload),
            TreasuryMessage::RetrieveMotorMemory => self.retrieve_motor_memory(payload),
            TreasuryMessage::UpdateProficiency => self.update_proficiency(payload),
            TreasuryMessage::RecordFeedback => self.record_feedback(payload),
            TreasuryMessage::GetSkillInventory => self.get_skill_inventory(),
            TreasuryMessage::IntegrateSkill => self.integrate_skill(payload),
            TreasuryMessage::SyncState => self.sync_state(),
        }
    }

    fn retire(&mut self) {
        self.integrations
            .iter_mut()
            .filter(|i| i.status == IntegrationStatus::Active)
            .for_each(|i| i.status = IntegrationStatus::Retired);
    }

    fn health_score(&self) -> f64 {
        self.memories
            .average(|m| m.proficiency)
            .unwrap_or(EMPTY_HEALTH)
    }

    fn entity_counts(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("memories".to_string(), self.memories.len()),
            ("integrations".to_string(), self.integrations.len()),
            ("accessLog".to_string(), self.access_log.len()),
            ("feedback".to_string(), self.feedback.len()),
        ])
    }
}
