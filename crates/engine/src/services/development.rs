use crate::EngineResult;
use crate::constants::{EMPTY_HEALTH, RECENT_ACTIVITY};
use crate::policy::{QualityScores, Recommendation, improvement_recommendations};
use crate::service::{Domain, soft_error, to_json};
use chrono::{DateTime, Utc};
use neuromesh_macros::{MessageKind, standard, standard_enum};
use neuromesh_store::{Entity, EntityStore};
use neuromesh_types::{Payload, PayloadExt, Value, to_payload};
use serde_json::json;
use std::collections::BTreeMap;

/// Messages handled by the development service
#[derive(Debug, Clone, Copy, PartialEq, Eq, MessageKind)]
pub enum DevelopmentMessage {
    CreatePlan,
    UpdateProgress,
    GetPlan,
    AssessQuality,
    RecommendImprovements,
    GetDevelopmentStatus,
}

/// Plan lifecycle: `planning -> active -> completed`
#[standard_enum]
pub enum PlanStatus {
    Planning,
    Active,
    Completed,
}

#[standard]
pub struct Stage {
    pub name: String,
    /// Percent complete, `0..=100`
    pub progress: f64,
}

impl Stage {
    fn is_complete(&self) -> bool {
        self.progress >= MAX_PROGRESS
    }
}

#[standard]
pub struct DevelopmentPlan {
    pub id: String,
    pub name: String,
    pub goal: String,
    pub stages: Vec<Stage>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DevelopmentPlan {
    /// Mean stage progress in percent
    pub fn progress(&self) -> f64 {
        if self.stages.is_empty() {
            return 0.0;
        }
        self.stages.iter().map(|s| s.progress).sum::<f64>() / self.stages.len() as f64
    }

    /// Stage by name, or by zero-based index
    fn stage_mut(&mut self, stage: &str) -> Option<&mut Stage> {
        if let Some(position) = self.stages.iter().position(|s| s.name == stage) {
            return self.stages.get_mut(position);
        }
        let index: usize = stage.parse().ok()?;
        self.stages.get_mut(index)
    }

    fn advance(&mut self) {
        if self.status == PlanStatus::Planning {
            self.status = PlanStatus::Active;
        }
        if self.status == PlanStatus::Active && self.stages.iter().all(Stage::is_complete) {
            self.status = PlanStatus::Completed;
            self.completed_at = Some(Utc::now());
        }
    }
}

impl Entity for DevelopmentPlan {
    fn id(&self) -> &str {
        &self.id
    }
}

#[standard]
pub struct QualityAssessment {
    pub id: String,
    pub subject: String,
    pub scores: QualityScores,
    pub overall: f64,
    pub assessed_at: DateTime<Utc>,
}

impl Entity for QualityAssessment {
    fn id(&self) -> &str {
        &self.id
    }
}

const MAX_PROGRESS: f64 = 100.0;
const DEFAULT_PLAN_NAME: &str = "development-plan";
const DEFAULT_SUBJECT: &str = "system";
const DEFAULT_STAGES: [&str; 4] = ["analysis", "design", "implementation", "validation"];
const SEED_PLAN: &str = "core-capabilities";
const SEED_GOAL: &str = "Establish baseline autonomic capabilities";

/// Capability development: staged plans and quality assessment
pub struct DevelopmentService {
    plans: EntityStore<DevelopmentPlan>,
    assessments: EntityStore<QualityAssessment>,
}

impl DevelopmentService {
    pub fn new() -> Self {
        Self {
            plans: EntityStore::new("plan"),
            assessments: EntityStore::new("assessment"),
        }
    }

    pub fn plans(&self) -> &EntityStore<DevelopmentPlan> {
        &self.plans
    }

    fn insert_plan(&mut self, payload: &Payload) -> &DevelopmentPlan {
        let mut names = payload.text_list("stages");
        if names.is_empty() {
            names = DEFAULT_STAGES.iter().map(|s| s.to_string()).collect();
        }
        let plan = DevelopmentPlan {
            id: self.plans.next_id(payload.text("id")),
            name: payload.text_or("name", DEFAULT_PLAN_NAME),
            goal: payload.text_or("goal", ""),
            stages: names
                .into_iter()
                .map(|name| Stage {
                    name,
                    progress: 0.0,
                })
                .collect(),
            status: PlanStatus::Planning,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.plans.insert(plan)
    }

    fn create_plan(&mut self, payload: &Payload) -> EngineResult<Value> {
        let plan = self.insert_plan(payload);
        Ok(json!({ "created": true, "plan": to_json(plan)? }))
    }

    fn update_progress(&mut self, payload: &Payload) -> EngineResult<Value> {
        let plan_id = payload.text_or("planId", "");
        let Some(plan) = self.plans.get_mut(&plan_id) else {
            return Ok(soft_error("Development plan not found", "planId", &plan_id));
        };
        if plan.status == PlanStatus::Completed {
            let mut body = soft_error("Development plan already completed", "planId", &plan_id);
            if let Value::Object(map) = &mut body {
                map.insert("status".to_string(), json!(plan.status));
            }
            return Ok(body);
        }

        let stage_name = payload.text_or("stage", "");
        let progress = payload
            .number_or("progress", 0.0)
            .clamp(0.0, MAX_PROGRESS);
        let Some(stage) = plan.stage_mut(&stage_name) else {
            return Ok(soft_error("Stage not found", "stage", &stage_name));
        };
        stage.progress = progress;
        plan.advance();

        Ok(json!({
            "updated": true,
            "overallProgress": plan.progress(),
            "plan": to_json(&*plan)?,
        }))
    }

    fn get_plan(&self, payload: &Payload) -> EngineResult<Value> {
        let plan_id = payload.text_or("planId", "");
        let Some(plan) = self.plans.get(&plan_id) else {
            return Ok(soft_error("Development plan not found", "planId", &plan_id));
        };
        Ok(json!({
            "plan": to_json(plan)?,
            "overallProgress": plan.progress(),
        }))
    }

    fn assess_quality(&mut self, payload: &Payload) -> EngineResult<Value> {
        let scores = QualityScores::from_payload(&payload.object_or_empty("scores"));
        let assessment = QualityAssessment {
            id: self.assessments.next_id(payload.text("id")),
            subject: payload.text_or("subject", DEFAULT_SUBJECT),
            overall: scores.overall(),
            scores,
            assessed_at: Utc::now(),
        };
        let assessment = self.assessments.insert(assessment);
        Ok(json!({ "assessment": to_json(assessment)? }))
    }

    fn recommend_improvements(&self, payload: &Payload) -> EngineResult<Value> {
        let assessment_id = payload.text_or("assessmentId", "");
        let Some(assessment) = self.assessments.get(&assessment_id) else {
            return Ok(soft_error(
                "Quality assessment not found",
                "assessmentId",
                &assessment_id,
            ));
        };
        let recommendations: Vec<Recommendation> = improvement_recommendations(&assessment.scores);
        Ok(json!({
            "assessmentId": assessment.id,
            "overall": assessment.overall,
            "recommendations": to_json(&recommendations)?,
        }))
    }

    fn get_development_status(&self) -> EngineResult<Value> {
        Ok(json!({
            "plans": self.plans.len(),
            "plansByStatus": self.plans.count_by(|p| p.status),
            "averageProgress": self.plans.average(DevelopmentPlan::progress).unwrap_or(0.0),
            "assessments": self.assessments.len(),
            "averageQuality": self.health_score(),
            "recentAssessments": to_json(&self.assessments.recent(RECENT_ACTIVITY))?,
        }))
    }
}

impl Default for DevelopmentService {
    fn default() -> Self {
        Self::new()
    }
}

impl Domain for DevelopmentService {
    type Kind = DevelopmentMessage;

    const NAME: &'static str = "development";
    const DESCRIPTION: &'static str = "Capability development plans and quality assessment";

    fn seed(&mut self) {
        let plan = self.insert_plan(&to_payload(json!({
            "name": SEED_PLAN,
            "goal": SEED_GOAL,
        })));
        tracing::info!("  ✓ Plan {}: {}", plan.id, plan.name);
    }

    fn handle(&mut self, kind: DevelopmentMessage, payload: &Payload) -> EngineResult<Value> {
        match kind {
            DevelopmentMessage::CreatePlan => self.create_plan(payload),
            DevelopmentMessage::UpdateProgress => self.update_progress(payload),
            DevelopmentMessage::GetPlan => self.get_plan(payload),
            DevelopmentMessage::AssessQuality => self.assess_quality(payload),
            DevelopmentMessage::RecommendImprovements => self.recommend_improvements(payload),
            DevelopmentMessage::GetDevelopmentStatus => self.get_development_status(),
        }
    }

    // Plans keep their status at shutdown
    fn retire(&mut self) {}

    fn health_score(&self) -> f64 {
        self.assessments
            .average(|a| a.overall)
            .unwrap_or(EMPTY_HEALTH)
    }

    fn entity_counts(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("plans".to_string(), self.plans.len()),
            ("assessments".to_string(), self.assessments.len()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> DevelopmentService {
        DevelopmentService::new()
    }

    #[test]
    fn test_plan_state_machine() {
        let mut service = service();
        let created = service
            .handle(
                DevelopmentMessage::CreatePlan,
                &to_payload(json!({"id": "p1", "stages": ["build", "ship"]})),
            )
            .unwrap();
        assert_eq!(created["plan"]["status"], "planning");

        let update = |stage: &str, progress: f64| {
            to_payload(json!({"planId": "p1", "stage": stage, "progress": progress}))
        };

        let result = service
            .handle(DevelopmentMessage::UpdateProgress, &update("build", 250.0))
            .unwrap();
        assert_eq!(result["plan"]["status"], "active");
        assert_eq!(result["plan"]["stages"][0]["progress"], 100.0);
        assert_eq!(result["overallProgress"], 50.0);

        let missing = service
            .handle(DevelopmentMessage::UpdateProgress, &update("deploy", 10.0))
            .unwrap();
        assert_eq!(missing["error"], "Stage not found");

        let result = service
            .handle(DevelopmentMessage::UpdateProgress, &update("1", 100.0))
            .unwrap();
        assert_eq!(result["plan"]["status"], "completed");
        assert!(!result["plan"]["completedAt"].is_null());
    }

    #[test]
    fn test_completed_plan_rejects_progress_updates() {
        let mut service = service();
        service
            .handle(
                DevelopmentMessage::CreatePlan,
                &to_payload(json!({"id": "p1", "stages": ["a"]})),
            )
            .unwrap();
        let update = |progress: f64| {
            to_payload(json!({"planId": "p1", "stage": "a", "progress": progress}))
        };

        let done = service
            .handle(DevelopmentMessage::UpdateProgress, &update(100.0))
            .unwrap();
        assert_eq!(done["plan"]["status"], "completed");

        let rejected = service
            .handle(DevelopmentMessage::UpdateProgress, &update(10.0))
            .unwrap();
        assert_eq!(rejected["error"], "Development plan already completed");
        assert_eq!(rejected["planId"], "p1");
        assert_eq!(rejected["status"], "completed");

        let plan = service.plans().get("p1").unwrap();
        assert_eq!(plan.status, PlanStatus::Completed);
        assert_eq!(plan.progress(), 100.0);
    }

    #[test]
    fn test_quality_and_recommendations() {
        let mut service = service();
        assert_eq!(service.health_score(), 1.0);

        let assessed = service
            .handle(
                DevelopmentMessage::AssessQuality,
                &to_payload(json!({"scores": {"accuracy": 0.9, "efficiency": 0.3}})),
            )
            .unwrap();
        let id = assessed["assessment"]["id"].as_str().unwrap().to_string();

        let result = service
            .handle(
                DevelopmentMessage::RecommendImprovements,
                &to_payload(json!({"assessmentId": id})),
            )
            .unwrap();
        let recommendations = result["recommendations"].as_array().unwrap();
        assert_eq!(recommendations[0]["dimension"], "efficiency");
        assert_eq!(recommendations.len(), 4);
    }
}
