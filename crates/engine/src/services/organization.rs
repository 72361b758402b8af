use crate::constants::{EMPTY_HEALTH, RECENT_ACTIVITY};
use crate::policy::{
    MaintenancePolicy, coordination_sync_score, default_maintenance, optimization_recommendations,
    optimized_efficiency,
};
use crate::service::{Domain, soft_error, to_json};
use crate::{EngineError, EngineResult, RandomSource};
use chrono::{DateTime, Utc};
use neuromesh_macros::{MessageKind, standard, standard_enum};
use neuromesh_store::{Entity, EntityStore};
use neuromesh_types::{OutboundIntent, Payload, PayloadExt, Value, to_payload};
use serde_json::json;
use std::collections::BTreeMap;

/// Messages handled by the organization service
#[derive(Debug, Clone, Copy, PartialEq, Eq, MessageKind)]
pub enum OrganizationMessage {
    OptimizeOrganization,
    CreateCoordination,
    Coordinate,
    ScheduleMaintenance,
    ExecuteMaintenance,
    GetOrganizationStatus,
}

#[standard_enum]
pub enum OrganizationStatus {
    Active,
    Optimizing,
    Inactive,
}

#[standard]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub efficiency: f64,
    pub status: OrganizationStatus,
    pub optimization_count: u32,
    pub last_optimized: Option<DateTime<Utc>>,
}

impl Entity for Organization {
    fn id(&self) -> &str {
        &self.id
    }
}

#[standard_enum]
pub enum CoordinationStatus {
    Active,
    Inactive,
}

#[standard]
pub struct Coordination {
    pub id: String,
    pub name: String,
    pub participants: Vec<String>,
    pub sync_score: f64,
    pub status: CoordinationStatus,
    pub rounds: u32,
    pub last_synced: Option<DateTime<Utc>>,
}

impl Entity for Coordination {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Maintenance lifecycle: `scheduled -> in-progress -> {completed, failed}`
#[standard_enum]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

impl MaintenanceStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[standard]
pub struct MaintenanceTask {
    pub id: String,
    pub kind: String,
    pub targets: Vec<String>,
    pub status: MaintenanceStatus,
    pub issues_found: u32,
    pub issues_resolved: u32,
    pub success: Option<bool>,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entity for MaintenanceTask {
    fn id(&self) -> &str {
        &self.id
    }
}

const DEFAULT_ORGANIZATION: &str = "autonomic-core";
const DEFAULT_EFFICIENCY: f64 = 0.75;
const DEFAULT_COORDINATION: &str = "system-health";
const DEFAULT_PARTICIPANTS: [&str; 3] = ["treasury", "development", "market"];
const DEFAULT_COORDINATION_NAME: &str = "unnamed-coordination";
const DEFAULT_MAINTENANCE_KIND: &str = "routine";
const INITIAL_SYNC_SCORE: f64 = 0.5;

/// Autonomic organization: structure optimization, coordination and maintenance
pub struct OrganizationService {
    organizations: EntityStore<Organization>,
    coordinations: EntityStore<Coordination>,
    tasks: EntityStore<MaintenanceTask>,
    maintenance_policy: MaintenancePolicy,
    random: Box<dyn RandomSource>,
}

impl OrganizationService {
    pub fn new(random: Box<dyn RandomSource>) -> Self {
        Self {
            organizations: EntityStore::new("org"),
            coordinations: EntityStore::new("coordination"),
            tasks: EntityStore::new("maintenance"),
            maintenance_policy: default_maintenance,
            random,
        }
    }

    /// Replace the maintenance outcome policy
    #[must_use]
    pub fn with_maintenance_policy(mut self, policy: MaintenancePolicy) -> Self {
        self.maintenance_policy = policy;
        self
    }

    pub fn organizations(&self) -> &EntityStore<Organization> {
        &self.organizations
    }

    pub fn coordinations(&self) -> &EntityStore<Coordination> {
        &self.coordinations
    }

    pub fn tasks(&self) -> &EntityStore<MaintenanceTask> {
        &self.tasks
    }

    fn optimize_organization(&mut self, payload: &Payload) -> EngineResult<Value> {
        let requested = payload.text("organizationId");
        let name = payload.text_or("name", DEFAULT_ORGANIZATION);
        let found = match &requested {
            Some(id) => self.organizations.get_mut(id),
            None => self.organizations.find_mut(|o| o.name == name),
        };
        let Some(organization) = found else {
            let id = requested.unwrap_or(name);
            return Ok(soft_error("Organization not found", "organizationId", &id));
        };

        organization.status = OrganizationStatus::Optimizing;
        let previous = organization.efficiency;
        organization.efficiency = optimized_efficiency(previous, self.random.as_mut());
        organization.optimization_count += 1;
        organization.last_optimized = Some(Utc::now());
        organization.status = OrganizationStatus::Active;

        tracing::debug!(
            organization = %organization.name,
            efficiency = organization.efficiency,
            "organization optimized"
        );

        Ok(json!({
            "organization": to_json(&*organization)?,
            "improvement": organization.efficiency - previous,
            "recommendations": optimization_recommendations(organization.efficiency),
        }))
    }

    fn insert_coordination(&mut self, payload: &Payload) -> Coordination {
        let coordination = Coordination {
            id: self.coordinations.next_id(payload.text("id")),
            name: payload.text_or("name", DEFAULT_COORDINATION_NAME),
            participants: payload.text_list("participants"),
            sync_score: INITIAL_SYNC_SCORE,
            status: CoordinationStatus::Active,
            rounds: 0,
            last_synced: None,
        };
        self.coordinations.insert(coordination).clone()
    }

    fn create_coordination(&mut self, payload: &Payload) -> EngineResult<Value> {
        let coordination = self.insert_coordination(payload);
        Ok(json!({ "created": true, "coordination": to_json(&coordination)? }))
    }

    fn coordinate(&mut self, payload: &Payload) -> EngineResult<Value> {
        let requested = payload.text("coordinationId");
        let found = match (&requested, payload.text("name")) {
            (Some(id), _) => self.coordinations.get_mut(id),
            (None, Some(name)) => self.coordinations.find_mut(|c| c.name == name),
            (None, None) => None,
        };
        let Some(coordination) = found else {
            let id = requested.unwrap_or_default();
            return Ok(soft_error("Coordination not found", "coordinationId", &id));
        };

        coordination.sync_score =
            coordination_sync_score(coordination.sync_score, coordination.participants.len());
        coordination.rounds += 1;
        coordination.last_synced = Some(Utc::now());

        let intents: Vec<OutboundIntent> = coordination
            .participants
            .iter()
            .map(|participant| {
                OutboundIntent::new(
                    participant.clone(),
                    "COORDINATION_SYNC",
                    to_payload(json!({
                        "coordinationId": coordination.id,
                        "name": coordination.name,
                        "round": coordination.rounds,
                        "syncScore": coordination.sync_score,
                    })),
                )
            })
            .collect();

        Ok(json!({
            "coordination": to_json(&*coordination)?,
            "intents": to_json(&intents)?,
        }))
    }

    fn schedule_maintenance(&mut self, payload: &Payload) -> EngineResult<Value> {
        let task = MaintenanceTask {
            id: self.tasks.next_id(payload.text("id")),
            kind: payload.text_or("kind", DEFAULT_MAINTENANCE_KIND),
            targets: payload.text_list("targets"),
            status: MaintenanceStatus::Scheduled,
            issues_found: 0,
            issues_resolved: 0,
            success: None,
            scheduled_at: Utc::now(),
            completed_at: None,
        };
        let task = self.tasks.insert(task);
        Ok(json!({ "scheduled": true, "task": to_json(task)? }))
    }

    fn execute_maintenance(&mut self, payload: &Payload) -> EngineResult<Value> {
        let task_id = payload.text_or("taskId", "");
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return Ok(soft_error("Maintenance task not found", "taskId", &task_id));
        };

        if task.status.is_terminal() {
            let mut body = soft_error("Maintenance task already executed", "taskId", &task_id);
            if let Value::Object(map) = &mut body {
                map.insert("status".to_string(), json!(task.status));
            }
            return Ok(body);
        }

        let outcome = (self.maintenance_policy)(&task.targets, self.random.as_mut());
        if outcome.issues_resolved > outcome.issues_found {
            return Err(EngineError::fault(
                "EXECUTE_MAINTENANCE",
                format!(
                    "policy resolved {} of {} issues",
                    outcome.issues_resolved, outcome.issues_found
                ),
            ));
        }

        task.status = MaintenanceStatus::InProgress;
        task.issues_found = outcome.issues_found;
        task.issues_resolved = outcome.issues_resolved;
        task.success = Some(outcome.success);
        task.status = if outcome.success {
            MaintenanceStatus::Completed
        } else {
            MaintenanceStatus::Failed
        };
        task.completed_at = Some(Utc::now());

        tracing::debug!(
            task = %task.id,
            found = task.issues_found,
            resolved = task.issues_resolved,
            "maintenance executed"
        );

        Ok(json!({
            "task": to_json(&*task)?,
            "issuesFound": outcome.issues_found,
            "issuesResolved": outcome.issues_resolved,
            "success": outcome.success,
        }))
    }

    fn get_organization_status(&self) -> EngineResult<Value> {
        Ok(json!({
            "organizations": self.organizations.len(),
            "coordinations": self.coordinations.len(),
            "averageEfficiency": self.organizations.average(|o| o.efficiency).unwrap_or(0.0),
            "health": self.health_score(),
            "organizationsByStatus": self.organizations.count_by(|o| o.status),
            "maintenanceByStatus": self.tasks.count_by(|t| t.status),
            "recentMaintenance": to_json(&self.tasks.recent(RECENT_ACTIVITY))?,
        }))
    }
}

impl Domain for OrganizationService {
    type Kind = OrganizationMessage;

    const NAME: &'static str = "organization";
    const DESCRIPTION: &'static str = "Autonomic organization: optimization, coordination, maintenance";

    fn seed(&mut self) {
        let organization = Organization {
            id: self.organizations.next_id(None),
            name: DEFAULT_ORGANIZATION.to_string(),
            efficiency: DEFAULT_EFFICIENCY,
            status: OrganizationStatus::Active,
            optimization_count: 0,
            last_optimized: None,
        };
        let organization = self.organizations.insert(organization);
        tracing::info!("  ✓ Organization {}: {}", organization.id, organization.name);

        let coordination = self.insert_coordination(&to_payload(json!({
            "name": DEFAULT_COORDINATION,
            "participants": DEFAULT_PARTICIPANTS,
        })));
        tracing::info!("  ✓ Coordination {}: {}", coordination.id, coordination.name);
    }

    fn handle(&mut self, kind: OrganizationMessage, payload: &Payload) -> EngineResult<Value> {
        match kind {
            OrganizationMessage::OptimizeOrganization => self.optimize_organization(payload),
            OrganizationMessage::CreateCoordination => self.create_coordination(payload),
            OrganizationMessage::Coordinate => self.coordinate(payload),
            OrganizationMessage::ScheduleMaintenance => self.schedule_maintenance(payload),
            OrganizationMessage::ExecuteMaintenance => self.execute_maintenance(payload),
            OrganizationMessage::GetOrganizationStatus => self.get_organization_status(),
        }
    }

    fn retire(&mut self) {
        self.organizations
            .iter_mut()
            .for_each(|o| o.status = OrganizationStatus::Inactive);
        self.coordinations
            .iter_mut()
            .for_each(|c| c.status = CoordinationStatus::Inactive);
    }

    fn health_score(&self) -> f64 {
        self.organizations
            .average(|o| o.efficiency)
            .unwrap_or(EMPTY_HEALTH)
    }

    fn entity_counts(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("organizations".to_string(), self.organizations.len()),
            ("coordinations".to_string(), self.coordinations.len()),
            ("maintenanceTasks".to_string(), self.tasks.len()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedSource;
    use crate::policy::MaintenanceOutcome;

    fn broken_policy(_: &[String], _: &mut dyn RandomSource) -> MaintenanceOutcome {
        MaintenanceOutcome {
            issues_found: 1,
            issues_resolved: 3,
            success: true,
        }
    }

    fn schedule(service: &mut OrganizationService) -> String {
        let result = service
            .handle(
                OrganizationMessage::ScheduleMaintenance,
                &to_payload(json!({"targets": ["a", "b"]})),
            )
            .unwrap();
        result["task"]["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_optimize_returns_to_active() {
        let mut service = OrganizationService::new(Box::new(ScriptedSource::constant(0.5)));
        service.seed();

        let result = service
            .handle(OrganizationMessage::OptimizeOrganization, &Payload::new())
            .unwrap();
        assert_eq!(result["organization"]["status"], "active");
        // gain = 0.01 + 0.5 * 0.04
        assert!((result["improvement"].as_f64().unwrap() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_policy_violation_is_a_fault() {
        let mut service = OrganizationService::new(Box::new(ScriptedSource::default()))
            .with_maintenance_policy(broken_policy);
        let task_id = schedule(&mut service);

        let err = service
            .handle(
                OrganizationMessage::ExecuteMaintenance,
                &to_payload(json!({"taskId": task_id})),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::HandlerFault { .. }));
        assert_eq!(
            service.tasks().get(&task_id).unwrap().status,
            MaintenanceStatus::Scheduled
        );
    }

    #[test]
    fn test_terminal_task_never_reopens() {
        let mut service = OrganizationService::new(Box::new(ScriptedSource::default()));
        let task_id = schedule(&mut service);
        let execute = to_payload(json!({"taskId": task_id}));

        let first = service
            .handle(OrganizationMessage::ExecuteMaintenance, &execute)
            .unwrap();
        // Exhausted script: zero issues found, resolved trivially
        assert_eq!(first["task"]["status"], "completed");

        let second = service
            .handle(OrganizationMessage::ExecuteMaintenance, &execute)
            .unwrap();
        assert_eq!(second["error"], "Maintenance task already executed");
        assert_eq!(second["status"], "completed");
    }

    #[test]
    fn test_coordinate_emits_intent_per_participant() {
        let mut service = OrganizationService::new(Box::new(ScriptedSource::default()));
        service.seed();

        let result = service
            .handle(
                OrganizationMessage::Coordinate,
                &to_payload(json!({"name": "system-health"})),
            )
            .unwrap();
        let destinations: Vec<_> = result["intents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["destination"].as_str().unwrap())
            .collect();
        assert_eq!(destinations, vec!["treasury", "development", "market"]);
        assert!((result["coordination"]["syncScore"].as_f64().unwrap() - 0.55).abs() < 1e-9);

        let missing = service
            .handle(OrganizationMessage::Coordinate, &Payload::new())
            .unwrap();
        assert_eq!(missing["error"], "Coordination not found");
    }
}
