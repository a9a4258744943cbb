//! Timed scenario replay against a live registry.
//!
//! A scenario is a TOML file of `[[step]]` entries, each fired `at_ms`
//! milliseconds after the run starts. Items are referred to by label.

use crate::config::ContainerConfig;
use crate::error::OverlayError;
use crate::item::{ItemSpec, Presence};
use crate::registry::Registry;
use crate::scheduler::Snapshot;
use crate::types::ItemId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOp {
    Show,
    Dismiss,
    DismissAll,
    DismissShowing,
    DismissTopmost,
    SetCapacity,
    /// Producer flips the item's presence cell to `false`
    Release,
    Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at_ms: u64,
    pub op: StepOp,
    #[serde(default)]
    pub container: Option<String>,
    /// Targets for the bulk dismiss ops; defaults to `container`
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_animated")]
    pub animated: bool,
    #[serde(default)]
    pub capacity: Option<usize>,
}

fn default_animated() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Containers registered on top of the loaded configuration
    #[serde(default)]
    pub containers: HashMap<String, ContainerConfig>,
    /// Extra time to let pending promotions and shaping windows finish
    #[serde(default)]
    pub settle_ms: u64,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self, OverlayError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, OverlayError> {
        let scenario: Scenario = toml::from_str(content)?;
        for (index, step) in scenario.steps.iter().enumerate() {
            step.validate()
                .map_err(|e| OverlayError::ScenarioError(format!("step {}: {}", index + 1, e)))?;
        }
        Ok(scenario)
    }
}

impl Step {
    fn validate(&self) -> Result<(), String> {
        let needs_label = matches!(self.op, StepOp::Show | StepOp::Dismiss | StepOp::Release);
        if needs_label && self.label.is_none() {
            return Err(format!("{:?} requires a label", self.op));
        }
        if self.op == StepOp::SetCapacity && self.capacity.is_none() {
            return Err("SetCapacity requires a capacity".to_string());
        }
        // label-addressed ops fall back to the container the item was shown in
        let label_addressed = matches!(self.op, StepOp::Dismiss | StepOp::Release);
        if self.targets().is_empty() && !label_addressed {
            return Err("step has no target container".to_string());
        }
        Ok(())
    }

    fn targets(&self) -> Vec<String> {
        if !self.containers.is_empty() {
            return self.containers.clone();
        }
        self.container.iter().cloned().collect()
    }

    fn target(&self) -> Result<&str, OverlayError> {
        self.container
            .as_deref()
            .or_else(|| self.containers.first().map(String::as_str))
            .ok_or_else(|| OverlayError::ScenarioError("step has no target container".to_string()))
    }
}

struct Shown {
    id: ItemId,
    container: String,
    presence: Presence,
}

/// Result of a scenario run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    /// Final snapshot per container, sorted by name
    pub containers: Vec<(String, Snapshot)>,
    /// Snapshots captured by `query` steps, in step order
    pub queries: Vec<(u64, String, Snapshot)>,
    /// Item id to scenario label
    pub labels: HashMap<ItemId, String>,
}

impl ScenarioReport {
    pub fn label_for(&self, id: ItemId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Register the scenario's containers and replay its steps in time order.
pub async fn run_scenario(
    registry: &Registry,
    scenario: &Scenario,
) -> Result<ScenarioReport, OverlayError> {
    let mut names: Vec<&String> = scenario.containers.keys().collect();
    names.sort();
    for name in names {
        registry.register(name, scenario.containers[name].clone());
    }

    let mut steps: Vec<&Step> = scenario.steps.iter().collect();
    steps.sort_by_key(|step| step.at_ms);

    let mut shown: HashMap<String, Shown> = HashMap::new();
    let mut report = ScenarioReport::default();
    let start = Instant::now();

    for step in steps {
        sleep_until(start + Duration::from_millis(step.at_ms)).await;
        debug!(at_ms = step.at_ms, op = ?step.op, "Replaying step");
        apply_step(registry, step, &mut shown, &mut report).await?;
    }

    if scenario.settle_ms > 0 {
        tokio::time::sleep(Duration::from_millis(scenario.settle_ms)).await;
    }

    for name in registry.names() {
        if let Some(handle) = registry.channel(&name) {
            let snapshot = handle.query().await.unwrap_or_else(|| handle.snapshot());
            report.containers.push((name, snapshot));
        }
    }
    info!(
        steps = scenario.steps.len(),
        containers = report.containers.len(),
        "Scenario finished"
    );
    Ok(report)
}

async fn apply_step(
    registry: &Registry,
    step: &Step,
    shown: &mut HashMap<String, Shown>,
    report: &mut ScenarioReport,
) -> Result<(), OverlayError> {
    match step.op {
        StepOp::Show => {
            let label = step.label.clone().unwrap_or_default();
            let container = step.target()?.to_string();
            let presence = Presence::new();
            let spec = ItemSpec::new(json!({ "label": label })).with_presence(presence.clone());
            if let Some(id) = registry.show(spec, &container, step.animated) {
                report.labels.insert(id, label.clone());
                shown.insert(
                    label,
                    Shown {
                        id,
                        container,
                        presence,
                    },
                );
            }
        }
        StepOp::Dismiss => {
            let entry = lookup(shown, step)?;
            let container = step.container.as_deref().unwrap_or(&entry.container);
            registry.dismiss(entry.id, container, step.animated);
        }
        StepOp::Release => {
            lookup(shown, step)?.presence.set(false);
        }
        StepOp::DismissAll => registry.dismiss_all(&step.targets(), step.animated),
        StepOp::DismissShowing => registry.dismiss_showing(&step.targets(), step.animated),
        StepOp::DismissTopmost => registry.dismiss_topmost(&step.targets(), step.animated),
        StepOp::SetCapacity => {
            let capacity = step.capacity.unwrap_or_default();
            for name in step.targets() {
                registry.set_capacity(&name, capacity);
            }
        }
        StepOp::Query => {
            for name in step.targets() {
                if let Some(handle) = registry.channel(&name) {
                    if let Some(snapshot) = handle.query().await {
                        report.queries.push((step.at_ms, name, snapshot));
                    }
                }
            }
        }
    }
    Ok(())
}

fn lookup<'a>(shown: &'a HashMap<String, Shown>, step: &Step) -> Result<&'a Shown, OverlayError> {
    let label = step.label.as_deref().unwrap_or_default();
    shown
        .get(label)
        .ok_or_else(|| OverlayError::UnknownLabel(label.to_string()))
}
