//! Plan-driven assembly automation: create → ensure components → BOM → workflow → report.
//!
//! [`build_assembly`] takes an [`AssemblyPlan`] (a parent item, its
//! components, an optional change-request workflow) and drives any
//! [`PlmApi`] implementation through it:
//!   - the parent item is created; failure here aborts the run,
//!   - each component is created if missing. A failed create is assumed to
//!     mean "already exists" and comes back as [`BestEffort::Ignored`],
//!   - each component is added as a BOM line under the parent. A failed line
//!     is logged and recorded, and the run moves on to the next component,
//!   - the change-request workflow, if any, is started against the parent.
//!
//! [`assembly_report`] reads an item back with its BOM and where-used list and
//! summarises it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::contract::PlmApi;
use crate::error::{BestEffort, PlmError};
use crate::model::{
    BomLine, BomQuery, Item, NewBomLine, NewItem, NewWorkflow, Properties, PropertyValue, Workflow,
    DEFAULT_ITEM_TYPE,
};

pub const CRITICAL_COMPONENT_PROPERTY: &str = "critical_component";
pub const POSITION_NUMBER_PROPERTY: &str = "position_number";
pub const DEFAULT_COMPONENT_TYPE: &str = "Component";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyPlan {
    pub assembly: PlannedItem,
    #[serde(default)]
    pub components: Vec<PlannedComponent>,
    #[serde(default)]
    pub change_request: Option<ChangeRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedItem {
    pub item_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl PlannedItem {
    fn to_new_item(&self, default_type: &str) -> NewItem {
        let mut item = NewItem::new(&self.item_id)
            .with_type(self.item_type.as_deref().unwrap_or(default_type));
        item.name = self.name.clone();
        item.description = self.description.clone();
        item.properties = self.properties.clone();
        item
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedComponent {
    pub item_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub critical: bool,
    /// Extra BOM line properties.
    #[serde(default)]
    pub properties: Properties,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub process_name: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug)]
pub struct ComponentOutcome {
    pub item_id: String,
    pub creation: BestEffort,
    pub line: Result<BomLine, PlmError>,
}

#[derive(Debug)]
pub struct BuildReport {
    pub assembly: Item,
    pub components: Vec<ComponentOutcome>,
    pub workflow: Option<Result<Workflow, PlmError>>,
}

impl BuildReport {
    pub fn lines_added(&self) -> usize {
        self.components.iter().filter(|c| c.line.is_ok()).count()
    }

    pub fn failed_components(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|c| c.line.is_err())
            .map(|c| c.item_id.as_str())
            .collect()
    }
}

/// Creates `item` unless the server refuses; a refusal is reported, not raised.
pub async fn ensure_item<A>(api: &A, item: NewItem) -> BestEffort
where
    A: PlmApi + ?Sized,
{
    let item_id = item.item_id.clone();
    match api.create_item(item).await {
        Ok(_) => {
            info!(item_id = %item_id, "[BUILD] Created component");
            BestEffort::Completed
        }
        Err(e) => {
            info!(item_id = %item_id, error = %e, "[BUILD] Component exists or could not be created; continuing");
            BestEffort::Ignored(e)
        }
    }
}

fn bom_line_for(component: &PlannedComponent, position: usize) -> NewBomLine {
    let mut line = NewBomLine::new(&component.item_id, component.quantity);
    line.properties = component.properties.clone();
    line.properties.insert(
        CRITICAL_COMPONENT_PROPERTY.to_string(),
        PropertyValue::Text(if component.critical { "True" } else { "False" }.to_string()),
    );
    line.properties.insert(
        POSITION_NUMBER_PROPERTY.to_string(),
        PropertyValue::Text(position.to_string()),
    );
    line
}

pub async fn build_assembly<A>(api: &A, plan: &AssemblyPlan) -> Result<BuildReport, PlmError>
where
    A: PlmApi + ?Sized,
{
    info!(item_id = %plan.assembly.item_id, components = plan.components.len(), "[BUILD] Starting assembly build");

    let assembly = match api
        .create_item(plan.assembly.to_new_item(DEFAULT_ITEM_TYPE))
        .await
    {
        Ok(item) => item,
        Err(e) => {
            error!(item_id = %plan.assembly.item_id, error = %e, "[BUILD][ERROR] Failed to create assembly item");
            return Err(e);
        }
    };
    let parent_id = assembly.item_id.clone();

    let mut components = Vec::with_capacity(plan.components.len());
    for (index, component) in plan.components.iter().enumerate() {
        let mut new_item = NewItem::new(&component.item_id).with_type(
            component
                .item_type
                .as_deref()
                .unwrap_or(DEFAULT_COMPONENT_TYPE),
        );
        new_item.name = component.name.clone();
        let creation = ensure_item(api, new_item).await;

        let line = api
            .add_bom_line(&parent_id, bom_line_for(component, index + 1))
            .await;
        match &line {
            Ok(_) => info!(parent_id = %parent_id, child_id = %component.item_id, "[BUILD] Added component to BOM"),
            Err(e) => error!(parent_id = %parent_id, child_id = %component.item_id, error = %e, "[BUILD][ERROR] Failed to add component"),
        }

        components.push(ComponentOutcome {
            item_id: component.item_id.clone(),
            creation,
            line,
        });
    }
    info!(parent_id = %parent_id, "[BUILD] BOM structure complete");

    let workflow = match &plan.change_request {
        Some(change) => {
            let request = NewWorkflow {
                process_name: change.process_name.clone(),
                targets: vec![parent_id.clone()],
                properties: change.properties.clone(),
            };
            let started = api.start_workflow(request).await;
            if let Err(e) = &started {
                warn!(parent_id = %parent_id, process_name = %change.process_name, error = %e, "[BUILD] Change-request workflow not started");
            }
            Some(started)
        }
        None => None,
    };

    Ok(BuildReport {
        assembly,
        components,
        workflow,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub generated_at: DateTime<Utc>,
    pub item_id: String,
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub total_components: usize,
    pub critical_components: usize,
    pub used_in: Vec<String>,
}

fn is_critical(line: &BomLine) -> bool {
    matches!(
        line.properties.get(CRITICAL_COMPONENT_PROPERTY),
        Some(PropertyValue::Text(v)) if v == "True"
    ) || matches!(
        line.properties.get(CRITICAL_COMPONENT_PROPERTY),
        Some(PropertyValue::Flag(true))
    )
}

pub async fn assembly_report<A>(
    api: &A,
    item_id: &str,
    levels: i32,
) -> Result<AssemblyReport, PlmError>
where
    A: PlmApi + ?Sized,
{
    info!(item_id, levels, "[REPORT] Generating report");
    let item = api.get_item(item_id).await?;
    let bom = api.get_bom_structure(item_id, BomQuery::levels(levels)).await?;
    let parents = api.get_where_used(item_id).await?;

    let report = AssemblyReport {
        generated_at: Utc::now(),
        item_id: item.item_id.clone(),
        name: item.name.clone(),
        item_type: item.item_type.clone(),
        total_components: bom.lines.len(),
        critical_components: bom.lines.iter().filter(|l| is_critical(l)).count(),
        used_in: parents.into_iter().map(|p| p.item_id).collect(),
    };
    info!(
        item_id,
        components = report.total_components,
        critical = report.critical_components,
        used_in = report.used_in.len(),
        "[REPORT] Report generated"
    );
    Ok(report)
}
