/// `load_config` module: reads a static YAML assembly plan into
/// [`AssemblyPlan`].
///
/// The plan holds no secrets. Server address and credentials come from the
/// environment (see `plm_bridge_core::config`), never from this file.
///
/// ```yaml
/// assembly:
///   item_id: LOADER-ST14
///   name: Battery Loader ST14
///   type: Assembly
///   properties:
///     operating_weight_kg: 38000
/// components:
///   - item_id: BATTERY-650V
///     name: Battery Pack
///     critical: true
///   - item_id: BUCKET-7T
///     quantity: 1
/// change_request:
///   process_name: ECN_Process
/// ```
use anyhow::Result;
use plm_bridge_core::assembly::AssemblyPlan;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<AssemblyPlan> {
    let path_ref = path.as_ref();
    info!(plan_path = ?path_ref, "Loading assembly plan from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, plan_path = ?path_ref, "Failed to read plan file");
            return Err(anyhow::anyhow!(
                "Failed to read plan file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let plan: AssemblyPlan = match serde_yaml::from_str(&content) {
        Ok(plan) => plan,
        Err(e) => {
            error!(error = ?e, plan_path = ?path_ref, "Failed to parse plan YAML");
            return Err(anyhow::anyhow!("Failed to parse plan YAML: {e}"));
        }
    };

    info!(
        plan_path = ?path_ref,
        item_id = %plan.assembly.item_id,
        components = plan.components.len(),
        "Parsed assembly plan"
    );
    Ok(plan)
}
