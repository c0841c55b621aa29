use super::PresetError;
use crate::config::{PatchConfig, RunParams};
use crate::executor::Pipeline;
use crate::inventory::Inventory;
use crate::rules::InventoryRule;

pub(super) fn pipeline(config: &PatchConfig, params: &RunParams) -> Result<Pipeline, PresetError> {
    let inventory = Inventory::scan(
        &params.site_root,
        &config.inventory.uploads_dir,
        &config.inventory.extensions,
    )?;
    Ok(Pipeline::new().with(InventoryRule::new("validate-images", inventory)?))
}
