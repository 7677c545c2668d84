//! Building catalog - static definitions for every placeable building

use serde::{Deserialize, Serialize};

use crate::components::{BuildingData, BuildingType, ProductionType};
use crate::error::ConfigError;

static BUILTIN_CATALOG: &str = include_str!("../../../../data/building_catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingCatalog {
    definitions: Vec<BuildingData>,
}

impl BuildingCatalog {
    /// The catalog shipped in `data/building_catalog.json`
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let catalog: BuildingCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, data) in self.definitions.iter().enumerate() {
            if self.definitions[..i]
                .iter()
                .any(|d| d.building_type == data.building_type)
            {
                return Err(ConfigError::Invalid("duplicate building type in catalog"));
            }
            if data.max_workers > 0 && data.job_type.is_none() {
                return Err(ConfigError::Invalid("building with workers has no job type"));
            }
            match data.production_type {
                ProductionType::Gathering if data.produced_resource.is_none() => {
                    return Err(ConfigError::Invalid("gathering building has no resource"));
                }
                ProductionType::Crafting if data.recipe.is_none() => {
                    return Err(ConfigError::Invalid("crafting building has no recipe"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn get(&self, building_type: BuildingType) -> Option<&BuildingData> {
        self.definitions
            .iter()
            .find(|d| d.building_type == building_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingData> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{JobType, ResourceKind};

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = BuildingCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 8);

        let smithy = catalog.get(BuildingType::Smithy).unwrap();
        assert_eq!(smithy.production_type, ProductionType::Crafting);
        assert_eq!(smithy.job_type, Some(JobType::Blacksmith));
        assert_eq!(
            smithy.recipe.as_ref().unwrap().output.resource,
            ResourceKind::Tools
        );

        let fishery = catalog.get(BuildingType::Fishery).unwrap();
        assert_eq!(fishery.produced_resource, Some(ResourceKind::Fish));
    }

    #[test]
    fn test_rejects_crafting_without_recipe() {
        let json = r#"[{
            "name": "Broken",
            "building_type": "Smithy",
            "construction_cost": [],
            "construction_time": 1.0,
            "job_type": "Blacksmith",
            "max_workers": 1,
            "production_type": "Crafting",
            "produced_resource": null,
            "production_amount": 0.0,
            "base_rate": 0.0,
            "recipe": null
        }]"#;
        assert!(matches!(
            BuildingCatalog::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            BuildingCatalog::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
