//! Producer and click-upgrade catalogs.
//!
//! Loaded once at startup (built-in defaults or a JSON file) and shared
//! read-only through an `Arc` for the lifetime of the process.

use std::{collections::HashSet, fs::read_to_string, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{ClickUpgradeDefinition, ProducerDefinition};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Duplicate catalog id: {0}")]
    DuplicateId(String),

    #[error("Catalog entry {id} has a zero base cost")]
    ZeroBaseCost { id: String },

    #[error("Catalog entry {id} has growth rate {rate}, must be > 1.0")]
    InvalidGrowthRate { id: String, rate: f64 },

    #[error("Catalog entry has an empty id")]
    EmptyId,
}

/// Immutable pricing and yield definitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    producers: Vec<ProducerDefinition>,
    #[serde(default)]
    click_upgrades: Vec<ClickUpgradeDefinition>,
}

impl Catalog {
    /// Build a catalog, rejecting entries that break the pricing invariants.
    pub fn new(
        producers: Vec<ProducerDefinition>,
        click_upgrades: Vec<ClickUpgradeDefinition>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            producers,
            click_upgrades,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Producers in display order.
    pub fn producers(&self) -> &[ProducerDefinition] {
        &self.producers
    }

    /// Click upgrades in display order.
    pub fn click_upgrades(&self) -> &[ClickUpgradeDefinition] {
        &self.click_upgrades
    }

    pub fn producer(&self, id: &str) -> Option<&ProducerDefinition> {
        self.producers.iter().find(|p| p.id == id)
    }

    pub fn click_upgrade(&self, id: &str) -> Option<&ClickUpgradeDefinition> {
        self.click_upgrades.iter().find(|u| u.id == id)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        let entries = self
            .producers
            .iter()
            .map(|p| (&p.id, p.base_cost, p.cost_growth_rate))
            .chain(
                self.click_upgrades
                    .iter()
                    .map(|u| (&u.id, u.base_cost, u.cost_growth_rate)),
            );

        for (id, base_cost, rate) in entries {
            if id.is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(id.as_str()) {
                return Err(CatalogError::DuplicateId(id.clone()));
            }
            if base_cost == 0 {
                return Err(CatalogError::ZeroBaseCost { id: id.clone() });
            }
            // NaN fails this comparison too.
            if !(rate > 1.0 && rate.is_finite()) {
                return Err(CatalogError::InvalidGrowthRate {
                    id: id.clone(),
                    rate,
                });
            }
        }
        Ok(())
    }
}

fn producer(id: &str, name: &str, description: &str, base_cost: u64, cps_yield: u64) -> ProducerDefinition {
    ProducerDefinition {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        base_cost,
        cost_growth_rate: 1.15,
        cps_yield,
        click_yield: 0,
    }
}

fn click_upgrade(id: &str, name: &str, description: &str, base_cost: u64, click_yield: u64) -> ClickUpgradeDefinition {
    ClickUpgradeDefinition {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        base_cost,
        cost_growth_rate: 1.15,
        click_yield,
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            producers: vec![
                producer("cursor", "Cursor", "Clicks cookies for you automatically", 15, 1),
                producer("grandma", "Grandma", "A nice grandma to bake more cookies", 100, 5),
                producer("farm", "Cookie Farm", "Grows cookie plants", 1_100, 47),
                producer("mine", "Cookie Mine", "Mines cookie ore from deep underground", 12_000, 260),
                producer("factory", "Cookie Factory", "Mass-produces cookies", 130_000, 1_400),
            ],
            click_upgrades: vec![
                click_upgrade("click_power", "Better Clicks", "Each click gives more cookies", 50, 1),
                click_upgrade("super_clicks", "Super Clicks", "Greatly enhances clicking power", 500, 5),
            ],
        }
    }
}
