//! Economy types: resource kinds, the resource ledger and crafting recipes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Fish,
    Wood,
    Stone,
    Iron,
    Tools,
    Shield,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Fish,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Iron,
        ResourceKind::Tools,
        ResourceKind::Shield,
    ];
}

/// A quantity of one resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceAmount {
    pub resource: ResourceKind,
    pub amount: f32,
}

impl ResourceAmount {
    pub fn new(resource: ResourceKind, amount: f32) -> Self {
        Self { resource, amount }
    }
}

/// Settlement-wide resource store shared by buildings and meals.
///
/// Quantities never go negative: `spend` refuses instead of overdrawing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    quantities: BTreeMap<ResourceKind, f32>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(resources: &[ResourceAmount]) -> Self {
        let mut ledger = Self::new();
        for r in resources {
            ledger.add(r.resource, r.amount);
        }
        ledger
    }

    pub fn get(&self, resource: ResourceKind) -> f32 {
        self.quantities.get(&resource).copied().unwrap_or(0.0)
    }

    /// Credit `amount`. Negative or non-finite amounts are ignored.
    pub fn add(&mut self, resource: ResourceKind, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        *self.quantities.entry(resource).or_insert(0.0) += amount;
    }

    /// Debit `amount` if available. Returns false and leaves the ledger
    /// untouched when the balance is insufficient.
    pub fn spend(&mut self, resource: ResourceKind, amount: f32) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        let balance = self.get(resource);
        if balance < amount {
            return false;
        }
        self.quantities.insert(resource, (balance - amount).max(0.0));
        true
    }

    /// Debit whatever is left of `resource`, returning the amount taken
    pub fn take_all(&mut self, resource: ResourceKind) -> f32 {
        self.quantities.insert(resource, 0.0).unwrap_or(0.0)
    }

    pub fn can_afford(&self, cost: &[ResourceAmount]) -> bool {
        // Sum per kind so a list naming the same resource twice is checked correctly
        let mut needed: BTreeMap<ResourceKind, f32> = BTreeMap::new();
        for c in cost {
            *needed.entry(c.resource).or_insert(0.0) += c.amount.max(0.0);
        }
        needed
            .iter()
            .all(|(resource, amount)| self.get(*resource) >= *amount)
    }

    /// Debit a whole cost list, all or nothing
    pub fn spend_all(&mut self, cost: &[ResourceAmount]) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for c in cost {
            self.spend(c.resource, c.amount.max(0.0));
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f32)> + '_ {
        self.quantities.iter().map(|(k, v)| (*k, *v))
    }
}

/// Inputs consumed and output produced by one crafting cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftingRecipe {
    pub inputs: Vec<ResourceAmount>,
    pub output: ResourceAmount,
    /// Progress points per second contributed by a worker with multiplier 1.0
    pub rate: f32,
}

impl CraftingRecipe {
    /// Pure precondition check, always called before `consume`
    pub fn can_craft(&self, ledger: &ResourceLedger) -> bool {
        ledger.can_afford(&self.inputs)
    }

    /// Debit the inputs. Check and debit happen in one call so two buildings
    /// can never both pass the check on the same stock.
    pub fn consume(&self, ledger: &mut ResourceLedger) -> bool {
        ledger.spend_all(&self.inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_fails_when_insufficient() {
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Wood, 3.0);

        assert!(!ledger.spend(ResourceKind::Wood, 5.0));
        assert_eq!(ledger.get(ResourceKind::Wood), 3.0);

        assert!(ledger.spend(ResourceKind::Wood, 3.0));
        assert_eq!(ledger.get(ResourceKind::Wood), 0.0);
    }

    #[test]
    fn test_add_then_spend_round_trip() {
        let mut ledger = ResourceLedger::with_resources(&[ResourceAmount::new(ResourceKind::Fish, 7.5)]);
        ledger.add(ResourceKind::Fish, 2.5);
        assert!(ledger.spend(ResourceKind::Fish, 2.5));
        assert_eq!(ledger.get(ResourceKind::Fish), 7.5);
    }

    #[test]
    fn test_add_ignores_negative_and_nan() {
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Iron, -4.0);
        ledger.add(ResourceKind::Iron, f32::NAN);
        assert_eq!(ledger.get(ResourceKind::Iron), 0.0);
        assert!(!ledger.spend(ResourceKind::Iron, -1.0));
    }

    #[test]
    fn test_spend_all_is_all_or_nothing() {
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Wood, 10.0);
        ledger.add(ResourceKind::Stone, 2.0);

        let cost = [
            ResourceAmount::new(ResourceKind::Wood, 5.0),
            ResourceAmount::new(ResourceKind::Stone, 3.0),
        ];
        assert!(!ledger.spend_all(&cost));
        assert_eq!(ledger.get(ResourceKind::Wood), 10.0);
        assert_eq!(ledger.get(ResourceKind::Stone), 2.0);

        ledger.add(ResourceKind::Stone, 1.0);
        assert!(ledger.spend_all(&cost));
        assert_eq!(ledger.get(ResourceKind::Wood), 5.0);
        assert_eq!(ledger.get(ResourceKind::Stone), 0.0);
    }

    #[test]
    fn test_can_afford_sums_duplicate_kinds() {
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Wood, 3.0);
        let cost = [
            ResourceAmount::new(ResourceKind::Wood, 2.0),
            ResourceAmount::new(ResourceKind::Wood, 2.0),
        ];
        assert!(!ledger.can_afford(&cost));
    }

    #[test]
    fn test_recipe_gating() {
        let recipe = CraftingRecipe {
            inputs: vec![
                ResourceAmount::new(ResourceKind::Wood, 2.0),
                ResourceAmount::new(ResourceKind::Iron, 1.0),
            ],
            output: ResourceAmount::new(ResourceKind::Tools, 1.0),
            rate: 3.0,
        };

        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Wood, 1.0);
        assert!(!recipe.can_craft(&ledger));
        assert!(!recipe.consume(&mut ledger));
        assert_eq!(ledger.get(ResourceKind::Wood), 1.0);

        ledger.add(ResourceKind::Wood, 1.0);
        ledger.add(ResourceKind::Iron, 1.0);
        assert!(recipe.can_craft(&ledger));
        assert!(recipe.consume(&mut ledger));
        assert_eq!(ledger.get(ResourceKind::Wood), 0.0);
        assert_eq!(ledger.get(ResourceKind::Iron), 0.0);
    }

    #[test]
    fn test_take_all_empties_resource() {
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Fish, 5.0);
        assert_eq!(ledger.take_all(ResourceKind::Fish), 5.0);
        assert_eq!(ledger.get(ResourceKind::Fish), 0.0);
        assert_eq!(ledger.take_all(ResourceKind::Tools), 0.0);
    }
}
