//! Daily meal - food consumption and the fed/hungry split

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Lifecycle, Nourishment, ResourceLedger, Vitals};
use crate::config::EconomyConfig;

use super::events::{EventLog, SettlementEvent};
use super::registry::SettlementRegistry;

/// Feed the settlement once.
///
/// When the ledger cannot cover everyone, all remaining food is spent and a
/// randomly chosen subset of that size is fed, so shortages do not always
/// starve the same villagers. Returns `(fed, hungry)`.
pub fn handle_meal_time(
    world: &mut World,
    registry: &SettlementRegistry,
    ledger: &mut ResourceLedger,
    events: &mut EventLog,
    config: &EconomyConfig,
    rng: &mut impl Rng,
) -> (u32, u32) {
    let mut villagers: Vec<Entity> = registry
        .villagers()
        .iter()
        .copied()
        .filter(|&v| {
            world
                .get::<&Lifecycle>(v)
                .map(|l| l.is_alive())
                .unwrap_or(false)
        })
        .collect();

    let rate = config.food_per_villager;
    let demand = villagers.len() as f32 * rate;

    let fed_count = if rate <= 0.0 {
        villagers.len()
    } else if ledger.spend(config.meal_resource, demand) {
        villagers.len()
    } else {
        let available = ledger.take_all(config.meal_resource);
        let covered = ((available / rate).floor() as usize).min(villagers.len());
        villagers.shuffle(rng);
        covered
    };

    for (i, &villager) in villagers.iter().enumerate() {
        let fed = i < fed_count;
        if let Ok(mut nourishment) = world.get::<&mut Nourishment>(villager) {
            nourishment.fed = fed;
            if fed {
                nourishment.hungry_days = 0;
            } else {
                nourishment.hungry_days += 1;
            }
        }
        if let Ok(mut vitals) = world.get::<&mut Vitals>(villager) {
            if fed {
                vitals.adjust_morale(config.fed_morale_gain);
            } else {
                vitals.adjust_morale(-config.hungry_morale_loss);
            }
        }
    }

    let fed = fed_count as u32;
    let hungry = (villagers.len() - fed_count) as u32;
    if hungry > 0 {
        log::warn!("Food shortage: {} fed, {} hungry", fed, hungry);
    } else {
        log::info!("Meal served to {} villagers", fed);
    }
    events.push(SettlementEvent::MealServed { fed, hungry });
    (fed, hungry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ResourceKind, Villager};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn populate(world: &mut World, registry: &mut SettlementRegistry, count: usize) -> Vec<Entity> {
        (0..count)
            .map(|_| {
                let v = world.spawn((
                    Villager,
                    Lifecycle::new(30.0, 60.0, 16.0),
                    Nourishment::default(),
                    Vitals::new(100.0, 0.1),
                ));
                registry.register_villager(v);
                v
            })
            .collect()
    }

    fn fed_flags(world: &World, villagers: &[Entity]) -> Vec<bool> {
        villagers
            .iter()
            .map(|&v| world.get::<&Nourishment>(v).unwrap().fed)
            .collect()
    }

    #[test]
    fn test_shortage_feeds_random_subset() {
        let mut world = World::new();
        let mut registry = SettlementRegistry::new();
        let villagers = populate(&mut world, &mut registry, 8);
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Fish, 5.0);
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(9);

        let (fed, hungry) = handle_meal_time(
            &mut world,
            &registry,
            &mut ledger,
            &mut events,
            &EconomyConfig::default(),
            &mut rng,
        );

        assert_eq!((fed, hungry), (5, 3));
        assert_eq!(ledger.get(ResourceKind::Fish), 0.0);
        let flags = fed_flags(&world, &villagers);
        assert_eq!(flags.iter().filter(|f| **f).count(), 5);
        assert_eq!(
            events.pending(),
            &[SettlementEvent::MealServed { fed: 5, hungry: 3 }]
        );
    }

    #[test]
    fn test_shortage_does_not_always_starve_same_villagers() {
        let mut world = World::new();
        let mut registry = SettlementRegistry::new();
        let villagers = populate(&mut world, &mut registry, 8);
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(5);

        let mut patterns = std::collections::HashSet::new();
        for _ in 0..10 {
            let mut ledger = ResourceLedger::new();
            ledger.add(ResourceKind::Fish, 4.0);
            handle_meal_time(
                &mut world,
                &registry,
                &mut ledger,
                &mut events,
                &EconomyConfig::default(),
                &mut rng,
            );
            patterns.insert(fed_flags(&world, &villagers));
        }
        assert!(patterns.len() > 1);
    }

    #[test]
    fn test_plenty_feeds_everyone() {
        let mut world = World::new();
        let mut registry = SettlementRegistry::new();
        let villagers = populate(&mut world, &mut registry, 4);
        let mut ledger = ResourceLedger::new();
        ledger.add(ResourceKind::Fish, 10.0);
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);

        let result = handle_meal_time(
            &mut world,
            &registry,
            &mut ledger,
            &mut events,
            &EconomyConfig::default(),
            &mut rng,
        );
        assert_eq!(result, (4, 0));
        assert_eq!(ledger.get(ResourceKind::Fish), 6.0);
        assert!(fed_flags(&world, &villagers).iter().all(|f| *f));
    }

    #[test]
    fn test_hunger_lowers_morale() {
        let mut world = World::new();
        let mut registry = SettlementRegistry::new();
        let villagers = populate(&mut world, &mut registry, 2);
        let mut ledger = ResourceLedger::new();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = EconomyConfig::default();

        handle_meal_time(&mut world, &registry, &mut ledger, &mut events, &config, &mut rng);
        handle_meal_time(&mut world, &registry, &mut ledger, &mut events, &config, &mut rng);

        let vitals = *world.get::<&Vitals>(villagers[0]).unwrap();
        assert_eq!(vitals.morale, 100.0 - 2.0 * config.hungry_morale_loss);
        assert_eq!(world.get::<&Nourishment>(villagers[0]).unwrap().hungry_days, 2);
    }
}
