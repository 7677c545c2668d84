//! Production scheduler - worker links, construction and per-frame production.
//!
//! The villager/building job link is bidirectional: `Employment::building` on
//! the villager and `Building::workers` on the building. Only the functions in
//! this module touch either side, so the two never disagree.

use hecs::{Entity, World};

use crate::components::{
    Building, BuildingData, BuildingType, Employment, JobType, Lifecycle, Position,
    ProductionType, ResourceLedger, Skills, Vec2, Vitals, PROGRESS_COMPLETE,
};
use crate::config::ProductionConfig;
use crate::error::{JobError, SettlementError};
use crate::generation::BuildingCatalog;

use super::events::{EventLog, SettlementEvent};
use super::registry::SettlementRegistry;

/// Where a crafting cycle is held when its inputs run out at completion
const CRAFT_HOLD_PROGRESS: f32 = PROGRESS_COMPLETE - 0.001;

/// Link a mature villager to a building.
///
/// An employed villager is moved: the old link is removed first. Assigning a
/// villager to the building they already work at succeeds without change.
pub fn assign_worker(world: &mut World, building: Entity, villager: Entity) -> Result<(), JobError> {
    let (max_workers, has_jobs) = match world.get::<&BuildingData>(building) {
        Ok(data) => (data.max_workers, data.job_type.is_some() && data.max_workers > 0),
        Err(_) => return Err(JobError::NoSuchBuilding(building)),
    };
    if world.get::<&Building>(building).is_err() {
        return Err(JobError::NoSuchBuilding(building));
    }
    if !has_jobs {
        return Err(JobError::NoJobs(building));
    }

    let current = {
        let life = world
            .get::<&Lifecycle>(villager)
            .map_err(|_| JobError::NoSuchVillager(villager))?;
        let employment = world
            .get::<&Employment>(villager)
            .map_err(|_| JobError::NoSuchVillager(villager))?;
        if !life.is_mature() {
            return Err(JobError::NotMature(villager));
        }
        employment.building
    };

    if current == Some(building) {
        let linked = world
            .get::<&Building>(building)
            .map(|b| b.has_worker(villager))
            .unwrap_or(false);
        if linked {
            return Ok(());
        }
    }

    {
        let b = world
            .get::<&Building>(building)
            .map_err(|_| JobError::NoSuchBuilding(building))?;
        if b.is_full(max_workers) {
            return Err(JobError::BuildingFull {
                building,
                max_workers,
            });
        }
    }

    if let Some(old) = current {
        remove_worker(world, old, villager);
    }

    if let Ok(mut b) = world.get::<&mut Building>(building) {
        b.workers.push(villager);
    }
    if let Ok(mut employment) = world.get::<&mut Employment>(villager) {
        employment.building = Some(building);
    }
    log::debug!("Assigned villager {:?} to building {:?}", villager, building);
    Ok(())
}

/// Unlink a villager from a building. Returns true if either side changed.
pub fn remove_worker(world: &mut World, building: Entity, villager: Entity) -> bool {
    let mut changed = false;

    if let Ok(mut b) = world.get::<&mut Building>(building) {
        let before = b.workers.len();
        b.workers.retain(|w| *w != villager);
        changed |= b.workers.len() != before;
    }
    if let Ok(mut employment) = world.get::<&mut Employment>(villager) {
        if employment.building == Some(building) {
            employment.building = None;
            changed = true;
        }
    }
    changed
}

/// Clear whatever job the villager holds
pub fn unassign_villager(world: &mut World, villager: Entity) -> bool {
    let current = match world.get::<&Employment>(villager) {
        Ok(employment) => employment.building,
        Err(_) => return false,
    };
    match current {
        Some(building) => remove_worker(world, building, villager),
        None => false,
    }
}

/// Per-worker contribution: job skill times morale fraction times the building's rate
fn worker_speed(world: &World, worker: Entity, job: JobType, rate: f32) -> f32 {
    let skill = world.get::<&Skills>(worker).map(|s| s.get(job)).unwrap_or(0.0);
    let morale = world.get::<&Vitals>(worker).map(|v| v.morale).unwrap_or(0.0);
    skill * (morale / 100.0) * rate
}

/// Total progress points per second from all assigned workers
pub fn production_speed(world: &World, building: Entity) -> f32 {
    let Ok(data) = world.get::<&BuildingData>(building) else {
        return 0.0;
    };
    let Ok(b) = world.get::<&Building>(building) else {
        return 0.0;
    };
    let Some(job) = data.job_type else {
        return 0.0;
    };
    let rate = data.work_rate();
    b.workers
        .iter()
        .map(|&w| worker_speed(world, w, job, rate))
        .sum()
}

/// Advance construction of unfinished buildings
pub fn construction_system(world: &mut World, events: &mut EventLog, delta_seconds: f32) {
    let mut finished = Vec::new();

    for (entity, (building, data)) in world.query_mut::<(&mut Building, &BuildingData)>() {
        if building.is_constructed() {
            continue;
        }
        let rate = if data.construction_time > 0.0 {
            PROGRESS_COMPLETE / data.construction_time
        } else {
            f32::INFINITY
        };
        building.construction_progress =
            (building.construction_progress + rate * delta_seconds).min(PROGRESS_COMPLETE);
        if building.is_constructed() {
            finished.push((entity, data.building_type));
        }
    }

    for (building, building_type) in finished {
        log::info!("{:?} {:?} construction complete", building_type, building);
        events.push(SettlementEvent::BuildingConstructed {
            building,
            building_type,
        });
    }
}

/// Work to do for one building this frame, gathered before mutation
struct ProductionJob {
    entity: Entity,
    speed: f32,
    job: Option<JobType>,
    data: BuildingData,
}

/// Advance production for every constructed, staffed building.
///
/// Completed cycles carry their overflow into the next one. Crafting only
/// advances while the ledger holds the recipe inputs; otherwise progress is
/// frozen and `waiting_for_resources` is set.
pub fn production_system(
    world: &mut World,
    ledger: &mut ResourceLedger,
    events: &mut EventLog,
    config: &ProductionConfig,
    delta_seconds: f32,
) {
    let candidates: Vec<Entity> = world
        .query::<(&Building, &BuildingData)>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    let mut jobs = Vec::with_capacity(candidates.len());
    for entity in candidates {
        let active = world
            .get::<&Building>(entity)
            .map(|b| b.is_constructed() && !b.workers.is_empty())
            .unwrap_or(false);
        if !active {
            if let Ok(mut b) = world.get::<&mut Building>(entity) {
                b.current_speed = 0.0;
                b.waiting_for_resources = false;
            }
            continue;
        }
        let speed = production_speed(world, entity);
        if let Ok(data) = world.get::<&BuildingData>(entity) {
            jobs.push(ProductionJob {
                entity,
                speed,
                job: data.job_type,
                data: (*data).clone(),
            });
        }
    }

    for job in jobs {
        let completed = run_production(world, ledger, events, &job, delta_seconds);
        if completed == 0 {
            continue;
        }
        let (Some(job_type), Ok(workers)) = (
            job.job,
            world.get::<&Building>(job.entity).map(|b| b.workers.clone()),
        ) else {
            continue;
        };
        let gain = config.skill_gain_per_cycle * completed as f32;
        for worker in workers {
            if let Ok(mut skills) = world.get::<&mut Skills>(worker) {
                skills.improve(job_type, gain, config.skill_cap);
            }
        }
    }
}

/// Returns the number of cycles completed
fn run_production(
    world: &mut World,
    ledger: &mut ResourceLedger,
    events: &mut EventLog,
    job: &ProductionJob,
    delta_seconds: f32,
) -> u32 {
    let Ok(mut building) = world.get::<&mut Building>(job.entity) else {
        return 0;
    };
    building.current_speed = job.speed;
    let data = &job.data;
    let mut completed = 0;

    match data.production_type {
        ProductionType::Garrison => {}
        ProductionType::Gathering => {
            let Some(resource) = data.produced_resource else {
                return 0;
            };
            let cycles = take_whole_cycles(&mut building, job.speed * delta_seconds);
            for _ in 0..cycles {
                ledger.add(resource, data.production_amount);
                completed += 1;
                events.push(SettlementEvent::ProductionCompleted {
                    building: job.entity,
                    resource,
                    amount: data.production_amount,
                });
                log::debug!(
                    "{} produced {} {:?}",
                    data.name,
                    data.production_amount,
                    resource
                );
            }
        }
        ProductionType::Crafting => {
            let Some(recipe) = data.recipe.as_ref() else {
                return 0;
            };
            if !recipe.can_craft(ledger) {
                if !building.waiting_for_resources {
                    log::debug!("{} waiting for resources", data.name);
                }
                building.waiting_for_resources = true;
                return 0;
            }
            building.waiting_for_resources = false;
            let cycles = take_whole_cycles(&mut building, job.speed * delta_seconds);
            for _ in 0..cycles {
                if !recipe.consume(ledger) {
                    building.production_progress = CRAFT_HOLD_PROGRESS;
                    building.waiting_for_resources = true;
                    break;
                }
                ledger.add(recipe.output.resource, recipe.output.amount);
                completed += 1;
                events.push(SettlementEvent::ProductionCompleted {
                    building: job.entity,
                    resource: recipe.output.resource,
                    amount: recipe.output.amount,
                });
                log::debug!(
                    "{} crafted {} {:?}",
                    data.name,
                    recipe.output.amount,
                    recipe.output.resource
                );
            }
        }
    }
    completed
}

/// Add progress and strip completed cycles, leaving the overflow in [0, 100)
fn take_whole_cycles(building: &mut Building, gained: f32) -> u32 {
    let total = building.production_progress + gained;
    let cycles = (total / PROGRESS_COMPLETE).floor() as u32;
    building.production_progress = total % PROGRESS_COMPLETE;
    cycles
}

/// Debit the construction cost and spawn an unfinished building
pub fn place_building(
    world: &mut World,
    registry: &mut SettlementRegistry,
    ledger: &mut ResourceLedger,
    events: &mut EventLog,
    catalog: &BuildingCatalog,
    building_type: BuildingType,
    position: Vec2,
) -> Result<Entity, SettlementError> {
    let data = catalog
        .get(building_type)
        .ok_or(SettlementError::UnknownBuilding(building_type))?
        .clone();
    if !ledger.spend_all(&data.construction_cost) {
        return Err(SettlementError::CannotAfford(building_type));
    }

    let building = Building::new(data.construction_time);
    let constructed = building.is_constructed();
    let entity = world.spawn((data, building, Position::from(position)));
    registry.register_building(entity);
    log::info!("Placed {:?} at ({:.1}, {:.1})", building_type, position.x, position.y);

    if constructed {
        events.push(SettlementEvent::BuildingConstructed {
            building: entity,
            building_type,
        });
    }
    Ok(entity)
}

/// Unassign every worker, then unregister and despawn the building
pub fn remove_building(world: &mut World, registry: &mut SettlementRegistry, building: Entity) -> bool {
    let workers = match world.get::<&Building>(building) {
        Ok(b) => b.workers.clone(),
        Err(_) => return false,
    };
    for worker in workers {
        remove_worker(world, building, worker);
    }
    registry.unregister_building(building);
    let _ = world.despawn(building);
    log::info!("Removed building {:?}", building);
    true
}

/// Progress of the current cycle, 0..100
pub fn production_progress_percent(world: &World, building: Entity) -> Option<f32> {
    world
        .get::<&Building>(building)
        .ok()
        .map(|b| b.production_progress)
}

/// Seconds until the current cycle completes at today's speed.
///
/// Infinite with no speed, or while a crafting cycle waits for inputs.
pub fn estimated_time_to_completion(world: &World, building: Entity) -> Option<f32> {
    let (progress, waiting) = world
        .get::<&Building>(building)
        .map(|b| (b.production_progress, b.waiting_for_resources))
        .ok()?;
    let speed = production_speed(world, building);
    if speed <= 0.0 || waiting {
        return Some(f32::INFINITY);
    }
    Some((PROGRESS_COMPLETE - progress) / speed)
}
