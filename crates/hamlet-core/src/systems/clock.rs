//! Day/night and season driver - emits NewDay, MealTime and SeasonChanged.

use serde::{Deserialize, Serialize};

use crate::config::ClockConfig;

use super::events::SettlementEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn next(&self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }
}

/// In-game calendar (singleton, stored in engine)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementClock {
    /// Fraction of the current day elapsed, in [0, 1)
    pub time_of_day: f32,
    /// Day counter, starting at 1
    pub day: u32,
    pub season: Season,
    pub days_into_season: u32,
    /// Day on which the meal was last announced
    last_meal_day: Option<u32>,
}

impl SettlementClock {
    pub fn new(starting_season: Season) -> Self {
        Self {
            time_of_day: 0.0,
            day: 1,
            season: starting_season,
            days_into_season: 0,
            last_meal_day: None,
        }
    }

    /// Advance by `delta_seconds` of sim time and return the events crossed
    pub fn advance(&mut self, delta_seconds: f32, config: &ClockConfig) -> Vec<SettlementEvent> {
        let mut events = Vec::new();
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 || config.day_length_seconds <= 0.0 {
            return events;
        }

        let elapsed =
            self.time_of_day as f64 + delta_seconds as f64 / config.day_length_seconds as f64;
        let whole_days = elapsed.floor() as u64;

        // Finish each crossed day, then roll over
        for _ in 0..whole_days {
            self.check_meal(1.0, config, &mut events);
            self.time_of_day = 0.0;
            self.day += 1;
            events.push(SettlementEvent::NewDay { day: self.day });

            self.days_into_season += 1;
            if config.days_per_season > 0 && self.days_into_season >= config.days_per_season {
                events.push(self.rotate_season());
            }
        }

        // time_of_day stays in [0, 1) even when the fraction rounds up in f32
        let next = (elapsed.fract() as f32).min(1.0 - f32::EPSILON);
        self.check_meal(next, config, &mut events);
        self.time_of_day = next;
        events
    }

    /// Meal fires when the meal time falls in [time_of_day, next)
    fn check_meal(&mut self, next: f32, config: &ClockConfig, events: &mut Vec<SettlementEvent>) {
        let meal = config.meal_time_of_day;
        if self.time_of_day <= meal && meal < next && self.last_meal_day != Some(self.day) {
            self.last_meal_day = Some(self.day);
            events.push(SettlementEvent::MealTime { day: self.day });
        }
    }

    fn rotate_season(&mut self) -> SettlementEvent {
        let from = self.season;
        self.season = from.next();
        self.days_into_season = 0;
        log::info!("Season changed: {:?} -> {:?}", from, self.season);
        SettlementEvent::SeasonChanged {
            from,
            to: self.season,
        }
    }

    /// Jump to `season`. Returns the event only if the season actually changed.
    pub fn set_season(&mut self, season: Season) -> Option<SettlementEvent> {
        if season == self.season {
            return None;
        }
        let from = self.season;
        self.season = season;
        self.days_into_season = 0;
        log::info!("Season set: {:?} -> {:?}", from, season);
        Some(SettlementEvent::SeasonChanged { from, to: season })
    }

    /// Skip straight to the next season
    pub fn force_season_change(&mut self) -> SettlementEvent {
        self.rotate_season()
    }

    pub fn is_night(&self, config: &ClockConfig) -> bool {
        self.time_of_day < config.dawn || self.time_of_day >= config.dusk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClockConfig {
        ClockConfig {
            day_length_seconds: 100.0,
            meal_time_of_day: 0.5,
            days_per_season: 2,
            ..Default::default()
        }
    }

    fn count(events: &[SettlementEvent], pred: impl Fn(&SettlementEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_meal_fires_once_per_day() {
        let cfg = config();
        let mut clock = SettlementClock::new(Season::Spring);

        // 110 one-second steps: one full day plus a tenth of the next
        let mut events = Vec::new();
        for _ in 0..110 {
            events.extend(clock.advance(1.0, &cfg));
        }
        assert_eq!(
            count(&events, |e| matches!(e, SettlementEvent::MealTime { .. })),
            1
        );
        assert_eq!(
            count(&events, |e| matches!(e, SettlementEvent::NewDay { .. })),
            1
        );
        assert_eq!(clock.day, 2);
    }

    #[test]
    fn test_large_step_crosses_multiple_days() {
        let cfg = config();
        let mut clock = SettlementClock::new(Season::Spring);

        let events = clock.advance(350.0, &cfg);
        assert_eq!(
            count(&events, |e| matches!(e, SettlementEvent::NewDay { .. })),
            3
        );
        // Days 1, 2, 3 fully passed their meal time, day 4 is at 0.5 which is not yet crossed
        assert_eq!(
            count(&events, |e| matches!(e, SettlementEvent::MealTime { .. })),
            3
        );
        assert_eq!(clock.day, 4);
    }

    #[test]
    fn test_huge_and_non_finite_steps_terminate() {
        let cfg = config();
        let mut clock = SettlementClock::new(Season::Spring);

        assert!(clock.advance(f32::INFINITY, &cfg).is_empty());
        assert!(clock.advance(f32::NAN, &cfg).is_empty());
        assert_eq!(clock.day, 1);

        // 16_777_220 / 100 = 167_772.2 days
        let events = clock.advance(16_777_220.0, &cfg);
        assert_eq!(
            count(&events, |e| matches!(e, SettlementEvent::NewDay { .. })),
            167_772
        );
        assert_eq!(clock.day, 167_773);
        assert!((0.0..1.0).contains(&clock.time_of_day));
    }

    #[test]
    fn test_season_rotates_after_configured_days() {
        let cfg = config();
        let mut clock = SettlementClock::new(Season::Winter);

        let events = clock.advance(200.0, &cfg);
        assert!(events.contains(&SettlementEvent::SeasonChanged {
            from: Season::Winter,
            to: Season::Spring,
        }));
        assert_eq!(clock.season, Season::Spring);
    }

    #[test]
    fn test_set_and_force_season() {
        let mut clock = SettlementClock::new(Season::Summer);
        assert!(clock.set_season(Season::Summer).is_none());
        assert!(clock.set_season(Season::Autumn).is_some());
        assert_eq!(
            clock.force_season_change(),
            SettlementEvent::SeasonChanged {
                from: Season::Autumn,
                to: Season::Winter
            }
        );
    }

    #[test]
    fn test_night() {
        let cfg = config();
        let mut clock = SettlementClock::new(Season::Spring);
        assert!(clock.is_night(&cfg));
        clock.advance(50.0, &cfg);
        assert!(!clock.is_night(&cfg));
    }
}
