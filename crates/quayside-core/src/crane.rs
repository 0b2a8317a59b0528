//! Crane animation state machine
//!
//! Each quay crane runs a cyclic cycle (descend, grab, ascend, travel,
//! deposit) advanced by a fixed 60 Hz step clock. The fleet owns the cranes
//! and a timestep accumulator so the animation speed stays wall-clock true
//! regardless of how often the caller gets around to ticking it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed animation steps per second
pub const STEP_HZ: u32 = 60;

/// Duration of a single animation step
pub const STEP: Duration = Duration::from_nanos(1_000_000_000 / STEP_HZ as u64);

/// Upper limit on catch-up steps per `advance` call. After a long stall
/// (suspended laptop, debugger pause) we drop the backlog instead of
/// fast-forwarding through it.
const MAX_CATCHUP_STEPS: u32 = 3 * STEP_HZ;

/// Cable length at the top of the hoist, start-of-cycle value
const CABLE_TOP: f32 = 12.0;
/// Cable length when the hook reaches the load
const CABLE_BOTTOM: f32 = 96.0;
/// Cable payout per step
const CABLE_SPEED: f32 = 1.5;

/// Carriage position at the quay side, start-of-cycle value
const CARRIAGE_HOME: f32 = 0.0;
/// Carriage position over the stacking bay
const CARRIAGE_BAY: f32 = 80.0;
/// Carriage travel per step
const CARRIAGE_SPEED: f32 = 1.2;

/// Frames the hook dwells while attaching or releasing a container
const HOLD_FRAMES: u16 = 45;

/// Phase of the crane work cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CranePhase {
    #[default]
    Descending,
    Grabbing,
    Ascending,
    Moving,
    Depositing,
}

impl CranePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CranePhase::Descending => "descending",
            CranePhase::Grabbing => "grabbing",
            CranePhase::Ascending => "ascending",
            CranePhase::Moving => "moving",
            CranePhase::Depositing => "depositing",
        }
    }
}

/// Occupancy of a single berth, as reported by the state endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BerthOccupancy {
    pub berth_id: i32,
    pub occupied: bool,
}

/// A single quay crane
#[derive(Debug, Clone)]
pub struct Crane {
    phase: CranePhase,
    cable: f32,
    carriage: f32,
    hold: u16,
    container: bool,
    powered: bool,
}

impl Default for Crane {
    fn default() -> Self {
        Self::new()
    }
}

impl Crane {
    /// Create a crane at the start of its cycle, powered off
    pub fn new() -> Self {
        Self {
            phase: CranePhase::Descending,
            cable: CABLE_TOP,
            carriage: CARRIAGE_HOME,
            hold: 0,
            container: false,
            powered: false,
        }
    }

    pub fn phase(&self) -> CranePhase {
        self.phase
    }

    pub fn cable(&self) -> f32 {
        self.cable
    }

    pub fn carriage(&self) -> f32 {
        self.carriage
    }

    pub fn has_container(&self) -> bool {
        self.container
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Idle overlay flag: shown whenever the crane is powered off
    pub fn is_idle(&self) -> bool {
        !self.powered
    }

    /// Toggle crane power.
    ///
    /// Powering off freezes every scalar in place. Powering back on resets
    /// cable and carriage to the start-of-cycle values before resuming.
    pub fn set_powered(&mut self, powered: bool) {
        if powered && !self.powered {
            self.phase = CranePhase::Descending;
            self.cable = CABLE_TOP;
            self.carriage = CARRIAGE_HOME;
            self.hold = 0;
            self.container = false;
        }
        self.powered = powered;
    }

    /// Advance one fixed step. Returns the new phase on a transition.
    pub fn step(&mut self) -> Option<CranePhase> {
        if !self.powered {
            return None;
        }

        match self.phase {
            CranePhase::Descending => {
                self.cable += CABLE_SPEED;
                if self.cable >= CABLE_BOTTOM {
                    self.cable = CABLE_BOTTOM;
                    self.hold = HOLD_FRAMES;
                    return self.transition(CranePhase::Grabbing);
                }
            }
            CranePhase::Grabbing => {
                self.hold = self.hold.saturating_sub(1);
                if self.hold == 0 {
                    self.container = true;
                    return self.transition(CranePhase::Ascending);
                }
            }
            CranePhase::Ascending => {
                self.cable -= CABLE_SPEED;
                if self.cable <= CABLE_TOP {
                    self.cable = CABLE_TOP;
                    return self.transition(CranePhase::Moving);
                }
            }
            CranePhase::Moving => {
                self.carriage += CARRIAGE_SPEED;
                if self.carriage >= CARRIAGE_BAY {
                    self.carriage = CARRIAGE_BAY;
                    self.hold = HOLD_FRAMES;
                    return self.transition(CranePhase::Depositing);
                }
            }
            CranePhase::Depositing => {
                self.hold = self.hold.saturating_sub(1);
                if self.hold == 0 {
                    self.container = false;
                    self.carriage = CARRIAGE_HOME;
                    return self.transition(CranePhase::Descending);
                }
            }
        }

        None
    }

    fn transition(&mut self, next: CranePhase) -> Option<CranePhase> {
        self.phase = next;
        Some(next)
    }
}

/// A phase transition observed while advancing the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetTransition {
    pub crane: usize,
    pub phase: CranePhase,
}

/// Controller owning the crane collection and the fixed-timestep clock
#[derive(Debug)]
pub struct CraneFleet {
    cranes: Vec<Crane>,
    backlog: Duration,
}

impl CraneFleet {
    pub fn new(count: usize) -> Self {
        Self {
            cranes: vec![Crane::new(); count],
            backlog: Duration::ZERO,
        }
    }

    pub fn len(&self) -> usize {
        self.cranes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cranes.is_empty()
    }

    pub fn cranes(&self) -> &[Crane] {
        &self.cranes
    }

    /// Advance the animation by `elapsed` wall-clock time, running as many
    /// whole 60 Hz steps as fit and carrying the remainder forward.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<FleetTransition> {
        self.backlog += elapsed;

        let mut steps = (self.backlog.as_nanos() / STEP.as_nanos()) as u32;
        if steps > MAX_CATCHUP_STEPS {
            steps = MAX_CATCHUP_STEPS;
            self.backlog = Duration::ZERO;
        } else {
            self.backlog -= STEP * steps;
        }

        let mut transitions = Vec::new();
        for _ in 0..steps {
            for (i, crane) in self.cranes.iter_mut().enumerate() {
                if let Some(phase) = crane.step() {
                    transitions.push(FleetTransition { crane: i, phase });
                }
            }
        }
        transitions
    }

    /// Synchronize crane power with a berth occupancy snapshot.
    ///
    /// The snapshot is sorted by berth id so that crane indices correspond
    /// to berths regardless of the order the server returned them in.
    /// Entries beyond the fleet size are ignored.
    pub fn apply_occupancy(&mut self, mut snapshot: Vec<BerthOccupancy>) {
        snapshot.sort_by_key(|s| s.berth_id);
        for (crane, state) in self.cranes.iter_mut().zip(snapshot) {
            crane.set_powered(state.occupied);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_crane() -> Crane {
        let mut crane = Crane::new();
        crane.set_powered(true);
        crane
    }

    fn run_until_phase(crane: &mut Crane, phase: CranePhase, budget: u32) {
        for _ in 0..budget {
            if crane.phase() == phase {
                return;
            }
            crane.step();
        }
        panic!("crane never reached {:?}", phase);
    }

    #[test]
    fn cycle_visits_every_phase_in_order() {
        let mut crane = powered_crane();
        let mut seen = vec![crane.phase()];
        for _ in 0..10_000 {
            if let Some(phase) = crane.step() {
                seen.push(phase);
            }
            if seen.len() == 6 {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                CranePhase::Descending,
                CranePhase::Grabbing,
                CranePhase::Ascending,
                CranePhase::Moving,
                CranePhase::Depositing,
                CranePhase::Descending,
            ]
        );
    }

    #[test]
    fn container_attaches_after_grab_and_detaches_after_deposit() {
        let mut crane = powered_crane();
        run_until_phase(&mut crane, CranePhase::Ascending, 10_000);
        assert!(crane.has_container());
        run_until_phase(&mut crane, CranePhase::Depositing, 10_000);
        assert!(crane.has_container());
        run_until_phase(&mut crane, CranePhase::Descending, 10_000);
        assert!(!crane.has_container());
    }

    #[test]
    fn power_off_freezes_scalars() {
        let mut crane = powered_crane();
        for _ in 0..10 {
            crane.step();
        }
        let cable = crane.cable();
        let phase = crane.phase();

        crane.set_powered(false);
        assert!(crane.is_idle());
        for _ in 0..100 {
            assert_eq!(crane.step(), None);
        }
        assert_eq!(crane.cable(), cable);
        assert_eq!(crane.phase(), phase);
    }

    #[test]
    fn power_on_resets_to_start_of_cycle() {
        let mut crane = powered_crane();
        run_until_phase(&mut crane, CranePhase::Moving, 10_000);
        crane.set_powered(false);
        crane.set_powered(true);

        assert_eq!(crane.phase(), CranePhase::Descending);
        assert_eq!(crane.cable(), CABLE_TOP);
        assert_eq!(crane.carriage(), CARRIAGE_HOME);
        assert!(!crane.has_container());
    }

    #[test]
    fn occupancy_snapshot_is_sorted_before_mapping() {
        let mut fleet = CraneFleet::new(2);
        fleet.apply_occupancy(vec![
            BerthOccupancy { berth_id: 2, occupied: false },
            BerthOccupancy { berth_id: 1, occupied: true },
        ]);

        assert!(fleet.cranes()[0].is_powered());
        assert!(!fleet.cranes()[1].is_powered());
    }

    #[test]
    fn missing_snapshot_leaves_power_unchanged() {
        let mut fleet = CraneFleet::new(2);
        fleet.apply_occupancy(vec![
            BerthOccupancy { berth_id: 1, occupied: true },
            BerthOccupancy { berth_id: 2, occupied: true },
        ]);

        // A failed fetch means apply_occupancy is simply never called;
        // advancing must not touch the flags.
        fleet.advance(Duration::from_secs(1));
        assert!(fleet.cranes().iter().all(Crane::is_powered));
    }

    #[test]
    fn oversized_snapshot_ignores_extra_berths() {
        let mut fleet = CraneFleet::new(1);
        fleet.apply_occupancy(vec![
            BerthOccupancy { berth_id: 1, occupied: true },
            BerthOccupancy { berth_id: 2, occupied: true },
        ]);
        assert_eq!(fleet.len(), 1);
        assert!(fleet.cranes()[0].is_powered());
    }

    #[test]
    fn advance_runs_whole_steps_and_banks_the_remainder() {
        let mut fleet = CraneFleet::new(1);
        fleet.apply_occupancy(vec![BerthOccupancy { berth_id: 1, occupied: true }]);

        let start = fleet.cranes()[0].cable();
        // Half a step: nothing moves yet.
        fleet.advance(STEP / 2);
        assert_eq!(fleet.cranes()[0].cable(), start);
        // The other half completes one step.
        fleet.advance(STEP / 2);
        assert_eq!(fleet.cranes()[0].cable(), start + CABLE_SPEED);
    }

    #[test]
    fn advance_caps_catchup_after_a_stall() {
        let mut fleet = CraneFleet::new(1);
        fleet.apply_occupancy(vec![BerthOccupancy { berth_id: 1, occupied: true }]);

        // An hour-long stall must not fast-forward an hour of animation.
        let transitions = fleet.advance(Duration::from_secs(3600));
        assert!(transitions.len() < 100);
    }
}
