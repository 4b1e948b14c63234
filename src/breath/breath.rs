use serde::{Deserialize, Serialize};

pub const INHALE_SECONDS: u32 = 4;
pub const HOLD_SECONDS: u32 = 7;
pub const EXHALE_SECONDS: u32 = 8;
pub const TICK_INTERVAL_MS: u64 = 1000; // One countdown step per second

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Inhale, Phase::Hold, Phase::Exhale];

    /// Default length of the phase in whole seconds.
    pub const fn duration(self) -> u32 {
        match self {
            Phase::Inhale => INHALE_SECONDS,
            Phase::Hold => HOLD_SECONDS,
            Phase::Exhale => EXHALE_SECONDS,
        }
    }

    pub const fn next(self) -> Phase {
        match self {
            Phase::Inhale => Phase::Hold,
            Phase::Hold => Phase::Exhale,
            Phase::Exhale => Phase::Inhale,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Phase::Inhale => "INHALE",
            Phase::Hold => "HOLD",
            Phase::Exhale => "EXHALE",
        }
    }

    /// Instruction shown under the countdown.
    pub(crate) fn text(&self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe In",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe Out",
        }
    }
}

/// Per-phase durations of one breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub inhale_seconds: u32,
    pub hold_seconds: u32,
    pub exhale_seconds: u32,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            inhale_seconds: Phase::Inhale.duration(),
            hold_seconds: Phase::Hold.duration(),
            exhale_seconds: Phase::Exhale.duration(),
        }
    }
}

impl Pattern {
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Inhale => self.inhale_seconds,
            Phase::Hold => self.hold_seconds,
            Phase::Exhale => self.exhale_seconds,
        }
    }

    pub fn cycle_seconds(&self) -> u32 {
        Phase::ALL.iter().map(|p| self.duration_of(*p)).sum()
    }
}

/// What a single tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer is stopped; nothing changed.
    Idle,
    Counted { remaining: u32 },
    PhaseChanged { from: Phase, to: Phase },
    /// Exhale rolled over into Inhale.
    CycleCompleted { cycles: u64 },
}

/// Read-only copy of the session for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub running: bool,
    pub phase: Phase,
    pub remaining: u32,
    pub cycles: u64,
}

#[derive(Debug, Clone)]
pub struct BreathTimer {
    pattern: Pattern,
    running: bool,
    phase: Phase,
    remaining: u32,
    cycles: u64,
}

impl Default for BreathTimer {
    fn default() -> Self {
        Self::new(Pattern::default())
    }
}

impl BreathTimer {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            running: false,
            phase: Phase::Inhale,
            remaining: pattern.duration_of(Phase::Inhale),
            cycles: 0,
        }
    }

    /// Begin (or restart) the cycle from Inhale.
    pub fn start(&mut self) {
        self.reset();
        self.running = true;
    }

    /// Stop and return to the idle display, which always shows the Inhale duration.
    pub fn stop(&mut self) {
        self.reset();
        self.running = false;
    }

    fn reset(&mut self) {
        self.phase = Phase::Inhale;
        self.remaining = self.pattern.duration_of(Phase::Inhale);
        self.cycles = 0;
    }

    /// Advance the session by one second.
    ///
    /// The countdown never reaches 0: the last second of a phase is consumed
    /// and the next phase begins at its full duration on the same tick.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        if self.remaining > 1 {
            self.remaining -= 1;
            return TickOutcome::Counted {
                remaining: self.remaining,
            };
        }

        let from = self.phase;
        self.phase = from.next();
        self.remaining = self.pattern.duration_of(self.phase);

        if from == Phase::Exhale {
            self.cycles += 1;
            TickOutcome::CycleCompleted {
                cycles: self.cycles,
            }
        } else {
            TickOutcome::PhaseChanged {
                from,
                to: self.phase,
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            running: self.running,
            phase: self.phase,
            remaining: self.remaining,
            cycles: self.cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> BreathTimer {
        let mut timer = BreathTimer::default();
        timer.start();
        timer
    }

    fn tick_n(timer: &mut BreathTimer, n: usize) {
        for _ in 0..n {
            timer.tick();
        }
    }

    #[test]
    fn test_new_timer_is_idle_on_inhale() {
        let timer = BreathTimer::default();
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::Inhale);
        assert_eq!(timer.remaining(), 4);
    }

    #[test]
    fn test_phase_cycle_order() {
        assert_eq!(Phase::Inhale.next(), Phase::Hold);
        assert_eq!(Phase::Hold.next(), Phase::Exhale);
        assert_eq!(Phase::Exhale.next(), Phase::Inhale);
        assert_eq!(Pattern::default().cycle_seconds(), 19);
    }

    #[test]
    fn test_three_ticks_then_hold() {
        let mut timer = started();
        tick_n(&mut timer, 3);
        assert_eq!(timer.phase(), Phase::Inhale);
        assert_eq!(timer.remaining(), 1);

        let outcome = timer.tick();
        assert_eq!(
            outcome,
            TickOutcome::PhaseChanged {
                from: Phase::Inhale,
                to: Phase::Hold
            }
        );
        assert_eq!(timer.phase(), Phase::Hold);
        assert_eq!(timer.remaining(), 7);
    }

    #[test]
    fn test_exhale_after_eleven_ticks() {
        let mut timer = started();
        tick_n(&mut timer, 11);
        assert_eq!(timer.phase(), Phase::Exhale);
        assert_eq!(timer.remaining(), 8);
    }

    #[test]
    fn test_cycle_closes_after_nineteen_ticks() {
        let mut timer = started();
        tick_n(&mut timer, 18);
        assert_eq!(timer.tick(), TickOutcome::CycleCompleted { cycles: 1 });
        assert_eq!(timer.phase(), Phase::Inhale);
        assert_eq!(timer.remaining(), 4);

        tick_n(&mut timer, 19);
        assert_eq!(
            timer.snapshot(),
            Snapshot {
                running: true,
                phase: Phase::Inhale,
                remaining: 4,
                cycles: 2,
            }
        );
    }

    #[test]
    fn test_remaining_stays_in_bounds() {
        let mut timer = started();
        for _ in 0..200 {
            timer.tick();
            let max = timer.pattern().duration_of(timer.phase());
            assert!(timer.remaining() >= 1 && timer.remaining() <= max);
        }
    }

    #[test]
    fn test_stop_resets_from_any_point() {
        for ticks in 0..40 {
            let mut timer = started();
            tick_n(&mut timer, ticks);
            timer.stop();
            assert_eq!(
                timer.snapshot(),
                Snapshot {
                    running: false,
                    phase: Phase::Inhale,
                    remaining: 4,
                    cycles: 0,
                }
            );
        }
    }

    #[test]
    fn test_tick_while_stopped_is_noop() {
        let mut timer = BreathTimer::default();
        let before = timer.snapshot();
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.snapshot(), before);
    }

    #[test]
    fn test_start_while_running_restarts() {
        let mut timer = started();
        tick_n(&mut timer, 9);
        timer.start();
        assert!(timer.is_running());
        assert_eq!(timer.phase(), Phase::Inhale);
        assert_eq!(timer.remaining(), 4);
    }

    #[test]
    fn test_custom_pattern_durations() {
        let pattern = Pattern {
            inhale_seconds: 2,
            hold_seconds: 1,
            exhale_seconds: 3,
        };
        let mut timer = BreathTimer::new(pattern);
        timer.start();
        tick_n(&mut timer, 2);
        assert_eq!(timer.phase(), Phase::Hold);
        assert_eq!(timer.remaining(), 1);
        timer.tick();
        assert_eq!(timer.phase(), Phase::Exhale);
        assert_eq!(timer.remaining(), 3);
        timer.stop();
        assert_eq!(timer.remaining(), 2);
    }

    #[test]
    fn test_pattern_serialization_uses_camel_case() {
        let json = serde_json::to_string(&Pattern::default()).unwrap();
        assert!(json.contains("\"inhaleSeconds\":4"));
        assert!(json.contains("\"holdSeconds\":7"));
        assert!(json.contains("\"exhaleSeconds\":8"));
    }
}
