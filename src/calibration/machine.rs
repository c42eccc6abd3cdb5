//! Calibration stage sequencing.
//!
//! The machine owns no clock. Something outside calls [`advance`]
//! on a schedule; the machine only knows the order of stages and
//! whether the camera still has to pick up the current stage's
//! focus profile.
//!
//! [`advance`]: CalibrationStateMachine::advance

use super::stage::{CalibrationStage, FocusProfile};

/// Result of a single [`CalibrationStateMachine::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Stage before the advance.
    pub from: CalibrationStage,
    /// Stage after the advance.
    pub to: CalibrationStage,
    /// Whether the camera must be reconfigured for `to`.
    pub reconfigure: bool,
}

impl Transition {
    /// True when the stage did not change.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Forward-only state machine over [`CalibrationStage`].
#[derive(Debug, Clone)]
pub struct CalibrationStateMachine {
    stage: CalibrationStage,
    reconfiguration_needed: bool,
}

impl CalibrationStateMachine {
    /// Starts at `Initialization` with a reconfiguration pending so the
    /// initial profile reaches the camera.
    pub fn new() -> Self {
        Self {
            stage: CalibrationStage::Initialization,
            reconfiguration_needed: true,
        }
    }

    /// Moves to the next stage.
    ///
    /// Every real transition flags a reconfiguration. Advancing from
    /// `QualityCheck` stays put and clears the flag.
    pub fn advance(&mut self) -> Transition {
        let from = self.stage;
        let to = from.next();

        self.stage = to;
        self.reconfiguration_needed = from != to;

        if from != to {
            tracing::info!(%from, %to, "Calibration stage advanced");
        } else {
            tracing::trace!(stage = %to, "Calibration already in steady state");
        }

        Transition {
            from,
            to,
            reconfigure: self.reconfiguration_needed,
        }
    }

    /// Current stage.
    #[inline]
    pub fn current_stage(&self) -> CalibrationStage {
        self.stage
    }

    /// True while the current stage's focus profile is pending.
    #[inline]
    pub fn needs_reconfiguration(&self) -> bool {
        self.reconfiguration_needed
    }

    /// Focus profile for the current stage.
    pub fn focus_profile(&self) -> FocusProfile {
        self.stage.focus_profile()
    }

    /// Consumes a pending reconfiguration, returning the profile to apply.
    ///
    /// Returns `None` when nothing is pending. The flag is cleared
    /// whether or not the caller manages to apply the profile.
    pub fn take_reconfiguration(&mut self) -> Option<FocusProfile> {
        if !self.reconfiguration_needed {
            return None;
        }
        self.reconfiguration_needed = false;
        Some(self.focus_profile())
    }

    /// True once quality checking has begun.
    pub fn is_calibrated(&self) -> bool {
        self.stage == CalibrationStage::QualityCheck
    }
}

impl Default for CalibrationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_in_initialization() {
        let machine = CalibrationStateMachine::new();
        assert_eq!(machine.current_stage(), CalibrationStage::Initialization);
        assert!(machine.needs_reconfiguration());
        assert!(!machine.is_calibrated());
    }

    #[test]
    fn test_four_advances_reach_quality_check() {
        let mut machine = CalibrationStateMachine::new();
        for _ in 0..4 {
            let transition = machine.advance();
            assert!(!transition.is_self_loop());
            assert!(transition.reconfigure);
            assert!(machine.needs_reconfiguration());
        }
        assert_eq!(machine.current_stage(), CalibrationStage::QualityCheck);

        let fifth = machine.advance();
        assert!(fifth.is_self_loop());
        assert!(!fifth.reconfigure);
        assert_eq!(machine.current_stage(), CalibrationStage::QualityCheck);
        assert!(!machine.needs_reconfiguration());
    }

    #[test]
    fn test_never_regresses() {
        let mut machine = CalibrationStateMachine::new();
        let mut previous = machine.current_stage();
        for _ in 0..10 {
            machine.advance();
            assert!(machine.current_stage() >= previous);
            previous = machine.current_stage();
        }
    }

    #[test]
    fn test_take_reconfiguration_consumes_once() {
        let mut machine = CalibrationStateMachine::new();
        assert_eq!(machine.take_reconfiguration(), Some(FocusProfile::centered()));
        assert_eq!(machine.take_reconfiguration(), None);

        machine.advance();
        assert_eq!(
            machine.take_reconfiguration(),
            Some(FocusProfile::FixedInfinity)
        );
        assert!(!machine.needs_reconfiguration());
    }

    #[test]
    fn test_reads_are_idempotent() {
        let mut machine = CalibrationStateMachine::new();
        machine.advance();
        machine.advance();

        let stage = machine.current_stage();
        let flag = machine.needs_reconfiguration();
        for _ in 0..5 {
            assert_eq!(machine.current_stage(), stage);
            assert_eq!(machine.needs_reconfiguration(), flag);
        }
    }
}
