//! Progress primitives: confidence meter and step indicator

use std::fmt;

/// Percentage meter; the value is clamped to [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meter {
    value: f64,
}

impl Meter {
    pub fn new(value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Rounded percentage for display
    pub fn percent(&self) -> u8 {
        self.value.round() as u8
    }

    /// Text bar of `width` cells, e.g. `[######----]`
    pub fn bar(&self, width: usize) -> String {
        let filled = ((self.value / 100.0) * width as f64).round() as usize;
        let filled = filled.min(width);
        format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// State of one step in a stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

/// Labelled steps with a 1-based current position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stepper {
    labels: Vec<String>,
    current: usize,
}

impl Stepper {
    /// Create a stepper; `current` is clamped to `1..=labels.len()`
    pub fn new<I, S>(labels: I, current: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let current = current.max(1).min(labels.len());
        Self { labels, current }
    }

    /// Clamped 1-based current step, 0 when there are no steps
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn states(&self) -> Vec<(&str, StepState)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let position = idx + 1;
                let state = if position < self.current {
                    StepState::Completed
                } else if position == self.current {
                    StepState::Current
                } else {
                    StepState::Pending
                };
                (label.as_str(), state)
            })
            .collect()
    }

    /// One-line rendering, e.g. `✓ Reading log › [2] Analyzing patterns › 3 Consulting model`
    pub fn render(&self) -> String {
        self.states()
            .iter()
            .enumerate()
            .map(|(idx, (label, state))| match state {
                StepState::Completed => format!("✓ {}", label),
                StepState::Current => format!("[{}] {}", idx + 1, label),
                StepState::Pending => format!("{} {}", idx + 1, label),
            })
            .collect::<Vec<_>>()
            .join(" › ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_clamps_and_rounds() {
        assert_eq!(Meter::new(84.6).percent(), 85);
        assert_eq!(Meter::new(150.0).percent(), 100);
        assert_eq!(Meter::new(-2.0).to_string(), "0%");
        assert_eq!(Meter::new(f64::NAN).percent(), 0);
        assert_eq!(Meter::new(50.0).bar(10), "[#####-----]");
    }

    #[test]
    fn test_stepper_clamps_current() {
        let stepper = Stepper::new(["a", "b", "c"], 9);
        assert_eq!(stepper.current(), 3);

        let stepper = Stepper::new(["a", "b", "c"], 0);
        assert_eq!(
            stepper.states(),
            vec![
                ("a", StepState::Current),
                ("b", StepState::Pending),
                ("c", StepState::Pending)
            ]
        );

        let empty = Stepper::new(Vec::<String>::new(), 2);
        assert_eq!(empty.current(), 0);
        assert!(empty.states().is_empty());
    }
}
