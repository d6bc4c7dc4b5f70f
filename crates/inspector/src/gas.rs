//! Helper inspector that measures the gas cost of each instruction.
use crate::Inspector;
use interpreter::{Gas, Interpreter};

/// Tracks gas across steps.
///
/// Remaining gas is kept per call depth: a `CALL` or `CREATE` step only ends after its child
/// frame finished, and the child's steps must not clobber the parent's reading.
#[derive(Clone, Debug, Default)]
pub struct GasInspector {
    gas_remaining: Vec<u64>,
    last_gas_cost: u64,
}

impl GasInspector {
    /// Create a new gas inspector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remaining gas recorded before the last step at `depth`.
    #[inline]
    pub fn gas_remaining(&self, depth: usize) -> u64 {
        self.gas_remaining.get(depth).copied().unwrap_or_default()
    }

    /// Returns the last gas cost.
    #[inline]
    pub fn last_gas_cost(&self) -> u64 {
        self.last_gas_cost
    }

    /// Records the remaining gas before a step at `depth`.
    #[inline]
    pub fn record_step(&mut self, gas: &Gas, depth: usize) {
        if self.gas_remaining.len() <= depth {
            self.gas_remaining.resize(depth + 1, 0);
        }
        self.gas_remaining[depth] = gas.remaining();
    }

    /// Calculates the cost of the step at `depth` that just finished.
    #[inline]
    pub fn record_step_end(&mut self, gas: &Gas, depth: usize) {
        let remaining = gas.remaining();
        self.last_gas_cost = self.gas_remaining(depth).saturating_sub(remaining);
        if let Some(slot) = self.gas_remaining.get_mut(depth) {
            *slot = remaining;
        }
    }

    /// Forgets every recorded depth.
    pub fn clear(&mut self) {
        self.gas_remaining.clear();
        self.last_gas_cost = 0;
    }
}

impl Inspector for GasInspector {
    fn step(&mut self, interp: &Interpreter, depth: usize) {
        self.record_step(&interp.gas, depth);
    }

    fn step_end(&mut self, interp: &Interpreter, depth: usize) {
        self.record_step_end(&interp.gas, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_per_depth() {
        let mut inspector = GasInspector::new();
        let mut outer = Gas::new(1_000);
        let mut inner = Gas::new(100);

        inspector.record_step(&outer, 0);
        assert!(outer.record_cost(700));

        inspector.record_step(&inner, 1);
        assert!(inner.record_cost(3));
        inspector.record_step_end(&inner, 1);
        assert_eq!(inspector.last_gas_cost(), 3);

        inspector.record_step_end(&outer, 0);
        assert_eq!(inspector.last_gas_cost(), 700);
        assert_eq!(inspector.gas_remaining(0), 300);
    }
}
