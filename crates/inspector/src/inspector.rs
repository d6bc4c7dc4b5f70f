use auto_impl::auto_impl;
use context::{Env, ExecutionResult};
use interpreter::Interpreter;

/// Execution callbacks.
///
/// Every method has an empty default, so implementors only override what they observe.
#[auto_impl(&mut, Box)]
pub trait Inspector {
    /// Called before each instruction.
    ///
    /// `depth` is the call depth of the executing frame, starting at zero for the outermost
    /// frame.
    #[inline]
    fn step(&mut self, interp: &Interpreter, depth: usize) {
        let _ = interp;
        let _ = depth;
    }

    /// Called after each instruction.
    #[inline]
    fn step_end(&mut self, interp: &Interpreter, depth: usize) {
        let _ = interp;
        let _ = depth;
    }

    /// Called once the outermost frame of a transaction finished.
    #[inline]
    fn transaction_end(&mut self, result: &ExecutionResult, env: &Env) {
        let _ = result;
        let _ = env;
    }
}
