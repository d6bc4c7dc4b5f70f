use primitives::{STACK_LIMIT, U256};

/// EVM operand stack, limited to [`STACK_LIMIT`] items.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stack {
    /// The underlying data of the stack.
    data: Vec<U256>,
}

impl Default for Stack {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Instantiate a new stack with the [default stack limit][STACK_LIMIT].
    #[inline]
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(STACK_LIMIT),
        }
    }

    /// Returns the length of the stack in words.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the stack is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a reference to the underlying data buffer, bottom first.
    #[inline]
    pub fn data(&self) -> &[U256] {
        &self.data
    }

    /// Push a new value onto the stack.
    ///
    /// If it will exceed the stack limit, returns `false` and leaves the stack unchanged.
    #[inline]
    #[must_use]
    pub fn push(&mut self, value: U256) -> bool {
        if self.data.len() == STACK_LIMIT {
            return false;
        }
        self.data.push(value);
        true
    }

    /// Removes the topmost element from the stack and returns it, or `None` if it is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<U256> {
        self.data.pop()
    }

    /// Pops `N` values, topmost first.
    #[inline]
    pub fn popn<const N: usize>(&mut self) -> Option<[U256; N]> {
        if self.data.len() < N {
            return None;
        }
        let mut values = [U256::ZERO; N];
        for value in values.iter_mut() {
            *value = self.data.pop()?;
        }
        Some(values)
    }

    /// Pops `N` values and returns them with a mutable reference to the new top.
    #[inline]
    pub fn popn_top<const N: usize>(&mut self) -> Option<([U256; N], &mut U256)> {
        if self.data.len() <= N {
            return None;
        }
        let values = self.popn::<N>()?;
        let top = self.data.last_mut()?;
        Some((values, top))
    }

    /// Duplicates the `N`th value from the top of the stack.
    ///
    /// Returns `false` on underflow or overflow.
    #[inline]
    #[must_use]
    pub fn dup(&mut self, n: usize) -> bool {
        let len = self.data.len();
        if n == 0 || len < n {
            return false;
        }
        let value = self.data[len - n];
        self.push(value)
    }

    /// Swaps the topmost value with the `N`th value from the top.
    ///
    /// Returns `false` on underflow.
    #[inline]
    #[must_use]
    pub fn exchange_top(&mut self, n: usize) -> bool {
        let len = self.data.len();
        if n == 0 || len <= n {
            return false;
        }
        self.data.swap(len - 1, len - 1 - n);
        true
    }
}
