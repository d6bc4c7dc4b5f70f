use crate::opcode;
use bitvec::{bitvec, order::Lsb0, vec::BitVec};

/// Valid `JUMPDEST` positions of a piece of code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct JumpTable(BitVec<u8>);

impl JumpTable {
    /// Returns `true` if `pc` is a valid jump destination.
    #[inline]
    pub fn is_valid(&self, pc: usize) -> bool {
        self.0.get(pc).is_some_and(|bit| *bit)
    }
}

/// Analyzes the bytecode for use in [`Interpreter`][crate::Interpreter].
///
/// Marks every `JUMPDEST` that is not part of a `PUSH` immediate.
pub fn analyze_legacy(code: &[u8]) -> JumpTable {
    let mut jumps: BitVec<u8> = bitvec![u8, Lsb0; 0; code.len()];
    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if op == opcode::JUMPDEST {
            jumps.set(i, true);
            i += 1;
        } else if opcode::is_push(op) {
            i += 1 + (op - opcode::PUSH1 + 1) as usize;
        } else {
            i += 1;
        }
    }
    JumpTable(jumps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_inside_push_is_invalid() {
        let code = [opcode::PUSH1, opcode::JUMPDEST, opcode::JUMPDEST, opcode::PUSH2, 0x5b];
        let table = analyze_legacy(&code);
        assert!(!table.is_valid(1));
        assert!(table.is_valid(2));
        assert!(!table.is_valid(4));
        assert!(!table.is_valid(100));
    }
}
