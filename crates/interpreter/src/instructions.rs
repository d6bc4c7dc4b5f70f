//! Instruction implementations and the opcode dispatch table.

#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod contract;
mod control;
mod host;
mod host_env;
mod memory;
mod stack;
mod system;

use crate::{opcode::*, Host, Interpreter};

/// Signature shared by every instruction.
pub type Instruction = fn(&mut Interpreter, &mut dyn Host);

/// Dispatch table indexed by opcode.
pub type InstructionTable = [Instruction; 256];

static INSTRUCTION_TABLE: InstructionTable = make_instruction_table();

/// Returns the dispatch table. Undefined opcodes halt with `OpcodeNotFound`.
#[inline]
pub fn instruction_table() -> &'static InstructionTable {
    &INSTRUCTION_TABLE
}

const fn make_instruction_table() -> InstructionTable {
    let mut table: InstructionTable = [control::unknown as Instruction; 256];

    table[STOP as usize] = control::stop;
    table[ADD as usize] = arithmetic::add;
    table[MUL as usize] = arithmetic::mul;
    table[SUB as usize] = arithmetic::sub;
    table[DIV as usize] = arithmetic::div;
    table[SDIV as usize] = arithmetic::sdiv;
    table[MOD as usize] = arithmetic::rem;
    table[SMOD as usize] = arithmetic::smod;
    table[ADDMOD as usize] = arithmetic::addmod;
    table[MULMOD as usize] = arithmetic::mulmod;
    table[EXP as usize] = arithmetic::exp;
    table[SIGNEXTEND as usize] = arithmetic::signextend;

    table[LT as usize] = bitwise::lt;
    table[GT as usize] = bitwise::gt;
    table[SLT as usize] = bitwise::slt;
    table[SGT as usize] = bitwise::sgt;
    table[EQ as usize] = bitwise::eq;
    table[ISZERO as usize] = bitwise::iszero;
    table[AND as usize] = bitwise::bitand;
    table[OR as usize] = bitwise::bitor;
    table[XOR as usize] = bitwise::bitxor;
    table[NOT as usize] = bitwise::not;
    table[BYTE as usize] = bitwise::byte;
    table[SHL as usize] = bitwise::shl;
    table[SHR as usize] = bitwise::shr;
    table[SAR as usize] = bitwise::sar;

    table[KECCAK256 as usize] = system::keccak256_op;

    table[ADDRESS as usize] = system::address;
    table[BALANCE as usize] = host::balance;
    table[ORIGIN as usize] = host_env::origin;
    table[CALLER as usize] = system::caller;
    table[CALLVALUE as usize] = system::callvalue;
    table[CALLDATALOAD as usize] = system::calldataload;
    table[CALLDATASIZE as usize] = system::calldatasize;
    table[CALLDATACOPY as usize] = system::calldatacopy;
    table[CODESIZE as usize] = system::codesize;
    table[CODECOPY as usize] = system::codecopy;
    table[GASPRICE as usize] = host_env::gasprice;
    table[EXTCODESIZE as usize] = host::extcodesize;
    table[EXTCODECOPY as usize] = host::extcodecopy;
    table[RETURNDATASIZE as usize] = system::returndatasize;
    table[RETURNDATACOPY as usize] = system::returndatacopy;
    table[EXTCODEHASH as usize] = host::extcodehash;

    table[BLOCKHASH as usize] = host::blockhash;
    table[COINBASE as usize] = host_env::coinbase;
    table[TIMESTAMP as usize] = host_env::timestamp;
    table[NUMBER as usize] = host_env::block_number;
    table[DIFFICULTY as usize] = host_env::difficulty;
    table[GASLIMIT as usize] = host_env::gaslimit;
    table[CHAINID as usize] = host_env::chainid;
    table[SELFBALANCE as usize] = host::selfbalance;
    table[BASEFEE as usize] = host_env::basefee;
    table[BLOBHASH as usize] = host_env::blob_hash;
    table[BLOBBASEFEE as usize] = host_env::blob_basefee;

    table[POP as usize] = stack::pop;
    table[MLOAD as usize] = memory::mload;
    table[MSTORE as usize] = memory::mstore;
    table[MSTORE8 as usize] = memory::mstore8;
    table[SLOAD as usize] = host::sload;
    table[SSTORE as usize] = host::sstore;
    table[JUMP as usize] = control::jump;
    table[JUMPI as usize] = control::jumpi;
    table[PC as usize] = control::pc;
    table[MSIZE as usize] = memory::msize;
    table[GAS as usize] = system::gas;
    table[JUMPDEST as usize] = control::jumpdest;
    table[TLOAD as usize] = host::tload;
    table[TSTORE as usize] = host::tstore;
    table[MCOPY as usize] = memory::mcopy;

    table[PUSH0 as usize] = stack::push0;
    table[PUSH1 as usize] = stack::push::<1>;
    table[PUSH2 as usize] = stack::push::<2>;
    table[PUSH3 as usize] = stack::push::<3>;
    table[PUSH4 as usize] = stack::push::<4>;
    table[PUSH5 as usize] = stack::push::<5>;
    table[PUSH6 as usize] = stack::push::<6>;
    table[PUSH7 as usize] = stack::push::<7>;
    table[PUSH8 as usize] = stack::push::<8>;
    table[PUSH9 as usize] = stack::push::<9>;
    table[PUSH10 as usize] = stack::push::<10>;
    table[PUSH11 as usize] = stack::push::<11>;
    table[PUSH12 as usize] = stack::push::<12>;
    table[PUSH13 as usize] = stack::push::<13>;
    table[PUSH14 as usize] = stack::push::<14>;
    table[PUSH15 as usize] = stack::push::<15>;
    table[PUSH16 as usize] = stack::push::<16>;
    table[PUSH17 as usize] = stack::push::<17>;
    table[PUSH18 as usize] = stack::push::<18>;
    table[PUSH19 as usize] = stack::push::<19>;
    table[PUSH20 as usize] = stack::push::<20>;
    table[PUSH21 as usize] = stack::push::<21>;
    table[PUSH22 as usize] = stack::push::<22>;
    table[PUSH23 as usize] = stack::push::<23>;
    table[PUSH24 as usize] = stack::push::<24>;
    table[PUSH25 as usize] = stack::push::<25>;
    table[PUSH26 as usize] = stack::push::<26>;
    table[PUSH27 as usize] = stack::push::<27>;
    table[PUSH28 as usize] = stack::push::<28>;
    table[PUSH29 as usize] = stack::push::<29>;
    table[PUSH30 as usize] = stack::push::<30>;
    table[PUSH31 as usize] = stack::push::<31>;
    table[PUSH32 as usize] = stack::push::<32>;

    table[DUP1 as usize] = stack::dup::<1>;
    table[DUP2 as usize] = stack::dup::<2>;
    table[DUP3 as usize] = stack::dup::<3>;
    table[DUP4 as usize] = stack::dup::<4>;
    table[DUP5 as usize] = stack::dup::<5>;
    table[DUP6 as usize] = stack::dup::<6>;
    table[DUP7 as usize] = stack::dup::<7>;
    table[DUP8 as usize] = stack::dup::<8>;
    table[DUP9 as usize] = stack::dup::<9>;
    table[DUP10 as usize] = stack::dup::<10>;
    table[DUP11 as usize] = stack::dup::<11>;
    table[DUP12 as usize] = stack::dup::<12>;
    table[DUP13 as usize] = stack::dup::<13>;
    table[DUP14 as usize] = stack::dup::<14>;
    table[DUP15 as usize] = stack::dup::<15>;
    table[DUP16 as usize] = stack::dup::<16>;

    table[SWAP1 as usize] = stack::swap::<1>;
    table[SWAP2 as usize] = stack::swap::<2>;
    table[SWAP3 as usize] = stack::swap::<3>;
    table[SWAP4 as usize] = stack::swap::<4>;
    table[SWAP5 as usize] = stack::swap::<5>;
    table[SWAP6 as usize] = stack::swap::<6>;
    table[SWAP7 as usize] = stack::swap::<7>;
    table[SWAP8 as usize] = stack::swap::<8>;
    table[SWAP9 as usize] = stack::swap::<9>;
    table[SWAP10 as usize] = stack::swap::<10>;
    table[SWAP11 as usize] = stack::swap::<11>;
    table[SWAP12 as usize] = stack::swap::<12>;
    table[SWAP13 as usize] = stack::swap::<13>;
    table[SWAP14 as usize] = stack::swap::<14>;
    table[SWAP15 as usize] = stack::swap::<15>;
    table[SWAP16 as usize] = stack::swap::<16>;

    table[LOG0 as usize] = host::log::<0>;
    table[LOG1 as usize] = host::log::<1>;
    table[LOG2 as usize] = host::log::<2>;
    table[LOG3 as usize] = host::log::<3>;
    table[LOG4 as usize] = host::log::<4>;

    table[CREATE as usize] = contract::create::<false>;
    table[CALL as usize] = contract::call;
    table[RETURN as usize] = control::ret;
    table[DELEGATECALL as usize] = contract::delegate_call;
    table[CREATE2 as usize] = contract::create::<true>;
    table[STATICCALL as usize] = contract::static_call;
    table[REVERT as usize] = control::revert;
    table[INVALID as usize] = control::invalid;

    table
}
