//! CPU execution engine for the RISC-AR5.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::bits;
use crate::cpu::alu::{self, Outcome};
use crate::cpu::decode::{AddressingMode, Instruction, Opcode};
use crate::cpu::{
    Flag, IoChannel, Memory, MemoryError, Register, Registers, INPUT_ADDR, INPUT_SIZE, IR_SIZE,
    MEMORY_SIZE, OUTPUT_ADDR, OUTPUT_SIZE, PC_INCREMENT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed STOP, or was stopped by its owner).
    Halted,
}

/// The RISC-AR5 processor.
///
/// The embedding application owns one instance per loaded program. `step`
/// and `run` take `&mut self`, so a processor is never driven from two
/// places at once.
#[derive(Clone, Serialize, Deserialize)]
pub struct Processor {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Cycles executed since the last `init`.
    pub cycles: u64,
    input: IoChannel,
    output: IoChannel,
}

impl Processor {
    /// Create a new processor with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            input: IoChannel::new(INPUT_SIZE),
            output: IoChannel::new(OUTPUT_SIZE),
        }
    }

    /// Reset the processor to its initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.input.clear();
        self.output.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
    }

    /// Reset the processor and load `program` into memory from address 0.
    pub fn init(&mut self, program: &[Instruction]) -> Result<(), MemoryError> {
        self.reset();
        self.mem.load_program(program)?;
        info!(instructions = program.len(), "program loaded");
        Ok(())
    }

    /// Execute a single fetch-decode-execute cycle.
    ///
    /// Returns the fetched instruction. An instruction with an undefined
    /// opcode still costs a cycle but has no other effect.
    pub fn step(&mut self) -> Instruction {
        // Fetch
        let pc = self.regs.pc.get() as usize;
        let instruction = Instruction::new(self.fetch(pc));

        self.regs.advance_pc();
        self.regs.ir.set(instruction.word());
        self.cycles += 1;

        self.sync_ports();

        // Decode
        let Some(op) = instruction.op() else {
            warn!(pc, word = %instruction.to_hex(), "skipping invalid instruction");
            return instruction;
        };
        trace!(pc, word = %instruction.to_hex(), %op, "execute");

        // Execute
        match op.mode() {
            AddressingMode::Implicit => self.implicit(op),
            AddressingMode::RegisterDirect => self.register_direct(op, instruction.register_index()),
            AddressingMode::Direct => self.direct(op, instruction.constant()),
            AddressingMode::Immediate => self.immediate(op, instruction.constant()),
        }

        self.sync_ports();

        instruction
    }

    /// Run until halt.
    ///
    /// Returns the number of cycles executed. A program that never reaches
    /// STOP makes this loop forever; use [`run_limited`](Self::run_limited)
    /// when that matters.
    pub fn run(&mut self) -> u64 {
        let start_cycles = self.cycles;

        while self.is_running() {
            self.step();
        }

        self.cycles - start_cycles
    }

    /// Run for at most `max_cycles` cycles.
    pub fn run_limited(&mut self, max_cycles: u64) -> u64 {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.is_running() && self.cycles < limit {
            self.step();
        }

        self.cycles - start_cycles
    }

    /// Read the instruction word at `addr`.
    fn fetch(&self, addr: usize) -> i32 {
        let cells = PC_INCREMENT as usize;
        if addr + cells <= self.mem.len() {
            return self.mem.read_many(addr, cells);
        }
        // Only an odd branch target gets here: the low byte wraps to cell 0.
        let high = self.mem.read(addr);
        let low = self.mem.read((addr + 1) % self.mem.len());
        bits::signed_bits((high << 8) | (low & 0xFF), 0, IR_SIZE - 1, IR_SIZE)
    }

    /// Copy the input channel into memory and the output cells into the
    /// output channel.
    ///
    /// Each output cell is read as an unsigned byte and mapped to the
    /// Latin-1 character with that code, so `-1` becomes `'ÿ'`.
    fn sync_ports(&mut self) {
        for (i, c) in self.input.read().chars().enumerate() {
            self.mem.write(INPUT_ADDR + i, u32::from(c) as i32);
        }

        let out: String = (0..OUTPUT_SIZE)
            .map(|i| char::from(self.mem.read(OUTPUT_ADDR + i) as u8))
            .collect();
        self.output.write(&out);
    }

    /// Store an ALU result in the accumulator and update the flags.
    fn apply(&mut self, outcome: Outcome) {
        outcome.apply(&mut self.regs.sr);
        self.regs.acc.set(outcome.result);
    }

    fn implicit(&mut self, op: Opcode) {
        let acc = self.regs.acc.get();
        let carry = self.regs.sr.is_set(Flag::Carry);

        match op {
            Opcode::Neg => self.apply(alu::neg(acc)),
            Opcode::Not => self.apply(alu::not(acc)),
            Opcode::Rlc => self.apply(alu::rlc(acc, carry)),
            Opcode::Rrc => self.apply(alu::rrc(acc, carry)),
            Opcode::Brz => self.branch_if(Flag::Zero),
            Opcode::Brc => self.branch_if(Flag::Carry),
            Opcode::Brn => self.branch_if(Flag::Negative),
            Opcode::Bro => self.branch_if(Flag::Overflow),
            Opcode::Nop => {}
            Opcode::Stop => {
                self.state = CpuState::Halted;
                info!(cycles = self.cycles, "processor halted");
            }
            _ => unreachable!("{} is not an implicit instruction", op),
        }
    }

    fn register_direct(&mut self, op: Opcode, index: usize) {
        let acc = self.regs.acc.get();
        let operand = self.regs.gpr[index].get();

        match op {
            Opcode::And => self.apply(alu::and(acc, operand)),
            Opcode::Or => self.apply(alu::or(acc, operand)),
            Opcode::Addc => {
                let carry = self.regs.sr.is_set(Flag::Carry);
                self.apply(alu::addc(acc, operand, carry));
            }
            Opcode::Sub => self.apply(alu::sub(acc, operand)),
            Opcode::Mul => self.apply(alu::mul(acc, operand)),
            Opcode::Ldar => self.apply(alu::load(operand)),
            Opcode::Star => self.regs.gpr[index].set(acc),
            _ => unreachable!("{} is not a register-direct instruction", op),
        }
    }

    fn direct(&mut self, op: Opcode, operand: i32) {
        let addr = Self::effective_address(operand);

        match op {
            Opcode::Ldaa => {
                let value = self.mem.read(addr);
                self.apply(alu::load(value));
            }
            Opcode::Staa => self.mem.write(addr, self.regs.acc.get()),
            _ => unreachable!("{} is not a direct instruction", op),
        }
    }

    fn immediate(&mut self, op: Opcode, operand: i32) {
        match op {
            Opcode::Ldai => self.apply(alu::load(operand)),
            _ => unreachable!("{} is not an immediate instruction", op),
        }
    }

    /// PC := R7 when `flag` is set.
    fn branch_if(&mut self, flag: Flag) {
        if self.regs.sr.is_set(flag) {
            let target = Self::effective_address(self.regs.gpr[7].get());
            debug!(?flag, target, "branch taken");
            self.regs.jump(target);
        }
    }

    /// Map a signed 8-bit address onto `0..MEMORY_SIZE`.
    #[inline]
    fn effective_address(value: i32) -> usize {
        value.rem_euclid(MEMORY_SIZE as i32) as usize
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Start or stop the processor.
    pub fn set_run(&mut self, run: bool) {
        self.state = if run { CpuState::Running } else { CpuState::Halted };
    }

    /// Look a register up by name (`R0`..`R7`, `ACC`, `IR`, `PC`, `SR`).
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.regs.by_name(name)
    }

    /// General purpose register `index`.
    ///
    /// # Panics
    /// Panics if `index` is not in `0..8`.
    pub fn gpr(&self, index: usize) -> &Register {
        &self.regs.gpr[index]
    }

    /// Every register: R0-R7, then ACC, IR, PC and SR.
    pub fn registers(&self) -> impl Iterator<Item = &Register> {
        self.regs.iter()
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Characters mirrored into cells 250-251.
    pub fn input_channel(&self) -> &IoChannel {
        &self.input
    }

    pub fn input_channel_mut(&mut self) -> &mut IoChannel {
        &mut self.input
    }

    /// Characters mirrored from cells 252-255.
    pub fn output_channel(&self) -> &IoChannel {
        &self.output
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn load(source: &str) -> Processor {
        let program = assemble(source).unwrap();
        let mut cpu = Processor::new();
        cpu.init(&program).unwrap();
        cpu
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = load("stop");

        let executed = cpu.run();

        assert_eq!(executed, 1);
        assert!(cpu.is_halted());
        assert_eq!(cpu.regs.pc.get(), 2);
    }

    #[test]
    fn test_load_immediate_then_stop() {
        let mut cpu = load("ldi 20\nstop");

        cpu.run();

        assert_eq!(cpu.regs.acc.get(), 20);
        assert_eq!(cpu.regs.pc.get(), 4);
        assert!(!cpu.is_running());
        assert_eq!(cpu.regs.ir.get() as u16, 0xF800);
    }

    #[test]
    fn test_step_executes_one_cycle() {
        let mut cpu = load("ldi 5\nnop\nstop");

        let instr = cpu.step();

        assert_eq!(instr.op(), Some(Opcode::Ldai));
        assert_eq!(cpu.regs.acc.get(), 5);
        assert_eq!(cpu.regs.pc.get(), 2);
        assert_eq!(cpu.cycles, 1);
        assert!(cpu.is_running());
    }

    #[test]
    fn test_invalid_instruction_is_skipped() {
        let program = [Instruction::new(0x1000), Instruction::from_hex("F800")];
        let mut cpu = Processor::new();
        cpu.init(&program).unwrap();

        let first = cpu.step();
        assert!(!first.is_valid());
        assert_eq!(cpu.regs.pc.get(), 2);
        assert_eq!(cpu.regs.ir.get(), 0x1000);
        assert!(cpu.is_running());

        assert_eq!(cpu.run(), 1);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_register_arithmetic() {
        let mut cpu = load(
            "ldi 6\n\
             star 1\n\
             ldi 9\n\
             sub 1\n\
             star 2\n\
             ldi 4\n\
             mul 2\n\
             stop",
        );

        cpu.run();

        assert_eq!(cpu.gpr(1).get(), 6);
        assert_eq!(cpu.gpr(2).get(), 3);
        assert_eq!(cpu.regs.acc.get(), 12);
        assert!(!cpu.regs.sr.is_set(Flag::Carry));
    }

    #[test]
    fn test_addc_sets_carry_and_zero() {
        let mut cpu = load("ldi -1\nstar 1\nldi 1\naddc 1\nstop");

        cpu.run();

        assert_eq!(cpu.regs.acc.get(), 0);
        assert!(cpu.regs.sr.is_set(Flag::Carry));
        assert!(cpu.regs.sr.is_set(Flag::Zero));
        assert!(!cpu.regs.sr.is_set(Flag::Overflow));
    }

    #[test]
    fn test_branch_taken() {
        let mut cpu = load(
            "ldi 10\n\
             star 7\n\
             ldi 0\n\
             brz\n\
             ldi 1\n\
             stop",
        );

        cpu.run();

        assert_eq!(cpu.regs.acc.get(), 0);
        assert_eq!(cpu.regs.pc.get(), 12);
        assert_eq!(cpu.cycles, 5);
    }

    #[test]
    fn test_branch_not_taken() {
        let mut cpu = load(
            "ldi 10\n\
             star 7\n\
             ldi 5\n\
             brz\n\
             ldi 1\n\
             stop",
        );

        cpu.run();

        assert_eq!(cpu.regs.acc.get(), 1);
        assert_eq!(cpu.cycles, 6);
    }

    #[test]
    fn test_direct_addressing_wraps_negative() {
        let mut cpu = load("ldi 42\nsta -1\nldi 7\nsta 255\nldi 0\nlda 255\nstop");

        cpu.run();

        assert_eq!(cpu.mem.read(255), 7);
        assert_eq!(cpu.regs.acc.get(), 7);
        assert!(!cpu.regs.sr.is_set(Flag::Zero));
    }

    #[test]
    fn test_memory_mapped_io() {
        let mut cpu = load("lda 250\nsta 252\nlda 251\nsta 253\nstop");
        cpu.input_channel_mut().write("hi!");

        cpu.run();

        assert_eq!(cpu.input_channel().read(), "hi");
        assert_eq!(cpu.output_channel().read(), "hi\0\0");
        assert_eq!(cpu.mem.read(250), 'h' as i32);
    }

    #[test]
    fn test_run_limited_stops_endless_loop() {
        let mut cpu = load("ldi 0\nstar 7\nbrz\nstop");

        let executed = cpu.run_limited(100);

        assert_eq!(executed, 100);
        assert!(cpu.is_running());
    }

    #[test]
    fn test_odd_branch_target_wraps_fetch() {
        let mut cpu = load(
            "ldi -8\n\
             sta 255\n\
             ldi -1\n\
             star 7\n\
             ldi 0\n\
             brz\n\
             nop",
        );

        cpu.run_limited(50);

        assert!(cpu.is_halted());
        assert_eq!(cpu.regs.pc.get(), 1);
    }

    #[test]
    fn test_set_run_and_init_reset() {
        let mut cpu = load("ldi 3\nnop\nstop");
        cpu.step();
        cpu.set_run(false);
        assert_eq!(cpu.run(), 0);

        cpu.init(&assemble("stop").unwrap()).unwrap();
        assert!(cpu.is_running());
        assert_eq!(cpu.regs.acc.get(), 0);
        assert_eq!(cpu.cycles, 0);
        assert_eq!(cpu.memory().read_many(0, 2) as u16, 0xF800);
    }

    #[test]
    fn test_register_access() {
        let mut cpu = load("ldi -3\nstar 4\nstop");
        cpu.run();

        assert_eq!(cpu.register("R4").unwrap().get(), -3);
        assert_eq!(cpu.register("PC").unwrap().get(), 6);
        assert!(cpu.register("XYZ").is_none());
        assert_eq!(cpu.registers().count(), 12);
        assert_eq!(cpu.memory().read_many(0, 2), 0x70FD);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut cpu = load("ldi 1\nstop");
        cpu.run();

        let json = serde_json::to_string(&cpu).unwrap();
        assert!(json.contains("\"state\":\"Halted\""));

        let restored: Processor = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.regs, cpu.regs);
    }

    fn run_to_halt(source: &str) -> Processor {
        let mut cpu = load(source);
        cpu.run_limited(1000);
        assert!(cpu.is_halted(), "program did not halt:\n{}", source);
        cpu
    }

    fn flags(cpu: &Processor) -> String {
        cpu.regs.sr.to_string()
    }

    #[test]
    fn test_run_limited_after_steps_does_not_overflow() {
        let mut cpu = load("nop\nnop\nstop");
        cpu.step();

        assert_eq!(cpu.run_limited(u64::MAX), 2);
        assert!(cpu.is_halted());
        assert_eq!(cpu.cycles, 3);
    }

    #[test]
    fn test_and_clears_carry() {
        let cpu = run_to_halt(
            "ldi -1\n\
             star 1\n\
             ldi 1\n\
             addc 1\n\
             ldi 12\n\
             star 2\n\
             ldi 10\n\
             and 2\n\
             stop",
        );

        assert_eq!(cpu.regs.acc.get(), 8);
        assert_eq!(flags(&cpu), "----");
    }

    #[test]
    fn test_or() {
        let cpu = run_to_halt("ldi 12\nstar 2\nldi -112\nor 2\nstop");

        assert_eq!(cpu.regs.acc.get(), -100);
        assert_eq!(flags(&cpu), "--N-");
    }

    #[test]
    fn test_neg_and_not() {
        let cpu = run_to_halt("ldi 5\nneg\nstop");
        assert_eq!(cpu.regs.acc.get(), -5);
        assert_eq!(flags(&cpu), "--N-");

        let cpu = run_to_halt("ldi 5\nnot\nstop");
        assert_eq!(cpu.regs.acc.get(), -6);
        assert_eq!(flags(&cpu), "--N-");

        let cpu = run_to_halt("ldi -1\nnot\nstop");
        assert_eq!(cpu.regs.acc.get(), 0);
        assert_eq!(flags(&cpu), "Z---");
    }

    #[test]
    fn test_rotate_left_through_carry() {
        // addc leaves C set, ldi keeps it, rlc shifts it into bit 0.
        let cpu = run_to_halt("ldi -1\nstar 1\nldi 1\naddc 1\nldi 65\nrlc\nstop");

        assert_eq!(cpu.regs.acc.get(), -125);
        assert_eq!(flags(&cpu), "--N-");
    }

    #[test]
    fn test_rotate_right_through_carry() {
        let cpu = run_to_halt("ldi -1\nstar 1\nldi 1\naddc 1\nldi 65\nrrc\nstop");

        assert_eq!(cpu.regs.acc.get(), -96);
        assert_eq!(flags(&cpu), "-CN-");
    }

    #[test]
    fn test_ldar_keeps_carry_and_overflow() {
        let mut cpu = load("ldi -128\nstar 1\naddc 1\nldar 1\nstop");

        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.regs.acc.get(), 0);
        assert_eq!(flags(&cpu), "ZC-V");

        let instr = cpu.step();
        assert_eq!(instr.op(), Some(Opcode::Ldar));
        assert_eq!(cpu.regs.acc.get(), -128);
        assert_eq!(flags(&cpu), "-CNV");
    }

    #[test]
    fn test_brc_follows_carry() {
        let cpu = run_to_halt(
            "ldi 16\n\
             star 7\n\
             ldi 2\n\
             star 1\n\
             ldi -1\n\
             addc 1\n\
             brc\n\
             ldi 5\n\
             stop",
        );

        assert_eq!(cpu.regs.acc.get(), 1);
        assert_eq!(cpu.regs.pc.get(), 18);
        assert_eq!(flags(&cpu), "-C--");
    }

    #[test]
    fn test_brn_follows_negative() {
        let cpu = run_to_halt("ldi 10\nstar 7\nldi -5\nbrn\nldi 5\nstop");

        assert_eq!(cpu.regs.acc.get(), -5);
        assert_eq!(cpu.regs.pc.get(), 12);
        assert_eq!(flags(&cpu), "--N-");
    }

    #[test]
    fn test_bro_follows_overflow() {
        // -1 - (-5): both operands negative, result positive.
        let cpu = run_to_halt(
            "ldi 16\n\
             star 7\n\
             ldi -5\n\
             star 1\n\
             ldi -1\n\
             sub 1\n\
             bro\n\
             ldi 5\n\
             stop",
        );

        assert_eq!(cpu.regs.acc.get(), 4);
        assert_eq!(cpu.regs.pc.get(), 18);
        assert_eq!(flags(&cpu), "---V");
    }

    #[test]
    fn test_branches_ignore_other_flags() {
        // Only N is set: BRZ, BRC and BRO all fall through.
        for branch in ["brz", "brc", "bro"] {
            let source = format!("ldi 10\nstar 7\nldi -5\n{}\nldi 5\nstop", branch);
            let cpu = run_to_halt(&source);
            assert_eq!(cpu.regs.acc.get(), 5, "{} should not branch", branch);
        }
    }

    #[test]
    fn test_output_bytes_map_to_latin1() {
        let cpu = run_to_halt("ldi -1\nsta 255\nldi 65\nsta 252\nstop");
        assert_eq!(cpu.output_channel().read(), "A\0\0\u{ff}");
    }
}
