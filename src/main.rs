//! RISC-AR5 Emulator - CLI Entry Point
//!
//! Commands:
//! - `riscar5 run <program>` - Run an assembly or machine-code file
//! - `riscar5 asm <source>` - Assemble to a machine-code file
//! - `riscar5 check <file>` - Report machine-code file diagnostics
//! - `riscar5 disasm <file>` - Disassemble a machine-code file
//! - `riscar5 encode <line>` - Assemble a single instruction

use clap::{ArgAction, Parser, Subcommand};
use riscar5::asm::{self, disassemble_instruction, Assembler, InstructionSet};
use riscar5::bits;
use riscar5::cpu::{INPUT_ADDR, INPUT_SIZE, MEMORY_CELL_SIZE, OUTPUT_SIZE};
use riscar5::{Instruction, Processor};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riscar5")]
#[command(version = "0.1.0")]
#[command(about = "An emulator and assembler for the 8-bit RISC-AR5 processor")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the assembly (.asm) or machine-code file to execute
        program: PathBuf,
        /// Maximum number of cycles to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Print every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Characters to place on the input channel (at most 2)
        #[arg(short, long)]
        input: Option<String>,
        /// Write the final processor state as JSON
        #[arg(short, long)]
        dump: Option<PathBuf>,
    },
    /// Assemble source to a machine-code file
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output machine-code file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a machine-code file
    Check {
        /// Path to the machine-code file
        file: PathBuf,
    },
    /// Disassemble a machine-code file to readable text
    Disasm {
        /// Path to the machine-code file
        file: PathBuf,
    },
    /// Assemble one instruction and print its word
    Encode {
        /// Instruction text, e.g. "ldi 20"
        line: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, input, dump }) => {
            run_program(&program, max_cycles, trace, input.as_deref(), dump.as_deref());
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Check { file }) => {
            check_file(&file);
        }
        Some(Commands::Disasm { file }) => {
            disassemble_file(&file);
        }
        Some(Commands::Encode { line }) => {
            encode_line(&line);
        }
        None => {
            println!("RISC-AR5 Emulator v0.1.0");
            println!("An 8-bit processor with 16-bit instructions");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load a program from assembly or machine code, exiting on any error.
fn load_program(path: &Path) -> Vec<Instruction> {
    if path.extension().is_some_and(|ext| ext == "asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match asm::assemble(&source) {
            Ok(instrs) => {
                println!("📝 Assembled {} instructions", instrs.len());
                instrs
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let file = asm::load_hex(path);
        if !file.loaded {
            eprintln!("❌ Failed to load {}", path.display());
            std::process::exit(1);
        }
        if !file.valid {
            eprintln!("❌ {} is not a valid program", path.display());
            report_diagnostics(&file);
            std::process::exit(1);
        }
        println!("📂 Loaded {} instructions", file.len());
        file.instructions
    }
}

fn run_program(path: &Path, max_cycles: u64, trace: bool, input: Option<&str>, dump: Option<&Path>) {
    println!("🔧 Running: {}", path.display());

    let instructions = load_program(path);
    if instructions.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    let mut cpu = Processor::new();
    if let Err(e) = cpu.init(&instructions) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }
    if let Some(text) = input {
        cpu.input_channel_mut().write(text);
    }

    println!();
    println!("━━━ Execution ━━━");

    while cpu.is_running() && cpu.cycles < max_cycles {
        let pc = cpu.regs.pc.get();
        let instr = cpu.step();

        if trace {
            println!(
                "{:03}: {}  {:<10} ACC={:<4} SR={}",
                pc,
                instr.to_hex(),
                disassemble_instruction(&instr),
                cpu.regs.acc.get(),
                cpu.regs.sr
            );
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("State: {:?}", cpu.state);
    for reg in cpu.registers() {
        println!("  {}", reg);
    }
    println!("Flags:  {}", cpu.regs.sr);
    println!("Output: {:?}", cpu.output_channel().read());
    println!("I/O cells:");
    for (addr, value) in cpu.memory().dump(INPUT_ADDR, INPUT_SIZE + OUTPUT_SIZE) {
        println!("  {:03}: {:>4}  {}", addr, value, bits::to_twos_complement_string(value, MEMORY_CELL_SIZE));
    }

    if cpu.is_running() {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if let Some(dump_path) = dump {
        let json = match serde_json::to_string_pretty(&cpu) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(dump_path, json) {
            eprintln!("❌ Failed to write {}: {}", dump_path.display(), e);
            std::process::exit(1);
        }
        println!("✓ State written to {}", dump_path.display());
    }
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>) {
    let out_path = output.unwrap_or_else(|| source_path.with_extension("hex"));

    println!("📝 Assembling: {} → {}", source_path.display(), out_path.display());

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let instructions = match asm::assemble(&source) {
        Ok(instrs) => instrs,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} instructions", instructions.len());

    if let Err(e) = asm::save_hex(&out_path, &instructions) {
        eprintln!("❌ Failed to save {}: {}", out_path.display(), e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path.display());
}

fn report_diagnostics(file: &asm::HexFile) {
    for &index in &file.error_lines {
        eprintln!("  line {}: malformed instruction {:?}", index + 1, &file.instructions[index].source()[1..]);
    }
    if file.too_long {
        eprintln!("  more than {} instructions", asm::FILE_INSTRUCTION_LIMIT);
    }
    if !file.instructions.iter().any(Instruction::is_halt) {
        eprintln!("  no stop instruction");
    }
}

fn check_file(path: &Path) {
    let file = asm::load_hex(path);

    if !file.loaded {
        eprintln!("❌ Failed to load {}", path.display());
        std::process::exit(1);
    }

    println!("Instructions: {}", file.len());
    println!("Too long:     {}", file.too_long);
    println!("Valid:        {}", file.valid);

    if file.valid {
        println!("✓ {} is a valid program", path.display());
    } else {
        report_diagnostics(&file);
        std::process::exit(1);
    }
}

fn disassemble_file(path: &Path) {
    println!("📖 Disassembling: {}", path.display());
    println!();

    let file = asm::load_hex(path);
    if !file.loaded {
        eprintln!("❌ Failed to load {}", path.display());
        std::process::exit(1);
    }

    println!("{}", asm::disassemble(&file.instructions));
}

fn encode_line(line: &str) {
    let isa = InstructionSet::new();
    match Assembler::new(&isa).assemble_line(line, 1) {
        Ok(instr) => println!("{}", instr.to_hex()),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
