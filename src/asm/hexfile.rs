//! Machine-code file format for RISC-AR5 programs.
//!
//! A plain text format:
//! - One instruction per line, exactly four hexadecimal digits
//! - At most 64 instructions
//! - The first STOP line ends the program
//!
//! Loading never fails outright. Malformed lines are kept (as invalid
//! instructions) and their indices recorded so a front end can point at them.

use crate::cpu::Instruction;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum number of instructions read from one file.
pub const FILE_INSTRUCTION_LIMIT: usize = 64;

/// Prefix marking the source text of a malformed line.
const MALFORMED_MARKER: char = '*';

/// A loaded machine-code file and its diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexFile {
    /// Instructions in file order, malformed lines included.
    pub instructions: Vec<Instruction>,
    /// Indices into `instructions` of the malformed lines.
    pub error_lines: Vec<usize>,
    /// The file could be opened.
    pub loaded: bool,
    /// Every line was well formed and a STOP ended the program.
    pub valid: bool,
    /// More than 64 instructions were present.
    pub too_long: bool,
}

impl HexFile {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

fn is_hex_word(line: &str) -> bool {
    line.len() == 4 && line.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse machine code from text.
pub fn parse_hex(text: &str) -> HexFile {
    let mut file = HexFile {
        loaded: true,
        ..HexFile::default()
    };
    let mut has_stop = false;

    for line in text.lines() {
        let count = file.instructions.len();
        if count >= FILE_INSTRUCTION_LIMIT {
            warn!(limit = FILE_INSTRUCTION_LIMIT, "file too long, ignoring remaining lines");
            file.too_long = true;
            break;
        }

        if is_hex_word(line) {
            let instr = Instruction::from_hex(line);
            let halt = instr.is_halt();
            file.instructions.push(instr);
            if halt {
                has_stop = true;
                break;
            }
        } else {
            debug!(index = count, line, "malformed line");
            file.error_lines.push(count);
            file.instructions
                .push(Instruction::from_hex(&format!("{}{}", MALFORMED_MARKER, line)));
        }
    }

    file.valid = has_stop && file.error_lines.is_empty();
    file
}

/// Load a machine-code file from disk.
///
/// A file that cannot be read yields a `HexFile` with `loaded == false`.
/// Bytes that are not UTF-8 only make their own line malformed.
pub fn load_hex<P: AsRef<Path>>(path: P) -> HexFile {
    match std::fs::read(path.as_ref()) {
        Ok(bytes) => parse_hex(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!(path = %path.as_ref().display(), error = %e, "cannot read machine-code file");
            HexFile::default()
        }
    }
}

/// Save instructions as a machine-code file, one uppercase word per line.
pub fn save_hex<P: AsRef<Path>>(path: P, instructions: &[Instruction]) -> Result<(), HexFileError> {
    let mut file = std::fs::File::create(path.as_ref())?;
    for instr in instructions {
        writeln!(file, "{}", instr.to_hex())?;
    }
    Ok(())
}

/// Errors that can occur while writing machine-code files.
#[derive(Debug, Error)]
pub enum HexFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
