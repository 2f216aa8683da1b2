//! RISC-AR5 memory subsystem.
//!
//! Memory is a flat array of fixed-width cells stored big-endian: a multi-cell
//! value keeps its most significant cell at the lowest address.

use crate::bits;
use crate::cpu::{Instruction, IR_SIZE, MEMORY_CELL_SIZE, MEMORY_SIZE, PC_INCREMENT};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Cell memory. The RISC-AR5 uses 256 cells of 8 bits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Raw cell contents, masked to `cell_size` bits.
    cells: Vec<u32>,
    cell_size: u32,
}

impl Memory {
    /// Create the RISC-AR5 memory (256 x 8 bits) with all cells zeroed.
    pub fn new() -> Self {
        Self::with_geometry(MEMORY_SIZE, MEMORY_CELL_SIZE)
    }

    /// Create a memory of `num_cells` cells, each `cell_size` bits wide.
    ///
    /// # Panics
    /// Panics if `cell_size` is not in `1..=32`.
    pub fn with_geometry(num_cells: usize, cell_size: u32) -> Self {
        assert!(
            (1..=bits::HOST_BITS).contains(&cell_size),
            "cell size {} is not in 1..=32",
            cell_size
        );
        Self {
            cells: vec![0; num_cells],
            cell_size,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the memory has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Width of one cell in bits.
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    fn cell_mask(&self) -> u32 {
        if self.cell_size == bits::HOST_BITS {
            u32::MAX
        } else {
            (1 << self.cell_size) - 1
        }
    }

    #[inline]
    fn check_addr(&self, addr: usize) {
        assert!(
            addr < self.cells.len(),
            "memory address {} out of range (0-{})",
            addr,
            self.cells.len() - 1
        );
    }

    /// Read one cell, sign-extended over the cell width.
    ///
    /// # Panics
    /// Panics if `addr` is out of range.
    #[inline]
    pub fn read(&self, addr: usize) -> i32 {
        self.check_addr(addr);
        bits::signed_bits(self.cells[addr] as i32, 0, self.cell_size - 1, self.cell_size)
    }

    /// Read `count` consecutive cells as one big-endian value, sign-extended
    /// over `count * cell_size` bits.
    ///
    /// # Panics
    /// Panics if any address is out of range or the value is wider than 32 bits.
    pub fn read_many(&self, addr: usize, count: usize) -> i32 {
        let width = count as u32 * self.cell_size;
        assert!(
            count > 0 && width <= bits::HOST_BITS,
            "cannot fetch {} cells of {} bits into an i32",
            count, self.cell_size
        );
        self.check_addr(addr + count - 1);

        let mut value: u32 = 0;
        for (i, &cell) in self.cells[addr..addr + count].iter().enumerate() {
            value |= cell;
            if i != count - 1 {
                value <<= self.cell_size;
            }
        }
        bits::signed_bits(value as i32, 0, width - 1, width)
    }

    /// Write one cell, keeping only the low `cell_size` bits of `value`.
    ///
    /// # Panics
    /// Panics if `addr` is out of range.
    #[inline]
    pub fn write(&mut self, addr: usize, value: i32) {
        self.check_addr(addr);
        self.cells[addr] = value as u32 & self.cell_mask();
    }

    /// Spread the `num_bits`-wide `value` across `ceil(num_bits / cell_size)`
    /// cells starting at `addr`, most significant slice first.
    ///
    /// # Panics
    /// Panics if any address is out of range or the span is wider than 32 bits.
    pub fn write_bits(&mut self, addr: usize, value: i32, num_bits: u32) {
        let num_cells = num_bits.div_ceil(self.cell_size);
        let width = num_cells * self.cell_size;
        for i in 0..num_cells {
            let start = i * self.cell_size;
            let end = start + self.cell_size - 1;
            let slice = bits::signed_bits(value, start, end, width);
            self.write(addr + i as usize, slice);
        }
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Store a program from address 0, one instruction word per
    /// `PC_INCREMENT` cells.
    pub fn load_program(&mut self, program: &[Instruction]) -> Result<(), MemoryError> {
        let step = PC_INCREMENT as usize;
        let needed = program.len() * step;
        if needed > self.cells.len() {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: self.cells.len() / step,
            });
        }

        for (i, instruction) in program.iter().enumerate() {
            self.write_bits(i * step, instruction.word(), IR_SIZE);
        }

        Ok(())
    }

    /// Cells `start..start + count` as `(address, signed value)` pairs,
    /// clipped to the end of memory.
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, i32)> {
        let end = (start + count).min(self.cells.len());
        (start..end).map(|i| (i, self.read(i))).collect()
    }

    /// Raw (unsigned) cell contents.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .field("cell_size", &self.cell_size)
            .finish()
    }
}

/// One line per cell: `AA: bbbbbbbb`.
impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (addr, &cell) in self.cells.iter().enumerate() {
            writeln!(
                f,
                "{:02X}: {}",
                addr,
                bits::to_twos_complement_string(cell as i32, self.cell_size)
            )?;
        }
        Ok(())
    }
}

/// Errors that can occur while loading memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program of {size} instructions exceeds the {available} that fit in memory")]
    ProgramTooLarge { size: usize, available: usize },
}
