use thiserror::Error;

use crate::constants::{Address, Word, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The accessed range goes past the end of memory
    #[error("access of {len} byte(s) at {address:#05X} is out of range")]
    OutOfRange { address: Address, len: usize },
}

/// Holds the memory cells of the machine.
///
/// Every access is bounds-checked: an out of range address is reported as a
/// [`MemoryError`] instead of panicking.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[Word; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory([...; {MEMORY_SIZE}])")
    }
}

impl Memory {
    fn range(address: Address, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = usize::from(address);
        match start.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(start..end),
            _ => Err(MemoryError::OutOfRange { address, len }),
        }
    }

    /// Get a cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: Address) -> Result<Word, MemoryError> {
        self.inner
            .get(usize::from(address))
            .copied()
            .ok_or(MemoryError::OutOfRange { address, len: 1 })
    }

    /// Get a mutable reference to a cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get_mut(&mut self, address: Address) -> Result<&mut Word, MemoryError> {
        self.inner
            .get_mut(usize::from(address))
            .ok_or(MemoryError::OutOfRange { address, len: 1 })
    }

    /// Read a big-endian 16-bit value from two adjacent cells
    ///
    /// # Errors
    ///
    /// It fails if either cell is out of bounds.
    pub fn read_u16(&self, address: Address) -> Result<u16, MemoryError> {
        let bytes = self.slice(address, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Borrow `len` cells starting at `address`
    ///
    /// # Errors
    ///
    /// It fails if the range does not fit in memory.
    pub fn slice(&self, address: Address, len: usize) -> Result<&[Word], MemoryError> {
        let range = Self::range(address, len)?;
        Ok(&self.inner[range])
    }

    /// Mutably borrow `len` cells starting at `address`
    ///
    /// # Errors
    ///
    /// It fails if the range does not fit in memory.
    pub fn slice_mut(&mut self, address: Address, len: usize) -> Result<&mut [Word], MemoryError> {
        let range = Self::range(address, len)?;
        Ok(&mut self.inner[range])
    }

    /// Copy `data` into memory at `address`. Nothing is written if it does not fit.
    ///
    /// # Errors
    ///
    /// It fails if the range does not fit in memory.
    pub fn write_all(&mut self, address: Address, data: &[Word]) -> Result<(), MemoryError> {
        self.slice_mut(address, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Zero every cell
    pub fn clear(&mut self) {
        self.inner.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_test() {
        let mut memory = Memory::default();
        assert_eq!(memory.get(0xFFF), Ok(0));
        assert_eq!(
            memory.get(0x1000),
            Err(MemoryError::OutOfRange {
                address: 0x1000,
                len: 1
            })
        );
        assert!(memory.get_mut(0x1000).is_err());
        assert!(memory.slice(0xFFE, 2).is_ok());
        assert_eq!(
            memory.slice(0xFFF, 2),
            Err(MemoryError::OutOfRange {
                address: 0xFFF,
                len: 2
            })
        );
    }

    #[test]
    fn write_all_is_atomic_test() {
        let mut memory = Memory::default();
        assert!(memory.write_all(0xFFE, &[1, 2, 3]).is_err());
        assert_eq!(memory.slice(0xFFE, 2).unwrap(), &[0, 0]);

        memory.write_all(0x200, &[0x12, 0x34]).unwrap();
        assert_eq!(memory.read_u16(0x200), Ok(0x1234));
    }

    #[test]
    fn clear_test() {
        let mut memory = Memory::default();
        *memory.get_mut(0x42).unwrap() = 7;
        memory.clear();
        assert_eq!(memory, Memory::default());
    }
}
