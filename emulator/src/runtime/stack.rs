use crate::constants::{Address, STACK_DEPTH};

use super::exception::Exception;

/// Fixed-depth stack of return addresses
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallStack {
    slots: [Address; STACK_DEPTH],
    sp: usize,
}

impl CallStack {
    /// Push a return address. The stack is left untouched on overflow.
    ///
    /// # Errors
    ///
    /// Raises [`Exception::StackOverflow`] if all slots are used.
    pub fn push(&mut self, address: Address) -> Result<(), Exception> {
        let slot = self.slots.get_mut(self.sp).ok_or(Exception::StackOverflow)?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    /// Pop the last return address
    ///
    /// # Errors
    ///
    /// Raises [`Exception::StackUnderflow`] if the stack is empty.
    pub fn pop(&mut self) -> Result<Address, Exception> {
        let sp = self.sp.checked_sub(1).ok_or(Exception::StackUnderflow)?;
        self.sp = sp;
        Ok(self.slots[sp])
    }

    /// Stack pointer, in `0..=STACK_DEPTH`
    #[must_use]
    pub const fn sp(&self) -> usize {
        self.sp
    }

    /// Move the stack pointer back to the bottom, keeping the slots
    pub fn reset_pointer(&mut self) {
        self.sp = 0;
    }

    /// Raw slots, including the ones above the stack pointer
    #[must_use]
    pub const fn slots(&self) -> &[Address; STACK_DEPTH] {
        &self.slots
    }

    /// Return addresses currently on the stack, bottom first
    #[must_use]
    pub fn frames(&self) -> &[Address] {
        &self.slots[..self.sp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_test() {
        let mut stack = CallStack::default();
        assert_eq!(stack.pop(), Err(Exception::StackUnderflow));

        stack.push(0x200).unwrap();
        stack.push(0x300).unwrap();
        assert_eq!(stack.sp(), 2);
        assert_eq!(stack.frames(), &[0x200, 0x300]);

        assert_eq!(stack.pop(), Ok(0x300));
        assert_eq!(stack.pop(), Ok(0x200));
        assert_eq!(stack.sp(), 0);
    }

    #[test]
    fn overflow_test() {
        let mut stack = CallStack::default();
        for i in 0..STACK_DEPTH {
            stack.push(u16::try_from(i).unwrap()).unwrap();
        }
        let before = stack.clone();
        assert_eq!(stack.push(0xABC), Err(Exception::StackOverflow));
        assert_eq!(stack, before);
    }
}
