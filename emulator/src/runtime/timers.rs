use std::sync::atomic::{AtomicU8, Ordering};

/// Delay and sound counters.
///
/// They are decremented by a driver at [`TIMER_FREQUENCY`](crate::constants::TIMER_FREQUENCY),
/// possibly from another thread than the one stepping the machine, so both are atomics: a read
/// always returns the latest committed value.
#[derive(Debug, Default)]
pub struct Timers {
    delay: AtomicU8,
    sound: AtomicU8,
}

fn decrement(counter: &AtomicU8) {
    // Err means the counter was already at zero
    let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1));
}

impl Timers {
    #[must_use]
    pub fn delay(&self) -> u8 {
        self.delay.load(Ordering::Acquire)
    }

    pub fn set_delay(&self, value: u8) {
        self.delay.store(value, Ordering::Release);
    }

    #[must_use]
    pub fn sound(&self) -> u8 {
        self.sound.load(Ordering::Acquire)
    }

    pub fn set_sound(&self, value: u8) {
        self.sound.store(value, Ordering::Release);
    }

    /// Whether the buzzer should currently sound
    #[must_use]
    pub fn is_sounding(&self) -> bool {
        self.sound() > 0
    }

    /// Decrement both counters by one, stopping at zero
    pub fn tick(&self) {
        decrement(&self.delay);
        decrement(&self.sound);
    }

    pub fn clear(&self) {
        self.set_delay(0);
        self.set_sound(0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn tick_test() {
        let timers = Timers::default();
        timers.set_delay(2);
        timers.set_sound(1);
        assert!(timers.is_sounding());

        timers.tick();
        assert_eq!(timers.delay(), 1);
        assert_eq!(timers.sound(), 0);
        assert!(!timers.is_sounding());

        timers.tick();
        timers.tick();
        assert_eq!(timers.delay(), 0);
        assert_eq!(timers.sound(), 0);
    }

    #[test]
    fn shared_tick_test() {
        let timers = Arc::new(Timers::default());
        timers.set_delay(200);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let timers = Arc::clone(&timers);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        timers.tick();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(timers.delay(), 100);
    }
}
