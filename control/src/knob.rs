//! Rotary knob position.

use core::cell::RefCell;

use critical_section::Mutex;

/// Hardware counter decoding the knob's quadrature signal.
pub trait QuadratureCounter {
    fn count(&self) -> i64;
    fn set_count(&mut self, value: i64);
    fn clear_count(&mut self);
}

/// Knob position shared between contexts.
///
/// The count is kept by the decoder itself, this only serializes access to
/// it. It is independent of the knob's button, which is read through the
/// expander like the other inputs.
pub struct Knob<Q> {
    counter: Mutex<RefCell<Q>>,
}

impl<Q: QuadratureCounter> Knob<Q> {
    pub const fn new(counter: Q) -> Self {
        Self {
            counter: Mutex::new(RefCell::new(counter)),
        }
    }

    #[must_use]
    pub fn get(&self) -> i64 {
        critical_section::with(|cs| self.counter.borrow_ref(cs).count())
    }

    pub fn set(&self, value: i64) {
        critical_section::with(|cs| self.counter.borrow_ref_mut(cs).set_count(value));
    }

    pub fn reset(&self) {
        critical_section::with(|cs| self.counter.borrow_ref_mut(cs).clear_count());
    }
}
