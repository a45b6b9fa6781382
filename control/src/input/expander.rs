use super::pin_map::Pin;

/// Access to the GPIO expander holding buttons and switches.
///
/// These calls perform bus transactions and must not be made from an
/// interrupt handler.
pub trait ExpanderBus {
    type Error;

    /// Electrical level of the pin, `true` for high.
    ///
    /// # Errors
    ///
    /// Fails when the expander does not respond.
    fn read_pin(&mut self, pin: Pin) -> Result<bool, Self::Error>;

    /// The pin that caused the most recent interrupt.
    ///
    /// # Errors
    ///
    /// Fails when the expander does not respond.
    fn last_interrupt_pin(&mut self) -> Result<Pin, Self::Error>;

    /// Release the interrupt line so the expander can signal again.
    ///
    /// # Errors
    ///
    /// Fails when the expander does not respond.
    fn clear_interrupt_latch(&mut self) -> Result<(), Self::Error>;
}
