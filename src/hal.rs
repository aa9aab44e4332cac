//! The hardware-abstraction seam this crate is built against.
//!
//! `HwInterface` is deliberately narrower than a raw GPIO/ADC pin pair: it
//! names the operations a reader-side protocol engine actually needs
//! (field control, sampling, tick bookkeeping, cooperative cancellation) so
//! that a host can implement it directly against an FPGA/CPLD LF front end
//! without going through `embedded-hal` pin traits that don't model things
//! like "configure the LF reader FPGA core" or "ticks since field start".

/// Hardware and timing operations the protocol engine needs from its host.
///
/// Implementors are expected to be cheap to call repeatedly from a
/// busy-wait loop: none of these methods may block for an unbounded time,
/// allocate, or yield to a scheduler. `now_ticks`/`wait_ticks` form the only
/// timing primitive the engine uses; there is no sleep/yield point anywhere
/// in this crate.
pub trait HwInterface {
    /// Error type surfaced by the underlying peripheral access, if any.
    type Error;

    /// Configure the LF reader FPGA/CPLD core for EM4x70-family signalling
    /// (125 kHz field, reader-talk-first framing) and energize the field.
    fn fpga_configure_lf_reader(&mut self) -> Result<(), Self::Error>;

    /// Take one raw ADC sample of the demodulated envelope (0-255).
    /// High/low discrimination against the sampler's hysteresis band is
    /// performed in-crate by [`crate::timing::classify_sample`], not by
    /// the implementor.
    fn adc_sample(&mut self) -> Result<u8, Self::Error>;

    /// Drive the field to its "high" (unmodulated) state.
    fn mod_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the field to its "low" (modulated) state.
    fn mod_low(&mut self) -> Result<(), Self::Error>;

    /// Ticks elapsed since the free-running tick counter was last started.
    fn now_ticks(&mut self) -> u32;

    /// Busy-wait until `now_ticks()` has advanced by at least `ticks`.
    fn wait_ticks(&mut self, ticks: u32);

    /// (Re)start the free-running tick counter at zero.
    fn start_ticks(&mut self);

    /// Stop the free-running tick counter.
    fn stop_ticks(&mut self);

    /// Kick the watchdog timer. Called periodically from long-running
    /// loops (listen-window search, brute force) so a stuck loop still
    /// resets the device instead of hanging it.
    fn watchdog_kick(&mut self);

    /// Whether the device's physical abort button is currently pressed.
    fn button_pressed(&mut self) -> bool;

    /// Whether the host has asked this operation to stop (e.g. a
    /// command-line Ctrl-C forwarded over the host link).
    fn host_abort_pending(&mut self) -> bool;
}
