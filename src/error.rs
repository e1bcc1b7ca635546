//! Error types for stepper-pulse library.
//!
//! Nothing in the motion path panics or aborts: every fallible operation
//! returns one of these enums, or an absent handle where the API says so.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-pulse operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// GPIO or pin assignment error
    Motor(MotorError),
    /// Move request rejected
    Motion(MotionError),
    /// Low-level queue entry rejected
    Queue(QueueError),
    /// Channel allocation error
    Engine(EngineError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Motor name not found in configuration
    MotorNotFound(heapless::String<32>),
    /// Speed (minimum step interval) must be > 0
    InvalidSpeed(u32),
    /// Acceleration must be > 0
    InvalidAcceleration(u32),
    /// Step pin cannot drive a pulse channel on this platform
    UnsupportedStepPin(u8),
    /// Same pin assigned twice
    DuplicatePin(u8),
    /// More motors configured than the platform has channels
    TooManyMotors {
        /// Number of motors configured
        configured: usize,
        /// Channels available on the platform
        available: usize,
    },
    /// Tick frequency too low to produce any pulse
    InvalidTickRate(u32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Pin and GPIO errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// Pin is not known to the GPIO back-end
    InvalidPin(u8),
}

/// Errors from `move`/`moveTo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// `set_speed` was never called with a non-zero interval
    SpeedNotSet,
    /// `set_acceleration` was never called with a non-zero value
    AccelerationNotSet,
}

/// Result of a rejected `add_queue_entry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// No free slot
    Full,
    /// Delta above `ABSOLUTE_MAX_TICKS`
    DeltaTooHigh,
    /// Delta below the platform's minimum delta
    DeltaTooLow,
    /// Zero steps requested
    StepsError,
}

/// Stepper channel allocation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// Pin cannot be driven by any pulse channel
    UnsupportedPin(u8),
    /// All channels in use
    NoFreeChannel,
    /// Pin already assigned to a stepper
    PinInUse(u8),
    /// Handle does not name a connected stepper
    UnknownStepper(u8),
    /// Channel still has pulses in flight
    ChannelBusy(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Queue(e) => write!(f, "Queue error: {}", e),
            Error::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::MotorNotFound(name) => write!(f, "Motor '{}' not found", name),
            ConfigError::InvalidSpeed(v) => {
                write!(f, "Invalid min_step_us: {}. Must be > 0", v)
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::UnsupportedStepPin(pin) => {
                write!(f, "Pin {} cannot be used as step pin on this platform", pin)
            }
            ConfigError::DuplicatePin(pin) => write!(f, "Pin {} assigned more than once", pin),
            ConfigError::TooManyMotors { configured, available } => write!(
                f,
                "{} motors configured but only {} channels available",
                configured, available
            ),
            ConfigError::InvalidTickRate(v) => {
                write!(f, "Tick rate {} Hz is below 50 kHz", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::InvalidPin(pin) => write!(f, "Pin {} is not available", pin),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::SpeedNotSet => write!(f, "Speed not set"),
            MotionError::AccelerationNotSet => write!(f, "Acceleration not set"),
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full => write!(f, "Queue full"),
            QueueError::DeltaTooHigh => write!(f, "Start delta above maximum"),
            QueueError::DeltaTooLow => write!(f, "Start delta below minimum"),
            QueueError::StepsError => write!(f, "Step count must be 1..=255"),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnsupportedPin(pin) => write!(f, "Pin {} has no pulse channel", pin),
            EngineError::NoFreeChannel => write!(f, "No free pulse channel"),
            EngineError::PinInUse(pin) => write!(f, "Pin {} already connected", pin),
            EngineError::UnknownStepper(id) => write!(f, "No stepper with id {}", id),
            EngineError::ChannelBusy(ch) => write!(f, "Channel {} is still running", ch),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::Engine(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for QueueError {}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}
