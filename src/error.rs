use crate::driver::DriverError;

/// Errors raised by the assignment manager, the input engine and configuration
///
/// None of these are fatal at runtime. `MissingLightProfile` and
/// `UncalibratedAxis` are only ever logged; the others are logged and returned
/// to the caller of the rejected operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WiimoteError {
    /// Slot index outside `[0, max_players)`
    #[error("Player slot {slot} is out of range: the maximum player count is {max_players}")]
    ConfigurationError { slot: usize, max_players: usize },

    /// No device was supplied for an assignment
    #[error("Assigning a device to player slot {0}, but no device was provided; call unassign() directly instead")]
    AssignmentConflict(usize),

    #[error("No light profile configured for player slot {0}")]
    MissingLightProfile(usize),

    /// The extension stick reported a zero sample
    #[error("Extension stick of player slot {0} is not calibrated yet, re-sending report mode")]
    UncalibratedAxis(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}
