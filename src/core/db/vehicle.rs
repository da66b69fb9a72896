use std::fmt;
use std::future::Future;

use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Active,
    Inactive,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for VehicleStatus {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(VehicleStatus::Active),
            "inactive" => Ok(VehicleStatus::Inactive),
            _ => Err(anyhow::anyhow!("Invalid vehicle status: {}", value)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub plate_number: String,
    pub owner: String,
    pub vehicle_type: String,
    pub registered_at: OffsetDateTime,
    pub status: VehicleStatus,
    pub(super) _guard: (),
}

#[derive(Debug, Clone, Default)]
pub struct NewVehicle {
    pub plate_number: String,
    pub owner: String,
    pub vehicle_type: String,
}

impl NewVehicle {
    pub fn new(plate_number: impl Into<String>) -> Self {
        Self {
            plate_number: plate_number.into(),
            ..Default::default()
        }
    }
}

/// Result of looking a plate up in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lookup {
    pub found: bool,
    pub active: bool,
}

impl Lookup {
    /// Only active registrations count
    pub fn is_registered(&self) -> bool {
        self.found && self.active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Store of known plates. Keys are compared uppercase; `Err` means a storage
/// fault, never a duplicate or a missing plate.
pub trait RegistryRepository {
    fn lookup(&self, plate: &str) -> impl Future<Output = anyhow::Result<Lookup>>;
    fn add(&self, vehicle: &NewVehicle) -> impl Future<Output = anyhow::Result<AddOutcome>>;
    fn remove(&self, plate: &str) -> impl Future<Output = anyhow::Result<RemoveOutcome>>;
    fn list_all(&self) -> impl Future<Output = anyhow::Result<Vec<RegistryEntry>>>;
    fn set_status(
        &self,
        plate: &str,
        status: VehicleStatus,
    ) -> impl Future<Output = anyhow::Result<bool>>;
}
