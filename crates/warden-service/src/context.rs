//! The staff member on whose behalf a service call runs.

use serde::{Deserialize, Serialize};

use warden_core::error::AppError;
use warden_entity::operator::Role;

use crate::access::Capability;

/// An identified bot user with a resolved role.
///
/// Built by the access service and passed into every service method so each
/// operation can check capabilities and attribute audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Telegram id.
    pub external_id: i64,
    /// Role at resolution time.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(external_id: i64, role: Role) -> Self {
        Self { external_id, role }
    }

    /// Returns whether the actor holds `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        capability.granted_to(self.role)
    }

    /// Fails with `Forbidden` unless the actor holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{} may not {}",
                self.role,
                capability.describe()
            )))
        }
    }
}
