use tracing::warn;

use crate::error::DashboardError;

/// Access state for one run of the dashboard; starts locked.
#[derive(Debug, Default)]
pub struct Session {
    unlocked: bool,
}

impl Session {
    pub fn unlock(&mut self, expected: &str, attempt: &str) -> Result<(), DashboardError> {
        self.unlocked = attempt == expected;
        if self.unlocked {
            Ok(())
        } else {
            warn!("rejected access phrase");
            Err(DashboardError::Auth)
        }
    }

    pub fn ensure_unlocked(&self) -> Result<(), DashboardError> {
        if self.unlocked {
            Ok(())
        } else {
            Err(DashboardError::Auth)
        }
    }
}
