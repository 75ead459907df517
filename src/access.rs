//! Role-based access control for treasury operations.
//!
//! Two roles exist: the CEO controls custody, configuration and
//! migration; workers are operator processes allowed to dispatch plays.
//! Role checks are injected into every privileged entry point rather
//! than trusted from the transport layer.

use crate::errors::{CasinoError, CasinoResult};
use serde::{Deserialize, Serialize};

/// Account identifier. Wallet address or operator id.
pub type Address = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Ceo,
    Worker,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Ceo => "CEO",
            Role::Worker => "worker",
        }
    }
}

/// Holds the current role assignments.
///
/// The CEO always implicitly holds the worker role as well, matching
/// the convention that the deployer can operate their own tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessControl {
    ceo: Address,
    workers: Vec<Address>,
}

impl AccessControl {
    pub fn new(ceo: impl Into<Address>) -> Self {
        Self {
            ceo: ceo.into(),
            workers: Vec::new(),
        }
    }

    pub fn ceo(&self) -> &Address {
        &self.ceo
    }

    pub fn is_ceo(&self, caller: &Address) -> bool {
        &self.ceo == caller
    }

    pub fn is_worker(&self, caller: &Address) -> bool {
        self.is_ceo(caller) || self.workers.iter().any(|w| w == caller)
    }

    /// Fails with `AccessDenied` unless the caller holds `role`.
    pub fn require(&self, caller: &Address, role: Role) -> CasinoResult<()> {
        let held = match role {
            Role::Ceo => self.is_ceo(caller),
            Role::Worker => self.is_worker(caller),
        };
        if held {
            Ok(())
        } else {
            Err(CasinoError::AccessDenied {
                required: role.name(),
            })
        }
    }

    /// Transfers the CEO role. Only the current CEO may do this.
    pub fn set_ceo(&mut self, caller: &Address, new_ceo: Address) -> CasinoResult<Address> {
        self.require(caller, Role::Ceo)?;
        let previous = std::mem::replace(&mut self.ceo, new_ceo);
        Ok(previous)
    }

    /// Grants the worker role. Idempotent.
    pub fn add_worker(&mut self, caller: &Address, worker: Address) -> CasinoResult<()> {
        self.require(caller, Role::Ceo)?;
        if !self.workers.contains(&worker) {
            self.workers.push(worker);
        }
        Ok(())
    }

    /// Revokes the worker role. Unknown workers are ignored.
    pub fn remove_worker(&mut self, caller: &Address, worker: &Address) -> CasinoResult<()> {
        self.require(caller, Role::Ceo)?;
        self.workers.retain(|w| w != worker);
        Ok(())
    }
}
