//! Access-control policies for hardware-resident keys.
//!
//! A policy describes the conditions the secure store enforces whenever a key
//! handle is used: the availability window, whether a user-presence check
//! (biometric/passcode) gates the operation, and whether the key is bound to
//! this device. Policies are validated at construction and immutable after.

use crate::error::{KeyError, Result};
use serde::{Deserialize, Serialize};

/// Availability window for a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protection {
    /// Key is usable at any time, including before first unlock after boot.
    AlwaysAvailable,
    /// Key becomes usable only after the device has been unlocked once.
    AfterFirstUnlock,
}

/// Declarative condition set attached to one half of a key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlPolicy {
    protection: Protection,
    requires_user_presence: bool,
    this_device_only: bool,
}

impl AccessControlPolicy {
    /// Build a policy, rejecting incoherent flag combinations.
    ///
    /// A user-presence gate implies the key cannot be available before first
    /// unlock: the presence prompt needs an unlocked device to run at all.
    pub fn new(
        protection: Protection,
        requires_user_presence: bool,
        this_device_only: bool,
    ) -> Result<Self> {
        if requires_user_presence && protection == Protection::AlwaysAvailable {
            return Err(KeyError::InvalidPolicy(
                "user presence requires at least after-first-unlock protection".to_string(),
            ));
        }
        Ok(Self {
            protection,
            requires_user_presence,
            this_device_only,
        })
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    pub fn requires_user_presence(&self) -> bool {
        self.requires_user_presence
    }

    pub fn this_device_only(&self) -> bool {
        self.this_device_only
    }

    /// Partial order over policies: true when every condition of `other` is
    /// also imposed by `self`. Used to check that the private half of a key
    /// pair is never easier to use than the public half.
    pub fn is_at_least_as_restrictive_as(&self, other: &AccessControlPolicy) -> bool {
        self.protection >= other.protection
            && (self.requires_user_presence || !other.requires_user_presence)
            && (self.this_device_only || !other.this_device_only)
    }
}
