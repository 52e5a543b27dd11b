//! Storage capability consumed by the subscription manager.

use std::collections::BTreeSet;

/// The narrow slice of application state push management needs. Implemented
/// by the application's storage layer; injected so this crate stays free of
/// any database and unit-testable with an in-memory stand-in.
pub trait PushStorage: Send + Sync {
    /// Public keys of every closed group this device is a member of.
    fn all_closed_group_public_keys(&self) -> BTreeSet<String>;

    /// The local account's public key, if an account exists.
    fn user_public_key(&self) -> Option<String>;

    /// Whether push notifications are currently enabled on this device.
    fn is_using_push_notifications(&self) -> bool;

    /// Flip the push flag. Only the confirmed-unregister path writes this.
    fn set_using_push_notifications(&self, enabled: bool);
}
