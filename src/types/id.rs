// ABOUTME: Phantom-typed identifiers for compile-time type safety.
// ABOUTME: Prevents accidental swapping of change set, hosted zone, and distribution IDs.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum ChangeSetMarker {}
pub enum HostedZoneMarker {}
pub enum DistributionMarker {}

/// A type-safe identifier that prevents accidental mixing of different ID types.
///
/// A `HostedZoneId` can't be passed where a `DistributionId` is expected even
/// though both are opaque provider strings.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only used as a phantom type marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

pub type ChangeSetId = Id<ChangeSetMarker>;
pub type HostedZoneId = Id<HostedZoneMarker>;
pub type DistributionId = Id<DistributionMarker>;

impl HostedZoneId {
    /// Build a hosted zone ID from a provider path such as `/hostedzone/Z123`.
    ///
    /// Only the last path segment is kept so IDs compare equal regardless of
    /// which API returned them.
    pub fn from_path(path: &str) -> Self {
        let id = path.rsplit('/').next().unwrap_or(path);
        Self::new(id)
    }
}
