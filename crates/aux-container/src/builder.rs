//! Fluent builder for constructing a [`Container`].

use aux_action::{ActionReference, ReferenceEntry};
use aux_world::TrainView;
use tracing::debug;

use crate::{ActionObserver, Container, ContainerResult, NoopObserver};

/// Fluent builder for [`Container<O>`].
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default          |
/// |-------------------|------------------|
/// | `.entries(v)`     | no references    |
/// | `.generic(r)`     | no event hooks   |
/// | `.observer(o)`    | `NoopObserver`   |
///
/// Entries must be supplied in route order.  Generic references are
/// registered only for AI-controlled trains; a player train gets its
/// specific references and nothing else.
///
/// # Example
///
/// ```rust,ignore
/// let refs = load_references_csv("timetable/refs.csv")?;
/// let mut container = ContainerBuilder::new()
///     .entries(refs)
///     .generic(ActionReference::level_crossing_horn(3, HornPattern::UsCrossing))
///     .build(&train)?;
/// ```
pub struct ContainerBuilder<O: ActionObserver = NoopObserver> {
    entries:  Vec<ReferenceEntry>,
    observer: O,
}

impl ContainerBuilder<NoopObserver> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), observer: NoopObserver }
    }
}

impl Default for ContainerBuilder<NoopObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ActionObserver> ContainerBuilder<O> {
    /// Append entries, in route order.
    pub fn entries(mut self, entries: impl IntoIterator<Item = ReferenceEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Append one event-triggered reference.
    pub fn generic(mut self, reference: ActionReference) -> Self {
        self.entries.push(ReferenceEntry::Single(reference));
        self
    }

    /// Replace the observer.
    pub fn observer<P: ActionObserver>(self, observer: P) -> ContainerBuilder<P> {
        ContainerBuilder { entries: self.entries, observer }
    }

    /// Validate and register everything for `train`.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::InvalidReference`] for a generic reference whose
    ///   kind cannot be event-triggered.
    /// - [`ContainerError::Association`] for a malformed delegate pair.
    ///
    /// [`ContainerError::InvalidReference`]: crate::ContainerError::InvalidReference
    /// [`ContainerError::Association`]: crate::ContainerError::Association
    pub fn build<T: TrainView + ?Sized>(self, train: &T) -> ContainerResult<Container<O>> {
        let ai = train.is_ai_controlled();
        let mut container = Container::with_observer(train.train_id(), self.observer);
        let mut skipped = 0usize;
        for entry in self.entries {
            let generic = matches!(&entry, ReferenceEntry::Single(r) if r.is_generic());
            if generic && !ai {
                skipped += 1;
                continue;
            }
            container.register(entry)?;
        }
        if skipped > 0 {
            debug!(train = %container.train(), skipped, "event hooks skipped for player train");
        }
        Ok(container)
    }
}
