use satchel_store::ContainerRecord;

/// Display collaborator, notified on every persist.
///
/// Implementations turn the record into whatever human-readable summary the
/// host shows. They must not call back into the cache.
pub trait RecordRenderer: Send + Sync {
    fn render(&self, record: &ContainerRecord);
}

/// Renderer that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpRenderer;

impl RecordRenderer for NoOpRenderer {
    fn render(&self, _record: &ContainerRecord) {}
}
