use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;
use tracing::debug;

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

/// Session-wide event bus
///
/// Handlers may publish or subscribe from inside `handle`. A handler that is
/// already running is skipped for events published while it runs.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<SharedHandler>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Session events
pub mod events {
    use super::Event;
    use crate::annotation::RowAnnotation;
    use crate::identity::FileIdentity;
    use crate::range::CountingRange;

    /// A file was imported and its rows committed
    #[derive(Debug, Clone)]
    pub struct DatasetImported {
        pub identity: FileIdentity,
        pub row_count: usize,
        pub resumed_page: u32,
    }

    /// The visible page changed
    #[derive(Debug, Clone)]
    pub struct PageChanged {
        pub identity: Option<FileIdentity>,
        pub page: u32,
        pub total_pages: u32,
    }

    /// A row annotation was merged
    #[derive(Debug, Clone)]
    pub struct AnnotationChanged {
        pub identity: FileIdentity,
        pub row_index: usize,
        pub annotation: RowAnnotation,
        pub range: CountingRange,
    }

    /// All annotations of a file were cleared
    #[derive(Debug, Clone)]
    pub struct AnnotationsCleared {
        pub identity: FileIdentity,
    }

    /// The current file's rows were removed
    #[derive(Debug, Clone)]
    pub struct DatasetRemoved {
        pub identity: FileIdentity,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        DatasetImported,
        PageChanged,
        AnnotationChanged,
        AnnotationsCleared,
        DatasetRemoved
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_default().push(Arc::new(Mutex::new(handler)));
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        // Snapshot so the bus lock is released before any handler runs
        let targets: Vec<SharedHandler> = match self.handlers.lock().get(&type_id) {
            Some(event_handlers) => event_handlers.clone(),
            None => return,
        };

        for handler in targets {
            match handler.try_lock() {
                Some(mut handler) => handler.handle(&event),
                None => debug!("Skipping handler already handling an event"),
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event handler built from a closure
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
