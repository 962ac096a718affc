//! Notifications sent by a brain set to registered observers.

use std::fmt;

use crate::caret_nodedata::NodeAttributeKind;


#[derive(Debug, Clone, PartialEq)]
pub enum BrainSetEvent {
    /// Data files were added or removed.
    BrainSetChanged,
    /// Cached drawing data must be rebuilt, for example after node classification.
    DisplayListsInvalidated,
    SurfaceOverlaysChanged,
    /// The file of the given kind was read, appended to or cleared.
    NodeAttributeChanged(NodeAttributeKind),
    /// A spec file finished loading. `cancelled` is set for partial loads.
    SpecFileLoaded { cancelled: bool },
    SceneShown(String),
}

impl fmt::Display for BrainSetEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BrainSetEvent::BrainSetChanged => write!(f, "brain set changed"),
            BrainSetEvent::DisplayListsInvalidated => write!(f, "display lists invalidated"),
            BrainSetEvent::SurfaceOverlaysChanged => write!(f, "surface overlays changed"),
            BrainSetEvent::NodeAttributeChanged(kind) => write!(f, "{} file changed", kind),
            BrainSetEvent::SpecFileLoaded { cancelled } => {
                if *cancelled { write!(f, "spec file partially loaded") } else { write!(f, "spec file loaded") }
            }
            BrainSetEvent::SceneShown(name) => write!(f, "scene {} shown", name),
        }
    }
}


/// A callback registered with [`crate::BrainSet::add_observer`]. Observers are called on the thread that
/// caused the event, and must not call back into the brain set's mutating methods.
pub type BrainSetObserver = Box<dyn Fn(&BrainSetEvent) + Send + Sync>;
