//! Calendar event cache: windows, ordering, merge and notification.

pub mod cache;
pub mod event;
pub mod notifier;
pub mod source;
pub mod window;

pub use cache::{EventCache, MergeStats};
pub use event::{CalendarEvent, IngestError, bucket_order};
pub use notifier::ChangeNotifier;
pub use source::{EpisodeSource, SeriesDirectory, SourceError};
pub use window::{DateWindow, compute_window};
