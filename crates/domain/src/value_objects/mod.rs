mod booking;
mod segment;
mod show;

pub use booking::{AutoBookingConstraints, BookingControlLevel, ProductType};
pub use segment::{SegmentDefinition, SegmentKind};
pub use show::{ShowContext, ShowDefinition, StorylineInfo, TitleInfo, WorkerSnapshot};
