pub mod profile;
pub mod schedule;

pub use profile::{ExerciseCatalogEntry, MissedWorkout, RecentLogEntry, UserProfile};
pub use schedule::{
  Day, ExerciseSlot, MovementPattern, RepTarget, RepairedFields, SetSpec, SetTarget, Tier, WeekSchedule,
};
