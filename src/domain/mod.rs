pub mod calendar;
pub mod clock;
pub mod models;
pub mod reorder;
pub mod time;
pub mod timer;
