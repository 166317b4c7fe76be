pub mod bootstrap;
pub mod drag_drop;
pub mod notification_scheduler;
pub mod session;
pub mod ticker;
