pub mod classifier;
pub mod notify;
pub mod shift_resolver;

pub use classifier::{AttendanceService, ScanInput, ScanOutcome};
pub use notify::{LogNotifier, NotificationDispatcher};
