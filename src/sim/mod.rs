/// Session-level machinery: the controller, its clock, dialogs and the scan capability.

pub mod dialog;
pub mod event;
pub mod scanner;
pub mod schedule;
pub mod session;
