pub mod detail;
pub mod dialog;
pub mod outline;
pub mod status_bar;
