pub mod attendance;
pub mod billing;
pub mod menu;
pub mod users;
