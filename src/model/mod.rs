pub mod attendance;
pub mod bill;
pub mod daily_menu;
pub mod role;
pub mod user;
