//! Bill arithmetic: the validated billing period, money bounds and the pure
//! calculator that turns menus and attendance into bill totals.

pub mod calculator;
pub mod money;
pub mod period;
