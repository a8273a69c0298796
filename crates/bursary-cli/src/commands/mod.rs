pub mod audit;
pub mod check_date;
pub mod dispatch;
pub mod mutate;
pub mod notifications;
pub mod shared;
