pub mod health;
pub mod quote;
pub mod visitor_count;
