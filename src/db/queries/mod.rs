pub mod inventory;
pub mod payments;
pub mod profiles;
pub mod purchase_orders;
pub mod requests;
pub mod setup;
pub mod teams;
pub mod vendors;
