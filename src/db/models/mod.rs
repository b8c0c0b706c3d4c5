pub mod inventory;
pub mod payment;
pub mod profile;
pub mod purchase_order;
pub mod requests;
pub mod team;
pub mod vendor;
