pub mod dashboard;
pub mod expiry;
pub mod ledger;
pub mod registry;
pub mod seat_id;
