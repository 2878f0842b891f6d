pub mod admin;
pub mod occupant;
pub mod plan;

pub use admin::Admin;
pub use occupant::OccupantRecord;
pub use plan::SubscriptionPlan;
