pub mod assignment;
pub mod bookings;
pub mod eligibility;
pub mod lifecycle;
pub mod matcher;
pub mod store;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod testing;
