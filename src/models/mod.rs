pub mod assistant;
pub mod booking;

pub use assistant::{ApplicationStatus, Assistant};
pub use booking::{Booking, BookingStatus, NewBooking};
