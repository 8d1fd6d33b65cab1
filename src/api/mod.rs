//! Remote backends.
//!
//! [`clinic::ClinicApi`] talks to the clinic server and implements every
//! service port, so it can be handed to the coordinator as a whole through
//! [`crate::libs::services::Services::from_backend`].

pub mod clinic;

pub use clinic::ClinicApi;
