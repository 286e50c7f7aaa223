pub mod service;

pub use service::{IncidentPage, IncidentService};
