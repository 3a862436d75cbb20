//! The last mile of the funnel: turning a finished wizard or contact form
//! into a stored lead plus conversion reports on every tracking channel.

pub mod events;
pub mod picks;
pub mod submit;

pub use events::{contact_event, lead_event};
pub use picks::pick_design;
pub use submit::{LeadSubmitter, SubmissionError};
