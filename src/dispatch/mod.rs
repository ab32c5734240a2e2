mod action;
mod dispatcher;

pub use action::{EssayLength, EssayType, ImagePayload, ScienceSubject, ToolAction};
pub use dispatcher::{DispatchOutcome, RejectReason, RequestDispatcher};
