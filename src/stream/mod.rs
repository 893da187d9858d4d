mod events;
mod handler;

pub use events::{
    event_channel, APPROVE_RESPONSE, EventSender, EventStream, InputKind, InputRequestError, ResponseChannel,
    ResponseReceiver, StreamEvent, REJECT_RESPONSE,
};
pub use handler::{StreamEnd, StreamHandler, StreamOutcome};
