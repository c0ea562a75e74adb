//! Live streaming inference: sliding windows, voting and sessions

pub mod live;
pub mod predictor;
pub mod ring_buffer;
pub mod session;
pub mod voter;

pub use live::LiveSessions;
pub use predictor::{LivePrediction, StreamState, StreamingPredictor};
pub use ring_buffer::RingBuffer;
pub use session::SessionRegistry;
pub use voter::{majority_vote, TemporalVoter, DEFAULT_VOTE_WINDOW};
