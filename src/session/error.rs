use super::events::Phase;
use crate::api::ApiError;
use crate::code::GateError;
use crate::media::MediaError;
use crate::speech::RecognitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation} while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    #[error("an answer is already being submitted")]
    TurnInFlight,

    #[error("the interview is already complete")]
    AlreadyCompleted,

    #[error("there is no current question")]
    NoCurrentQuestion,

    #[error("answer is empty")]
    EmptyAnswer,

    #[error("submit your code before answering by voice")]
    CodeAwaitingSubmit,

    #[error("microphone unavailable: {0}")]
    MicrophoneGated(&'static str),

    #[error("speech recognition unavailable: {0}")]
    Recognition(RecognitionError),

    #[error(transparent)]
    Code(#[from] GateError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
