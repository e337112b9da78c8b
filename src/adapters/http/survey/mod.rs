//! HTTP adapter for survey session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ChatMessageResponse, ContradictionResponse, CurrentQuestionResponse, SessionResponse,
    StartSurveyRequest, SubmitAnswerRequest,
};
pub use handlers::SurveyHandlers;
pub use routes::survey_routes;
