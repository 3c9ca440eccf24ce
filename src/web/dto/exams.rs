use serde::Deserialize;

use crate::progress::ExamScore;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ExamBody {
    pub correct_words: u32,
    pub wrong_words: u32,
}

impl From<ExamBody> for ExamScore {
    fn from(body: ExamBody) -> Self {
        ExamScore::new(body.correct_words, body.wrong_words)
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExamLogQuery {
    /// `initial` or `final`, every exam when absent
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
