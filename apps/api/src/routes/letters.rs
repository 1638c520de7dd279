use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::letter::LETTER_FILE_NAME;
use crate::pipeline::GeneratedLetter;
use crate::state::AppState;

const INDEX_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Job Application Letter Generator</title>
</head>
<body>
<h1>Job Application Letter Generator</h1>
<p>Enter your GitHub username and the job posting URL to generate a tailored application letter.</p>
<form method="post" action="/letters">
  <label>GitHub Username <input type="text" name="github_username" required></label><br>
  <label>Job Posting URL <input type="url" name="job_posting_url" required></label><br>
  <button type="submit">Generate Letter</button>
</form>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct LetterRequest {
    #[serde(default)]
    pub github_username: String,
    #[serde(default)]
    pub job_posting_url: String,
}

#[derive(Serialize)]
pub struct LetterResponse {
    #[serde(flatten)]
    pub generated: GeneratedLetter,
    pub file_name: &'static str,
}

/// GET /
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// POST /letters
/// Form submission; the letter comes back as a text file download.
pub async fn handle_letter_form(
    State(state): State<AppState>,
    Form(req): Form<LetterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let generated = state
        .pipeline
        .generate(&req.github_username, &req.job_posting_url)
        .await?;

    let disposition = format!("attachment; filename=\"{LETTER_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        generated.letter,
    ))
}

/// POST /api/v1/letters
pub async fn handle_letter_json(
    State(state): State<AppState>,
    Json(req): Json<LetterRequest>,
) -> Result<Json<LetterResponse>, AppError> {
    let generated = state
        .pipeline
        .generate(&req.github_username, &req.job_posting_url)
        .await?;
    Ok(Json(LetterResponse {
        generated,
        file_name: LETTER_FILE_NAME,
    }))
}
