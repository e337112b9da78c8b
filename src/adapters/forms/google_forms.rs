//! Google Forms adapter - loads a form through the Forms REST API and
//! normalizes its items into a `Schema`.
//!
//! Supported item kinds:
//!
//! | Forms question            | Field kind                       |
//! |---------------------------|----------------------------------|
//! | `textQuestion`            | `shortText` (`email` if titled so) |
//! | `textQuestion.paragraph`  | `longText`                       |
//! | `choiceQuestion`          | `singleChoice`                   |
//! | `scaleQuestion`           | `scale` (`low..=high`)           |
//! | `ratingQuestion`          | `scale` (`1..=level`)            |
//! | `dateQuestion`/`timeQuestion` | `shortText`                  |
//!
//! Section headers, images, videos, grids and file uploads are skipped.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::foundation::FieldId;
use crate::domain::session::AccessToken;
use crate::domain::survey::{Field, FieldKind, FormReference, Schema};
use crate::ports::{FormSource, FormSourceError};

/// Configuration for the Google Forms adapter.
#[derive(Debug, Clone)]
pub struct GoogleFormsConfig {
    /// Forms API base URL (default: https://forms.googleapis.com/v1).
    pub api_base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for GoogleFormsConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://forms.googleapis.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GoogleFormsConfig {
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Loads forms from the Google Forms API with the user's bearer token.
pub struct GoogleFormsSource {
    config: GoogleFormsConfig,
    client: Client,
}

impl GoogleFormsSource {
    /// # Errors
    ///
    /// - `Upstream` if the HTTP client cannot be built
    pub fn new(config: GoogleFormsConfig) -> Result<Self, FormSourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FormSourceError::Upstream(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Follows a `forms.gle` link to the full form URL and reads the id from it.
    async fn resolve_short_link(&self, link: &str) -> Result<String, FormSourceError> {
        let response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(|e| FormSourceError::UnresolvedLink(e.to_string()))?;

        let target = response.url().as_str().to_string();
        debug!(short_link = %link, target = %target, "Short link resolved");

        match FormReference::parse(&target) {
            Ok(FormReference::FormId(id)) => Ok(id),
            _ => Err(FormSourceError::UnresolvedLink(format!(
                "{} did not lead to a form",
                link
            ))),
        }
    }

    async fn fetch_form(&self, form_id: &str, token: &AccessToken) -> Result<ApiForm, FormSourceError> {
        let url = format!("{}/forms/{}", self.config.api_base_url, form_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| FormSourceError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(form_id = %form_id, status = status.as_u16(), "Forms API request failed");
            return Err(map_error_status(status, form_id, &body));
        }

        response
            .json::<ApiForm>()
            .await
            .map_err(|e| FormSourceError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl FormSource for GoogleFormsSource {
    async fn load_schema(
        &self,
        form: &FormReference,
        token: &AccessToken,
    ) -> Result<Schema, FormSourceError> {
        if token.is_blank() {
            return Err(FormSourceError::AccessDenied);
        }

        let form_id = match form {
            FormReference::FormId(id) => id.clone(),
            FormReference::ShortLink(link) => self.resolve_short_link(link).await?,
        };

        let raw = self.fetch_form(&form_id, token).await?;
        let schema = normalize_form(raw)?;
        info!(form_id = %form_id, fields = schema.len(), "Form schema loaded");
        Ok(schema)
    }
}

fn map_error_status(status: StatusCode, form_id: &str, body: &str) -> FormSourceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FormSourceError::AccessDenied,
        StatusCode::NOT_FOUND => FormSourceError::NotFound(form_id.to_string()),
        _ => FormSourceError::Upstream(format!("HTTP {}: {}", status.as_u16(), body)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Forms API types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiForm {
    #[serde(default)]
    info: ApiInfo,
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInfo {
    title: Option<String>,
    document_title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiItem {
    item_id: Option<String>,
    title: Option<String>,
    question_item: Option<ApiQuestionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiQuestionItem {
    question: ApiQuestion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiQuestion {
    question_id: Option<String>,
    #[serde(default)]
    required: bool,
    text_question: Option<ApiTextQuestion>,
    choice_question: Option<ApiChoiceQuestion>,
    scale_question: Option<ApiScaleQuestion>,
    rating_question: Option<ApiRatingQuestion>,
    date_question: Option<serde_json::Value>,
    time_question: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiTextQuestion {
    #[serde(default)]
    paragraph: bool,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceQuestion {
    #[serde(default)]
    options: Vec<ApiOption>,
}

#[derive(Debug, Deserialize)]
struct ApiOption {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiScaleQuestion {
    #[serde(default)]
    low: i64,
    high: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRatingQuestion {
    rating_scale_level: i64,
}

// ════════════════════════════════════════════════════════════════════════════
// Normalization
// ════════════════════════════════════════════════════════════════════════════

fn normalize_form(form: ApiForm) -> Result<Schema, FormSourceError> {
    let fields: Vec<Field> = form
        .items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_item(index, item))
        .collect();

    if fields.is_empty() {
        return Err(FormSourceError::NoQuestions);
    }

    let title = form
        .info
        .title
        .or(form.info.document_title)
        .unwrap_or_default();
    Schema::new(title, form.info.description, fields)
        .map_err(|e| FormSourceError::InvalidPayload(e.to_string()))
}

/// Most steps a scale or rating may have; Forms scales run 0..=10 at most.
const MAX_SCALE_STEPS: i64 = 11;

/// Numeric options for `low..=high`, or `None` when the bounds are
/// inverted or wider than any real Forms scale.
fn scale_options(label: &str, low: i64, high: i64) -> Option<Vec<String>> {
    let steps = high.checked_sub(low).and_then(|d| d.checked_add(1));
    match steps {
        Some(steps) if (1..=MAX_SCALE_STEPS).contains(&steps) => {
            Some((low..=high).map(|n| n.to_string()).collect())
        }
        _ => {
            warn!(label, low, high, "Skipping scale question with out-of-range bounds");
            None
        }
    }
}

/// Maps one form item to a field, or `None` for unsupported items.
fn normalize_item(index: usize, item: ApiItem) -> Option<Field> {
    let question = item.question_item?.question;
    let label = item.title.unwrap_or_default();

    let (kind, options) = if let Some(text) = &question.text_question {
        if text.paragraph {
            (FieldKind::LongText, Vec::new())
        } else if label.to_lowercase().contains("email") {
            (FieldKind::Email, Vec::new())
        } else {
            (FieldKind::ShortText, Vec::new())
        }
    } else if let Some(choice) = question.choice_question {
        let options = choice.options.into_iter().filter_map(|o| o.value).collect();
        (FieldKind::SingleChoice, options)
    } else if let Some(scale) = &question.scale_question {
        (FieldKind::Scale, scale_options(&label, scale.low, scale.high)?)
    } else if let Some(rating) = &question.rating_question {
        (FieldKind::Scale, scale_options(&label, 1, rating.rating_scale_level)?)
    } else if question.date_question.is_some() || question.time_question.is_some() {
        (FieldKind::ShortText, Vec::new())
    } else {
        debug!(item_id = ?item.item_id, "Skipping unsupported form item");
        return None;
    };

    let raw_id = question
        .question_id
        .or(item.item_id)
        .unwrap_or_else(|| format!("q{}", index + 1));
    let id = FieldId::new(raw_id).ok()?;

    match Field::new(id, label, kind, question.required, options) {
        Ok(field) => Some(field),
        Err(e) => {
            warn!(error = %e, "Skipping form item that does not make a valid field");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Schema, FormSourceError> {
        normalize_form(serde_json::from_value(value).unwrap())
    }

    mod normalization {
        use super::*;

        #[test]
        fn maps_question_kinds() {
            let schema = parse(json!({
                "formId": "abc",
                "info": {"title": "Team Survey", "description": "Quarterly check-in"},
                "items": [
                    {"itemId": "i1", "title": "Your name",
                     "questionItem": {"question": {"questionId": "n1", "required": true, "textQuestion": {}}}},
                    {"itemId": "i2", "title": "Work email",
                     "questionItem": {"question": {"questionId": "e1", "textQuestion": {"paragraph": false}}}},
                    {"itemId": "i3", "title": "Anything else?",
                     "questionItem": {"question": {"questionId": "c1", "textQuestion": {"paragraph": true}}}},
                    {"itemId": "i4", "title": "Team",
                     "questionItem": {"question": {"questionId": "t1", "choiceQuestion": {"type": "RADIO",
                        "options": [{"value": "Red"}, {"value": "Blue"}]}}}},
                    {"itemId": "i5", "title": "Rate us",
                     "questionItem": {"question": {"questionId": "s1", "scaleQuestion": {"low": 1, "high": 5}}}}
                ]
            }))
            .unwrap();

            assert_eq!(schema.title(), "Team Survey");
            assert_eq!(schema.description(), Some("Quarterly check-in"));
            let kinds: Vec<FieldKind> = schema.fields().iter().map(|f| f.kind()).collect();
            assert_eq!(
                kinds,
                vec![
                    FieldKind::ShortText,
                    FieldKind::Email,
                    FieldKind::LongText,
                    FieldKind::SingleChoice,
                    FieldKind::Scale
                ]
            );
            assert_eq!(schema.fields()[0].id().as_str(), "n1");
            assert!(schema.fields()[0].is_required());
            assert_eq!(schema.fields()[3].options(), &["Red".to_string(), "Blue".to_string()]);
            assert_eq!(schema.fields()[4].options().len(), 5);
            assert_eq!(schema.answered_count(), 0);
        }

        #[test]
        fn skips_non_question_items() {
            let schema = parse(json!({
                "info": {"documentTitle": "Untitled form"},
                "items": [
                    {"itemId": "h1", "title": "Section 2", "pageBreakItem": {}},
                    {"itemId": "img", "imageItem": {}},
                    {"itemId": "f1", "title": "Upload",
                     "questionItem": {"question": {"questionId": "f1", "fileUploadQuestion": {}}}},
                    {"itemId": "r1", "title": "Stars",
                     "questionItem": {"question": {"questionId": "r1", "ratingQuestion": {"ratingScaleLevel": 3}}}}
                ]
            }))
            .unwrap();

            assert_eq!(schema.title(), "Untitled form");
            assert_eq!(schema.len(), 1);
            assert_eq!(schema.fields()[0].options().len(), 3);
        }

        #[test]
        fn oversized_or_inverted_scales_are_skipped() {
            let schema = parse(json!({
                "info": {"title": "Scales"},
                "items": [
                    {"itemId": "a", "title": "Huge",
                     "questionItem": {"question": {"questionId": "a", "scaleQuestion": {"low": 0, "high": 9_000_000_000i64}}}},
                    {"itemId": "b", "title": "Backwards",
                     "questionItem": {"question": {"questionId": "b", "scaleQuestion": {"low": 5, "high": 1}}}},
                    {"itemId": "c", "title": "Extreme",
                     "questionItem": {"question": {"questionId": "c", "scaleQuestion": {"low": i64::MIN, "high": i64::MAX}}}},
                    {"itemId": "d", "title": "Stars",
                     "questionItem": {"question": {"questionId": "d", "ratingQuestion": {"ratingScaleLevel": 1_000_000}}}},
                    {"itemId": "e", "title": "Zero to ten",
                     "questionItem": {"question": {"questionId": "e", "scaleQuestion": {"low": 0, "high": 10}}}}
                ]
            }))
            .unwrap();

            assert_eq!(schema.len(), 1);
            assert_eq!(schema.fields()[0].id().as_str(), "e");
            assert_eq!(schema.fields()[0].options().len(), 11);
        }

        #[test]
        fn form_without_questions_is_rejected() {
            let result = parse(json!({"info": {"title": "Empty"}, "items": [{"itemId": "x", "textItem": {}}]}));
            assert_eq!(result.unwrap_err(), FormSourceError::NoQuestions);

            let result = parse(json!({"info": {"title": "No items"}}));
            assert_eq!(result.unwrap_err(), FormSourceError::NoQuestions);
        }

        #[test]
        fn choice_without_options_is_skipped() {
            let result = parse(json!({
                "items": [{"itemId": "c", "title": "Pick",
                    "questionItem": {"question": {"questionId": "c", "choiceQuestion": {"options": []}}}}]
            }));
            assert_eq!(result.unwrap_err(), FormSourceError::NoQuestions);
        }
    }

    mod status_mapping {
        use super::*;

        #[test]
        fn maps_auth_and_missing_forms() {
            assert_eq!(map_error_status(StatusCode::UNAUTHORIZED, "f", ""), FormSourceError::AccessDenied);
            assert_eq!(map_error_status(StatusCode::FORBIDDEN, "f", ""), FormSourceError::AccessDenied);
            assert_eq!(
                map_error_status(StatusCode::NOT_FOUND, "f", ""),
                FormSourceError::NotFound("f".to_string())
            );
            assert!(matches!(
                map_error_status(StatusCode::BAD_GATEWAY, "f", "oops"),
                FormSourceError::Upstream(_)
            ));
        }
    }

    #[tokio::test]
    async fn blank_token_is_denied_without_a_request() {
        let source = GoogleFormsSource::new(
            GoogleFormsConfig::default().with_api_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        let result = source
            .load_schema(&FormReference::FormId("abc".to_string()), &AccessToken::new("  "))
            .await;
        assert_eq!(result.unwrap_err(), FormSourceError::AccessDenied);
    }
}
