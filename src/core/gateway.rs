use crate::core::tips::TipProvider;
use crate::domain::model::{AnalysisResult, ProviderAssessment};
use crate::domain::ports::{AnalysisProvider, ProviderRequest};
use crate::utils::error::{AdvisorError, Result};
use base64::Engine as _;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const ACCEPTED_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

const SYSTEM_INSTRUCTION: &str = "Act as an AI Dermatologist. Analyze the scalp image for hair loss. \
Respond ONLY in VALID JSON using the exact schema.";

const USER_PROMPT: &str = "Analyze this scalp image for hair loss.";

const ADDITIONAL_TIP_COUNT: usize = 3;
const REFILL_TIP_COUNT: usize = 2;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Schema handed to the provider so it answers with structured output.
pub fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "grade": { "type": "STRING" },
            "percentageLoss": { "type": "NUMBER" },
            "analysisSummary": { "type": "STRING" },
            "tips": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "doctorConsultationAdvice": { "type": "STRING" }
        },
        "required": [
            "grade",
            "percentageLoss",
            "analysisSummary",
            "tips",
            "doctorConsultationAdvice"
        ]
    })
}

/// Removes a surrounding markdown code fence (```` ```json ... ``` ````).
/// Text without a fence is only trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let label_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        text = &rest[label_len..];
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Orchestrates one image assessment against the configured provider.
pub struct AnalysisGateway {
    provider: Arc<dyn AnalysisProvider>,
    tips: TipProvider,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl AnalysisGateway {
    pub fn new(provider: Arc<dyn AnalysisProvider>, timeout: Duration, retry_attempts: u32) -> Self {
        Self {
            provider,
            tips: TipProvider::new(),
            timeout,
            retry_attempts: retry_attempts.min(1),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn analyze(&self, image_base64: &str, mime_type: &str) -> Result<AnalysisResult> {
        let (payload, mime_type) = validate_image(image_base64, mime_type)?;

        let request = ProviderRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: USER_PROMPT.to_string(),
            image_base64: payload.to_string(),
            mime_type,
            response_schema: response_schema(),
        };

        tracing::debug!(
            provider = self.provider.name(),
            mime_type = %request.mime_type,
            payload_len = request.image_base64.len(),
            "Requesting scalp analysis"
        );

        let raw = self
            .call_provider(&request)
            .await?
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AdvisorError::malformed("provider returned an empty reply"))?;

        let assessment = parse_reply(&raw)?;
        let result = self.normalize(assessment)?;

        tracing::info!(
            grade = %result.grade,
            percentage_loss = result.percentage_loss,
            "Scalp analysis completed"
        );

        Ok(result)
    }

    /// Well-formed stand-in returned to the client when the provider fails.
    pub fn degraded(&self) -> AnalysisResult {
        AnalysisResult {
            grade: "Error".to_string(),
            percentage_loss: 0.0,
            analysis_summary: "Cannot analyze the image.".to_string(),
            tips: vec![
                "Try clearer lighting".to_string(),
                "Upload a non-blurry image".to_string(),
            ],
            doctor_consultation_advice: "Retry with another picture.".to_string(),
            additional_hair_care_tips: self.tips.sample(ADDITIONAL_TIP_COUNT),
        }
    }

    async fn call_provider(&self, request: &ProviderRequest) -> Result<Option<String>> {
        let max_attempts = self.retry_attempts + 1;
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(self.timeout, self.provider.generate(request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AdvisorError::UpstreamTimeout {
                    timeout: self.timeout,
                }),
            };

            match outcome {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        "Transient provider failure, retrying in {:?}",
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn normalize(&self, assessment: ProviderAssessment) -> Result<AnalysisResult> {
        if !assessment.percentage_loss.is_finite() {
            return Err(AdvisorError::malformed("percentageLoss is not a finite number"));
        }

        let mut tips: Vec<String> = assessment
            .tips
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tips.is_empty() {
            tracing::debug!("Provider returned no tips, filling from the static pool");
            tips = self.tips.sample(REFILL_TIP_COUNT);
        }

        Ok(AnalysisResult {
            grade: assessment.grade.trim().to_string(),
            percentage_loss: assessment.percentage_loss.clamp(0.0, 100.0),
            analysis_summary: assessment.analysis_summary.trim().to_string(),
            tips,
            doctor_consultation_advice: assessment.doctor_consultation_advice.trim().to_string(),
            additional_hair_care_tips: self.tips.sample(ADDITIONAL_TIP_COUNT),
        })
    }
}

/// Checks the payload before anything goes over the network. Returns the bare
/// base64 text (any `data:` URL prefix removed) and the lower-cased mime type.
fn validate_image<'a>(image_base64: &'a str, mime_type: &str) -> Result<(&'a str, String)> {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    if mime_type.is_empty() {
        return Err(AdvisorError::invalid_input("Missing image data"));
    }
    if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(AdvisorError::invalid_input(format!(
            "Unsupported image type: {}",
            mime_type
        )));
    }

    let mut payload = image_base64.trim();
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(";base64,") {
            payload = data;
        }
    }
    if payload.is_empty() {
        return Err(AdvisorError::invalid_input("Missing image data"));
    }

    match base64::engine::general_purpose::STANDARD.decode(payload) {
        Ok(bytes) if !bytes.is_empty() => Ok((payload, mime_type)),
        Ok(_) => Err(AdvisorError::invalid_input("Missing image data")),
        Err(e) => Err(AdvisorError::invalid_input(format!(
            "Image data is not valid base64: {}",
            e
        ))),
    }
}

fn parse_reply(raw: &str) -> Result<ProviderAssessment> {
    let body = strip_code_fences(raw);
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(reply = %raw, "Unparsable provider reply");
        AdvisorError::malformed(format!("reply does not match the analysis schema: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tips::HAIR_CARE_TIPS;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    enum Reply {
        Text(&'static str),
        Empty,
        Fail(fn() -> AdvisorError),
        Hang,
    }

    struct MockProvider {
        replies: Mutex<Vec<Reply>>,
        calls: AtomicUsize,
        last_request: Mutex<Option<ProviderRequest>>,
    }

    impl MockProvider {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for MockProvider {
        async fn generate(&self, request: &ProviderRequest) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().await = Some(request.clone());

            let reply = {
                let mut replies = self.replies.lock().await;
                if replies.is_empty() {
                    Reply::Empty
                } else {
                    replies.remove(0)
                }
            };

            match reply {
                Reply::Text(text) => Ok(Some(text.to_string())),
                Reply::Empty => Ok(None),
                Reply::Fail(make) => Err(make()),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(None)
                }
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn gateway(provider: Arc<MockProvider>, retries: u32) -> AnalysisGateway {
        AnalysisGateway::new(provider, Duration::from_millis(200), retries)
            .with_retry_delay(Duration::from_millis(1))
    }

    const VALID_REPLY: &str = r#"{"grade":"II","percentageLoss":15,"analysisSummary":"Mild thinning at the crown.","tips":["Use a gentle shampoo","Reduce heat styling"],"doctorConsultationAdvice":"Monitor for three months."}"#;

    #[test]
    fn test_strip_code_fences() {
        let fenced = "```json\n{\"grade\":\"II\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"grade\":\"II\"}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON\r\n[1]\r\n```\n"), "[1]");
    }

    #[tokio::test]
    async fn test_fenced_reply_parses_like_plain_json() {
        let plain = MockProvider::new(vec![Reply::Text(VALID_REPLY)]);
        let fenced = MockProvider::new(vec![Reply::Text(
            "```json\n{\"grade\":\"II\",\"percentageLoss\":15,\"analysisSummary\":\"Mild thinning at the crown.\",\"tips\":[\"Use a gentle shampoo\",\"Reduce heat styling\"],\"doctorConsultationAdvice\":\"Monitor for three months.\"}\n```",
        )]);

        let a = gateway(plain, 0).analyze(PNG_B64, "image/png").await.unwrap();
        let b = gateway(fenced, 0).analyze(PNG_B64, "image/png").await.unwrap();

        assert_eq!(a.grade, b.grade);
        assert_eq!(a.percentage_loss, b.percentage_loss);
        assert_eq!(a.analysis_summary, b.analysis_summary);
        assert_eq!(a.tips, b.tips);
        assert_eq!(a.doctor_consultation_advice, b.doctor_consultation_advice);
    }

    #[tokio::test]
    async fn test_success_adds_three_pool_tips() {
        let provider = MockProvider::new(vec![Reply::Text(VALID_REPLY)]);
        let result = gateway(provider.clone(), 0)
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap();

        assert_eq!(result.grade, "II");
        assert_eq!(result.percentage_loss, 15.0);
        assert_eq!(result.tips.len(), 2);
        assert_eq!(result.additional_hair_care_tips.len(), 3);
        assert!(result
            .additional_hair_care_tips
            .iter()
            .all(|t| HAIR_CARE_TIPS.contains(&t.as_str())));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_schema_and_image() {
        let provider = MockProvider::new(vec![Reply::Text(VALID_REPLY)]);
        gateway(provider.clone(), 0)
            .analyze(&format!("data:image/png;base64,{}", PNG_B64), "IMAGE/PNG")
            .await
            .unwrap();

        let request = provider.last_request.lock().await.clone().unwrap();
        assert_eq!(request.mime_type, "image/png");
        assert_eq!(request.image_base64, PNG_B64);
        assert_eq!(request.prompt, USER_PROMPT);
        assert!(request.system_instruction.contains("AI Dermatologist"));
        assert_eq!(request.response_schema["required"].as_array().unwrap().len(), 5);
        assert_eq!(
            request.response_schema["properties"]["percentageLoss"]["type"],
            "NUMBER"
        );
    }

    #[tokio::test]
    async fn test_percentage_is_clamped_and_tips_refilled() {
        let provider = MockProvider::new(vec![Reply::Text(
            r#"{"grade":"VII","percentageLoss":140,"analysisSummary":"Extensive loss","tips":["  ",""],"doctorConsultationAdvice":"See a dermatologist."}"#,
        )]);
        let result = gateway(provider, 0).analyze(PNG_B64, "image/jpeg").await.unwrap();

        assert_eq!(result.percentage_loss, 100.0);
        assert_eq!(result.tips.len(), 2);
        assert!(result.tips.iter().all(|t| HAIR_CARE_TIPS.contains(&t.as_str())));
    }

    #[tokio::test]
    async fn test_negative_percentage_is_clamped_to_zero() {
        let provider = MockProvider::new(vec![Reply::Text(
            r#"{"grade":"I","percentageLoss":-4,"analysisSummary":"Healthy","tips":["Keep going"],"doctorConsultationAdvice":"None needed."}"#,
        )]);
        let result = gateway(provider, 0).analyze(PNG_B64, "image/webp").await.unwrap();
        assert_eq!(result.percentage_loss, 0.0);
    }

    #[tokio::test]
    async fn test_invalid_input_never_calls_provider() {
        let provider = MockProvider::new(vec![Reply::Text(VALID_REPLY)]);
        let gw = gateway(provider.clone(), 1);

        for (image, mime) in [
            ("", "image/png"),
            (PNG_B64, ""),
            (PNG_B64, "application/pdf"),
            ("not base64 at all!", "image/png"),
            ("data:image/png;base64,", "image/png"),
        ] {
            let err = gw.analyze(image, mime).await.unwrap_err();
            assert!(
                matches!(err, AdvisorError::InvalidInput { .. }),
                "{image:?} {mime:?} gave {err:?}"
            );
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_reply_is_upstream_error() {
        let provider = MockProvider::new(vec![Reply::Empty]);
        let err = gateway(provider.clone(), 1)
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, AdvisorError::UpstreamMalformed { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_not_retried() {
        let provider = MockProvider::new(vec![
            Reply::Text("I think this is grade two."),
            Reply::Text(VALID_REPLY),
        ]);
        let err = gateway(provider.clone(), 1)
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, AdvisorError::UpstreamMalformed { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let provider = MockProvider::new(vec![
            Reply::Fail(|| AdvisorError::UpstreamStatus {
                status: 503,
                body: "overloaded".to_string(),
            }),
            Reply::Text(VALID_REPLY),
        ]);
        let result = gateway(provider.clone(), 1)
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap();

        assert_eq!(result.grade, "II");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let provider = MockProvider::new(vec![
            Reply::Fail(|| AdvisorError::UpstreamStatus {
                status: 500,
                body: String::new(),
            }),
            Reply::Fail(|| AdvisorError::UpstreamStatus {
                status: 500,
                body: String::new(),
            }),
            Reply::Text(VALID_REPLY),
        ]);
        let err = AnalysisGateway::new(provider.clone(), Duration::from_millis(200), 5)
            .with_retry_delay(Duration::from_millis(1))
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, AdvisorError::UpstreamStatus { status: 500, .. }));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_client_error_status_not_retried() {
        let provider = MockProvider::new(vec![Reply::Fail(|| AdvisorError::UpstreamStatus {
            status: 403,
            body: "API key invalid".to_string(),
        })]);
        let err = gateway(provider.clone(), 1)
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out() {
        let provider = MockProvider::new(vec![Reply::Hang, Reply::Hang]);
        let err = AnalysisGateway::new(provider.clone(), Duration::from_millis(50), 0)
            .analyze(PNG_B64, "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, AdvisorError::UpstreamTimeout { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_degraded_payload_literals() {
        let provider = MockProvider::new(vec![]);
        let degraded = gateway(provider, 0).degraded();

        assert_eq!(degraded.grade, "Error");
        assert_eq!(degraded.percentage_loss, 0.0);
        assert_eq!(degraded.analysis_summary, "Cannot analyze the image.");
        assert_eq!(
            degraded.tips,
            vec!["Try clearer lighting", "Upload a non-blurry image"]
        );
        assert_eq!(degraded.doctor_consultation_advice, "Retry with another picture.");
        assert_eq!(degraded.additional_hair_care_tips.len(), 3);
    }
}
