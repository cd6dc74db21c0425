//! Caption requests with timeout, cancellation and fallback.

use std::sync::Arc;
use std::time::Duration;

use polaroid_common::config::CaptionDefaults;
use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_model::CapturedImage;
use tokio_util::sync::CancellationToken;

use crate::gemini::GeminiProvider;
use crate::provider::CaptionProvider;

/// Result of a caption request that cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionOutcome {
    pub text: String,
    /// `false` when `text` is the fallback.
    pub generated: bool,
}

/// Single-attempt captioning front end.
#[derive(Clone)]
pub struct CaptionService {
    provider: Option<Arc<dyn CaptionProvider>>,
    prompt: String,
    fallback: String,
    timeout: Duration,
}

impl CaptionService {
    pub fn new(
        provider: Option<Arc<dyn CaptionProvider>>,
        prompt: impl Into<String>,
        fallback: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            prompt: prompt.into(),
            fallback: fallback.into(),
            timeout,
        }
    }

    /// Service backed by Gemini when a credential is configured; otherwise
    /// every request yields the fallback.
    pub fn from_defaults(caption: &CaptionDefaults) -> Self {
        let provider: Option<Arc<dyn CaptionProvider>> = match GeminiProvider::from_defaults(caption)
        {
            Ok(Some(gemini)) => Some(Arc::new(gemini)),
            Ok(None) => {
                tracing::info!(
                    env = %caption.api_key_env,
                    "No captioning credential; captions will use the fallback"
                );
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Captioning disabled");
                None
            }
        };
        Self::new(
            provider,
            caption.prompt.clone(),
            caption.fallback.clone(),
            Duration::from_secs(caption.timeout_secs),
        )
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// One caption attempt, with errors surfaced.
    pub async fn try_caption(
        &self,
        image: &CapturedImage,
        cancel: &CancellationToken,
    ) -> PolaroidResult<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| PolaroidError::caption("No captioning credential configured"))?;

        let request = tokio::time::timeout(self.timeout, provider.generate(image, &self.prompt));
        let text = tokio::select! {
            _ = cancel.cancelled() => return Err(PolaroidError::Cancelled),
            result = request => match result {
                Ok(text) => text?,
                Err(_) => return Err(PolaroidError::timeout("caption request", self.timeout)),
            },
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(PolaroidError::caption(format!(
                "{} returned an empty caption",
                provider.name()
            )));
        }
        Ok(text.to_string())
    }

    /// One caption attempt that always produces text.
    pub async fn request_caption(
        &self,
        image: &CapturedImage,
        cancel: &CancellationToken,
    ) -> CaptionOutcome {
        match self.try_caption(image, cancel).await {
            Ok(text) => {
                tracing::info!(chars = text.chars().count(), "Caption generated");
                CaptionOutcome {
                    text,
                    generated: true,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, fallback = %self.fallback, "Caption failed; using fallback");
                CaptionOutcome {
                    text: self.fallback.clone(),
                    generated: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{ImageFormat, Rgba, RgbaImage};
    use polaroid_common::config::DEFAULT_FALLBACK_CAPTION;
    use polaroid_model::{Facing, ImageOrigin};

    use super::*;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct StubProvider {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl CaptionProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, _image: &CapturedImage, prompt: &str) -> PolaroidResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("Chinese"));
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(PolaroidError::caption("quota exceeded")),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn still() -> CapturedImage {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        CapturedImage::from_encoded(
            out.into_inner(),
            ImageOrigin::Camera {
                facing: Facing::Front,
            },
        )
        .unwrap()
    }

    fn service(provider: Option<Arc<StubProvider>>) -> CaptionService {
        let defaults = CaptionDefaults::default();
        CaptionService::new(
            provider.map(|p| p as Arc<dyn CaptionProvider>),
            defaults.prompt,
            defaults.fallback,
            Duration::from_secs(20),
        )
    }

    #[tokio::test]
    async fn generated_text_is_trimmed() {
        let provider = StubProvider::new(Reply::Text("  春日微光 \n"));
        let outcome = service(Some(provider.clone()))
            .request_caption(&still(), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            CaptionOutcome {
                text: "春日微光".into(),
                generated: true
            }
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_error_becomes_fallback() {
        let provider = StubProvider::new(Reply::Fail);
        let svc = service(Some(provider.clone()));
        let outcome = svc.request_caption(&still(), &CancellationToken::new()).await;
        assert_eq!(outcome.text, DEFAULT_FALLBACK_CAPTION);
        assert!(!outcome.generated);
        // Single attempt, no retry.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let err = svc
            .try_caption(&still(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PolaroidError::Caption { .. }));
    }

    #[tokio::test]
    async fn blank_text_becomes_fallback() {
        let outcome = service(Some(StubProvider::new(Reply::Text("   "))))
            .request_caption(&still(), &CancellationToken::new())
            .await;
        assert_eq!(outcome.text, DEFAULT_FALLBACK_CAPTION);
    }

    #[tokio::test]
    async fn missing_credential_becomes_fallback() {
        let svc = service(None);
        assert!(!svc.has_provider());
        let outcome = svc.request_caption(&still(), &CancellationToken::new()).await;
        assert_eq!(outcome.text, DEFAULT_FALLBACK_CAPTION);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let svc = service(Some(StubProvider::new(Reply::Hang)));
        let err = svc
            .try_caption(&still(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PolaroidError::Timeout { .. }));

        let outcome = svc.request_caption(&still(), &CancellationToken::new()).await;
        assert!(!outcome.generated);
    }

    #[tokio::test]
    async fn cancellation_becomes_fallback() {
        let svc = service(Some(StubProvider::new(Reply::Hang)));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = svc.try_caption(&still(), &cancel).await.unwrap_err();
        assert!(matches!(err, PolaroidError::Cancelled));
        assert_eq!(svc.request_caption(&still(), &cancel).await.text, DEFAULT_FALLBACK_CAPTION);
    }
}
