use polaroid_common::error::PolaroidResult;
use polaroid_model::CapturedImage;

/// A model that can describe an image.
#[async_trait::async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Generate caption text for `image` following `prompt`.
    ///
    /// Implementations return the raw text; trimming and fallback handling
    /// happen in the service.
    async fn generate(&self, image: &CapturedImage, prompt: &str) -> PolaroidResult<String>;
}
