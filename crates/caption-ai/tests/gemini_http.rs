//! GeminiProvider against a local one-shot HTTP responder.

use std::io::Cursor;
use std::time::Duration;

use image::{ImageFormat, Rgba, RgbaImage};
use polaroid_caption_ai::{CaptionProvider, CaptionService, GeminiProvider};
use polaroid_model::{CapturedImage, Facing, ImageOrigin};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Recorded {
    head: String,
    body: serde_json::Value,
}

/// Serve exactly one request with `status` and `reply`, handing back what
/// the client sent.
async fn serve_once(status: &'static str, reply: String) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 8192];
        let (head, body_start, length) = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending a full request");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..pos]).to_string();
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (head, pos + 4, length);
            }
        };
        while raw.len() < body_start + length {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
        }
        let body = serde_json::from_slice(&raw[body_start..body_start + length]).unwrap();

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
            reply.len(),
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        Recorded { head, body }
    });
    (format!("http://{addr}"), handle)
}

fn jpeg_still() -> CapturedImage {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([200, 100, 50, 255])))
        .to_rgb8()
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    CapturedImage::from_encoded(
        out.into_inner(),
        ImageOrigin::Camera {
            facing: Facing::Front,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn sends_image_and_prompt_and_reads_text() {
    let reply = serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": " 夕阳正好 "}]}}]
    })
    .to_string();
    let (endpoint, server) = serve_once("200 OK", reply).await;

    let provider =
        GeminiProvider::new(endpoint, "gemini-2.5-flash", "secret-key", Duration::from_secs(5))
            .unwrap();
    let image = jpeg_still();
    let text = provider.generate(&image, "say something").await.unwrap();
    assert_eq!(text, "夕阳正好");

    let recorded = server.await.unwrap();
    let request_line = recorded.head.lines().next().unwrap_or_default();
    assert_eq!(
        request_line,
        "POST /v1beta/models/gemini-2.5-flash:generateContent HTTP/1.1"
    );
    assert!(recorded
        .head
        .lines()
        .any(|l| l.eq_ignore_ascii_case("x-goog-api-key: secret-key")));

    let parts = &recorded.body["contents"][0]["parts"];
    assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
    assert!(!parts[0]["inline_data"]["data"].as_str().unwrap_or_default().is_empty());
    assert_eq!(parts[1]["text"], "say something");
}

#[tokio::test]
async fn http_error_falls_back_through_the_service() {
    let (endpoint, server) = serve_once(
        "429 Too Many Requests",
        r#"{"error":{"message":"quota"}}"#.to_string(),
    )
    .await;
    let provider =
        GeminiProvider::new(endpoint, "gemini-2.5-flash", "k", Duration::from_secs(5)).unwrap();

    let service = CaptionService::new(
        Some(std::sync::Arc::new(provider)),
        "prompt",
        "美好瞬间",
        Duration::from_secs(5),
    );
    let outcome = service
        .request_caption(&jpeg_still(), &CancellationToken::new())
        .await;
    assert_eq!(outcome.text, "美好瞬间");
    assert!(!outcome.generated);
    server.await.unwrap();
}
