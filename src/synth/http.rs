use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{ReelError, ReelResult};
use crate::synth::capability::{ImageSynthesizer, ImageToImageRequest, TextToImageRequest};

const TXT2IMG_PATH: &str = "/sdapi/v1/txt2img";
const IMG2IMG_PATH: &str = "/sdapi/v1/img2img";

/// Capability backed by a Stable Diffusion WebUI-compatible HTTP API.
///
/// Every request carries an explicit seed, so a server that honors it is deterministic for a
/// fixed request.
#[derive(Debug, Clone)]
pub struct HttpSynthesizer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, serde::Serialize)]
struct Txt2ImgBody<'a> {
    prompt: &'a str,
    seed: u64,
    steps: u32,
    cfg_scale: f32,
    width: u32,
    height: u32,
    batch_size: u32,
    n_iter: u32,
}

#[derive(Debug, serde::Serialize)]
struct Img2ImgBody<'a> {
    init_images: Vec<String>,
    denoising_strength: f64,
    prompt: &'a str,
    seed: u64,
    steps: u32,
    cfg_scale: f32,
    width: u32,
    height: u32,
    batch_size: u32,
    n_iter: u32,
}

#[derive(Debug, serde::Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: Vec<String>,
}

impl HttpSynthesizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> ReelResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(ReelError::validation("http synthesizer endpoint is empty"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReelError::setup(format!("failed to build http client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn post<B: serde::Serialize>(&self, path: &str, body: &B) -> ReelResult<PixelBuffer> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, "posting generation request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| ReelError::synthesis(format!("request to '{url}' failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ReelError::synthesis(format!(
                "'{url}' returned {status}: {}",
                text.trim()
            )));
        }

        let parsed: ImagesResponse = response
            .json()
            .map_err(|e| ReelError::synthesis(format!("invalid response from '{url}': {e}")))?;
        let first = parsed
            .images
            .first()
            .ok_or_else(|| ReelError::synthesis(format!("'{url}' returned no images")))?;
        decode_image_payload(first)
    }
}

impl ImageSynthesizer for HttpSynthesizer {
    fn name(&self) -> &'static str {
        "http"
    }

    fn text_to_image(&mut self, req: &TextToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        req.params.validate()?;
        let body = Txt2ImgBody {
            prompt: req.prompt,
            seed: req.seed,
            steps: req.params.steps,
            cfg_scale: req.params.guidance_scale,
            width: req.params.width,
            height: req.params.height,
            batch_size: 1,
            n_iter: 1,
        };
        self.post(TXT2IMG_PATH, &body)
    }

    fn image_to_image(&mut self, req: &ImageToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        req.params.validate()?;
        let source = BASE64.encode(req.source.encode_png()?);
        let body = Img2ImgBody {
            init_images: vec![source],
            denoising_strength: req.strength,
            prompt: req.prompt,
            seed: req.seed,
            steps: req.params.steps,
            cfg_scale: req.params.guidance_scale,
            width: req.source.width,
            height: req.source.height,
            batch_size: 1,
            n_iter: 1,
        };
        self.post(IMG2IMG_PATH, &body)
    }
}

/// Decode a base64 image, with or without a `data:` URL prefix.
pub(crate) fn decode_image_payload(payload: &str) -> ReelResult<PixelBuffer> {
    let raw = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let bytes = BASE64
        .decode(raw.trim())
        .map_err(|e| ReelError::synthesis(format!("invalid base64 image payload: {e}")))?;
    PixelBuffer::decode(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/synth/http.rs"]
mod tests;
