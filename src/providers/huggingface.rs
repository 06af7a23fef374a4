use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{ info, warn };
use reqwest::{ Client as HttpClient, header::AUTHORIZATION };
use serde::{ Deserialize, Serialize };

use crate::session::Preferences;
use super::{ is_substantial, ImagePayload, ProviderError, ReplyProvider };

#[derive(Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: TextGenerationParameters,
}

#[derive(Serialize)]
struct TextGenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}

impl Default for TextGenerationParameters {
    fn default() -> Self {
        Self {
            max_new_tokens: 150,
            temperature: 0.7,
            top_p: 0.9,
            do_sample: true,
            return_full_text: false,
        }
    }
}

#[derive(Deserialize)]
struct TextGenerationResponse {
    generated_text: String,
}

#[derive(Serialize)]
struct TextToImageRequest<'a> {
    inputs: &'a str,
    parameters: TextToImageParameters<'a>,
}

#[derive(Serialize)]
struct TextToImageParameters<'a> {
    negative_prompt: &'a str,
    num_inference_steps: u32,
    guidance_scale: f32,
}

impl Default for TextToImageParameters<'_> {
    fn default() -> Self {
        Self {
            negative_prompt: "blurry, low quality, distorted",
            num_inference_steps: 25,
            guidance_scale: 7.5,
        }
    }
}

/// Secondary tier: the Hugging Face inference API. Each call walks a ladder of
/// models and returns the first substantial result; a model-level failure just
/// moves on to the next model.
pub struct HuggingFaceProvider {
    http: HttpClient,
    api_key: String,
    base_url: String,
    text_models: Vec<String>,
    image_models: Vec<String>,
}

impl HuggingFaceProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        text_models: Vec<String>,
        image_models: Vec<String>
    ) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            base_url,
            text_models,
            image_models,
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), model)
    }

    async fn generate_with_model(
        &self,
        model: &str,
        prompt: &str
    ) -> Result<String, ProviderError> {
        let req = TextGenerationRequest {
            inputs: prompt,
            parameters: TextGenerationParameters::default(),
        };
        let resp = self.http
            .post(self.model_url(model))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<Vec<TextGenerationResponse>>().await?;

        let mut reply = resp
            .into_iter()
            .next()
            .map(|r| r.generated_text)
            .ok_or(ProviderError::EmptyResponse("huggingface"))?;

        // some models echo the prompt despite return_full_text=false
        if let Some(stripped) = reply.strip_prefix(prompt) {
            reply = stripped.trim().to_string();
        }

        if is_substantial(&reply) {
            Ok(reply)
        } else {
            Err(ProviderError::EmptyResponse("huggingface"))
        }
    }

    async fn image_with_model(
        &self,
        model: &str,
        prompt: &str
    ) -> Result<ImagePayload, ProviderError> {
        let req = TextToImageRequest {
            inputs: prompt,
            parameters: TextToImageParameters::default(),
        };
        let bytes = self.http
            .post(self.model_url(model))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send().await?
            .error_for_status()?
            .bytes().await?;

        if bytes.is_empty() {
            return Err(ProviderError::EmptyResponse("huggingface"));
        }

        let image = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
        Ok(ImagePayload {
            image,
            message: format!("Image generated successfully for: \"{}\" using AI!", prompt),
        })
    }
}

#[async_trait]
impl ReplyProvider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn complete(
        &self,
        prompt: &str,
        _preferences: &Preferences
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("huggingface"));
        }

        for model in &self.text_models {
            match self.generate_with_model(model, prompt).await {
                Ok(reply) => {
                    info!("Hugging Face text generation succeeded with model '{}'", model);
                    return Ok(reply);
                }
                Err(e) => {
                    warn!("Hugging Face model '{}' failed: {}", model, e);
                }
            }
        }
        Err(ProviderError::AllModelsFailed("huggingface"))
    }

    async fn text_to_image(&self, prompt: &str) -> Result<ImagePayload, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("huggingface"));
        }

        for model in &self.image_models {
            match self.image_with_model(model, prompt).await {
                Ok(payload) => {
                    info!("Hugging Face image generation succeeded with model '{}'", model);
                    return Ok(payload);
                }
                Err(e) => {
                    warn!("Hugging Face image model '{}' failed: {}", model, e);
                }
            }
        }
        Err(ProviderError::AllModelsFailed("huggingface"))
    }
}
