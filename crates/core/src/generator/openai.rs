//! OpenAI-compatible generation client (chat completions + image generations).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{description_prompt, image_prompt, ContentGenerator, GeneratorError};
use crate::config::GeneratorConfig;

/// Generation client talking to an OpenAI-compatible API.
pub struct OpenAiGenerator {
    client: Client,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GeneratorError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeneratorError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(GeneratorError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| GeneratorError::Json(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn describe(&self, topic: &str) -> Result<String, GeneratorError> {
        let prompt = description_prompt(topic, &self.config.description_examples);
        let request = ChatRequest {
            model: &self.config.text_model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response: ChatResponse = self.post_json("chat/completions", &request).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GeneratorError::Empty("no completion text".to_string()))?;

        debug!("Generated description for '{}' ({} chars)", topic, text.len());
        Ok(text)
    }

    async fn render_image(&self, topic: &str, dest: &Path) -> Result<(), GeneratorError> {
        info!("Generating profile picture");

        let prompt = image_prompt(topic);
        let request = ImageRequest {
            model: &self.config.image_model,
            prompt: &prompt,
            n: 1,
            size: &self.config.image_size,
        };

        let response: ImageResponse = self.post_json("images/generations", &request).await?;
        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GeneratorError::Empty("no image in response".to_string()))?;

        let bytes = match (image.b64_json, image.url) {
            (Some(encoded), _) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| GeneratorError::Json(format!("invalid b64_json: {}", e)))?,
            (None, Some(url)) => {
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| GeneratorError::Http(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(GeneratorError::Api {
                        status: response.status().as_u16(),
                        message: format!("image download failed: {}", url),
                    });
                }
                response
                    .bytes()
                    .await
                    .map_err(|e| GeneratorError::Http(e.to_string()))?
                    .to_vec()
            }
            (None, None) => {
                return Err(GeneratorError::Empty(
                    "image entry has neither url nor b64_json".to_string(),
                ))
            }
        };

        tokio::fs::write(dest, &bytes).await?;
        info!(
            "Profile picture saved as {}",
            dest.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> GeneratorConfig {
        GeneratorConfig {
            api_key: "sk-test".to_string(),
            api_base,
            text_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            timeout_secs: 5,
            description_examples: vec![],
        }
    }

    #[tokio::test]
    async fn test_describe_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Cute pets daily  " } }]
            })))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new(config(server.uri())).unwrap();
        let text = generator.describe("pets").await.unwrap();
        assert_eq!(text, "Cute pets daily");
    }

    #[tokio::test]
    async fn test_describe_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "quota exceeded" }
            })))
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new(config(server.uri())).unwrap();
        match generator.describe("pets").await {
            Err(GeneratorError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_render_image_downloads_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "url": format!("{}/files/img.png", server.uri()) }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("42.png");
        let generator = OpenAiGenerator::new(config(server.uri())).unwrap();
        generator.render_image("pets", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_render_image_decodes_b64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "b64_json": "UE5HREFUQQ==" }]
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("7.png");
        let generator = OpenAiGenerator::new(config(server.uri())).unwrap();
        generator.render_image("pets", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"PNGDATA");
    }
}
