use serde::{Deserialize, Serialize};

use crate::core::{
    GeneratedImage, ImageData, ImageGeneration, ImageRequest, ImageResponseFormat, LlmError,
};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ImageGenerationRequest {
    pub model: String,

    pub prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<&'static str>,
}

impl From<&ImageRequest> for ImageGenerationRequest {
    fn from(request: &ImageRequest) -> Self {
        Self {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            n: request.n,
            response_format: request.response_format.map(|format| match format {
                ImageResponseFormat::Url => "url",
                ImageResponseFormat::B64Json => "b64_json",
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageGenerationResponse {
    #[serde(default)]
    pub data: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageEntry {
    pub url: Option<String>,
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

impl ImageGenerationResponse {
    pub(crate) fn into_generation(self) -> Result<ImageGeneration, LlmError> {
        let images = self
            .data
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let data = match (entry.url, entry.b64_json) {
                    (Some(url), _) => ImageData::Url(url),
                    (None, Some(b64)) => ImageData::Base64(b64),
                    (None, None) => {
                        return Err(LlmError::parse(
                            "Failed to parse image response",
                            format!("image {index} has neither `url` nor `b64_json`"),
                        ));
                    }
                };
                Ok(GeneratedImage {
                    data,
                    revised_prompt: entry.revised_prompt,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ImageGeneration { images })
    }
}
