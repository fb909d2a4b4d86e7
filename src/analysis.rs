//! Root-cause analysis request.

use std::fmt;

use tracing::info;

use crate::config::Credential;
use crate::error::RcaResult;
use crate::llm::{ChatModel, MessageContent};
use crate::processing::EncodedImage;
use crate::severity::SeverityTier;

/// Instruction sent alongside the workplace photograph.
pub fn analysis_instruction() -> String {
    format!(
        "Analyze this workplace image for Root Cause Analysis. Identify problems, assess their \
         severity ({}), determine immediate causes and potential root causes. Focus on safety \
         hazards, operational inefficiencies, quality issues, and maintenance problems. Provide a \
         detailed analysis with severity classifications.",
        SeverityTier::assessed_scale()
    )
}

/// Free-text analysis exactly as the model returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisText(String);

impl AnalysisText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AnalysisText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Send the encoded image to the model and return its analysis verbatim.
pub fn analyze_workplace(
    model: &dyn ChatModel,
    credential: &Credential,
    image: &EncodedImage,
) -> RcaResult<AnalysisText> {
    let text = model.complete(
        credential,
        MessageContent::TextWithImage {
            text: analysis_instruction(),
            image_data_uri: image.data_uri(),
        },
    )?;
    info!(chars = text.len(), "Root cause analysis complete");
    Ok(AnalysisText(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoModel {
        seen: Mutex<Option<MessageContent>>,
    }

    impl ChatModel for EchoModel {
        fn complete(&self, _credential: &Credential, content: MessageContent) -> RcaResult<String> {
            *self.seen.lock().unwrap() = Some(content);
            Ok("  Critical: exposed wiring near the press.\n".to_string())
        }
    }

    #[test]
    fn instruction_names_categories_and_tiers() {
        let text = analysis_instruction();
        for needle in [
            "safety hazards",
            "operational inefficiencies",
            "quality issues",
            "maintenance problems",
            "Critical/High/Medium/Low",
        ] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn analysis_is_returned_verbatim_with_image_attached() {
        let model = EchoModel {
            seen: Mutex::new(None),
        };
        let image = EncodedImage {
            base64: "QUJD".to_string(),
            width: 800,
            height: 600,
        };
        let key = Credential::new("k").unwrap();

        let analysis = analyze_workplace(&model, &key, &image).unwrap();
        assert_eq!(analysis.as_str(), "  Critical: exposed wiring near the press.\n");

        match model.seen.lock().unwrap().take().unwrap() {
            MessageContent::TextWithImage { image_data_uri, .. } => {
                assert_eq!(image_data_uri, "data:image/jpeg;base64,QUJD");
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }
}
