use tracing::{info, warn};

use crate::clients::openai::{ChatMessage, OpenAiClient};
use crate::clients::vision::VisionClient;
use crate::services::soil_service::{
    SoilAnalysis, SoilError, SoilParameters, SoilReport, SoilService, SoilStatus,
};

/// OCR stand-in used when no OCR key is configured.
pub const SAMPLE_REPORT_TEXT: &str = "Sample Soil Test Report\nSoil pH: 6.8\nNitrogen: 150 ppm\nPhosphorus: 25 ppm\nPotassium: 280 ppm\nOrganic Carbon: 0.8%\nElectrical Conductivity: 0.4 dS/m";

const ENGLISH_ISSUES: [&str; 3] = [
    "Low phosphorus levels detected",
    "Organic carbon content below optimal range",
    "Soil pH slightly acidic for most crops",
];

const ENGLISH_ADVICE: [&str; 4] = [
    "Apply DAP fertilizer to increase phosphorus levels",
    "Add organic compost to improve soil structure",
    "Consider lime application to adjust pH to 7.0-7.5",
    "Use balanced NPK fertilizer for overall nutrition",
];

const HINDI_ISSUES: [&str; 3] = [
    "फॉस्फोरस का स्तर कम है",
    "जैविक कार्बन की मात्रा कम है",
    "मिट्टी का pH अधिकांश फसलों के लिए थोड़ा अम्लीय है",
];

const HINDI_ADVICE: [&str; 4] = [
    "फॉस्फोरस बढ़ाने के लिए DAP खाद का उपयोग करें",
    "मिट्टी की संरचना सुधारने के लिए जैविक खाद डालें",
    "pH को 7.0-7.5 तक लाने के लिए चूना डालना विचार करें",
    "समग्र पोषण के लिए संतुलित NPK खाद का उपयोग करें",
];

/// Deterministic analysis of the sample report. Issue and advice lists are
/// Hindi for `Hindi`, English for anything else.
#[must_use]
pub fn fallback_analysis(language: &str) -> SoilAnalysis {
    let (issues, advice): (&[&str], &[&str]) = if language == "Hindi" {
        (&HINDI_ISSUES, &HINDI_ADVICE)
    } else {
        (&ENGLISH_ISSUES, &ENGLISH_ADVICE)
    };

    SoilAnalysis {
        status: SoilStatus::NeedsImprovement,
        parameters: SoilParameters {
            ph: 6.8,
            nitrogen: 150.0,
            phosphorus: 25.0,
            potassium: 280.0,
            organic_carbon: 0.8,
        },
        issues: issues.iter().map(ToString::to_string).collect(),
        advice: advice.iter().map(ToString::to_string).collect(),
        language: language.to_string(),
    }
}

fn system_prompt(language: &str) -> String {
    format!(
        r#"You are an agricultural soil analysis expert. Analyze the extracted text from a soil test report and provide structured recommendations in {language}.

Extract numerical values for soil parameters and provide farming advice.

Respond with JSON in this exact format:
{{
  "status": "Good" | "Needs Improvement" | "Poor",
  "parameters": {{
    "pH": number,
    "nitrogen": number,
    "phosphorus": number,
    "potassium": number,
    "organic_carbon": number
  }},
  "issues": ["list", "of", "issues"],
  "advice": ["practical", "farming", "recommendations"],
  "language": "{language}"
}}"#
    )
}

/// Parses the model's answer. `None` when it is not an analysis object.
#[must_use]
pub fn parse_analysis(content: &str, language: &str) -> Option<SoilAnalysis> {
    let mut analysis: SoilAnalysis = serde_json::from_str(content.trim()).ok()?;
    if analysis.language.is_empty() {
        analysis.language = language.to_string();
    }
    Some(analysis)
}

pub struct DefaultSoilService {
    vision: Option<VisionClient>,
    llm: Option<OpenAiClient>,
}

impl DefaultSoilService {
    #[must_use]
    pub const fn new(vision: Option<VisionClient>, llm: Option<OpenAiClient>) -> Self {
        Self { vision, llm }
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String, SoilError> {
        let Some(vision) = &self.vision else {
            info!("No OCR key configured, using sample report text");
            return Ok(SAMPLE_REPORT_TEXT.to_string());
        };

        Ok(vision.detect_text(image).await?.unwrap_or_default())
    }

    async fn interpret(&self, ocr_text: &str, language: &str) -> Result<SoilAnalysis, SoilError> {
        let Some(llm) = self.llm.as_ref().filter(|_| !ocr_text.is_empty()) else {
            info!("LLM key missing or no OCR text, using fallback analysis");
            return Ok(fallback_analysis(language));
        };

        let system = system_prompt(language);
        let user = format!("Analyze this soil test report text:\n\n{ocr_text}");
        let messages = [
            ChatMessage {
                role: "system",
                content: &system,
            },
            ChatMessage {
                role: "user",
                content: &user,
            },
        ];

        let Some(content) = llm.complete(&messages).await? else {
            warn!("LLM returned no content, using fallback analysis");
            return Ok(fallback_analysis(language));
        };

        Ok(parse_analysis(&content, language).unwrap_or_else(|| {
            warn!("LLM answer is not a soil analysis, using fallback analysis");
            fallback_analysis(language)
        }))
    }
}

#[async_trait::async_trait]
impl SoilService for DefaultSoilService {
    async fn analyze(&self, image: &[u8], language: &str) -> Result<SoilReport, SoilError> {
        if image.is_empty() {
            return Err(SoilError::Validation("No image file provided".to_string()));
        }

        let ocr_text = self.extract_text(image).await?;
        let analysis = self.interpret(&ocr_text, language).await?;

        info!(
            image_size = image.len(),
            language,
            status = ?analysis.status,
            "Soil analysis completed"
        );

        Ok(SoilReport { ocr_text, analysis })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_without_keys_uses_sample_text_and_fallback() {
        let service = DefaultSoilService::new(None, None);
        let report = service.analyze(b"jpeg", "English").await.unwrap();

        assert_eq!(report.ocr_text, SAMPLE_REPORT_TEXT);
        assert_eq!(report.analysis, fallback_analysis("English"));
    }

    #[tokio::test]
    async fn test_empty_image_is_rejected() {
        let service = DefaultSoilService::new(None, None);
        assert!(matches!(
            service.analyze(b"", "English").await,
            Err(SoilError::Validation(_))
        ));
    }

    #[test]
    fn test_fallback_language_selection() {
        let hindi = fallback_analysis("Hindi");
        assert_eq!(hindi.issues[0], "फॉस्फोरस का स्तर कम है");
        assert_eq!(hindi.language, "Hindi");

        let marathi = fallback_analysis("Marathi");
        assert_eq!(marathi.issues[0], "Low phosphorus levels detected");
        assert_eq!(marathi.language, "Marathi");
        assert_eq!(marathi.advice.len(), 4);
    }

    #[test]
    fn test_fallback_serializes_ph_key() {
        let json = serde_json::to_value(fallback_analysis("English")).unwrap();
        assert_eq!(json["status"], "Needs Improvement");
        assert_eq!(json["parameters"]["pH"], 6.8);
    }

    #[test]
    fn test_parse_analysis() {
        let content = r#"{
            "status": "Good",
            "parameters": {"pH": 7.1, "nitrogen": 210, "phosphorus": 30, "potassium": 300, "organic_carbon": 0.9},
            "issues": [],
            "advice": ["Maintain current practice"]
        }"#;

        let analysis = parse_analysis(content, "English").unwrap();
        assert_eq!(analysis.status, SoilStatus::Good);
        assert_eq!(analysis.language, "English");
        assert!(parse_analysis("Sure! Here is your analysis.", "English").is_none());
    }
}
