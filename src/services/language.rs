//! Script-based language detection and the chatbot's canned replies.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Mr,
    Pa,
}

impl Language {
    pub const ALL: [Self; 4] = [Self::En, Self::Hi, Self::Mr, Self::Pa];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Mr => "mr",
            Self::Pa => "pa",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "hi" => Ok(Self::Hi),
            "mr" => Ok(Self::Mr),
            "pa" => Ok(Self::Pa),
            other => Err(format!("Unsupported language: {other}")),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

const MARATHI_MARKERS: [&str; 7] = ["आहे", "मला", "तुला", "काय", "कसे", "कुठे", "कधी"];
const HINDI_MARKERS: [&str; 7] = ["है", "मुझे", "तुम्हें", "क्या", "कैसे", "कहां", "कब"];

/// Devanagari text with equal marker scores is read as Hindi.
pub const DEVANAGARI_TIE_BREAK: Language = Language::Hi;

fn non_script_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\x{0900}-\x{097F}\x{0A00}-\x{0A7F}A-Za-z0-9_]").expect("Invalid regex")
    })
}

const fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}')
}

const fn is_gurmukhi(c: char) -> bool {
    matches!(c, '\u{0A00}'..='\u{0A7F}')
}

fn marker_score(text: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| text.contains(*m)).count()
}

/// Classifies a chat message by script.
///
/// Gurmukhi wins outright. Devanagari is split between Marathi and Hindi by
/// counting which small marker lexicon has more words present in the text.
/// Anything else, including empty input, is English.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    if text.trim().is_empty() {
        return Language::En;
    }

    let script_only = non_script_chars().replace_all(text, "");

    if script_only.chars().any(is_gurmukhi) {
        return Language::Pa;
    }

    if script_only.chars().any(is_devanagari) {
        let lower = text.to_lowercase();
        let marathi = marker_score(&lower, &MARATHI_MARKERS);
        let hindi = marker_score(&lower, &HINDI_MARKERS);

        return match marathi.cmp(&hindi) {
            std::cmp::Ordering::Greater => Language::Mr,
            std::cmp::Ordering::Less => Language::Hi,
            std::cmp::Ordering::Equal => DEVANAGARI_TIE_BREAK,
        };
    }

    Language::En
}

// ============================================================================
// Chatbot replies
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    ThankYou,
    SoilHealth,
    Weather,
    PestControl,
    MarketPrices,
}

impl Topic {
    /// Maps a quick-reply label or free text onto a topic.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let key: String = text
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_lowercase)
            .collect();

        match key.as_str() {
            "soilhealthtips" | "soilhealth" => Self::SoilHealth,
            "weatherupdate" | "weather" => Self::Weather,
            "pestcontrol" => Self::PestControl,
            "marketprices" => Self::MarketPrices,
            _ => Self::ThankYou,
        }
    }
}

/// Reply text per language and topic, built once at startup.
#[derive(Debug, Clone)]
pub struct ResponseCatalog {
    default_language: Language,
    entries: HashMap<(Language, Topic), String>,
}

impl ResponseCatalog {
    #[must_use]
    pub fn new(default_language: Language) -> Self {
        Self {
            default_language,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, language: Language, topic: Topic, reply: impl Into<String>) -> Self {
        self.entries.insert((language, topic), reply.into());
        self
    }

    #[must_use]
    pub const fn default_language(&self) -> Language {
        self.default_language
    }

    /// Falls back to the default language when a translation is missing.
    #[must_use]
    pub fn reply(&self, language: Language, topic: Topic) -> Option<&str> {
        self.entries
            .get(&(language, topic))
            .or_else(|| self.entries.get(&(self.default_language, topic)))
            .map(String::as_str)
    }

    /// The stock catalog in English, Hindi, Marathi and Punjabi.
    #[must_use]
    pub fn builtin() -> Self {
        use Language::{En, Hi, Mr, Pa};
        use Topic::{MarketPrices, PestControl, SoilHealth, ThankYou, Weather};

        Self::new(En)
            .with(En, ThankYou, "Thank you for your question! I'm here to help with your farming needs.")
            .with(En, SoilHealth, "Here are some soil health tips: Test pH regularly, use organic matter, rotate crops.")
            .with(En, Weather, "Today's weather: Clear skies, 25°C. Good conditions for farming activities.")
            .with(En, PestControl, "For pest control: Use neem oil, maintain field hygiene, implement IPM practices.")
            .with(En, MarketPrices, "Current market prices: Wheat ₹2,200/quintal, Rice ₹2,800/quintal.")
            .with(Hi, ThankYou, "आपके प्रश्न के लिए धन्यवाद! मैं आपकी खेती की जरूरतों में मदद के लिए यहां हूं।")
            .with(Hi, SoilHealth, "मिट्टी की सेहत के टिप्स: नियमित pH टेस्ट करें, जैविक खाद डालें, फसल चक्र अपनाएं।")
            .with(Hi, Weather, "आज का मौसम: साफ आसमान, 25°C। खेती के काम के लिए अच्छी स्थिति।")
            .with(Hi, PestControl, "कीट नियंत्रण के लिए: नीम का तेल उपयोग करें, खेत की सफाई रखें, IPM अपनाएं।")
            .with(Hi, MarketPrices, "वर्तमान बाजार भाव: गेहूं ₹2,200/क्विंटल, चावल ₹2,800/क्विंटल।")
            .with(Mr, ThankYou, "तुमच्या प्रश्नासाठी धन्यवाद! मी तुमच्या शेतीच्या गरजांमध्ये मदत करण्यासाठी येथे आहे।")
            .with(Mr, SoilHealth, "मातीच्या आरोग्यासाठी टिप्स: नियमित pH तपासा, सेंद्रिय खत वापरा, पीक चक्र करा।")
            .with(Mr, Weather, "आजचे हवामान: स्वच्छ आकाश, 25°C। शेतीच्या कामासाठी चांगली परिस्थिती।")
            .with(Mr, PestControl, "कीड नियंत्रणासाठी: कडुनिंबाचे तेल वापरा, शेताची स्वच्छता राखा, IPM अवलंबा।")
            .with(Mr, MarketPrices, "सद्य बाजार भाव: गहू ₹2,200/क्विंटल, तांदूळ ₹2,800/क्विंटल।")
            .with(Pa, ThankYou, "ਤੁਹਾਡੇ ਸਵਾਲ ਲਈ ਧੰਨਵਾਦ! ਮੈਂ ਤੁਹਾਡੀ ਖੇਤੀ ਦੀਆਂ ਲੋੜਾਂ ਵਿੱਚ ਮਦਦ ਲਈ ਇੱਥੇ ਹਾਂ।")
            .with(Pa, SoilHealth, "ਮਿੱਟੀ ਦੀ ਸਿਹਤ ਦੇ ਟਿਪਸ: ਨਿਯਮਿਤ pH ਟੈਸਟ ਕਰੋ, ਜੈਵਿਕ ਖਾਦ ਵਰਤੋ, ਫਸਲੀ ਚੱਕਰ ਅਪਣਾਓ।")
            .with(Pa, Weather, "ਅੱਜ ਦਾ ਮੌਸਮ: ਸਾਫ਼ ਅਸਮਾਨ, 25°C। ਖੇਤੀ ਦੇ ਕੰਮਾਂ ਲਈ ਚੰਗੀ ਸਥਿਤੀ।")
            .with(Pa, PestControl, "ਕੀੜੇ ਕੰਟਰੋਲ ਲਈ: ਨਿੰਮ ਦਾ ਤੇਲ ਵਰਤੋ, ਖੇਤ ਦੀ ਸਫਾਈ ਰੱਖੋ, IPM ਅਪਣਾਓ।")
            .with(Pa, MarketPrices, "ਮੌਜੂਦਾ ਮਾਰਕਿਟ ਰੇਟ: ਕਣਕ ₹2,200/ਕਿਵੰਟਲ, ਚਾਵਲ ₹2,800/ਕਿਵੰਟਲ।")
    }
}
