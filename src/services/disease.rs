//! Crop disease detection.
//!
//! No model is wired in yet; a detection is one of a few fixed profiles
//! picked by the caller's RNG.

use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseSeverity {
    Low,
    Medium,
    High,
}

struct DiseaseProfile {
    name: &'static str,
    confidence: f64,
    severity: DiseaseSeverity,
    affected_area: u32,
    immediate: [&'static str; 3],
    preventive: [&'static str; 3],
    products: [&'static str; 3],
    monitoring: &'static str,
    recovery: &'static str,
}

const PROFILES: [DiseaseProfile; 3] = [
    DiseaseProfile {
        name: "Leaf Blight",
        confidence: 0.92,
        severity: DiseaseSeverity::Medium,
        affected_area: 25,
        immediate: [
            "Remove affected leaves immediately",
            "Apply copper-based fungicide",
            "Improve air circulation",
        ],
        preventive: [
            "Avoid overhead watering",
            "Space plants adequately",
            "Apply preventive fungicide spray",
        ],
        products: [
            "Copper Hydroxide 53.8% DF",
            "Mancozeb 75% WP",
            "Propiconazole 25% EC",
        ],
        monitoring: "Daily for first week, then every 3 days",
        recovery: "2-3 weeks with proper treatment",
    },
    DiseaseProfile {
        name: "Powdery Mildew",
        confidence: 0.87,
        severity: DiseaseSeverity::Low,
        affected_area: 15,
        immediate: [
            "Spray neem oil solution",
            "Remove severely affected parts",
            "Increase sunlight exposure",
        ],
        preventive: [
            "Maintain proper plant spacing",
            "Avoid high nitrogen fertilizers",
            "Regular monitoring",
        ],
        products: [
            "Neem Oil 1500 PPM",
            "Sulfur 80% WDG",
            "Potassium Bicarbonate",
        ],
        monitoring: "Every 2-3 days initially",
        recovery: "1-2 weeks",
    },
    DiseaseProfile {
        name: "Bacterial Spot",
        confidence: 0.78,
        severity: DiseaseSeverity::High,
        affected_area: 40,
        immediate: [
            "Apply copper bactericide",
            "Remove infected plant debris",
            "Disinfect tools",
        ],
        preventive: [
            "Use drip irrigation",
            "Rotate crops",
            "Plant resistant varieties",
        ],
        products: [
            "Copper Sulfate Pentahydrate",
            "Streptomycin 90% + Tetracycline 10%",
            "Kasugamycin 3% SL",
        ],
        monitoring: "Daily monitoring required",
        recovery: "3-4 weeks",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Treatment {
    pub immediate_actions: Vec<String>,
    pub preventive_measures: Vec<String>,
    pub recommended_products: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUp {
    pub monitoring_frequency: String,
    pub expected_recovery_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseDetection {
    pub disease: String,
    pub confidence: f64,
    pub severity: DiseaseSeverity,
    /// Percent of the leaf surface
    pub affected_area: u32,
    pub treatment: Treatment,
    pub follow_up: FollowUp,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl From<&DiseaseProfile> for DiseaseDetection {
    fn from(profile: &DiseaseProfile) -> Self {
        Self {
            disease: profile.name.to_string(),
            confidence: profile.confidence,
            severity: profile.severity,
            affected_area: profile.affected_area,
            treatment: Treatment {
                immediate_actions: owned(&profile.immediate),
                preventive_measures: owned(&profile.preventive),
                recommended_products: owned(&profile.products),
            },
            follow_up: FollowUp {
                monitoring_frequency: profile.monitoring.to_string(),
                expected_recovery_time: profile.recovery.to_string(),
            },
        }
    }
}

pub fn detect(rng: &mut impl Rng) -> DiseaseDetection {
    let index = rng.random_range(0..PROFILES.len());
    DiseaseDetection::from(&PROFILES[index])
}
