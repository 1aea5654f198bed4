use serde::{Deserialize, Deserializer, Serialize};

/// Hair-loss assessment returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub grade: String,
    pub percentage_loss: f64,
    pub analysis_summary: String,
    pub tips: Vec<String>,
    pub doctor_consultation_advice: String,
    #[serde(default)]
    pub additional_hair_care_tips: Vec<String>,
}

/// The five fields the provider is asked to produce. `additionalHairCareTips`
/// is ours to fill in, so it is not part of the provider contract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAssessment {
    pub grade: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub percentage_loss: f64,
    pub analysis_summary: String,
    pub tips: Vec<String>,
    pub doctor_consultation_advice: String,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }

    match Loose::deserialize(deserializer)? {
        Loose::Number(n) => Ok(n),
        Loose::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("percentageLoss is not numeric: {s}"))),
    }
}

/// A practitioner row from the directory dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PractitionerRecord {
    pub name: String,
    pub qualification: String,
    pub speciality: String,
    pub location: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub registration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Body of `POST /api/analyze`. Both fields are optional at the wire level so
/// that a missing field becomes a 400 with our own message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub base64_image: Option<String>,
    pub mime_type: Option<String>,
}

/// Body of `POST /api/doctors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorQuery {
    pub location: Option<String>,
    #[serde(alias = "speciality")]
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorList {
    pub doctors: Vec<PractitionerRecord>,
}
