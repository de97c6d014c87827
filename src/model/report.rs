use serde::{Deserialize, Serialize};

/// The seven fixed maturity dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Strategy,
    Culture,
    Processes,
    Data,
    Analytics,
    Technology,
    Governance,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Strategy,
        Dimension::Culture,
        Dimension::Processes,
        Dimension::Data,
        Dimension::Analytics,
        Dimension::Technology,
        Dimension::Governance,
    ];

    /// Canonical payload key
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Strategy => "strategy",
            Dimension::Culture => "culture",
            Dimension::Processes => "processes",
            Dimension::Data => "data",
            Dimension::Analytics => "analytics",
            Dimension::Technology => "technology",
            Dimension::Governance => "governance",
        }
    }

    /// What the dimension assesses, used in prompts
    pub fn description(&self) -> &'static str {
        match self {
            Dimension::Strategy => "business strategy and AI vision, alignment with commercial goals",
            Dimension::Culture => "people and digital culture: talent, openness to change, training",
            Dimension::Processes => "processes and operations: bottlenecks and manual work",
            Dimension::Data => "data quality, storage, access and stewardship",
            Dimension::Analytics => "analytics and decision making, descriptive versus predictive",
            Dimension::Technology => "technology infrastructure, cloud usage and scalability",
            Dimension::Governance => "governance, ethics and security: privacy, bias, compliance",
        }
    }
}

/// Score and narrative for one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAssessment {
    /// Integer 1-5
    pub score: u8,
    pub level: String,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Exactly one assessment per dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub strategy: DimensionAssessment,
    pub culture: DimensionAssessment,
    pub processes: DimensionAssessment,
    pub data: DimensionAssessment,
    pub analytics: DimensionAssessment,
    pub technology: DimensionAssessment,
    pub governance: DimensionAssessment,
}

impl Dimensions {
    pub fn get(&self, dimension: Dimension) -> &DimensionAssessment {
        match dimension {
            Dimension::Strategy => &self.strategy,
            Dimension::Culture => &self.culture,
            Dimension::Processes => &self.processes,
            Dimension::Data => &self.data,
            Dimension::Analytics => &self.analytics,
            Dimension::Technology => &self.technology,
            Dimension::Governance => &self.governance,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &DimensionAssessment)> {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    /// Mean dimension score rounded to one decimal
    pub fn mean_score(&self) -> f64 {
        let total: u32 = self.iter().map(|(_, a)| a.score as u32).sum();
        let mean = total as f64 / Dimension::ALL.len() as f64;
        (mean * 10.0).round() / 10.0
    }
}

/// Expected impact of a roadmap initiative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    High,
    Medium,
    Low,
}

/// Roadmap time window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::ShortTerm, Horizon::MediumTerm, Horizon::LongTerm];

    pub fn key(&self) -> &'static str {
        match self {
            Horizon::ShortTerm => "shortTerm",
            Horizon::MediumTerm => "mediumTerm",
            Horizon::LongTerm => "longTerm",
        }
    }
}

/// One roadmap initiative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub title: String,
    pub impact: ImpactTier,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Three-horizon roadmap, initiatives in priority order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    #[serde(default)]
    pub short_term: Vec<Initiative>,
    #[serde(default)]
    pub medium_term: Vec<Initiative>,
    #[serde(default)]
    pub long_term: Vec<Initiative>,
}

impl Roadmap {
    pub fn horizon(&self, horizon: Horizon) -> &[Initiative] {
        match horizon {
            Horizon::ShortTerm => &self.short_term,
            Horizon::MediumTerm => &self.medium_term,
            Horizon::LongTerm => &self.long_term,
        }
    }
}

/// Scored digital maturity assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 0-5
    pub overall_score: f64,
    pub strongest_area: String,
    pub main_opportunity: String,
    #[serde(default)]
    pub executive_summary: String,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub roadmap: Roadmap,
}
