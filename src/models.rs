use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Health,
    Work,
    Study,
    Leisure,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Health,
        Category::Work,
        Category::Study,
        Category::Leisure,
        Category::Other,
    ];

    /// Name the habit API stores.
    pub fn wire_name(self) -> &'static str {
        match self {
            Category::Health => "Saúde",
            Category::Work => "Trabalho",
            Category::Study => "Estudo",
            Category::Leisure => "Lazer",
            Category::Other => "Outros",
        }
    }

    /// Unknown values degrade to `Other`.
    pub fn parse_lenient(value: &str) -> Self {
        match fold(value).as_str() {
            "saude" | "health" => Category::Health,
            "trabalho" | "work" => Category::Work,
            "estudo" | "study" => Category::Study,
            "lazer" | "leisure" => Category::Leisure,
            _ => Category::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    #[default]
    EveryDay,
    Weekly,
}

impl Frequency {
    pub fn wire_name(self) -> &'static str {
        match self {
            Frequency::EveryDay => "Todo dia",
            Frequency::Weekly => "Semanal",
        }
    }

    /// Unknown values degrade to `EveryDay`.
    pub fn parse_lenient(value: &str) -> Self {
        match fold(value).as_str() {
            "semanal" | "weekly" => Frequency::Weekly,
            _ => Frequency::EveryDay,
        }
    }
}

/// Lowercases and strips the Portuguese diacritics the API uses.
fn fold(value: &str) -> String {
    value
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

macro_rules! wire_enum_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.wire_name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok($name::parse_lenient(&value))
            }
        }
    };
}

wire_enum_serde!(Category);
wire_enum_serde!(Frequency);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProgressEntry {
    pub date: DateTime<Utc>,
    pub completed: bool,
}

/// Habit record as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHabit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub goal_count: Option<u32>,
    pub category: Category,
    pub frequency: Frequency,
    pub progress_entries: Vec<RawProgressEntry>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedHabit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub goal: Option<u32>,
    pub category: Category,
    pub frequency: Frequency,
    pub completed_dates: Vec<NaiveDate>,
    pub progress_percent: f64,
    pub streak_days: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Fields a user fills in to create a habit.
#[derive(Debug, Clone, Deserialize)]
pub struct HabitForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: Option<u32>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub frequency: Frequency,
}

impl HabitForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.frequency == Frequency::Weekly && self.goal == Some(0) {
            return Err("goal must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn to_request(&self) -> CreateHabitRequest {
        let goal = match self.frequency {
            Frequency::EveryDay => None,
            Frequency::Weekly => Some(self.goal.unwrap_or(1)),
        };
        CreateHabitRequest {
            name: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            goal,
            category: self.category,
            frequency: self.frequency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<u32>,
    pub category: Category,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub completed: bool,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Completed,
    AlreadyCompleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub questionnaire_completed: bool,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub token: String,
    #[serde(default)]
    pub user: Profile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireAnswers {
    #[serde(default)]
    pub current_lifestyle: String,
    #[serde(default)]
    pub main_goals: String,
    #[serde(default)]
    pub challenges: String,
    #[serde(default)]
    pub available_time: String,
    #[serde(default)]
    pub preferred_categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedHabit {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub frequency: Frequency,
}

impl SuggestedHabit {
    pub fn to_request(&self) -> CreateHabitRequest {
        CreateHabitRequest {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            goal: None,
            category: self.category,
            frequency: self.frequency,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireRecord {
    #[serde(default)]
    pub generated_habits: Vec<SuggestedHabit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AdoptionReport {
    pub created: usize,
    pub skipped: usize,
}
