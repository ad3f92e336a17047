//! Animal records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `animals` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Animal {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Animal {
    /// Name used in confirmations and listings
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Subset of animal columns embedded in adoption rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnimalSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl From<&Animal> for AnimalSummary {
    fn from(animal: &Animal) -> Self {
        Self {
            id: Some(animal.id.clone()),
            name: animal.name.clone(),
            breed: animal.breed.clone(),
            size: animal.size.clone(),
            age: animal.age,
        }
    }
}

/// Insert payload for a new animal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAnimal {
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<u32>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub available: bool,
    pub image_url: Option<String>,
}

/// Full edit of an animal; `None` fields are written as `null`.
/// `image_url` is only sent when a new photo replaces the old one.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct AnimalUpdate {
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<u32>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Attribute used to group listings of what is treated as the same animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchField {
    Name,
    Breed,
    Size,
    Age,
}

impl MatchField {
    pub const ALL: [MatchField; 4] = [
        MatchField::Name,
        MatchField::Breed,
        MatchField::Size,
        MatchField::Age,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            MatchField::Name => "name",
            MatchField::Breed => "breed",
            MatchField::Size => "size",
            MatchField::Age => "age",
        }
    }

    /// Value of this attribute on `animal`, if it is set and non-empty
    pub fn value_of(&self, animal: &Animal) -> Option<String> {
        let value = match self {
            MatchField::Name => animal.name.clone(),
            MatchField::Breed => animal.breed.clone(),
            MatchField::Size => animal.size.clone(),
            MatchField::Age => animal.age.map(|age| age.to_string()),
        };
        value.filter(|v| !v.is_empty())
    }
}
