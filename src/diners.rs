use crate::time_util::{deserialize_dataset_date, DatasetDate};
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// One dish ordered during a reservation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Order {
    pub item: String,
    pub price: f64,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Reservation {
    #[serde(deserialize_with = "deserialize_dataset_date")]
    pub date: DatasetDate,
    pub number_of_people: u32,
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Review {
    pub date: String,
    pub restaurant_name: String,
    pub rating: f64,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Email {
    pub date: String,
    pub subject: String,
    pub combined_thread: String,
}

/// A guest and everything we know about them. Names are not guaranteed
/// to be unique across the dataset.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Diner {
    pub name: String,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub emails: Vec<Email>,
}

// The dataset is usually wrapped in `{"diners": [...]}` but older exports
// are a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetShape {
    Wrapped { diners: Vec<Diner> },
    Bare(Vec<Diner>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DinersList {
    pub diners: Vec<Diner>,
}

impl DinersList {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let shape: DatasetShape = serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse diner dataset: {}", e))?;
        let diners = match shape {
            DatasetShape::Wrapped { diners } => diners,
            DatasetShape::Bare(diners) => diners,
        };
        Ok(Self { diners })
    }

    #[instrument(err)]
    pub fn load_from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read diner dataset '{}': {}",
                path.display(),
                e
            )
        })?;
        let list = Self::from_json_str(&content)?;
        info!("Loaded {} diners", list.diners.len());
        Ok(list)
    }

    /// All diners with the given name, in dataset order.
    pub fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Diner> + 'a {
        self.diners.iter().filter(move |d| d.name == name)
    }

    pub fn reservation_count(&self) -> usize {
        self.diners.iter().map(|d| d.reservations.len()).sum()
    }
}
