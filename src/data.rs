use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    rating::{self, StarRating},
    store::{self, Entry, ListStore, Record, RecordId},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    /// url to logo, not validated
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub user_ratings: u32,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Default, Clone, Builder, Deserialize)]
#[serde(rename_all = "camelCase")]
#[builder(default)]
pub struct RestaurantPatch {
    #[builder(setter(into, strip_option))]
    pub name: Option<String>,
    #[builder(setter(into, strip_option))]
    pub description: Option<String>,
    #[builder(setter(into, strip_option))]
    pub details: Option<String>,
    #[builder(setter(into, strip_option))]
    pub image: Option<String>,
    #[builder(setter(strip_option))]
    pub rating: Option<f64>,
    #[builder(setter(strip_option))]
    pub user_ratings: Option<u32>,
    #[builder(setter(strip_option))]
    pub is_favorite: Option<bool>,
}

impl Record for Restaurant {
    type Patch = RestaurantPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> store::Result<()> {
        store::require("name", &self.name)
    }

    fn apply(&mut self, patch: RestaurantPatch) {
        let RestaurantPatch {
            name,
            description,
            details,
            image,
            rating,
            user_ratings,
            is_favorite,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(details) = details {
            self.details = details;
        }
        if let Some(image) = image {
            self.image = image;
        }
        if let Some(rating) = rating {
            self.rating = rating;
        }
        if let Some(user_ratings) = user_ratings {
            self.user_ratings = user_ratings;
        }
        if let Some(is_favorite) = is_favorite {
            self.is_favorite = is_favorite;
        }
    }
}

/// Donation shelter. `name`, `description` and `location` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub image: String,
    pub location: String,
    #[serde(default)]
    pub capacity: String,
}

#[derive(Debug, Default, Clone, Builder, Deserialize)]
#[builder(default)]
pub struct ShelterPatch {
    #[builder(setter(into, strip_option))]
    pub name: Option<String>,
    #[builder(setter(into, strip_option))]
    pub description: Option<String>,
    #[builder(setter(into, strip_option))]
    pub details: Option<String>,
    #[builder(setter(into, strip_option))]
    pub image: Option<String>,
    #[builder(setter(into, strip_option))]
    pub location: Option<String>,
    #[builder(setter(into, strip_option))]
    pub capacity: Option<String>,
}

impl Record for Shelter {
    type Patch = ShelterPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> store::Result<()> {
        store::require("name", &self.name)?;
        store::require("description", &self.description)?;
        store::require("location", &self.location)
    }

    fn apply(&mut self, patch: ShelterPatch) {
        let fields = [
            (&mut self.name, patch.name),
            (&mut self.description, patch.description),
            (&mut self.details, patch.details),
            (&mut self.image, patch.image),
            (&mut self.location, patch.location),
            (&mut self.capacity, patch.capacity),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

impl ListStore<Restaurant> {
    pub fn favorites(&self) -> Vec<&Entry<Restaurant>> {
        self.filtered_by(|restaurant| restaurant.is_favorite)
    }

    /// Flip the favorite flag of `id` and return the new value.
    pub fn toggle_favorite(&mut self, id: RecordId) -> store::Result<bool> {
        let current = self.get(id).ok_or(StoreError::NotFound(id))?;
        let flag = !current.record.is_favorite;
        let patch = RestaurantPatch {
            is_favorite: Some(flag),
            ..Default::default()
        };
        self.update_by_id(id, patch)?;
        Ok(flag)
    }

    /// Fold one user rating into the restaurant's average.
    pub fn rate(&mut self, id: RecordId, stars: StarRating) -> store::Result<&Entry<Restaurant>> {
        let current = &self.get(id).ok_or(StoreError::NotFound(id))?.record;
        let (average, count) = rating::aggregate(current.rating, current.user_ratings, stars.value());
        let patch = RestaurantPatch {
            rating: Some(average),
            user_ratings: Some(count),
            ..Default::default()
        };
        self.update_by_id(id, patch)
    }
}

pub fn initial_restaurants() -> Vec<Restaurant> {
    vec![
        Restaurant {
            name: "AL-Baik".to_string(),
            description: "Fried Chicken · $$ · 0.6 miles away".to_string(),
            details: "Best Muslim restaurant in Jeddah".to_string(),
            image: "https://upload.wikimedia.org/wikipedia/en/thumb/5/56/Al_Baik_Logo.svg/1200px-Al_Baik_Logo.svg.png".to_string(),
            rating: 4.5,
            user_ratings: 100,
            is_favorite: false,
        },
        Restaurant {
            name: "Uncle Kebab".to_string(),
            description: "BBQ · $$ · 1.2 miles away".to_string(),
            details: "Best halal kebab".to_string(),
            image: "https://kebabuncle.com/wp-content/uploads/2020/02/KebabUncle-logo.jpg".to_string(),
            rating: 4.0,
            user_ratings: 50,
            is_favorite: false,
        },
    ]
}

pub fn initial_shelters() -> Vec<Shelter> {
    vec![
        Shelter {
            name: "Hope Shelter".to_string(),
            description: "Temporary housing for families".to_string(),
            details: "Open 24/7, includes food and basic amenities".to_string(),
            image: "https://example.com/hope-shelter.jpg".to_string(),
            location: "123 Main Street, Cityville".to_string(),
            capacity: "50 people".to_string(),
        },
        Shelter {
            name: "Safe Haven".to_string(),
            description: "Emergency shelter for women and children".to_string(),
            details: "Provides counseling and secure accommodation".to_string(),
            image: "https://example.com/safe-haven.jpg".to_string(),
            location: "456 Elm Street, Townsville".to_string(),
            capacity: "30 people".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurants() -> ListStore<Restaurant> {
        ListStore::with_records(initial_restaurants()).unwrap()
    }

    #[test]
    fn seeds_are_valid() {
        assert_eq!(restaurants().len(), 2);
        assert_eq!(ListStore::with_records(initial_shelters()).unwrap().len(), 2);
    }

    #[test]
    fn rating_is_folded_and_written_back() {
        let mut store = restaurants();
        let kebab = store.read_all()[1].id;

        let entry = store.rate(kebab, StarRating::new(5.0).unwrap()).unwrap();

        // (4.0 * 50 + 5) / 51 = 4.0196..
        assert_eq!(entry.record.rating, 4.0);
        assert_eq!(entry.record.user_ratings, 51);
        assert_eq!(store.read_all()[1].record.user_ratings, 51);
    }

    #[test]
    fn toggling_favorite_updates_the_view() {
        let mut store = restaurants();
        let baik = store.read_all()[0].id;
        assert!(store.favorites().is_empty());

        assert!(store.toggle_favorite(baik).unwrap());
        let favorites = store.favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].record.name, "AL-Baik");

        assert!(!store.toggle_favorite(baik).unwrap());
        assert!(store.favorites().is_empty());
    }

    #[test]
    fn unknown_restaurant() {
        let mut store = restaurants();
        let missing = RecordId(99);
        assert_eq!(store.toggle_favorite(missing), Err(StoreError::NotFound(missing)));
    }

    #[test]
    fn shelter_requires_name_description_location() {
        let mut store = ListStore::<Shelter>::new();
        let mut shelter = initial_shelters().remove(0);
        shelter.location = " ".to_string();

        assert_eq!(
            store.create(shelter),
            Err(StoreError::Validation { field: "location" })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn shelter_with_only_required_fields() {
        let shelter: Shelter = serde_json::from_value(serde_json::json!({
            "name": "Night Shelter",
            "description": "Beds for the night",
            "location": "2400 Cypress St",
        }))
        .unwrap();
        let mut store = ListStore::new();
        store.create(shelter).unwrap();
        assert_eq!(store.read_all()[0].record.capacity, "");
    }

    #[test]
    fn shelter_patch_merges() {
        let mut store = ListStore::with_records(initial_shelters()).unwrap();
        let patch = ShelterPatchBuilder::default()
            .capacity("60 people")
            .build()
            .unwrap();
        store.update_at(0, patch).unwrap();

        let shelter = &store.read_all()[0].record;
        assert_eq!(shelter.capacity, "60 people");
        assert_eq!(shelter.name, "Hope Shelter");
        assert_eq!(shelter.location, "123 Main Street, Cityville");
    }

    #[test]
    fn restaurant_serializes_camel_case_with_id() {
        let store = restaurants();
        let json = serde_json::to_value(&store.read_all()[0]).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["userRatings"], 100);
        assert_eq!(json["isFavorite"], false);
    }
}
