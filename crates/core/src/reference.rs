//! Administrative reference data: wilayas, communes, professions.
//!
//! Read-only lookup tables consumed by the admission form. Seeded with a
//! small default set when no data file exists yet.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Wilaya {
    pub id: u32,
    pub nom: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Commune {
    pub id: u32,
    pub nom: String,
    pub wilaya_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profession {
    pub id: u32,
    pub nom: String,
}

/// The three administrative lookup tables, loaded and saved as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub wilayas: Vec<Wilaya>,
    pub communes: Vec<Commune>,
    pub professions: Vec<Profession>,
}

impl ReferenceData {
    /// Communes belonging to one wilaya, in table order.
    pub fn communes_for_wilaya(&self, wilaya_id: u32) -> Vec<&Commune> {
        self.communes
            .iter()
            .filter(|c| c.wilaya_id == wilaya_id)
            .collect()
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            wilayas: vec![
                Wilaya {
                    id: 1,
                    nom: "Alger".to_owned(),
                    code: "16".to_owned(),
                },
                Wilaya {
                    id: 2,
                    nom: "Oran".to_owned(),
                    code: "31".to_owned(),
                },
                Wilaya {
                    id: 3,
                    nom: "Constantine".to_owned(),
                    code: "25".to_owned(),
                },
            ],
            communes: vec![
                Commune {
                    id: 1,
                    nom: "Alger Centre".to_owned(),
                    wilaya_id: 1,
                },
                Commune {
                    id: 2,
                    nom: "Sidi M'Hamed".to_owned(),
                    wilaya_id: 1,
                },
                Commune {
                    id: 3,
                    nom: "Oran Centre".to_owned(),
                    wilaya_id: 2,
                },
                Commune {
                    id: 4,
                    nom: "Constantine Centre".to_owned(),
                    wilaya_id: 3,
                },
            ],
            professions: vec![
                Profession {
                    id: 1,
                    nom: "Étudiant".to_owned(),
                },
                Profession {
                    id: 2,
                    nom: "Fonctionnaire".to_owned(),
                },
                Profession {
                    id: 3,
                    nom: "Commerçant".to_owned(),
                },
                Profession {
                    id: 4,
                    nom: "Sans profession".to_owned(),
                },
            ],
        }
    }
}
