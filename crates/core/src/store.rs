//! The practice store: patients, consultations, reference data, catalogs.
//!
//! One `CabinetStore` is constructed per process and injected into whatever
//! needs it; there is no global instance. Each collection persists as a
//! single pretty-printed JSON file under the data directory, rewritten in
//! full after every mutation. There are deliberately no transactions, no
//! indexes, and no file locking; callers serialise access (the HTTP layer
//! holds the store behind a lock). Concurrent writers from separate
//! processes are not supported.

use crate::catalogue::Catalogues;
use crate::config::CoreConfig;
use crate::consultation::{self, Consultation, ConsultationDraft};
use crate::error::{StoreError, StoreResult};
use crate::patient::{Patient, PatientDraft};
use crate::reference::{Commune, Profession, ReferenceData, Wilaya};
use crate::validation::ValidationErrors;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use utoipa::ToSchema;
use uuid::Uuid;

/// Dossier numbers start here, as in the paper filing system.
const DOSSIER_SEED: u32 = 1000;

/// A consultation as persisted: the normalized record plus its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredConsultation {
    pub id: Uuid,
    #[serde(flatten)]
    pub consultation: Consultation,
}

/// Monthly activity summary across all consultations.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatistics {
    /// Number of recorded consultations.
    pub total: usize,
    /// Sum of collected payment amounts.
    pub montant_total: f64,
    /// Mean collected amount over all consultations (paid or not).
    pub moyenne: f64,
    /// Consultation count per `YYYY-MM` month.
    pub par_mois: BTreeMap<String, usize>,
}

/// In-memory collections backed by flat JSON files.
#[derive(Debug)]
pub struct CabinetStore {
    cfg: CoreConfig,
    patients: Vec<Patient>,
    consultations: Vec<StoredConsultation>,
    references: ReferenceData,
    catalogues: Catalogues,
    next_dossier: u32,
}

impl CabinetStore {
    /// Opens the store rooted at the configured data directory.
    ///
    /// Missing collection files mean empty collections; a missing reference
    /// file is seeded with the default tables and written out. Catalog files
    /// fall back to built-in defaults per family. The dossier counter resumes
    /// above the highest persisted dossier number.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the data directory cannot be created or an
    /// existing collection file cannot be read or parsed. Unparseable primary
    /// data is an error rather than a silent reset; delete or repair the file
    /// to recover.
    pub fn open(cfg: CoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(cfg.data_dir()).map_err(StoreError::StorageDirCreation)?;

        let patients: Vec<Patient> = load_collection(&cfg.patients_file())?;
        let consultations: Vec<StoredConsultation> = load_collection(&cfg.consultations_file())?;

        let references = match load_references(&cfg.references_file())? {
            Some(references) => references,
            None => {
                let defaults = ReferenceData::default();
                save_json(&cfg.references_file(), &defaults)?;
                tracing::info!("seeded default reference data");
                defaults
            }
        };

        let catalogues = Catalogues::load_or_default(&cfg.catalogues_dir());

        let next_dossier = patients
            .iter()
            .filter_map(|p| parse_dossier_number(&p.num_dossier))
            .max()
            .map_or(DOSSIER_SEED, |n| n.saturating_add(1).max(DOSSIER_SEED));

        Ok(Self {
            cfg,
            patients,
            consultations,
            references,
            catalogues,
            next_dossier,
        })
    }

    // --- patients ---

    pub fn list_patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn find_patient(&self, id: &str) -> Option<&Patient> {
        let id = Uuid::parse_str(id).ok()?;
        self.patients.iter().find(|p| p.id == id)
    }

    /// Whether a patient with this identifier is registered.
    pub fn patient_exists(&self, id: &str) -> bool {
        self.find_patient(id).is_some()
    }

    /// Case-insensitive substring search over family and given names.
    pub fn search_patients(&self, query: &str) -> Vec<&Patient> {
        let query = query.trim().to_lowercase();
        self.patients
            .iter()
            .filter(|p| {
                p.nom.to_lowercase().contains(&query) || p.prenom.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Validates and registers a patient, assigning id and dossier number.
    ///
    /// # Errors
    ///
    /// `StoreError::Validation` when the draft is rejected; a file error when
    /// the collection cannot be persisted (the patient is then not kept).
    pub fn add_patient(&mut self, draft: &PatientDraft) -> StoreResult<Patient> {
        let num_dossier = match draft.num_dossier.as_deref().map(str::trim) {
            Some(dossier) if !dossier.is_empty() => dossier.to_owned(),
            _ => format!("PSY-{}", self.next_dossier),
        };

        let now = Utc::now();
        let patient = Patient::from_draft(
            draft,
            Uuid::new_v4(),
            num_dossier,
            now.date_naive(),
            now,
        )?;

        self.patients.push(patient.clone());
        if let Err(e) = save_json(&self.cfg.patients_file(), &self.patients) {
            self.patients.pop();
            return Err(e);
        }

        if let Some(n) = parse_dossier_number(&patient.num_dossier) {
            self.next_dossier = self.next_dossier.max(n.saturating_add(1));
        }

        Ok(patient)
    }

    // --- consultations ---

    pub fn list_consultations(&self) -> &[StoredConsultation] {
        &self.consultations
    }

    pub fn consultations_for_patient(&self, patient_id: &str) -> Vec<&StoredConsultation> {
        self.consultations
            .iter()
            .filter(|c| c.consultation.patient_id == patient_id)
            .collect()
    }

    /// Validates a consultation draft, checks the referenced patient exists,
    /// and persists the normalized record.
    ///
    /// # Errors
    ///
    /// `StoreError::Validation` carrying the field-error list when the draft
    /// is rejected or the patient is unknown; a file error when the
    /// collection cannot be persisted (the record is then not kept).
    pub fn add_consultation(&mut self, draft: &ConsultationDraft) -> StoreResult<StoredConsultation> {
        let record = consultation::validate(draft)?;

        // Existence is a collaborator concern, deliberately outside the pure
        // validator; reported in the same field-error shape.
        if !self.patient_exists(&record.patient_id) {
            return Err(StoreError::Validation(ValidationErrors::single(
                "patientId",
                format!("Patient inconnu: {}", record.patient_id),
            )));
        }

        let stored = StoredConsultation {
            id: Uuid::new_v4(),
            consultation: record,
        };

        self.consultations.push(stored.clone());
        if let Err(e) = save_json(&self.cfg.consultations_file(), &self.consultations) {
            self.consultations.pop();
            return Err(e);
        }

        Ok(stored)
    }

    /// Aggregates the activity summary served by the statistics endpoint.
    pub fn monthly_statistics(&self) -> MonthlyStatistics {
        let total = self.consultations.len();
        let montant_total: f64 = self
            .consultations
            .iter()
            .filter_map(|c| c.consultation.montant_paiement)
            .sum();

        let mut par_mois = BTreeMap::new();
        for stored in &self.consultations {
            let mois = stored
                .consultation
                .date_consultation
                .format("%Y-%m")
                .to_string();
            *par_mois.entry(mois).or_insert(0) += 1;
        }

        MonthlyStatistics {
            total,
            montant_total,
            moyenne: if total > 0 {
                montant_total / total as f64
            } else {
                0.0
            },
            par_mois,
        }
    }

    // --- reference data and catalogs ---

    pub fn wilayas(&self) -> &[Wilaya] {
        &self.references.wilayas
    }

    pub fn communes_for_wilaya(&self, wilaya_id: u32) -> Vec<&Commune> {
        self.references.communes_for_wilaya(wilaya_id)
    }

    pub fn professions(&self) -> &[Profession] {
        &self.references.professions
    }

    pub fn catalogues(&self) -> &Catalogues {
        &self.catalogues
    }
}

fn parse_dossier_number(num_dossier: &str) -> Option<u32> {
    num_dossier.strip_prefix("PSY-")?.parse().ok()
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
    serde_json::from_str(&contents).map_err(StoreError::Deserialization)
}

fn load_references(path: &Path) -> StoreResult<Option<ReferenceData>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
    match serde_json::from_str(&contents) {
        Ok(references) => Ok(Some(references)),
        Err(e) => {
            // Reference tables are form furniture; degrade rather than refuse
            // to start, but do not overwrite the broken file.
            tracing::warn!(
                "failed to parse reference data {}: {} (falling back to defaults)",
                path.display(),
                e
            );
            Ok(Some(ReferenceData::default()))
        }
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(StoreError::Serialization)?;
    fs::write(path, json).map_err(StoreError::FileWrite)
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> CabinetStore {
        CabinetStore::open(CoreConfig::new(dir.path().to_path_buf())).expect("store opens")
    }

    fn patient_draft() -> PatientDraft {
        PatientDraft {
            nom: "Benali".into(),
            prenom: "Karim".into(),
            date_naissance: "1985-06-15".into(),
            ..PatientDraft::default()
        }
    }

    fn consultation_draft(patient_id: &str) -> ConsultationDraft {
        ConsultationDraft {
            patient_id: patient_id.into(),
            date_consultation: "2024-03-01".into(),
            type_consultation: "suivi".into(),
            motif_consultation: "Anxiété".into(),
            ..ConsultationDraft::default()
        }
    }

    #[test]
    fn open_seeds_reference_data_in_an_empty_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir);
        assert!(store.list_patients().is_empty());
        assert!(store.list_consultations().is_empty());
        assert_eq!(store.wilayas().len(), 3);
        assert!(dir.path().join("references.json").is_file());
    }

    #[test]
    fn dossier_numbers_are_sequential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let premier = store.add_patient(&patient_draft()).expect("patient added");
        let second = store.add_patient(&patient_draft()).expect("patient added");
        assert_eq!(premier.num_dossier, "PSY-1000");
        assert_eq!(second.num_dossier, "PSY-1001");
    }

    #[test]
    fn dossier_counter_resumes_after_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut store = open_store(&dir);
            store.add_patient(&patient_draft()).expect("patient added");
        }
        let mut store = open_store(&dir);
        let patient = store.add_patient(&patient_draft()).expect("patient added");
        assert_eq!(patient.num_dossier, "PSY-1001");
    }

    #[test]
    fn invalid_patient_is_not_persisted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let draft = PatientDraft {
            nom: "B".into(),
            ..patient_draft()
        };
        let err = store.add_patient(&draft).expect_err("short name must fail");
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_patients().is_empty());
    }

    #[test]
    fn consultations_round_trip_through_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stored = {
            let mut store = open_store(&dir);
            let patient = store.add_patient(&patient_draft()).expect("patient added");
            store
                .add_consultation(&consultation_draft(&patient.id.to_string()))
                .expect("consultation added")
        };

        let reopened = open_store(&dir);
        assert_eq!(reopened.list_consultations().len(), 1);
        assert_eq!(reopened.list_consultations()[0], stored);
    }

    #[test]
    fn unknown_patient_is_reported_on_patient_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let draft = consultation_draft(&Uuid::new_v4().to_string());
        let err = store
            .add_consultation(&draft)
            .expect_err("unknown patient must fail");
        match err {
            StoreError::Validation(erreurs) => assert!(erreurs.concerne("patientId")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(store.list_consultations().is_empty());
    }

    #[test]
    fn history_is_filtered_by_patient() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let premier = store.add_patient(&patient_draft()).expect("patient added");
        let second = store.add_patient(&patient_draft()).expect("patient added");

        let premier_id = premier.id.to_string();
        let second_id = second.id.to_string();
        store
            .add_consultation(&consultation_draft(&premier_id))
            .expect("consultation added");
        store
            .add_consultation(&consultation_draft(&premier_id))
            .expect("consultation added");
        store
            .add_consultation(&consultation_draft(&second_id))
            .expect("consultation added");

        assert_eq!(store.consultations_for_patient(&premier_id).len(), 2);
        assert_eq!(store.consultations_for_patient(&second_id).len(), 1);
    }

    #[test]
    fn monthly_statistics_aggregate_counts_and_amounts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let patient = store.add_patient(&patient_draft()).expect("patient added");
        let id = patient.id.to_string();

        let paid = ConsultationDraft {
            paiement_effectue: true,
            montant_paiement: Some(3000.0),
            ..consultation_draft(&id)
        };
        store.add_consultation(&paid).expect("consultation added");

        let unpaid = ConsultationDraft {
            date_consultation: "2024-04-10".into(),
            ..consultation_draft(&id)
        };
        store.add_consultation(&unpaid).expect("consultation added");

        let stats = store.monthly_statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.montant_total, 3000.0);
        assert_eq!(stats.moyenne, 1500.0);
        assert_eq!(stats.par_mois.get("2024-03"), Some(&1));
        assert_eq!(stats.par_mois.get("2024-04"), Some(&1));
    }

    #[test]
    fn search_matches_either_name_case_insensitively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        store.add_patient(&patient_draft()).expect("patient added");
        store
            .add_patient(&PatientDraft {
                nom: "Kadri".into(),
                prenom: "Samira".into(),
                ..patient_draft()
            })
            .expect("patient added");

        assert_eq!(store.search_patients("benali").len(), 1);
        assert_eq!(store.search_patients("SAMIRA").len(), 1);
        assert_eq!(store.search_patients("zz").len(), 0);
    }
}
