//! Patient records and their intake validation.
//!
//! A patient is created from a [`PatientDraft`] submitted by the admission
//! form. Validation follows the same collect-all discipline as consultation
//! intake: every violated rule is reported, tagged with its field name. The
//! store assigns the identifier and dossier number; everything here is pure.

use crate::validation::{FieldError, ValidationErrors};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Patient gender marker, as recorded on the dossier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Genre {
    #[default]
    M,
    F,
    A,
}

impl Genre {
    pub fn libelle(&self) -> &'static str {
        match self {
            Self::M => "Masculin",
            Self::F => "Féminin",
            Self::A => "Autre",
        }
    }
}

/// Administrative status of a dossier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Statut {
    #[default]
    Actif,
    Inactif,
    #[serde(rename = "archivé")]
    Archive,
}

/// A candidate patient as submitted by the admission form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct PatientDraft {
    pub nom: String,
    pub prenom: String,
    pub date_naissance: String,
    /// Dossier number; assigned by the store when absent.
    pub num_dossier: Option<String>,
    pub genre: Option<Genre>,
    pub situation_familiale: Option<String>,
    pub profession_id: Option<u32>,
    pub num_cni: String,
    pub date_delivrance: Option<String>,
    pub wilaya_naissance_id: Option<u32>,
    pub commune_naissance_id: Option<u32>,
    pub wilaya_residence_id: Option<u32>,
    pub commune_residence_id: Option<u32>,
    pub telephone: String,
    pub email: String,
    pub adresse: String,
    pub medecin_traitant: String,
    pub antecedents: String,
    pub notes: String,
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub num_dossier: String,
    pub nom: String,
    pub prenom: String,
    pub date_naissance: NaiveDate,
    pub genre: Genre,
    pub situation_familiale: String,
    pub profession_id: Option<u32>,
    pub num_cni: String,
    pub date_delivrance: Option<NaiveDate>,
    pub wilaya_naissance_id: Option<u32>,
    pub commune_naissance_id: Option<u32>,
    pub wilaya_residence_id: Option<u32>,
    pub commune_residence_id: Option<u32>,
    pub telephone: String,
    pub email: String,
    pub adresse: String,
    pub medecin_traitant: String,
    pub antecedents: String,
    pub notes: String,
    pub statut: Statut,
    pub date_creation: DateTime<Utc>,
}

impl Patient {
    /// Validates a draft and assembles the patient record.
    ///
    /// The identifier, dossier number, and timestamps are injected by the
    /// caller (the store), which keeps this function pure and directly
    /// testable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing one entry per violated rule:
    /// - `nom` and `prenom` must have at least 2 characters after trimming,
    /// - `date_naissance` must parse and must not lie in the future,
    /// - `num_cni`, when provided, must contain exactly 10 digits,
    /// - `date_delivrance`, when provided, must parse.
    pub fn from_draft(
        draft: &PatientDraft,
        id: Uuid,
        num_dossier: String,
        today: NaiveDate,
        date_creation: DateTime<Utc>,
    ) -> Result<Self, ValidationErrors> {
        let mut erreurs = Vec::new();

        let nom = draft.nom.trim();
        if nom.chars().count() < 2 {
            erreurs.push(FieldError::new(
                "nom",
                "Le nom est obligatoire (min 2 caractères)",
            ));
        }

        let prenom = draft.prenom.trim();
        if prenom.chars().count() < 2 {
            erreurs.push(FieldError::new(
                "prenom",
                "Le prénom est obligatoire (min 2 caractères)",
            ));
        }

        let date_naissance = {
            let raw = draft.date_naissance.trim();
            if raw.is_empty() {
                erreurs.push(FieldError::new(
                    "date_naissance",
                    "La date de naissance est obligatoire",
                ));
                None
            } else {
                match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                    Ok(date) if date > today => {
                        erreurs.push(FieldError::new(
                            "date_naissance",
                            "La date de naissance ne peut pas être dans le futur",
                        ));
                        None
                    }
                    Ok(date) => Some(date),
                    Err(_) => {
                        erreurs.push(FieldError::new(
                            "date_naissance",
                            "La date de naissance est invalide (format AAAA-MM-JJ attendu)",
                        ));
                        None
                    }
                }
            }
        };

        let num_cni: String = draft
            .num_cni
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if !num_cni.is_empty()
            && !(num_cni.len() == 10 && num_cni.chars().all(|c| c.is_ascii_digit()))
        {
            erreurs.push(FieldError::new(
                "num_cni",
                "Le numéro CNI doit contenir 10 chiffres",
            ));
        }

        let date_delivrance = match draft.date_delivrance.as_deref().map(str::trim) {
            None | Some("") => Some(None),
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(Some(date)),
                Err(_) => {
                    erreurs.push(FieldError::new(
                        "date_delivrance",
                        "La date de délivrance est invalide (format AAAA-MM-JJ attendu)",
                    ));
                    None
                }
            },
        };

        match (date_naissance, date_delivrance) {
            (Some(date_naissance), Some(date_delivrance)) if erreurs.is_empty() => Ok(Self {
                id,
                num_dossier,
                nom: nom.to_owned(),
                prenom: prenom.to_owned(),
                date_naissance,
                genre: draft.genre.unwrap_or_default(),
                situation_familiale: draft
                    .situation_familiale
                    .clone()
                    .unwrap_or_else(|| "Célibataire".to_owned()),
                profession_id: draft.profession_id,
                num_cni,
                date_delivrance,
                wilaya_naissance_id: draft.wilaya_naissance_id,
                commune_naissance_id: draft.commune_naissance_id,
                wilaya_residence_id: draft.wilaya_residence_id,
                commune_residence_id: draft.commune_residence_id,
                telephone: draft.telephone.trim().to_owned(),
                email: draft.email.trim().to_owned(),
                adresse: draft.adresse.trim().to_owned(),
                medecin_traitant: draft.medecin_traitant.trim().to_owned(),
                antecedents: draft.antecedents.trim().to_owned(),
                notes: draft.notes.trim().to_owned(),
                statut: Statut::Actif,
                date_creation,
            }),
            _ => Err(ValidationErrors(erreurs)),
        }
    }

    /// Age in full years at the given date, month and day aware.
    pub fn age_at(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.date_naissance.year();
        if (today.month(), today.day()) < (self.date_naissance.month(), self.date_naissance.day())
        {
            age -= 1;
        }
        age
    }

    /// Display name, "Prenom NOM".
    pub fn nom_complet(&self) -> String {
        format!("{} {}", self.prenom, self.nom.to_uppercase())
    }
}

#[cfg(test)]
mod patient_tests {
    use super::*;

    fn base_draft() -> PatientDraft {
        PatientDraft {
            nom: "Benali".into(),
            prenom: "Karim".into(),
            date_naissance: "1985-06-15".into(),
            ..PatientDraft::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
    }

    fn build(draft: &PatientDraft) -> Result<Patient, ValidationErrors> {
        Patient::from_draft(
            draft,
            Uuid::new_v4(),
            "PSY-1000".into(),
            today(),
            Utc::now(),
        )
    }

    #[test]
    fn valid_draft_becomes_a_patient() {
        let patient = build(&base_draft()).expect("draft should validate");
        assert_eq!(patient.nom, "Benali");
        assert_eq!(patient.num_dossier, "PSY-1000");
        assert_eq!(patient.genre, Genre::M);
        assert_eq!(patient.situation_familiale, "Célibataire");
        assert_eq!(patient.statut, Statut::Actif);
    }

    #[test]
    fn short_names_are_rejected_together() {
        let draft = PatientDraft {
            nom: "B".into(),
            prenom: " ".into(),
            ..base_draft()
        };
        let erreurs = build(&draft).expect_err("short names must fail");
        assert!(erreurs.concerne("nom"));
        assert!(erreurs.concerne("prenom"));
        assert_eq!(erreurs.len(), 2);
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let draft = PatientDraft {
            date_naissance: "2030-01-01".into(),
            ..base_draft()
        };
        let erreurs = build(&draft).expect_err("future birth date must fail");
        assert!(erreurs.concerne("date_naissance"));
    }

    #[test]
    fn missing_birth_date_is_rejected() {
        let draft = PatientDraft {
            date_naissance: "".into(),
            ..base_draft()
        };
        let erreurs = build(&draft).expect_err("missing birth date must fail");
        assert!(erreurs.concerne("date_naissance"));
    }

    #[test]
    fn cni_accepts_ten_digits_with_spaces() {
        let draft = PatientDraft {
            num_cni: "12 345 678 90".into(),
            ..base_draft()
        };
        let patient = build(&draft).expect("spaced CNI should validate");
        assert_eq!(patient.num_cni, "1234567890");
    }

    #[test]
    fn cni_rejects_wrong_length_or_letters() {
        for cni in ["12345", "12345678901", "12345abc90"] {
            let draft = PatientDraft {
                num_cni: cni.into(),
                ..base_draft()
            };
            let erreurs = build(&draft).expect_err("bad CNI must fail");
            assert!(erreurs.concerne("num_cni"), "cni {:?} should fail", cni);
        }
    }

    #[test]
    fn age_accounts_for_birthday_not_yet_reached() {
        let patient = build(&base_draft()).expect("draft should validate");
        // Born 1985-06-15; birthday not yet reached on 2024-03-01.
        assert_eq!(patient.age_at(today()), 38);
        let after_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        assert_eq!(patient.age_at(after_birthday), 39);
    }

    #[test]
    fn nom_complet_upper_cases_the_family_name() {
        let patient = build(&base_draft()).expect("draft should validate");
        assert_eq!(patient.nom_complet(), "Karim BENALI");
    }
}
