//! Consultation intake: draft validation and record assembly.
//!
//! A consultation arrives as a [`ConsultationDraft`], the raw field mapping
//! submitted by the intake form. [`validate`] checks the whole draft at once,
//! reporting every violated rule tagged with its field name, and on success
//! assembles the canonical [`Consultation`] record: dates parsed, code lists
//! deduplicated, the payment amount cleared unless payment was made.
//!
//! Validation is pure. Patient existence and catalog membership are the
//! store's concern, not checked here.

use crate::validation::{FieldError, ValidationErrors};
use cabinet_types::{GafScore, NonEmptyText};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wire format for consultation dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The fixed set of consultation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TypeConsultation {
    Premiere,
    Controle,
    Urgence,
    Suivi,
}

impl TypeConsultation {
    /// Parses the wire value (`premiere`, `controle`, `urgence`, `suivi`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "premiere" => Some(Self::Premiere),
            "controle" => Some(Self::Controle),
            "urgence" => Some(Self::Urgence),
            "suivi" => Some(Self::Suivi),
            _ => None,
        }
    }

    /// Display label, as shown in the intake form.
    pub fn libelle(&self) -> &'static str {
        match self {
            Self::Premiere => "Première consultation",
            Self::Controle => "Consultation de contrôle",
            Self::Urgence => "Urgence",
            Self::Suivi => "Suivi régulier",
        }
    }
}

impl std::fmt::Display for TypeConsultation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wire = match self {
            Self::Premiere => "premiere",
            Self::Controle => "controle",
            Self::Urgence => "urgence",
            Self::Suivi => "suivi",
        };
        write!(f, "{}", wire)
    }
}

/// A candidate consultation as submitted, before validation.
///
/// Every field is optional on the wire: absent scalars arrive as empty
/// strings or `None`, absent lists as empty vectors. Field names follow the
/// intake form's JSON contract.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsultationDraft {
    pub patient_id: String,
    pub date_consultation: String,
    pub type_consultation: String,
    pub antecedent: String,
    pub motif_consultation: String,
    pub examen_physique: String,
    pub recommandations: String,
    pub symptomes: Vec<String>,
    pub diagnostics: Vec<String>,
    pub dsm5: Vec<String>,
    pub medicaments: Vec<String>,
    pub maladies_associees: Vec<String>,
    #[serde(rename = "scoreGAF")]
    pub score_gaf: Option<i64>,
    pub notes_evaluation: String,
    pub paiement_effectue: bool,
    pub montant_paiement: Option<f64>,
}

/// A validated, normalized consultation record.
///
/// Guarantees: the date parsed, the type is a member of the enumeration, the
/// motive is non-empty, code lists are deduplicated, `dsm5` holds at most one
/// code, and `montant_paiement` is `Some` (and positive) exactly when
/// `paiement_effectue` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub patient_id: String,
    #[schema(value_type = String, format = Date)]
    pub date_consultation: NaiveDate,
    pub type_consultation: TypeConsultation,
    pub antecedent: String,
    #[schema(value_type = String)]
    pub motif_consultation: NonEmptyText,
    pub examen_physique: String,
    pub recommandations: String,
    pub symptomes: Vec<String>,
    pub diagnostics: Vec<String>,
    pub dsm5: Vec<String>,
    pub medicaments: Vec<String>,
    pub maladies_associees: Vec<String>,
    #[serde(rename = "scoreGAF")]
    #[schema(value_type = Option<u8>, minimum = 1, maximum = 100)]
    pub score_gaf: Option<GafScore>,
    pub notes_evaluation: String,
    pub paiement_effectue: bool,
    pub montant_paiement: Option<f64>,
}

/// Validates a draft and assembles the normalized record.
///
/// All rules are evaluated; every violation is reported, each tagged with the
/// wire name of the offending field. This function is pure: no I/O, no clock,
/// no collaborator calls. Whether the referenced patient exists is checked by
/// the store at submission time.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing one entry per violated rule.
pub fn validate(draft: &ConsultationDraft) -> Result<Consultation, ValidationErrors> {
    let mut erreurs = Vec::new();

    let patient_id = draft.patient_id.trim();
    if patient_id.is_empty() {
        erreurs.push(FieldError::new("patientId", "Le patient est requis"));
    }

    let date_consultation = {
        let raw = draft.date_consultation.trim();
        if raw.is_empty() {
            erreurs.push(FieldError::new(
                "dateConsultation",
                "La date de consultation est requise",
            ));
            None
        } else {
            match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    erreurs.push(FieldError::new(
                        "dateConsultation",
                        "La date de consultation est invalide (format AAAA-MM-JJ attendu)",
                    ));
                    None
                }
            }
        }
    };

    let type_consultation = {
        let raw = draft.type_consultation.trim();
        if raw.is_empty() {
            erreurs.push(FieldError::new(
                "typeConsultation",
                "Le type de consultation est requis",
            ));
            None
        } else {
            match TypeConsultation::parse(raw) {
                Some(t) => Some(t),
                None => {
                    erreurs.push(FieldError::new(
                        "typeConsultation",
                        format!("Type de consultation inconnu: {}", raw),
                    ));
                    None
                }
            }
        }
    };

    let motif_consultation = match NonEmptyText::new(&draft.motif_consultation) {
        Ok(motif) => Some(motif),
        Err(_) => {
            erreurs.push(FieldError::new(
                "motifConsultation",
                "Le motif de consultation est requis",
            ));
            None
        }
    };

    // Optional by contract: absent or null passes without a default.
    let score_gaf = match draft.score_gaf {
        None => Some(None),
        Some(value) => match GafScore::new(value) {
            Ok(score) => Some(Some(score)),
            Err(_) => {
                erreurs.push(FieldError::new(
                    "scoreGAF",
                    "Le score GAF doit être compris entre 1 et 100",
                ));
                None
            }
        },
    };

    // Cross-field rule: the amount exists exactly when payment was made.
    // When no payment was made, any supplied amount is cleared, never an error.
    let montant_paiement = if draft.paiement_effectue {
        match draft.montant_paiement {
            Some(montant) if montant > 0.0 => Some(Some(montant)),
            _ => {
                erreurs.push(FieldError::new(
                    "montantPaiement",
                    "Le montant est requis lorsque le paiement est effectué",
                ));
                None
            }
        }
    } else {
        Some(None)
    };

    // The form's DSM-5 selector replaces rather than appends, so a well-formed
    // candidate carries at most one code; oversized input keeps the first.
    let mut dsm5 = dedupe(&draft.dsm5);
    dsm5.truncate(1);

    match (
        date_consultation,
        type_consultation,
        motif_consultation,
        score_gaf,
        montant_paiement,
    ) {
        (Some(date), Some(type_), Some(motif), Some(score), Some(montant))
            if erreurs.is_empty() =>
        {
            Ok(Consultation {
                patient_id: patient_id.to_owned(),
                date_consultation: date,
                type_consultation: type_,
                antecedent: draft.antecedent.trim().to_owned(),
                motif_consultation: motif,
                examen_physique: draft.examen_physique.trim().to_owned(),
                recommandations: draft.recommandations.trim().to_owned(),
                symptomes: dedupe(&draft.symptomes),
                diagnostics: dedupe(&draft.diagnostics),
                dsm5,
                medicaments: dedupe(&draft.medicaments),
                maladies_associees: dedupe(&draft.maladies_associees),
                score_gaf: score,
                notes_evaluation: draft.notes_evaluation.trim().to_owned(),
                paiement_effectue: draft.paiement_effectue,
                montant_paiement: montant,
            })
        }
        _ => Err(ValidationErrors(erreurs)),
    }
}

/// Collapses duplicates, keeping the first occurrence of each code.
///
/// Order carries no meaning for code sets; first-occurrence order is simply
/// what dedup leaves behind.
fn dedupe(codes: &[String]) -> Vec<String> {
    let mut uniques: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        if !uniques.contains(code) {
            uniques.push(code.clone());
        }
    }
    uniques
}
