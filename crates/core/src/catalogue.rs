//! Reference catalogs for the intake form's multi-select fields.
//!
//! Each code family (symptômes, diagnostics CIM-10, DSM-5, médicaments,
//! maladies associées) is an ordered [`Catalogue`] of coded entries. The
//! catalogs are read-only collaborators of the intake form: loaded once at
//! startup, filtered per keystroke, never mutated. Built-in defaults keep the
//! form usable when no catalog file is present or a file fails to parse.

use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

/// One entry of a reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogueEntry {
    /// Stable code identifying the entry (e.g. `ANX001`, `F41.1`).
    pub code: String,
    /// Display label.
    pub libelle: String,
    /// Grouping category shown as a section header in the selector.
    pub categorie: String,
}

/// An ordered, read-only sequence of catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue(Vec<CatalogueEntry>);

impl Catalogue {
    pub fn new(entries: Vec<CatalogueEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up an entry by its code.
    pub fn find(&self, code: &str) -> Option<&CatalogueEntry> {
        self.0.iter().find(|e| e.code == code)
    }

    /// Filters entries by a free-text query and groups them by category.
    ///
    /// Matching is a case-insensitive substring test against both code and
    /// label; a blank query keeps every entry. Entries keep their catalog
    /// order within each category bucket, and buckets appear in the order
    /// their category first appears in the catalog. Deterministic and
    /// idempotent; categories whose entries are all filtered out are absent
    /// from the result.
    pub fn filter_and_group(&self, recherche: &str) -> Vec<(&str, Vec<&CatalogueEntry>)> {
        let recherche = recherche.trim().to_lowercase();
        let mut groupes: Vec<(&str, Vec<&CatalogueEntry>)> = Vec::new();

        for entry in &self.0 {
            if !recherche.is_empty()
                && !entry.code.to_lowercase().contains(&recherche)
                && !entry.libelle.to_lowercase().contains(&recherche)
            {
                continue;
            }

            match groupes.iter_mut().find(|(c, _)| *c == entry.categorie) {
                Some((_, bucket)) => bucket.push(entry),
                None => groupes.push((entry.categorie.as_str(), vec![entry])),
            }
        }

        groupes
    }
}

/// The code families served to the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogueFamille {
    Symptomes,
    Diagnostics,
    Dsm5,
    Medicaments,
    Maladies,
}

impl CatalogueFamille {
    pub const ALL: [CatalogueFamille; 5] = [
        Self::Symptomes,
        Self::Diagnostics,
        Self::Dsm5,
        Self::Medicaments,
        Self::Maladies,
    ];

    /// Parses the path segment used by the catalog routes.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "symptomes" => Some(Self::Symptomes),
            "diagnostics" => Some(Self::Diagnostics),
            "dsm5" => Some(Self::Dsm5),
            "medicaments" => Some(Self::Medicaments),
            "maladies" => Some(Self::Maladies),
            _ => None,
        }
    }

    /// Stable name, used both in routes and as the catalog file stem.
    pub fn nom(&self) -> &'static str {
        match self {
            Self::Symptomes => "symptomes",
            Self::Diagnostics => "diagnostics",
            Self::Dsm5 => "dsm5",
            Self::Medicaments => "medicaments",
            Self::Maladies => "maladies",
        }
    }
}

/// The five catalogs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalogues {
    symptomes: Catalogue,
    diagnostics: Catalogue,
    dsm5: Catalogue,
    medicaments: Catalogue,
    maladies: Catalogue,
}

impl Catalogues {
    pub fn get(&self, famille: CatalogueFamille) -> &Catalogue {
        match famille {
            CatalogueFamille::Symptomes => &self.symptomes,
            CatalogueFamille::Diagnostics => &self.diagnostics,
            CatalogueFamille::Dsm5 => &self.dsm5,
            CatalogueFamille::Medicaments => &self.medicaments,
            CatalogueFamille::Maladies => &self.maladies,
        }
    }

    /// Loads catalogs from `<dir>/<famille>.json` files, falling back to the
    /// built-in defaults for any family whose file is absent or unreadable.
    ///
    /// A bad catalog file degrades that one family and logs a warning; it
    /// never prevents startup. The intake form stays usable on defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        Self {
            symptomes: load_famille(dir, CatalogueFamille::Symptomes),
            diagnostics: load_famille(dir, CatalogueFamille::Diagnostics),
            dsm5: load_famille(dir, CatalogueFamille::Dsm5),
            medicaments: load_famille(dir, CatalogueFamille::Medicaments),
            maladies: load_famille(dir, CatalogueFamille::Maladies),
        }
    }
}

impl Default for Catalogues {
    fn default() -> Self {
        Self {
            symptomes: default_symptomes(),
            diagnostics: default_diagnostics(),
            dsm5: default_dsm5(),
            medicaments: default_medicaments(),
            maladies: default_maladies(),
        }
    }
}

fn load_famille(dir: &Path, famille: CatalogueFamille) -> Catalogue {
    let path = dir.join(format!("{}.json", famille.nom()));
    if !path.is_file() {
        return default_for(famille);
    }

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "failed to read catalogue {}: {} (falling back to defaults)",
                path.display(),
                e
            );
            return default_for(famille);
        }
    };

    match serde_json::from_str::<Vec<CatalogueEntry>>(&contents) {
        Ok(entries) => Catalogue::new(entries),
        Err(e) => {
            tracing::warn!(
                "failed to parse catalogue {}: {} (falling back to defaults)",
                path.display(),
                e
            );
            default_for(famille)
        }
    }
}

fn default_for(famille: CatalogueFamille) -> Catalogue {
    match famille {
        CatalogueFamille::Symptomes => default_symptomes(),
        CatalogueFamille::Diagnostics => default_diagnostics(),
        CatalogueFamille::Dsm5 => default_dsm5(),
        CatalogueFamille::Medicaments => default_medicaments(),
        CatalogueFamille::Maladies => default_maladies(),
    }
}

fn entry(code: &str, libelle: &str, categorie: &str) -> CatalogueEntry {
    CatalogueEntry {
        code: code.to_owned(),
        libelle: libelle.to_owned(),
        categorie: categorie.to_owned(),
    }
}

fn default_symptomes() -> Catalogue {
    Catalogue::new(vec![
        entry("ANX001", "Anxiété généralisée", "Affectif"),
        entry("DEP001", "Tristesse persistante", "Affectif"),
        entry("INS001", "Insomnie", "Somnolence"),
        entry("HYP001", "Hypersomnie", "Somnolence"),
        entry("IRR001", "Irritabilité", "Affectif"),
        entry("CON001", "Difficultés de concentration", "Cognitif"),
        entry("MEM001", "Problèmes de mémoire", "Cognitif"),
        entry("FAT001", "Fatigue chronique", "Somatique"),
        entry("CEPH001", "Céphalées", "Somatique"),
        entry("APP001", "Perte d'appétit", "Somatique"),
        entry("HYPER001", "Hyperphagie", "Somatique"),
        entry("AGIT001", "Agitation psychomotrice", "Comportemental"),
        entry("RET001", "Ralentissement psychomoteur", "Comportemental"),
        entry("ISO001", "Isolement social", "Social"),
        entry("IDE001", "Idées noires", "Cognitif"),
    ])
}

fn default_diagnostics() -> Catalogue {
    Catalogue::new(vec![
        entry("F32.0", "Épisode dépressif léger", "Troubles de l'humeur"),
        entry("F32.1", "Épisode dépressif moyen", "Troubles de l'humeur"),
        entry("F32.2", "Épisode dépressif sévère", "Troubles de l'humeur"),
        entry("F41.0", "Trouble panique", "Troubles anxieux"),
        entry("F41.1", "Trouble anxieux généralisé", "Troubles anxieux"),
        entry("F43.2", "Trouble de l'adaptation", "Troubles anxieux"),
        entry("F20.0", "Schizophrénie paranoïde", "Troubles psychotiques"),
        entry(
            "F31.0",
            "Trouble bipolaire actuellement hypomaniaque",
            "Troubles de l'humeur",
        ),
        entry(
            "F31.1",
            "Trouble bipolaire actuellement maniaque",
            "Troubles de l'humeur",
        ),
        entry(
            "F31.2",
            "Trouble bipolaire actuellement dépressif",
            "Troubles de l'humeur",
        ),
    ])
}

fn default_dsm5() -> Catalogue {
    Catalogue::new(vec![
        entry(
            "296.21",
            "Trouble dépressif majeur, épisode unique, léger",
            "Troubles dépressifs",
        ),
        entry(
            "296.22",
            "Trouble dépressif majeur, épisode unique, moyen",
            "Troubles dépressifs",
        ),
        entry(
            "296.23",
            "Trouble dépressif majeur, épisode unique, sévère",
            "Troubles dépressifs",
        ),
        entry("300.02", "Trouble anxieux généralisé", "Troubles anxieux"),
        entry("300.01", "Trouble panique", "Troubles anxieux"),
    ])
}

fn default_medicaments() -> Catalogue {
    Catalogue::new(vec![
        entry("PAR001", "Paroxétine 20mg", "ISRS"),
        entry("SER001", "Sertraline 50mg", "ISRS"),
        entry("FLU001", "Fluoxétine 20mg", "ISRS"),
        entry("CIT001", "Citalopram 20mg", "ISRS"),
        entry("ESC001", "Escitalopram 10mg", "ISRS"),
        entry("VEN001", "Venlafaxine 75mg", "IRSNa"),
        entry("DUL001", "Duloxétine 60mg", "IRSNa"),
        entry("ALP001", "Alprazolam 0.25mg", "Benzodiazépine"),
        entry("CLO001", "Clonazépam 0.5mg", "Benzodiazépine"),
        entry("LOR001", "Lorazépam 1mg", "Benzodiazépine"),
        entry("OLZ001", "Olanzapine 5mg", "Neuroleptique atypique"),
        entry("RIS001", "Risperidone 2mg", "Neuroleptique atypique"),
        entry("QUE001", "Quétiapine 100mg", "Neuroleptique atypique"),
        entry("ARI001", "Aripiprazole 10mg", "Neuroleptique atypique"),
        entry("LIT001", "Lithium 300mg", "Thymorégulateur"),
        entry("VAL001", "Valproate 500mg", "Thymorégulateur"),
    ])
}

fn default_maladies() -> Catalogue {
    Catalogue::new(vec![
        entry("E11.9", "Diabète de type 2", "Métabolique"),
        entry("I10", "Hypertension essentielle", "Cardiovasculaire"),
        entry("E04.9", "Hypothyroïdie non spécifiée", "Endocrinien"),
        entry("E05.9", "Hyperthyroïdie", "Endocrinien"),
        entry("K21.9", "Reflux gastro-œsophagien", "Digestif"),
        entry("J45.9", "Asthme", "Respiratoire"),
        entry("M54.5", "Lombalgie", "Musculosquelettique"),
        entry("G43.9", "Migraine", "Neurologique"),
        entry("F10.2", "Troubles mentaux liés à l'alcool", "Addiction"),
        entry("F17.2", "Troubles mentaux liés au tabac", "Addiction"),
    ])
}

#[cfg(test)]
mod catalogue_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn blank_query_is_the_identity() {
        let catalogue = default_symptomes();
        let groupes = catalogue.filter_and_group("");
        let total: usize = groupes.iter().map(|(_, entries)| entries.len()).sum();
        assert_eq!(total, catalogue.len());
    }

    #[test]
    fn unmatched_query_yields_empty_mapping() {
        let catalogue = default_symptomes();
        assert!(catalogue.filter_and_group("zzzznotfound").is_empty());
    }

    #[test]
    fn categories_follow_first_appearance_order() {
        let catalogue = default_symptomes();
        let groupes = catalogue.filter_and_group("");
        let categories: Vec<&str> = groupes.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                "Affectif",
                "Somnolence",
                "Cognitif",
                "Somatique",
                "Comportemental",
                "Social"
            ]
        );
    }

    #[test]
    fn matching_is_case_insensitive_on_code_and_label() {
        let catalogue = default_medicaments();

        let par_code = catalogue.filter_and_group("par001");
        assert_eq!(par_code.len(), 1);
        assert_eq!(par_code[0].1[0].code, "PAR001");

        let par_libelle = catalogue.filter_and_group("PAROXÉTINE");
        assert_eq!(par_libelle.len(), 1);
        assert_eq!(par_libelle[0].1[0].code, "PAR001");
    }

    #[test]
    fn filtering_is_idempotent() {
        let catalogue = default_diagnostics();
        let premiere = catalogue.filter_and_group("bipolaire");
        let seconde = catalogue.filter_and_group("bipolaire");
        assert_eq!(premiere, seconde);
        assert_eq!(premiere.len(), 1);
        assert_eq!(premiere[0].1.len(), 3);
    }

    #[test]
    fn load_falls_back_to_defaults_when_dir_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalogues = Catalogues::load_or_default(dir.path());
        assert_eq!(
            catalogues.get(CatalogueFamille::Symptomes).len(),
            default_symptomes().len()
        );
    }

    #[test]
    fn load_falls_back_to_defaults_on_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("symptomes.json");
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(b"{ not json ]").expect("write file");

        let catalogues = Catalogues::load_or_default(dir.path());
        assert_eq!(
            catalogues.get(CatalogueFamille::Symptomes).len(),
            default_symptomes().len()
        );
    }

    #[test]
    fn load_reads_a_valid_catalogue_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entries = vec![entry("X001", "Exemple", "Test")];
        let json = serde_json::to_string(&entries).expect("serialize entries");
        std::fs::write(dir.path().join("symptomes.json"), json).expect("write file");

        let catalogues = Catalogues::load_or_default(dir.path());
        let symptomes = catalogues.get(CatalogueFamille::Symptomes);
        assert_eq!(symptomes.len(), 1);
        assert_eq!(
            symptomes.find("X001").expect("entry present").libelle,
            "Exemple"
        );
    }

    #[test]
    fn famille_round_trips_through_parse() {
        for famille in CatalogueFamille::ALL {
            assert_eq!(CatalogueFamille::parse(famille.nom()), Some(famille));
        }
        assert_eq!(CatalogueFamille::parse("inconnue"), None);
    }
}
