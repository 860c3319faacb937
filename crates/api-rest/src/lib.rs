//! # API REST
//!
//! REST API implementation for Cabinet.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error mapping)
//!
//! All domain logic lives in `cabinet-core`; this crate only maps requests
//! onto the store and store results onto status codes. Validation failures
//! surface as a `400` carrying the field-error list so the form can render
//! each message next to its control.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use cabinet_core::catalogue::{CatalogueEntry, CatalogueFamille};
use cabinet_core::consultation::{Consultation, ConsultationDraft, TypeConsultation};
use cabinet_core::patient::{Genre, Patient, PatientDraft, Statut};
use cabinet_core::reference::{Commune, Profession, Wilaya};
use cabinet_core::store::{MonthlyStatistics, StoredConsultation};
use cabinet_core::{CabinetStore, FieldError, StoreError, ValidationErrors};

/// Application state for the REST API server
///
/// Holds the practice store behind a lock; handlers take read access for
/// queries and write access for mutations.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<CabinetStore>>,
}

impl AppState {
    pub fn new(store: CabinetStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    fn store(&self) -> Result<RwLockReadGuard<'_, CabinetStore>, ApiError> {
        self.store.read().map_err(|_| {
            tracing::error!("store lock poisoned");
            ApiError::Internal
        })
    }

    fn store_mut(&self) -> Result<RwLockWriteGuard<'_, CabinetStore>, ApiError> {
        self.store.write().map_err(|_| {
            tracing::error!("store lock poisoned");
            ApiError::Internal
        })
    }
}

/// Errors a handler can surface to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation failures, rendered as a 400 with the error list.
    Validation(ValidationErrors),
    NotFound(&'static str),
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(erreurs) => ApiError::Validation(erreurs),
            other => {
                tracing::error!("store error: {:?}", other);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(erreurs) => (
                StatusCode::BAD_REQUEST,
                Json(ErreursRes {
                    erreurs: erreurs.0,
                }),
            )
                .into_response(),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

/// Body of a 400 validation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErreursRes {
    pub erreurs: Vec<FieldError>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A patient as served to clients: the dossier fields plus derived display
/// attributes (age, full name, gender label).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientView {
    pub id: String,
    pub num_dossier: String,
    pub nom: String,
    pub prenom: String,
    pub nom_complet: String,
    pub date_naissance: String,
    pub age: i32,
    pub genre: Genre,
    pub genre_libelle: String,
    pub situation_familiale: String,
    pub statut: Statut,
    pub telephone: String,
    pub email: String,
}

impl PatientView {
    fn from_patient(patient: &Patient) -> Self {
        Self {
            id: patient.id.to_string(),
            num_dossier: patient.num_dossier.clone(),
            nom: patient.nom.clone(),
            prenom: patient.prenom.clone(),
            nom_complet: patient.nom_complet(),
            date_naissance: patient.date_naissance.to_string(),
            age: patient.age_at(Utc::now().date_naive()),
            genre: patient.genre,
            genre_libelle: patient.genre.libelle().to_owned(),
            situation_familiale: patient.situation_familiale.clone(),
            statut: patient.statut,
            telephone: patient.telephone.clone(),
            email: patient.email.clone(),
        }
    }
}

/// One category section of a filtered catalog view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogueGroupe {
    pub categorie: String,
    pub entrees: Vec<CatalogueEntry>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RechercheParams {
    /// Free-text filter, case-insensitive, matched against code and label.
    pub recherche: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        get_patient,
        create_patient,
        list_consultations,
        create_consultation,
        patient_consultations,
        monthly_statistics,
        filter_catalogue,
        list_wilayas,
        wilaya_communes,
        list_professions,
    ),
    components(schemas(
        HealthRes,
        ErreursRes,
        FieldError,
        PatientView,
        PatientDraft,
        Genre,
        Statut,
        ConsultationDraft,
        Consultation,
        TypeConsultation,
        StoredConsultation,
        MonthlyStatistics,
        CatalogueGroupe,
        CatalogueEntry,
        Wilaya,
        Commune,
        Profession,
    ))
)]
struct ApiDoc;

/// Builds the application router with CORS and Swagger UI mounted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/patients/:id", get(get_patient))
        .route("/consultations", get(list_consultations))
        .route("/consultations", post(create_consultation))
        .route("/consultations/patient/:id", get(patient_consultations))
        .route(
            "/consultations/statistiques/mensuelles",
            get(monthly_statistics),
        )
        .route("/catalogues/:famille", get(filter_catalogue))
        .route("/references/wilayas", get(list_wilayas))
        .route("/references/wilayas/:id/communes", get(wilaya_communes))
        .route("/references/professions", get(list_professions))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the listener and serves the API until the process exits.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails while
/// running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Cabinet REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients",
    params(RechercheParams),
    responses(
        (status = 200, description = "List of patients", body = [PatientView]),
        (status = 500, description = "Internal server error")
    )
)]
/// List registered patients
///
/// With a `recherche` query parameter, restricts the list to patients whose
/// family or given name contains the query (case-insensitive).
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<RechercheParams>,
) -> Result<Json<Vec<PatientView>>, ApiError> {
    let store = state.store()?;
    let patients: Vec<PatientView> = match params.recherche.as_deref() {
        Some(query) if !query.trim().is_empty() => store
            .search_patients(query)
            .into_iter()
            .map(PatientView::from_patient)
            .collect(),
        _ => store
            .list_patients()
            .iter()
            .map(PatientView::from_patient)
            .collect(),
    };
    Ok(Json(patients))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient found", body = PatientView),
        (status = 404, description = "Patient not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Fetch one patient by identifier
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientView>, ApiError> {
    let store = state.store()?;
    let patient = store
        .find_patient(&id)
        .ok_or(ApiError::NotFound("Patient non trouvé"))?;
    Ok(Json(PatientView::from_patient(patient)))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientDraft,
    responses(
        (status = 201, description = "Patient created", body = PatientView),
        (status = 400, description = "Validation failed", body = ErreursRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new patient
///
/// # Errors
///
/// Returns `400 Bad Request` with the field-error list when the draft is
/// rejected, `500` when the collection cannot be persisted.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(draft): Json<PatientDraft>,
) -> Result<(StatusCode, Json<PatientView>), ApiError> {
    let mut store = state.store_mut()?;
    let patient = store.add_patient(&draft)?;
    Ok((
        StatusCode::CREATED,
        Json(PatientView::from_patient(&patient)),
    ))
}

#[utoipa::path(
    get,
    path = "/consultations",
    responses(
        (status = 200, description = "List of consultations", body = [StoredConsultation]),
        (status = 500, description = "Internal server error")
    )
)]
/// List all recorded consultations
#[axum::debug_handler]
async fn list_consultations(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredConsultation>>, ApiError> {
    let store = state.store()?;
    Ok(Json(store.list_consultations().to_vec()))
}

#[utoipa::path(
    post,
    path = "/consultations",
    request_body = ConsultationDraft,
    responses(
        (status = 201, description = "Consultation recorded", body = StoredConsultation),
        (status = 400, description = "Validation failed", body = ErreursRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a consultation
///
/// The draft is validated as a whole; every violated rule is reported, each
/// tagged with the offending field, including the patient-existence check.
///
/// # Errors
///
/// Returns `400 Bad Request` with the field-error list when validation
/// fails, `500` when the record cannot be persisted.
#[axum::debug_handler]
async fn create_consultation(
    State(state): State<AppState>,
    Json(draft): Json<ConsultationDraft>,
) -> Result<(StatusCode, Json<StoredConsultation>), ApiError> {
    let mut store = state.store_mut()?;
    let stored = store.add_consultation(&draft)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    get,
    path = "/consultations/patient/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Consultation history for the patient", body = [StoredConsultation]),
        (status = 500, description = "Internal server error")
    )
)]
/// Consultation history for one patient
///
/// An unknown patient yields an empty history rather than a 404; the
/// distinction is not observable from the history itself.
#[axum::debug_handler]
async fn patient_consultations(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Vec<StoredConsultation>>, ApiError> {
    let store = state.store()?;
    let history: Vec<StoredConsultation> = store
        .consultations_for_patient(&id)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/consultations/statistiques/mensuelles",
    responses(
        (status = 200, description = "Monthly activity summary", body = MonthlyStatistics),
        (status = 500, description = "Internal server error")
    )
)]
/// Monthly activity summary
#[axum::debug_handler]
async fn monthly_statistics(
    State(state): State<AppState>,
) -> Result<Json<MonthlyStatistics>, ApiError> {
    let store = state.store()?;
    Ok(Json(store.monthly_statistics()))
}

#[utoipa::path(
    get,
    path = "/catalogues/{famille}",
    params(
        ("famille" = String, Path, description = "Catalog family: symptomes, diagnostics, dsm5, medicaments or maladies"),
        RechercheParams,
    ),
    responses(
        (status = 200, description = "Filtered catalog grouped by category", body = [CatalogueGroupe]),
        (status = 404, description = "Unknown catalog family"),
        (status = 500, description = "Internal server error")
    )
)]
/// Filtered, category-grouped view of one reference catalog
///
/// A blank or absent query returns the whole catalog. Buckets appear in the
/// order their category first appears in the catalog.
#[axum::debug_handler]
async fn filter_catalogue(
    State(state): State<AppState>,
    AxumPath(famille): AxumPath<String>,
    Query(params): Query<RechercheParams>,
) -> Result<Json<Vec<CatalogueGroupe>>, ApiError> {
    let famille = CatalogueFamille::parse(&famille)
        .ok_or(ApiError::NotFound("Famille de catalogue inconnue"))?;

    let store = state.store()?;
    let recherche = params.recherche.unwrap_or_default();
    let groupes: Vec<CatalogueGroupe> = store
        .catalogues()
        .get(famille)
        .filter_and_group(&recherche)
        .into_iter()
        .map(|(categorie, entrees)| CatalogueGroupe {
            categorie: categorie.to_owned(),
            entrees: entrees.into_iter().cloned().collect(),
        })
        .collect();
    Ok(Json(groupes))
}

#[utoipa::path(
    get,
    path = "/references/wilayas",
    responses(
        (status = 200, description = "List of wilayas", body = [Wilaya]),
        (status = 500, description = "Internal server error")
    )
)]
/// List wilayas
#[axum::debug_handler]
async fn list_wilayas(State(state): State<AppState>) -> Result<Json<Vec<Wilaya>>, ApiError> {
    let store = state.store()?;
    Ok(Json(store.wilayas().to_vec()))
}

#[utoipa::path(
    get,
    path = "/references/wilayas/{id}/communes",
    params(("id" = u32, Path, description = "Wilaya identifier")),
    responses(
        (status = 200, description = "Communes of the wilaya", body = [Commune]),
        (status = 500, description = "Internal server error")
    )
)]
/// Communes of one wilaya
#[axum::debug_handler]
async fn wilaya_communes(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u32>,
) -> Result<Json<Vec<Commune>>, ApiError> {
    let store = state.store()?;
    let communes: Vec<Commune> = store
        .communes_for_wilaya(id)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(communes))
}

#[utoipa::path(
    get,
    path = "/references/professions",
    responses(
        (status = 200, description = "List of professions", body = [Profession]),
        (status = 500, description = "Internal server error")
    )
)]
/// List professions
#[axum::debug_handler]
async fn list_professions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profession>>, ApiError> {
    let store = state.store()?;
    Ok(Json(store.professions().to_vec()))
}
