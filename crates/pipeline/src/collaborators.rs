//! External collaborator contract.
//!
//! Each pipeline stage is backed by an external generation service (market
//! research, code synthesis, media rendering, identity attestation). The
//! core consumes them as opaque async calls: typed payload on success,
//! [`CollaboratorError`] on failure, nothing in between. Failures are never
//! retried here; retry policy belongs to the collaborator side.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// The fixed, ordered pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discovery,
    Build,
    Package,
    Enrich,
    Finalize,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Discovery,
        Stage::Build,
        Stage::Package,
        Stage::Enrich,
        Stage::Finalize,
    ];

    pub fn index(self) -> usize {
        match self {
            Stage::Discovery => 0,
            Stage::Build => 1,
            Stage::Package => 2,
            Stage::Enrich => 3,
            Stage::Finalize => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Discovery => "Market discovery",
            Stage::Build => "Backend generation",
            Stage::Package => "Brand packaging",
            Stage::Enrich => "Promo enrichment",
            Stage::Finalize => "Identity attestation",
        }
    }

    /// Job progress after this stage completes. Monotone across stages and
    /// reaches 100 only at the final one.
    pub fn progress_after(self) -> u8 {
        match self {
            Stage::Discovery => 20,
            Stage::Build => 45,
            Stage::Package => 70,
            Stage::Enrich => 90,
            Stage::Finalize => 100,
        }
    }

    pub fn titles() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.title()).collect()
    }
}

/// A pipeline stage's external call failed.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{0}")]
    Upstream(String),
}

/// Output of the discovery stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResearch {
    pub summary: String,
    pub competitors: Vec<String>,
}

/// Output of the build stage: the artifact the host will activate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedApp {
    pub display_name: String,
    pub source_code: String,
}

/// Output of the package stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandKit {
    pub logo_url: String,
    pub palette: Vec<String>,
}

/// Output of the enrich stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoVideo {
    pub video_url: String,
}

/// Output of the finalize stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAttestation {
    pub attestation_id: String,
}

/// The external generation services, one method per stage.
#[async_trait]
pub trait Collaborators: Send + Sync {
    async fn research_market(&self, prompt: &str) -> Result<MarketResearch, CollaboratorError>;

    async fn generate_backend(
        &self,
        prompt: &str,
        research: &MarketResearch,
    ) -> Result<GeneratedApp, CollaboratorError>;

    async fn design_brand_kit(&self, app: &GeneratedApp) -> Result<BrandKit, CollaboratorError>;

    async fn produce_promo_video(
        &self,
        app: &GeneratedApp,
        kit: &BrandKit,
    ) -> Result<PromoVideo, CollaboratorError>;

    async fn attest_identity(
        &self,
        app: &GeneratedApp,
    ) -> Result<IdentityAttestation, CollaboratorError>;
}

/// Deterministic collaborators for dev wiring and tests.
///
/// Synthesizes a small manifest application (`/health`, `/`, `/echo`) from
/// the prompt. Can be told to fail at a chosen stage, inject a canned
/// backend source, or add per-call latency so tests can observe a job
/// mid-flight.
#[derive(Debug, Default)]
pub struct ScriptedCollaborators {
    fail_at: Option<Stage>,
    source_override: Option<String>,
    latency: Option<Duration>,
}

impl ScriptedCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }

    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source_override: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn gate(&self, stage: Stage) -> Result<(), CollaboratorError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_at == Some(stage) {
            return Err(CollaboratorError::Upstream(format!(
                "{} service rejected the request",
                stage.title()
            )));
        }
        Ok(())
    }
}

/// Derive a human display name from a free-form prompt.
fn display_name_from_prompt(prompt: &str) -> String {
    let mut words: Vec<String> = prompt
        .split_whitespace()
        .take(6)
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        words.push("Untitled Venture".to_string());
    }
    words.join(" ")
}

#[async_trait]
impl Collaborators for ScriptedCollaborators {
    async fn research_market(&self, prompt: &str) -> Result<MarketResearch, CollaboratorError> {
        self.gate(Stage::Discovery).await?;
        Ok(MarketResearch {
            summary: format!("niche analysis for: {prompt}"),
            competitors: vec!["incumbent-a".to_string(), "incumbent-b".to_string()],
        })
    }

    async fn generate_backend(
        &self,
        prompt: &str,
        _research: &MarketResearch,
    ) -> Result<GeneratedApp, CollaboratorError> {
        self.gate(Stage::Build).await?;
        let display_name = display_name_from_prompt(prompt);
        let source_code = match &self.source_override {
            Some(source) => source.clone(),
            None => json!({
                "app": {
                    "name": display_name,
                    "routes": [
                        {"method": "GET", "path": "/health", "body": {"status": "ok"}},
                        {"method": "GET", "path": "/", "body": {"service": display_name, "generated_from": prompt}},
                        {"method": "POST", "path": "/echo", "behavior": "echo"}
                    ]
                }
            })
            .to_string(),
        };
        Ok(GeneratedApp {
            display_name,
            source_code,
        })
    }

    async fn design_brand_kit(&self, app: &GeneratedApp) -> Result<BrandKit, CollaboratorError> {
        self.gate(Stage::Package).await?;
        Ok(BrandKit {
            logo_url: format!("https://assets.invalid/{}/logo.png", slug(&app.display_name)),
            palette: vec!["#1a1a2e".to_string(), "#e94560".to_string()],
        })
    }

    async fn produce_promo_video(
        &self,
        app: &GeneratedApp,
        _kit: &BrandKit,
    ) -> Result<PromoVideo, CollaboratorError> {
        self.gate(Stage::Enrich).await?;
        Ok(PromoVideo {
            video_url: format!("https://assets.invalid/{}/promo.mp4", slug(&app.display_name)),
        })
    }

    async fn attest_identity(
        &self,
        app: &GeneratedApp,
    ) -> Result<IdentityAttestation, CollaboratorError> {
        self.gate(Stage::Finalize).await?;
        Ok(IdentityAttestation {
            attestation_id: format!("attest-{}", slug(&app.display_name)),
        })
    }
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
