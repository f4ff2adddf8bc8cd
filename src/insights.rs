use crate::diners::{Diner, Reservation};
use crate::openai::OpenAIClientTrait;
use crate::profile::{fallback_profile, parse_model_response, Profile};
use crate::prompts::{build_analysis_prompt, INSIGHT_SYSTEM_PROMPT};
use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Aggregate counts over a profile list. Always recomputed from the list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightStats {
    pub total_reservations: usize,
    pub vip_count: usize,
    pub dietary_count: usize,
    pub special_occasion_count: usize,
}

impl InsightStats {
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        Self {
            total_reservations: profiles.len(),
            vip_count: profiles.iter().filter(|p| p.is_vip()).count(),
            dietary_count: profiles
                .iter()
                .filter(|p| p.has_dietary_needs())
                .count(),
            special_occasion_count: profiles
                .iter()
                .filter(|p| p.has_special_occasion())
                .count(),
        }
    }
}

/// The persisted output of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightDocument {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: InsightStats,
    pub profiles: Vec<Profile>,
}

impl InsightDocument {
    pub fn new(profiles: Vec<Profile>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            stats: InsightStats::from_profiles(&profiles),
            profiles,
        }
    }
}

// Why a model call produced no usable reply. Kept private: callers only
// see a profile, a fallback profile, or nothing.
#[derive(Debug)]
enum CompletionOutcome {
    Reply(Option<String>),
    TransportFailure(anyhow::Error),
}

/// Turns diner history into profiles, one model call per reservation.
#[derive(Clone)]
pub struct InsightExtractor {
    client: Option<Arc<dyn OpenAIClientTrait>>,
    model: String,
    temperature: f32,
}

impl InsightExtractor {
    /// `client` may be absent (no API key); every reservation then takes
    /// the fallback path.
    pub fn new(
        client: Option<Arc<dyn OpenAIClientTrait>>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages(
        prompt: String,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let system_message = ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(INSIGHT_SYSTEM_PROMPT)
                .build()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to build system message: {}", e)
                })?,
        );
        let user_message = ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to build user message: {}", e)
                })?,
        );
        Ok(vec![system_message, user_message])
    }

    async fn request_completion(&self, prompt: String) -> CompletionOutcome {
        let client = match &self.client {
            Some(client) => client,
            None => {
                return CompletionOutcome::TransportFailure(anyhow::anyhow!(
                    "OpenAI client not configured"
                ))
            }
        };

        let messages = match Self::build_messages(prompt) {
            Ok(messages) => messages,
            Err(e) => return CompletionOutcome::TransportFailure(e),
        };

        match client
            .chat_completion(self.model.clone(), messages, self.temperature)
            .await
        {
            Ok(response) => match response.choices.into_iter().next() {
                Some(choice) => CompletionOutcome::Reply(choice.message.content),
                None => CompletionOutcome::TransportFailure(anyhow::anyhow!(
                    "Completion returned no choices"
                )),
            },
            Err(e) => CompletionOutcome::TransportFailure(e),
        }
    }

    /// Produce at most one profile for `reservation`.
    ///
    /// A request that cannot complete yields the fallback profile. A reply
    /// that cannot be parsed yields nothing.
    #[instrument(skip_all, fields(guest = %diner.name, date = %reservation.date))]
    pub async fn analyze_reservation(
        &self,
        diner: &Diner,
        reservation: &Reservation,
    ) -> Option<Profile> {
        let prompt = build_analysis_prompt(diner, reservation);
        debug!("Built prompt of {} bytes", prompt.len());

        match self.request_completion(prompt).await {
            CompletionOutcome::Reply(Some(content)) => {
                match parse_model_response(&content, diner, reservation) {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        warn!("Dropping profile for {}: {}", diner.name, e);
                        None
                    }
                }
            }
            CompletionOutcome::Reply(None) => {
                warn!("Dropping profile for {}: empty model reply", diner.name);
                None
            }
            CompletionOutcome::TransportFailure(e) => {
                error!("Error analyzing diner {}: {}", diner.name, e);
                Some(fallback_profile(diner, reservation))
            }
        }
    }

    /// Profiles for every reservation of one diner, in reservation order.
    pub async fn analyze_diner(&self, diner: &Diner) -> Vec<Profile> {
        let mut profiles = Vec::new();
        for reservation in &diner.reservations {
            if let Some(profile) =
                self.analyze_reservation(diner, reservation).await
            {
                profiles.push(profile);
            }
        }
        profiles
    }

    /// Run every diner through the extractor.
    ///
    /// With `max_concurrent <= 1` requests go out one at a time. Otherwise up
    /// to `max_concurrent` requests are in flight; either way the result is
    /// ordered by diner, then by reservation.
    #[instrument(skip(self, diners), fields(diners = diners.len()))]
    pub async fn process_all_diners(
        &self,
        diners: &[Diner],
        max_concurrent: usize,
    ) -> Vec<Profile> {
        if max_concurrent <= 1 {
            let mut all_profiles = Vec::new();
            for diner in diners {
                info!("Analyzing diner {}", diner.name);
                all_profiles.extend(self.analyze_diner(diner).await);
            }
            return all_profiles;
        }

        self.process_concurrently(diners, max_concurrent).await
    }

    async fn process_concurrently(
        &self,
        diners: &[Diner],
        max_concurrent: usize,
    ) -> Vec<Profile> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut tasks = JoinSet::new();

        for (diner_index, diner) in diners.iter().enumerate() {
            if diner.reservations.is_empty() {
                continue;
            }
            info!("Analyzing diner {}", diner.name);
            let diner = Arc::new(diner.clone());
            for reservation_index in 0..diner.reservations.len() {
                let extractor = self.clone();
                let diner = diner.clone();
                let semaphore = semaphore.clone();
                tasks.spawn(async move {
                    // The semaphore is never closed.
                    let _permit = semaphore.acquire_owned().await.ok();
                    let reservation = &diner.reservations[reservation_index];
                    let profile =
                        extractor.analyze_reservation(&diner, reservation).await;
                    ((diner_index, reservation_index), profile)
                });
            }
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("Insight task failed: {}", e),
            }
        }

        results.sort_by_key(|(position, _)| *position);
        results
            .into_iter()
            .filter_map(|(_, profile)| profile)
            .collect()
    }
}
