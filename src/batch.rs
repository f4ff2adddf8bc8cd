use crate::cli::{CommonArgs, ModelArgs};
use crate::diners::DinersList;
use crate::insights::{InsightDocument, InsightExtractor, InsightStats};
use crate::openai::real::maybe_create_openai_client;
use crate::prompts::build_analysis_prompt;
use crate::store::InsightStore;
use crate::time_util::parse_dataset_date;
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Generate guest insight profiles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    pub common_args: CommonArgs,

    #[command(flatten)]
    pub model_args: ModelArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every reservation and write the insights document
    Generate,

    /// Print the prompt that would be sent for a guest
    Prompt {
        /// Guest name as it appears in the dataset
        #[arg(long)]
        guest: String,

        /// Only this reservation date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Print the counts of the stored insights document
    Stats,
}

pub async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    run_app().await
}

pub async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    let store = InsightStore::new(cli.common_args.insights_file);

    match cli.command {
        Commands::Generate => {
            store.check_writable()?;

            let diners = DinersList::load_from_json(&cli.model_args.diners_file)?;
            let client = match maybe_create_openai_client(
                cli.model_args.openai_api_key,
                cli.model_args.openai_api_base,
            ) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(
                        "Failed to create OpenAI client: {}. Every reservation will get a fallback profile.",
                        e
                    );
                    None
                }
            };
            let extractor = InsightExtractor::new(
                client,
                cli.model_args.model,
                cli.model_args.temperature,
            );

            let document = generate_insights(
                &extractor,
                &diners,
                &store,
                cli.model_args.max_concurrent_requests,
            )
            .await?;
            print_stats(&document.stats);
        }
        Commands::Prompt { guest, date } => {
            let diners = DinersList::load_from_json(&cli.model_args.diners_file)?;
            for prompt in render_guest_prompts(&diners, &guest, date.as_deref())? {
                println!("{}\n", prompt);
            }
        }
        Commands::Stats => {
            let document = store.read_document().await?;
            println!("Generated at: {}", document.generated_at.to_rfc3339());
            print_stats(&document.stats);
        }
    }

    Ok(())
}

fn print_stats(stats: &InsightStats) {
    println!("Total reservations: {}", stats.total_reservations);
    println!("VIP guests: {}", stats.vip_count);
    println!("Dietary needs: {}", stats.dietary_count);
    println!("Special occasions: {}", stats.special_occasion_count);
}

/// Run the whole batch and persist the result.
#[instrument(skip_all, fields(model = extractor.model(), path = %store.path().display()), err)]
pub async fn generate_insights(
    extractor: &InsightExtractor,
    diners: &DinersList,
    store: &InsightStore,
    max_concurrent: usize,
) -> Result<InsightDocument> {
    info!(
        "Analyzing {} reservations across {} diners",
        diners.reservation_count(),
        diners.diners.len()
    );
    let started = std::time::Instant::now();
    let profiles = extractor
        .process_all_diners(&diners.diners, max_concurrent)
        .await;
    info!(
        "Produced {} profiles in {}ms",
        profiles.len(),
        started.elapsed().as_millis()
    );

    let document = InsightDocument::new(profiles, Utc::now());
    store.write_document(&document)?;
    Ok(document)
}

/// Prompts for every reservation of every diner called `guest`, optionally
/// narrowed to one reservation date.
pub fn render_guest_prompts(
    diners: &DinersList,
    guest: &str,
    date: Option<&str>,
) -> Result<Vec<String>> {
    let date = date.map(parse_dataset_date).transpose()?;

    let prompts: Vec<String> = diners
        .find_by_name(guest)
        .flat_map(|diner| {
            diner
                .reservations
                .iter()
                .filter(move |r| date.map_or(true, |d| r.date.date() == d.date()))
                .map(move |r| build_analysis_prompt(diner, r))
        })
        .collect();

    if prompts.is_empty() {
        return Err(anyhow::anyhow!("No reservations found for guest {}", guest));
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{diner_named, reservation};

    fn dataset() -> DinersList {
        DinersList {
            diners: vec![
                diner_named(
                    "Ada Park",
                    vec![
                        reservation("2024-05-01", 2, vec![]),
                        reservation("2024-06-01", 2, vec![]),
                    ],
                ),
                diner_named("Walk In", vec![]),
            ],
        }
    }

    #[test]
    fn renders_one_prompt_per_reservation() {
        let prompts = render_guest_prompts(&dataset(), "Ada Park", None).unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Upcoming Reservation: 2024-05-01"));
        assert!(prompts[1].contains("Upcoming Reservation: 2024-06-01"));
    }

    #[test]
    fn narrows_prompts_by_date() {
        let prompts =
            render_guest_prompts(&dataset(), "Ada Park", Some("2024-06-01"))
                .unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Date: 2024-05-01, People: 2"));
    }

    #[test]
    fn unknown_guest_or_date_is_an_error() {
        assert!(render_guest_prompts(&dataset(), "Nobody", None).is_err());
        assert!(render_guest_prompts(&dataset(), "Walk In", None).is_err());
        assert!(
            render_guest_prompts(&dataset(), "Ada Park", Some("2023-01-01"))
                .is_err()
        );
        assert!(
            render_guest_prompts(&dataset(), "Ada Park", Some("not a date"))
                .is_err()
        );
    }
}
