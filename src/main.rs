use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use youtube_mass_updater::config::DATE_FORMAT;
use youtube_mass_updater::youtube::{load_client_secrets, YouTubeClient};
use youtube_mass_updater::*;

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new().filter_level(level).parse_default_env().init();
}

fn select_videos(
    inventory: Inventory,
    config: &ScheduleConfig,
) -> (Vec<VideoItem>, chrono::DateTime<chrono::FixedOffset>) {
    let (mut videos, anchor) = match config.mode {
        RunMode::Drafts => {
            let anchor = resolve_anchor(&inventory.scheduled, config.start_date);
            (inventory.drafts, anchor)
        }
        RunMode::Reschedule(day) => {
            let offset = config.offset();
            let videos = inventory
                .scheduled
                .into_iter()
                .filter(|video| {
                    video
                        .publish_at
                        .map(|at| at.with_timezone(&offset).date_naive() == day)
                        .unwrap_or(false)
                })
                .collect();
            (videos, config.start_date)
        }
    };
    videos.truncate(config.max_videos);
    (videos, anchor)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logger(args.verbose);

    let config = ScheduleConfig::from_args(&args).context("Invalid configuration")?;
    info!("Starting {:?} run.", config.mode);

    let oauth_config = load_client_secrets(&args.client_secrets)?;
    let mut client = YouTubeClient::new(&oauth_config, &args.token_file)?;
    println!("Authenticating with YouTube...");
    client.authenticate().await?;

    let inventory = discover(&client, &config.episodes, config.page_size).await;
    let (videos, anchor) = select_videos(inventory, &config);
    if videos.is_empty() {
        println!("Nothing to schedule.");
        return Ok(());
    }

    let mut hours = RandomHours(StdRng::from_entropy());
    let plan = plan_updates(&videos, anchor, &config, &mut hours)?;

    println!("Update Schedule (starting {}):", anchor.format(DATE_FORMAT));
    println!("==================================");
    for entry in &plan {
        let verdict = match entry.validate() {
            Ok(()) => String::new(),
            Err(e) => format!("  [skipped: {}]", e),
        };
        println!(
            "{}. {} -> {} @ {}{}",
            entry.index + 1,
            entry.video.title,
            entry.title,
            entry.publish_at.format("%Y-%m-%d %H:%M:%S %:z"),
            verdict
        );
    }

    if args.dry_run {
        println!("\nDry run complete. No videos were updated.");
        return Ok(());
    }

    if !args.yes {
        println!("\nProceed with update? (y/N): ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().to_lowercase().starts_with('y') {
            println!("Update cancelled.");
            return Ok(());
        }
    }

    let report = execute_plan(&client, &plan, &config).await?;

    println!(
        "\nUpdated {}, skipped {}, failed {}. Quota used: {}.",
        report.updated(),
        report.skipped(),
        report.failed(),
        report.quota_used
    );
    if report.stopped_by_quota {
        println!("{} videos left for the next run.", report.deferred);
    }
    info!("Finished {:?} run.", config.mode);
    Ok(())
}
