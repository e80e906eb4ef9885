use crate::cli::FetchArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::fetch::FetchOutcome;
use errp_rs::{FetchConfig, Fetcher};

pub fn execute(args: FetchArgs) -> i32 {
    let mut config = FetchConfig::with_target_dir(&args.target_dir);
    if let Some(subjects) = args.subjects {
        config.subjects = subjects;
    }
    if let Some(sessions) = args.sessions {
        config.sessions = sessions;
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    config.timeout_secs = args.timeout;

    let fetcher = match Fetcher::http(config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    let report = match fetcher.ensure_dataset() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        if let Err(e) = output::print_json(&report, args.compact) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        for entry in &report.entries {
            match entry.outcome {
                FetchOutcome::Downloaded { bytes } => {
                    println!("downloaded {} ({} bytes)", entry.path.display(), bytes)
                }
                FetchOutcome::Skipped => println!("present    {}", entry.path.display()),
            }
        }
        println!(
            "{} downloaded, {} already present",
            report.downloaded(),
            report.skipped()
        );
    }

    exit_codes::SUCCESS
}
