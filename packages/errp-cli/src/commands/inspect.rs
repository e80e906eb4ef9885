use crate::cli::InspectArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::{read_info, EventClass};
use std::path::Path;

pub fn execute(args: InspectArgs) -> i32 {
    let info = match read_info(Path::new(&args.file)) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        if let Err(e) = output::print_json(&info, args.compact) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
        return exit_codes::SUCCESS;
    }

    println!("File: {}", info.path);
    if let Some(subject) = info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(session) = info.session {
        println!("Session: {}", session);
    }
    println!("Sample rate: {} Hz", info.sfreq);
    println!("Channels ({}): {}", info.n_channels, info.ch_names.join(", "));
    println!("Trials: {}", info.n_trials);
    for (i, n) in info.samples_per_trial.iter().enumerate() {
        println!(
            "  trial {:>2}: {} samples ({:.1} s)",
            i,
            n,
            *n as f64 / info.sfreq
        );
    }
    println!("Events:");
    for (code, count) in &info.event_counts {
        let class = match EventClass::from_code(*code) {
            Some(EventClass::Correct) => "correct",
            Some(EventClass::Error) => "error",
            None => "-",
        };
        println!("  {:>4} x{:<5} {}", code, count, class);
    }

    exit_codes::SUCCESS
}
