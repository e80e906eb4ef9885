use crate::cli::DefaultsArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::DatasetConfig;

pub fn execute(args: DefaultsArgs) -> i32 {
    match output::print_json(&DatasetConfig::default(), args.compact) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}
