use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "errp",
    version,
    about = "Fetch and preprocess the BNCI 013-2015 error-related potential dataset",
    long_about = "Download the BNCI Horizon 2020 data set 013-2015 (monitoring error-related potentials)\n\
                  and turn its MATLAB recordings into band-pass filtered, decimated epochs with\n\
                  correct/error labels."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download missing subject/session recordings
    Fetch(FetchArgs),
    /// Show sample rate, channels, trials and event codes of a recording
    Inspect(InspectArgs),
    /// Preprocess recordings and extract features and labels
    Extract(ExtractArgs),
    /// Print the default configuration as JSON
    Defaults(DefaultsArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Directory the recordings are stored in
    #[arg(long, env = "ERRP_DATA_DIR", default_value = "data")]
    pub target_dir: String,

    /// Subjects to fetch, 1-6 (default: all)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub subjects: Option<Vec<u32>>,

    /// Sessions to fetch, 1-2 (default: both)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub sessions: Option<Vec<u32>>,

    /// Base URL of the data set
    #[arg(long, env = "ERRP_BASE_URL")]
    pub base_url: Option<String>,

    /// Whole-request timeout in seconds (default: none)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the fetch report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Recording file (.mat)
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Session to aggregate over subjects (1-2)
    #[arg(long, conflicts_with = "files", required_unless_present = "files")]
    pub session: Option<u32>,

    /// Subjects of the session, in output order (default: 1-6)
    #[arg(long, num_args = 1.., value_delimiter = ',', requires = "session")]
    pub subjects: Option<Vec<u32>>,

    /// Directory holding sub{SS}_ses{N}.mat files
    #[arg(long, env = "ERRP_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// Glob pattern of recording files to process instead of a session
    #[arg(long)]
    pub files: Option<String>,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    pub config: Option<String>,

    /// High-pass edge in Hz
    #[arg(long)]
    pub l_freq: Option<f64>,

    /// Low-pass edge in Hz
    #[arg(long)]
    pub h_freq: Option<f64>,

    /// Skip band-pass filtering
    #[arg(long, default_value_t = false, conflicts_with_all = ["l_freq", "h_freq"])]
    pub no_filter: bool,

    /// Target sample rate in Hz
    #[arg(long)]
    pub resample_to: Option<f64>,

    /// Keep the native sample rate
    #[arg(long, default_value_t = false, conflicts_with = "resample_to")]
    pub no_resample: bool,

    /// Epoch start relative to the event (s)
    #[arg(long, allow_hyphen_values = true)]
    pub tmin: Option<f64>,

    /// Epoch end relative to the event (s)
    #[arg(long, allow_hyphen_values = true)]
    pub tmax: Option<f64>,

    /// Disable baseline correction
    #[arg(long, default_value_t = false)]
    pub no_baseline: bool,

    /// Channels to keep (default: FCz,Cz)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub picks: Option<Vec<String>>,

    /// Feature window start (s)
    #[arg(long, allow_hyphen_values = true)]
    pub crop_tmin: Option<f64>,

    /// Feature window end (s)
    #[arg(long, allow_hyphen_values = true)]
    pub crop_tmax: Option<f64>,

    /// Write X, y, channels, times and sfreq to this .mat file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct DefaultsArgs {
    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("errp").chain(args.iter().copied()))
    }

    #[test]
    fn test_subject_lists_accept_commas_and_spaces() {
        let cli = parse(&["fetch", "--subjects", "1,3", "--sessions", "2"]).unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.subjects, Some(vec![1, 3]));
        assert_eq!(args.sessions, Some(vec![2]));

        let cli = parse(&["extract", "--session", "1", "--subjects", "4", "2"]).unwrap();
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.subjects, Some(vec![4, 2]));
    }

    #[test]
    fn test_extract_needs_a_source() {
        assert!(parse(&["extract"]).is_err());
        assert!(parse(&["extract", "--session", "1", "--files", "*.mat"]).is_err());
        assert!(parse(&["extract", "--files", "data/*.mat"]).is_ok());
    }

    #[test]
    fn test_negative_times() {
        let cli = parse(&["extract", "--session", "1", "--tmin", "-0.5", "--crop-tmin", "-0.1"])
            .unwrap();
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.tmin, Some(-0.5));
        assert_eq!(args.crop_tmin, Some(-0.1));
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = parse(&["defaults", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
