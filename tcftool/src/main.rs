use clap::{Parser, Subcommand};
use colored_json::{Color, ColorMode, Output, Styler, ToColoredJson};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tcf_consent::evaluator::{
    ConsentPolicyEvaluator, ConsentReport, EvaluatorConfig, PartnerMatching, VendorPolicies,
};
use tcf_consent::store::{shared_prefs, MemoryStore};
use tcf_consent::tc_string::TcString;
use tcf_consent::timestamp::{
    age_in_days, decode_timestamp, is_expired, unix_millis, RETENTION_DAYS,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a TC string and display it in the console
    Decode {
        /// TC string to decode
        tc_string: String,
    },
    /// Evaluate the ad policies of a preferences snapshot
    Evaluate {
        /// SharedPreferences XML file, or JSON object of preference values
        prefs: PathBuf,
        /// Vendor ID to check, can be repeated
        #[arg(short, long = "vendor")]
        vendors: Vec<u16>,
        /// Additional consent provider ID to check, can be repeated
        #[arg(short, long = "partner")]
        partners: Vec<u32>,
        /// Match additional consent providers by exact ID
        #[arg(long)]
        exact_partners: bool,
        /// Age in days past which a TC string is considered expired
        #[arg(long, default_value_t = RETENTION_DAYS)]
        retention_days: i64,
    },
    /// Display the creation date and age of a TC string
    Age {
        /// TC string to inspect
        tc_string: String,
        /// Reference time in milliseconds since the epoch, defaults to now
        #[arg(long)]
        now_ms: Option<i64>,
        /// Age in days past which a TC string is considered expired
        #[arg(long, default_value_t = RETENTION_DAYS)]
        retention_days: i64,
    },
}

#[derive(Serialize)]
struct Evaluation {
    tc_string_age_days: Option<i64>,
    tc_string_expired: bool,
    #[serde(flatten)]
    report: ConsentReport,
    vendor_policies: BTreeMap<u16, VendorPolicies>,
}

#[derive(Serialize)]
struct Age {
    created_ms: i64,
    age_days: i64,
    expired: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let e = match args.cmd {
        Commands::Decode { tc_string } => decode_tc_string(&tc_string),
        Commands::Evaluate {
            prefs,
            vendors,
            partners,
            exact_partners,
            retention_days,
        } => {
            let config = EvaluatorConfig {
                retention_days,
                partner_matching: if exact_partners {
                    PartnerMatching::Exact
                } else {
                    PartnerMatching::Substring
                },
            };
            evaluate(&prefs, config, &vendors, &partners)
        }
        Commands::Age {
            tc_string,
            now_ms,
            retention_days,
        } => age(&tc_string, now_ms, retention_days),
    };

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn decode_tc_string(s: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tc = TcString::parse_str(s)?;

    print_json(&tc)
}

fn evaluate(
    path: &Path,
    config: EvaluatorConfig,
    vendors: &[u16],
    partners: &[u32],
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(path)?;
    debug!(?store, "loaded preferences");

    let evaluator = ConsentPolicyEvaluator::with_config(store, config);
    let now = SystemTime::now();

    print_json(&Evaluation {
        tc_string_age_days: evaluator.stored_consent_age_in_days(now),
        tc_string_expired: evaluator.is_consent_string_expired(now),
        report: evaluator.report(vendors, partners),
        vendor_policies: vendors
            .iter()
            .map(|&id| (id, evaluator.vendor_policies(id)))
            .collect(),
    })
}

fn load_store(path: &Path) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let is_xml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"));

    if is_xml {
        Ok(shared_prefs::from_file(path)?)
    } else {
        let f = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(f)?)
    }
}

fn age(
    s: &str,
    now_ms: Option<i64>,
    retention_days: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let now_ms = now_ms.unwrap_or_else(|| unix_millis(SystemTime::now()));
    debug!(now_ms, "reference time");

    print_json(&Age {
        created_ms: decode_timestamp(s),
        age_days: age_in_days(s, now_ms),
        expired: is_expired(s, now_ms, retention_days),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{}",
        serde_json::to_string_pretty(value)?
            .to_colored_json_with_styler(ColorMode::Auto(Output::StdOut), json_color_styler())?
    );

    Ok(())
}

fn json_color_styler() -> Styler {
    Styler {
        key: Color::Green.foreground(),
        string_value: Color::Blue.bold(),
        integer_value: Color::Magenta.bold(),
        float_value: Color::Magenta.italic(),
        object_brackets: Color::Yellow.bold(),
        array_brackets: Color::Cyan.bold(),
        ..Default::default()
    }
}
