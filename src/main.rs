use std::env;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};

use medphys::configuration::Configuration;
use medphys::mosaiq::qcl::DATE_FORMAT;
use medphys::mudensity::mudensity::calc_single_leaf_pair;
use medphys::time::daterange::QclDateRange;

const DEFAULT_CONFIG_PATH: &str = "config.json";

// medphys [config.json] [START END]，日期格式 %Y-%m-%d；未指定時取上個月
fn qcl_date_range(start: Option<String>, end: Option<String>) -> Result<QclDateRange, String> {
    match (start, end) {
        (None, None) => Ok(QclDateRange::default_for(Local::now().date_naive(), 1)),
        (Some(start), Some(end)) => {
            let start = NaiveDate::parse_from_str(&start, DATE_FORMAT).map_err(|e| format!("{}: {}", start, e))?;
            let end = NaiveDate::parse_from_str(&end, DATE_FORMAT).map_err(|e| format!("{}: {}", end, e))?;
            QclDateRange::new(start, end).map_err(|e| e.to_string())
        },
        _ => Err("both START and END dates are required".to_owned())
    }
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let range = match qcl_date_range(args.next(), args.next()) {
        Ok(range) => range,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };
    let config = Configuration::new();
    match config.from_reader(&config_path) {
        Ok(exclusions) => {
            for exclusion in exclusions {
                println!("skipped: {}", exclusion);
            }
        },
        Err(error) => {
            eprintln!("{}: {}", config_path, error);
            return ExitCode::FAILURE;
        }
    }

    match config.require_candidate_sites() {
        Ok(sites) => {
            println!("QCL completion range: {} to {}", range.start(), range.end());
            for site in sites {
                let mosaiq = site.mosaiq();
                println!("{} ({}:{}), location '{}'",
                         mosaiq.alias(),
                         mosaiq.hostname(),
                         mosaiq.port(),
                         mosaiq.physics_qcl_location());
            }
        },
        Err(error) => println!("warning: {}", error)
    }

    match calc_single_leaf_pair(&[-2.3, 3.1], &[0.0, 7.7], 1.0, 1000) {
        Ok(mu_density) => {
            println!("single leaf pair MU density:");
            for (x, density) in mu_density.iter() {
                println!("{:>6.2}, {:.4}", x, density);
            }
            ExitCode::SUCCESS
        },
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
