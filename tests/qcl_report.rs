// Site configuration through to the per-site QCL report, with an in-memory Mosaiq.
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use medphys::configuration::Configuration;
use medphys::mosaiq::connection::{ConnectionParams, ConnectionProvider, SingleThreadedConnectionCache};
use medphys::mosaiq::qcl::{QclReport, QueryExecutor, QueryParameters, QueryValue};
use medphys::mosaiq::qclerror::QclError;
use medphys::mosaiq::siteconfig::ExclusionReason;
use medphys::time::daterange::QclDateRange;

const CONFIG: &str = r#"{
    "site": [
        {
            "name": "rccc",
            "mosaiq": {
                "physics_qcl_location": "Physics",
                "hostname": "rccc-mosaiq",
                "port": 1433,
                "alias": "RCCC"
            }
        },
        { "name": "nbcc", "mosaiq": { "hostname": "nbcc-mosaiq" } },
        {
            "name": "sash",
            "mosaiq": {
                "physics_qcl_location": "Physics",
                "hostname": "sash-mosaiq",
                "port": 1433,
                "alias": "SASH"
            }
        }
    ]
}"#;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 30, 0).unwrap()
}

/// One Mosaiq server: a list of (location, completed time, task) checklist rows.
struct FakeMosaiq {
    checklist: Vec<(&'static str, NaiveDateTime, &'static str)>,
    queries: RefCell<usize>
}

impl QueryExecutor for FakeMosaiq {
    fn execute(&self, _sql: &str, parameters: &QueryParameters) -> Result<Vec<Vec<QueryValue>>, QclError> {
        *self.queries.borrow_mut() += 1;
        let (Some(QueryValue::Text(location)), Some(QueryValue::DateTime(start)), Some(QueryValue::DateTime(end))) =
            (parameters.get("location"), parameters.get("start"), parameters.get("end")) else {
            return Err(QclError::Query("missing parameter".to_owned()));
        };
        Ok(self.checklist
            .iter()
            .filter(|(loc, t, _)| loc.trim() == location.trim() && start <= t && t < end)
            .enumerate()
            .map(|(i, (_, t, task))| vec![
                QueryValue::Text(format!("{:06}", i)),
                QueryValue::Text("Citizen".to_owned()),
                QueryValue::Text("Jane".to_owned()),
                QueryValue::Null,
                QueryValue::DateTime(*t),
                QueryValue::Text((*task).to_owned())
            ])
            .collect())
    }
}

struct FakeProvider {
    servers: HashMap<&'static str, Arc<FakeMosaiq>>,
    connects: RefCell<Vec<String>>
}

impl ConnectionProvider for FakeProvider {
    type Connection = FakeMosaiq;

    fn connect(&self, params: &ConnectionParams) -> Result<Arc<FakeMosaiq>, QclError> {
        self.connects.borrow_mut().push(params.alias().to_owned());
        self.servers
            .get(params.hostname())
            .cloned()
            .ok_or_else(|| QclError::Connection { alias: params.alias().to_owned(), message: "unknown host".to_owned() })
    }
}

fn provider() -> FakeProvider {
    let rccc = FakeMosaiq {
        checklist: vec![
            ("Physics", at(2021, 2, 3), "Weekly check 10"),
            ("Physics", at(2021, 2, 25), "Weekly check 2"),
            ("Physics", at(2021, 3, 1), "Weekly check 2"),
            ("Dosimetry", at(2021, 2, 9), "Plan check")
        ],
        queries: RefCell::new(0)
    };
    let sash = FakeMosaiq {
        checklist: vec![
            (" Physics ", at(2021, 2, 14), "Weekly check 2"),
            ("Physics", at(2021, 1, 31), "Weekly check 2")
        ],
        queries: RefCell::new(0)
    };
    FakeProvider {
        servers: HashMap::from([("rccc-mosaiq", Arc::new(rccc)), ("sash-mosaiq", Arc::new(sash))]),
        connects: RefCell::new(Vec::new())
    }
}

#[test]
fn report_covers_configured_sites_in_order() {
    let config = Configuration::new();
    let exclusions = config.from_json_str(CONFIG).unwrap();
    assert_eq!(exclusions.len(), 1);
    assert_eq!(exclusions[0].site, "nbcc");
    assert_eq!(exclusions[0].reason, ExclusionReason::MissingField("physics_qcl_location"));

    let sites = config.require_candidate_sites().unwrap();
    let cached = SingleThreadedConnectionCache::<FakeProvider>::new(provider());
    let range = QclDateRange::default_for(NaiveDate::from_ymd_opt(2021, 3, 17).unwrap(), 1);
    let report = QclReport::collect(&sites, &cached, &range).unwrap();

    let aliases: Vec<&str> = report.per_site().iter().map(|r| r.site().mosaiq().alias()).collect();
    assert_eq!(aliases, vec!["RCCC", "SASH"]);

    let rccc = report.per_site()[0].records();
    assert_eq!(rccc.len(), 2);
    assert!(rccc[0].actual_completed_time() > rccc[1].actual_completed_time());
    assert_eq!(rccc[0].task(), "Weekly check 2");
    assert_eq!(report.per_site()[1].records().len(), 1);
    assert_eq!(report.all_records().count(), 3);

    assert_eq!(
        report.task_counts(),
        vec![("Weekly check 2".to_owned(), 2), ("Weekly check 10".to_owned(), 1)]
    );
    assert_eq!(report.counts_markdown(), "# Counts\n\n* Weekly check 2: `2`\n* Weekly check 10: `1`\n");
}

#[test]
fn repeated_reports_reuse_connections() {
    let config = Configuration::new();
    config.from_json_str(CONFIG).unwrap();
    let sites = config.candidate_sites();
    let cached = SingleThreadedConnectionCache::<FakeProvider>::new(provider());
    let range = QclDateRange::default_for(NaiveDate::from_ymd_opt(2021, 3, 17).unwrap(), 1);

    let first = QclReport::collect(&sites, &cached, &range).unwrap();
    let second = QclReport::collect(&sites, &cached, &range).unwrap();
    assert_eq!(first, second);
    assert_eq!(cached.cached_connections(), Ok(2));

    let rccc = cached.connect(&ConnectionParams::from_site(&sites[0])).unwrap();
    assert_eq!(*rccc.queries.borrow(), 2);
}

#[test]
fn unreachable_site_fails_the_report() {
    let config = Configuration::new();
    config.from_json_str(CONFIG).unwrap();
    let sites = config.candidate_sites();
    let mut fake = provider();
    fake.servers.remove("sash-mosaiq");
    let range = QclDateRange::default_for(NaiveDate::from_ymd_opt(2021, 3, 17).unwrap(), 1);

    let error = QclReport::collect(&sites, &fake, &range).unwrap_err();
    assert_eq!(error, QclError::Connection { alias: "SASH".to_owned(), message: "unknown host".to_owned() });
    assert_eq!(*fake.connects.borrow(), vec!["RCCC".to_owned(), "SASH".to_owned()]);
}
