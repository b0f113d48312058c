use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::time::daterange::QclDateRange;

use super::connection::{
    ConnectionParams,
    ConnectionProvider
};
use super::qclerror::QclError;
use super::siteconfig::SiteConfig;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 完成時間落在 `[start, end)`、且負責人為指定 location 的 QCL。
pub const QCL_BY_DATE_QUERY: &str = "
    SELECT
        Ident.IDA,
        Patient.Last_Name,
        Patient.First_Name,
        Chklist.Due_DtTm,
        Chklist.Act_DtTm,
        QCLTask.Description
    FROM Chklist, Staff, QCLTask, Ident, Patient
    WHERE
        Chklist.Pat_ID1 = Ident.Pat_ID1 AND
        Patient.Pat_ID1 = Ident.Pat_ID1 AND
        QCLTask.TSK_ID = Chklist.TSK_ID AND
        Staff.Staff_ID = Chklist.Rsp_Staff_ID AND
        RTRIM(LTRIM(Staff.Last_Name)) = RTRIM(LTRIM(%(location)s)) AND
        Chklist.Act_DtTm >= %(start)s AND
        Chklist.Act_DtTm < %(end)s
";

// ─────────────────────────────────────────────────────────────────────────────
// Query executor
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    DateTime(NaiveDateTime),
    Null
}

impl QueryValue {
    fn describe(&self) -> String {
        match self {
            QueryValue::Text(text) => format!("'{}'", text),
            QueryValue::Integer(number) => number.to_string(),
            QueryValue::DateTime(t) => t.to_string(),
            QueryValue::Null => "NULL".to_owned()
        }
    }
}

/// 具名參數，對應 query 中的 `%(name)s`。
pub type QueryParameters = BTreeMap<&'static str, QueryValue>;

/// 由連線實作：執行參數化 query，依欄位順序回傳每一列。
pub trait QueryExecutor {
    fn execute(&self, sql: &str, parameters: &QueryParameters) -> Result<Vec<Vec<QueryValue>>, QclError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// QclRecord
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QclRecord {
    patient_id: String,
    last_name: String,
    first_name: String,
    due: Option<NaiveDateTime>,
    actual_completed_time: NaiveDateTime,
    task: String
}

fn text_column(column: &'static str, value: &QueryValue) -> Result<String, QclError> {
    match value {
        QueryValue::Text(text) => Ok(text.trim().to_owned()),
        QueryValue::Integer(number) => Ok(number.to_string()),
        QueryValue::Null => Ok(String::new()),
        other => Err(QclError::UnexpectedColumn { column, found: other.describe() })
    }
}

fn datetime_column(column: &'static str, value: &QueryValue) -> Result<Option<NaiveDateTime>, QclError> {
    match value {
        QueryValue::DateTime(t) => Ok(Some(*t)),
        QueryValue::Null => Ok(None),
        other => Err(QclError::UnexpectedColumn { column, found: other.describe() })
    }
}

impl QclRecord {
    pub const COLUMNS: [&'static str; 6] = [
        "patient_id",
        "last_name",
        "first_name",
        "due",
        "actual_completed_time",
        "task"
    ];

    pub fn from_row(row: &[QueryValue]) -> Result<QclRecord, QclError> {
        let [patient_id, last_name, first_name, due, actual, task] = row else {
            return Err(QclError::UnexpectedRow { expected: QclRecord::COLUMNS.len(), found: row.len() });
        };
        let actual_completed_time = datetime_column("actual_completed_time", actual)?
            .ok_or_else(|| QclError::UnexpectedColumn {
                column: "actual_completed_time",
                found: QueryValue::Null.describe()
            })?;
        Ok(QclRecord {
            patient_id: text_column("patient_id", patient_id)?,
            last_name: text_column("last_name", last_name)?,
            first_name: text_column("first_name", first_name)?,
            due: datetime_column("due", due)?,
            actual_completed_time,
            task: text_column("task", task)?
        })
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn due(&self) -> Option<NaiveDateTime> {
        self.due
    }

    pub fn actual_completed_time(&self) -> NaiveDateTime {
        self.actual_completed_time
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// 依 `COLUMNS` 順序輸出的表格列，日期以 `%Y-%m-%d` 表示。
    pub fn to_table_row(&self) -> [String; 6] {
        [
            self.patient_id.clone(),
            self.last_name.clone(),
            self.first_name.clone(),
            self.due.map(|t| t.format(DATE_FORMAT).to_string()).unwrap_or_default(),
            self.actual_completed_time.format(DATE_FORMAT).to_string(),
            self.task.clone()
        ]
    }
}

pub fn qcl_query_parameters(location: &str, range: &QclDateRange) -> QueryParameters {
    QueryParameters::from([
        ("location", QueryValue::Text(location.to_owned())),
        ("start", QueryValue::DateTime(range.start_datetime())),
        ("end", QueryValue::DateTime(range.end_datetime()))
    ])
}

/// 取回 location 在區間內完成的 QCL，依完成時間由新到舊排列。
pub fn get_qcls_by_date<E: QueryExecutor + ?Sized>(connection: &E,
                                                    location: &str,
                                                    range: &QclDateRange) -> Result<Vec<QclRecord>, QclError> {
    let parameters = qcl_query_parameters(location, range);
    let rows = connection.execute(QCL_BY_DATE_QUERY, &parameters)?;
    let mut records = rows
        .iter()
        .map(|row| QclRecord::from_row(row))
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by(|a, b| b.actual_completed_time.cmp(&a.actual_completed_time));
    Ok(records)
}

// ─────────────────────────────────────────────────────────────────────────────
// 自然排序：數字片段以數值比較（"task 2" < "task 10"）
// ─────────────────────────────────────────────────────────────────────────────

fn split_chunks(s: &str) -> Vec<(bool, &str)> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        if in_digits.is_some_and(|d| d != is_digit) {
            chunks.push((!is_digit, &s[start..i]));
            start = i;
        }
        in_digits = Some(is_digit);
    }
    if let Some(is_digit) = in_digits {
        chunks.push((is_digit, &s[start..]));
    }
    chunks
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed.len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_chunks = split_chunks(a);
    let b_chunks = split_chunks(b);
    for (&(a_digit, a_chunk), &(b_digit, b_chunk)) in a_chunks.iter().zip(b_chunks.iter()) {
        let ordering = match (a_digit, b_digit) {
            (true, true) => compare_digits(a_chunk, b_chunk),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a_chunk.cmp(b_chunk)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a_chunks.len().cmp(&b_chunks.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// QclReport
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SiteQclResults {
    site: SiteConfig,
    records: Vec<QclRecord>
}

impl SiteQclResults {
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn records(&self) -> &[QclRecord] {
        &self.records
    }
}

/// 多個站點的 QCL 查詢結果，保留站點順序。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QclReport {
    per_site: Vec<SiteQclResults>
}

impl QclReport {
    pub fn collect<P>(sites: &[SiteConfig],
                      provider: &P,
                      range: &QclDateRange) -> Result<QclReport, QclError>
        where P: ConnectionProvider,
              P::Connection: QueryExecutor {
        let mut per_site = Vec::with_capacity(sites.len());
        for site in sites {
            let connection = provider.connect(&ConnectionParams::from_site(site))?;
            let records = get_qcls_by_date(connection.as_ref(), site.mosaiq().physics_qcl_location(), range)?;
            log::info!("{}: {} completed QCLs", site.mosaiq().alias(), records.len());
            per_site.push(SiteQclResults { site: site.clone(), records });
        }
        Ok(QclReport { per_site })
    }

    pub fn per_site(&self) -> &[SiteQclResults] {
        &self.per_site
    }

    pub fn all_records(&self) -> impl Iterator<Item = &QclRecord> {
        self.per_site.iter().flat_map(|results| results.records.iter())
    }

    /// 各 task 的完成數量，task 名稱依自然排序。
    pub fn task_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in self.all_records() {
            *counts.entry(record.task()).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(task, count)| (task.to_owned(), count))
            .collect();
        counts.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        counts
    }

    pub fn counts_markdown(&self) -> String {
        let mut markdown = "# Counts\n\n".to_owned();
        for (task, count) in self.task_counts() {
            let _ = writeln!(markdown, "* {}: `{}`", task, count);
        }
        markdown
    }
}
