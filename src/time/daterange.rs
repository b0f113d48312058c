use chrono::{
    Datelike,
    Months,
    NaiveDate,
    NaiveDateTime,
    NaiveTime
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("end date {end} is before start date {start}")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate
}

pub fn start_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// 加上 `months` 個月；超出月底時取該月最後一天（1/31 + 1 個月 = 2/28 或 2/29）。
pub fn add_months(d: NaiveDate, months: u32) -> NaiveDate {
    d.checked_add_months(Months::new(months)).unwrap_or(NaiveDate::MAX)
}

/// 上個月的第一天。
pub fn start_of_last_month(d: NaiveDate) -> NaiveDate {
    let definitely_in_last_month = start_of_month(d).pred_opt().unwrap_or(d);
    start_of_month(definitely_in_last_month)
}

/// QCL 完成時間的篩選區間，半開區間 `[start, end)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QclDateRange {
    start: NaiveDate,
    end: NaiveDate
}

impl QclDateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<QclDateRange, InvalidDateRange> {
        if end < start {
            Err(InvalidDateRange { start, end })
        } else {
            Ok(QclDateRange { start, end })
        }
    }

    /// 預設區間：上個月第一天起算 `months` 個月。
    pub fn default_for(today: NaiveDate, months: u32) -> QclDateRange {
        let start = start_of_last_month(today);
        QclDateRange { start, end: add_months(start, months) }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn end_datetime(&self) -> NaiveDateTime {
        self.end.and_time(NaiveTime::MIN)
    }
}
