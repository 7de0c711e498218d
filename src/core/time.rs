use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Accepts RFC 3339 (offset converted to UTC) or a naive `YYYY-MM-DDTHH:MM[:SS]`
/// as sent by `datetime-local` inputs, which is taken as UTC.
pub(crate) fn parse_datetime(value: &str) -> Option<PrimitiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        let utc = parsed.to_offset(time::UtcOffset::UTC);
        return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
    }

    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    PrimitiveDateTime::parse(value, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(value, without_seconds))
        .ok()
}

pub(crate) fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Month, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        assert_eq!(format_primitive(PrimitiveDateTime::new(date, time)), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_datetime_accepts_offsets_and_naive_input() {
        let shifted = parse_datetime("2025-03-01T13:00:00+03:00").expect("rfc3339");
        assert_eq!(format_primitive(shifted), "2025-03-01T10:00:00Z");

        let naive = parse_datetime("2025-03-01T23:59").expect("datetime-local");
        assert_eq!(format_primitive(naive), "2025-03-01T23:59:00Z");

        assert!(parse_datetime("tomorrow").is_none());
    }

    #[test]
    fn dates_round_trip_through_iso_form() {
        let date = parse_date("2024-07-01").expect("date");
        assert_eq!(date, Date::from_calendar_date(2024, Month::July, 1).unwrap());
        assert_eq!(format_date(date), "2024-07-01");
        assert!(parse_date("01/07/2024").is_none());
    }
}
