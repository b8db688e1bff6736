//! End-to-end encoding and round-trip scenarios

use anyhow::Result;
use chrono::{DateTime, FixedOffset, TimeZone};
use csvplus::{
    field, hook_field, BoxError, CsvConfig, CsvEncoder, CsvMapper, CsvMarshal, CsvRecord,
    CsvUnmarshal, FieldDef, FieldRegistry, RecordTerminator,
};
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq)]
struct Pair {
    first: String,
    second: i64,
}

impl CsvRecord for Pair {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![field!("First", Pair, first), field!("Second", Pair, second)]
    }
}

#[test]
fn test_marshal_writes_header_and_rows() -> Result<()> {
    let out = csvplus::marshal(&[Pair {
        first: "a".to_string(),
        second: 1,
    }])?;
    assert_eq!(String::from_utf8(out)?, "First,Second\na,1\n");
    Ok(())
}

#[test]
fn test_marshal_empty_collection_writes_header() -> Result<()> {
    let out = csvplus::marshal::<Pair>(&[])?;
    assert_eq!(String::from_utf8(out)?, "First,Second\n");
    Ok(())
}

#[test]
fn test_marshal_without_header() -> Result<()> {
    let out = csvplus::marshal_without_header(&[
        Pair {
            first: "a".to_string(),
            second: 1,
        },
        Pair {
            first: "b".to_string(),
            second: 2,
        },
    ])?;
    assert_eq!(String::from_utf8(out)?, "a,1\nb,2\n");
    Ok(())
}

#[test]
fn test_marshal_writer() -> Result<()> {
    let mut out = Vec::new();
    csvplus::marshal_writer(
        &[Pair {
            first: "quote \"me\"".to_string(),
            second: -2,
        }],
        &mut out,
    )?;
    assert_eq!(String::from_utf8(out)?, "First,Second\n\"quote \"\"me\"\"\",-2\n");
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Mixed {
    name: String,
    small: i8,
    large: u64,
    ratio: f64,
    narrow: f32,
    flag: bool,
    note: Option<String>,
}

impl CsvRecord for Mixed {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            field!(Mixed, name),
            field!(Mixed, small),
            field!(Mixed, large),
            field!(Mixed, ratio),
            field!(Mixed, narrow),
            field!(Mixed, flag),
            field!(Mixed, note),
        ]
    }
}

#[test]
fn test_round_trip_scalars() -> Result<()> {
    let records = vec![
        Mixed {
            name: "alpha".to_string(),
            small: -128,
            large: u64::MAX,
            ratio: 0.1,
            narrow: 1.5,
            flag: true,
            note: Some("with, comma".to_string()),
        },
        Mixed {
            name: "beta".to_string(),
            small: 127,
            large: 0,
            ratio: -2.25,
            narrow: 0.3,
            flag: false,
            note: None,
        },
    ];

    let out = csvplus::marshal(&records)?;
    let text = String::from_utf8(out.clone())?;
    assert!(text.starts_with("name,small,large,ratio,narrow,flag,note\n"));
    assert!(text.contains("alpha,-128,18446744073709551615,0.1,1.5,true,\"with, comma\"\n"));
    assert!(text.contains("beta,127,0,-2.25,0.3,false,\n"));

    let decoded: Vec<Mixed> = csvplus::unmarshal(&out)?;
    assert_eq!(decoded, records);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct YesNo(bool);

impl CsvUnmarshal for YesNo {
    fn unmarshal_csv(text: &str) -> Result<Self, BoxError> {
        match text {
            "yes" => Ok(YesNo(true)),
            "no" => Ok(YesNo(false)),
            other => Err(format!("unable to convert {other} to bool").into()),
        }
    }
}

impl CsvMarshal for YesNo {
    fn marshal_csv(&self) -> Result<Vec<u8>, BoxError> {
        Ok(if self.0 { b"yes".to_vec() } else { b"no".to_vec() })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Answer {
    question: String,
    answer: YesNo,
    maybe: Option<YesNo>,
}

impl CsvRecord for Answer {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            field!(Answer, question).tag("q"),
            hook_field!(Answer, answer).tag("a"),
            hook_field!(Answer, maybe).tag("m,omitempty"),
        ]
    }
}

#[test]
fn test_hook_round_trip() -> Result<()> {
    let input = "q,a,m\nfirst,yes,\nsecond,no,yes\n";
    let answers: Vec<Answer> = csvplus::unmarshal(input.as_bytes())?;
    assert_eq!(answers[1].maybe, Some(YesNo(true)));

    let out = csvplus::marshal(&answers)?;
    assert_eq!(String::from_utf8(out)?, input);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Event {
    name: String,
    month: DateTime<FixedOffset>,
    at: DateTime<FixedOffset>,
    precise: Option<DateTime<FixedOffset>>,
}

impl CsvRecord for Event {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            field!(Event, name),
            field!(Event, month).layout("%Y-%m"),
            field!(Event, at).layout("time.RFC3339"),
            field!(Event, precise).layout("RFC3339Nano"),
        ]
    }
}

#[test]
fn test_time_round_trip() -> Result<()> {
    let input = "name,month,at,precise\n\
                 launch,2000-01,2021-03-04T05:06:07+01:00,2021-03-04T05:06:07.123456789Z\n\
                 idle,1999-12,2020-01-01T00:00:00Z,\n\
                 late,2019-10,2019-10-12T07:20:50Z,2019-10-12T07:20:50.52+01:00\n";
    let events: Vec<Event> = csvplus::unmarshal(input.as_bytes())?;

    let offset = FixedOffset::east_opt(3600).expect("offset");
    assert_eq!(
        events[0].at,
        offset.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
    );
    assert!(events[1].precise.is_none());

    let out = csvplus::marshal(&events)?;
    assert_eq!(String::from_utf8(out)?, input);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Shift {
    starts: DateTime<FixedOffset>,
    ends: Option<DateTime<FixedOffset>>,
}

impl CsvRecord for Shift {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            field!(Shift, starts).layout("%H:%M"),
            field!(Shift, ends).layout("%H:%M:%S"),
        ]
    }
}

#[test]
fn test_time_only_layout_round_trip() -> Result<()> {
    let input = "starts,ends\n15:04,23:59:58\n08:00,\n";
    let shifts: Vec<Shift> = csvplus::unmarshal(input.as_bytes())?;

    let utc = FixedOffset::east_opt(0).expect("utc offset");
    assert_eq!(
        shifts[0].starts,
        utc.with_ymd_and_hms(0, 1, 1, 15, 4, 0).unwrap()
    );
    assert!(shifts[1].ends.is_none());

    let out = csvplus::marshal(&shifts)?;
    assert_eq!(String::from_utf8(out)?, input);
    Ok(())
}

#[test]
fn test_encoder_with_config() -> Result<()> {
    let config = CsvConfig::new()
        .delimiter('\t')
        .record_terminator(RecordTerminator::CRLF);
    let mut out = Vec::new();
    CsvEncoder::new().with_config(config).encode(
        &mut out,
        &[Pair {
            first: "a b".to_string(),
            second: 3,
        }],
    )?;
    assert_eq!(String::from_utf8(out)?, "First\tSecond\r\na b\t3\r\n");
    Ok(())
}

#[test]
fn test_streaming_session_through_mapper() -> Result<()> {
    let mapper = CsvMapper::new().with_registry(Arc::new(FieldRegistry::new()));
    let mut session = mapper.encoder().writer::<Pair, _>(Vec::new())?;
    for i in 0..3 {
        session.write(&Pair {
            first: format!("r{i}"),
            second: i,
        })?;
    }
    let out = session.finish()?;
    assert_eq!(String::from_utf8(out.clone())?, "First,Second\nr0,0\nr1,1\nr2,2\n");

    let back: Vec<Pair> = mapper.decoder().decode(out.as_slice())?;
    assert_eq!(back.len(), 3);
    assert_eq!(back[2].second, 2);
    Ok(())
}

#[derive(Debug, Default)]
struct BadHook {
    raw: Raw,
}

#[derive(Debug, Default)]
struct Raw;

impl CsvUnmarshal for Raw {
    fn unmarshal_csv(_: &str) -> Result<Self, BoxError> {
        Ok(Raw)
    }
}

impl CsvMarshal for Raw {
    fn marshal_csv(&self) -> Result<Vec<u8>, BoxError> {
        Err("raw values cannot be written".into())
    }
}

impl CsvRecord for BadHook {
    fn fields() -> Vec<FieldDef<Self>> {
        vec![hook_field!(BadHook, raw)]
    }
}

#[test]
fn test_marshal_hook_failure() {
    let err = csvplus::marshal(&[BadHook::default()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot encode column raw: field raw: raw values cannot be written"
    );
}
