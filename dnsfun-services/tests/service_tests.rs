//! Query behavior of the reference services.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use chrono::Utc;
use dnsfun_core::{Service, ServiceError, ServiceRequest};
use dnsfun_services::dice::Dice;
use dnsfun_services::dict::{Dict, DictOptions};
use dnsfun_services::fx::{Fx, FxOptions, Rates};
use dnsfun_services::ip::EchoIp;
use dnsfun_services::pi::{Pi, DIGITS, PI_V4, PI_V6};
use dnsfun_services::random::Random;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use rstest::rstest;
use tempfile::TempDir;

fn request(name: &str, subject: &str, record_type: RecordType) -> ServiceRequest {
    request_from(name, subject, record_type, "127.0.0.1:40000".parse().unwrap())
}

fn request_from(
    name: &str,
    subject: &str,
    record_type: RecordType,
    client: SocketAddr,
) -> ServiceRequest {
    ServiceRequest {
        name: Name::from_ascii(name).unwrap(),
        subject: subject.to_string(),
        record_type,
        client,
    }
}

fn text(record: &Record) -> String {
    match record.data() {
        Some(RData::TXT(txt)) => txt
            .txt_data()
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect(),
        other => panic!("expected TXT, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// dice / rand
// ---------------------------------------------------------------------------

#[test]
fn single_die_stays_in_range() {
    for _ in 0..200 {
        let records = Dice::new().query(&request("1d6.dice.", "1d6", RecordType::TXT)).unwrap();
        let value: u32 = text(&records[0]).parse().unwrap();
        assert!((1..=6).contains(&value));
    }
}

#[test]
fn many_dice_report_rolls_and_total() {
    let records = Dice::new().query(&request("3d4.dice.", "3d4", RecordType::TXT)).unwrap();
    let line = text(&records[0]);
    let (rolls, total) = line.split_once(" = ").unwrap();
    let rolls: Vec<u32> = rolls.split(" + ").map(|r| r.parse().unwrap()).collect();
    assert_eq!(rolls.len(), 3);
    assert_eq!(rolls.iter().sum::<u32>(), total.parse::<u32>().unwrap());
}

#[test]
fn malformed_dice_is_invalid_query() {
    let err = Dice::new().query(&request("xdy.dice.", "xdy", RecordType::TXT)).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidQuery(_)));
}

#[test]
fn random_stays_in_range() {
    for _ in 0..200 {
        let records = Random::new()
            .query(&request("10-20.rand.", "10-20", RecordType::TXT))
            .unwrap();
        let value: u64 = text(&records[0]).parse().unwrap();
        assert!((10..=20).contains(&value));
    }
}

// ---------------------------------------------------------------------------
// pi / ip
// ---------------------------------------------------------------------------

#[rstest]
#[case(RecordType::A)]
#[case(RecordType::AAAA)]
#[case(RecordType::TXT)]
fn pi_answers_by_record_type(#[case] record_type: RecordType) {
    let records = Pi::new().query(&request("pi.", "", record_type)).unwrap();
    match (record_type, records[0].data()) {
        (RecordType::A, Some(RData::A(a))) => assert_eq!(a.0, PI_V4),
        (RecordType::AAAA, Some(RData::AAAA(aaaa))) => assert_eq!(aaaa.0, PI_V6),
        (RecordType::TXT, _) => assert_eq!(text(&records[0]), DIGITS),
        (_, other) => panic!("unexpected rdata {other:?}"),
    }
}

#[test]
fn ip_echoes_client_as_txt_and_a() {
    let client: SocketAddr = "192.0.2.7:5353".parse().unwrap();
    let txt = EchoIp::new()
        .query(&request_from("ip.", "", RecordType::TXT, client))
        .unwrap();
    assert_eq!(text(&txt[0]), "192.0.2.7");

    let a = EchoIp::new()
        .query(&request_from("ip.", "", RecordType::A, client))
        .unwrap();
    assert!(matches!(a[0].data(), Some(RData::A(a)) if a.0 == Ipv4Addr::new(192, 0, 2, 7)));
}

#[test]
fn ip_falls_back_to_txt_on_family_mismatch() {
    let client = SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 5353);
    let records = EchoIp::new()
        .query(&request_from("ip.", "", RecordType::A, client))
        .unwrap();
    assert_eq!(text(&records[0]), "::1");
}

// ---------------------------------------------------------------------------
// fx
// ---------------------------------------------------------------------------

fn rates_snapshot() -> Vec<u8> {
    let rates = Rates {
        base: "USD".to_string(),
        rates: BTreeMap::from([("USD".to_string(), 1.0), ("INR".to_string(), 80.0)]),
        fetched_at: Utc::now(),
    };
    serde_json::to_vec(&rates).unwrap()
}

#[test]
fn fx_without_rates_is_unavailable() {
    let fx = Fx::new(FxOptions::default());
    let err = fx.query(&request("1usd-inr.fx.", "1usd-inr", RecordType::TXT)).unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
}

#[test]
fn fx_converts_loaded_rates() {
    let fx = Fx::new(FxOptions::default());
    fx.load(&rates_snapshot()).unwrap();
    let records = fx.query(&request("99usd-inr.fx.", "99usd-inr", RecordType::TXT)).unwrap();
    assert_eq!(text(&records[0]), "99.00 USD = 7920.00 INR");
}

#[test]
fn fx_unknown_currency_is_invalid_query() {
    let fx = Fx::new(FxOptions::default());
    fx.load(&rates_snapshot()).unwrap();
    let err = fx.query(&request("1usd-xyz.fx.", "1usd-xyz", RecordType::TXT)).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidQuery(_)));
}

#[test]
fn fx_dump_then_load_preserves_answers() {
    let original = Fx::new(FxOptions::default());
    original.load(&rates_snapshot()).unwrap();
    let bytes = original.dump().unwrap().expect("state to persist");

    let restored = Fx::new(FxOptions::default());
    restored.load(&bytes).unwrap();

    let q = request("12.5inr-usd.fx.", "12.5inr-usd", RecordType::TXT);
    assert_eq!(
        text(&original.query(&q).unwrap()[0]),
        text(&restored.query(&q).unwrap()[0])
    );
    assert_eq!(original.rates(), restored.rates());
}

#[test]
fn fx_restored_fresh_rates_skip_refresh() {
    // The url is unreachable; a fetch attempt would fail.
    let fx = Fx::new(FxOptions {
        refresh_interval_secs: 3600,
        rates_url: "http://127.0.0.1:9/unreachable".to_string(),
    });
    fx.load(&rates_snapshot()).unwrap();
    fx.refresh().expect("fresh rates need no fetch");
}

#[test]
fn fx_refresh_failure_is_unavailable() {
    let fx = Fx::new(FxOptions {
        refresh_interval_secs: 3600,
        rates_url: "http://127.0.0.1:9/unreachable".to_string(),
    });
    assert!(matches!(fx.refresh(), Err(ServiceError::Unavailable(_))));
}

// ---------------------------------------------------------------------------
// dict
// ---------------------------------------------------------------------------

const DEFINITIONS: &str = "\
# word\tpos\tdefinition
fun\tnoun\tplayful amusement
fun\tadjective\tproviding enjoyment
fun\tverb\tto joke
dig\tverb\tto break up earth
";

fn dict(max_results: usize) -> (TempDir, Dict) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("words.tsv");
    std::fs::write(&path, DEFINITIONS).unwrap();
    let dict = Dict::open(&DictOptions {
        definitions_path: path,
        max_results,
    })
    .unwrap();
    (tmp, dict)
}

#[test]
fn dict_answers_one_record_per_sense() {
    let (_tmp, dict) = dict(5);
    let records = dict.query(&request("fun.dict.", "fun", RecordType::TXT)).unwrap();
    let texts: Vec<_> = records.iter().map(text).collect();
    assert_eq!(
        texts,
        vec![
            "fun (noun): playful amusement",
            "fun (adjective): providing enjoyment",
            "fun (verb): to joke",
        ]
    );
    assert!(records
        .iter()
        .all(|r| r.name() == &Name::from_ascii("fun.dict.").unwrap()));
}

#[test]
fn dict_caps_answers_at_max_results() {
    let (_tmp, dict) = dict(2);
    let records = dict.query(&request("fun.dict.", "fun", RecordType::TXT)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(text(&records[0]), "fun (noun): playful amusement");
}

#[rstest]
#[case::empty_subject("dict.", "")]
#[case::unknown_word("zzz.dict.", "zzz")]
fn dict_rejects_missing_words(#[case] name: &str, #[case] subject: &str) {
    let (_tmp, dict) = dict(5);
    let err = dict.query(&request(name, subject, RecordType::TXT)).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidQuery(_)), "{err:?}");
}
