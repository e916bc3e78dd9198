use relayrace_core::Error;
use relayrace_gateway::parse::{
    parse_balance, parse_block_response, parse_search_result, parse_tx_response,
};

const ACCEPTED_TX: &str = r#"{
    "height": "1042",
    "txhash": "0D9CC1249EF0E4B7D91F2C8F2BFE6E0A2C6F9B1B3D4E5F60718293A4B5C6D7E8",
    "code": 0,
    "raw_log": "[]",
    "logs": [
        {
            "events": [
                {
                    "type": "send_packet",
                    "attributes": [
                        {"key": "packet_src_port", "value": "transfer"},
                        {"key": "packet_src_channel", "value": "channel-0"},
                        {"key": "packet_sequence", "value": "12"}
                    ]
                }
            ]
        }
    ],
    "timestamp": "2024-05-11T09:30:00Z"
}"#;

#[test]
fn accepted_tx_is_parsed_with_events_and_height() {
    let record = parse_tx_response(ACCEPTED_TX).unwrap();
    assert_eq!(record.code, 0);
    assert!(record.accepted());
    assert_eq!(record.height, Some(1042));
    assert_eq!(record.events.len(), 1);
    assert_eq!(record.events[0].kind, "send_packet");
    assert_eq!(record.events[0].attr("packet_sequence"), Some("12"));
    assert!(record.timestamp.is_some());
}

#[test]
fn pending_tx_has_no_height() {
    // logo após o broadcast o node reporta altura "0"
    let json = r#"{"height": "0", "txhash": "ABCD", "code": 0, "raw_log": ""}"#;
    let record = parse_tx_response(json).unwrap();
    assert_eq!(record.height, None);
    assert!(record.events.is_empty());
    assert_eq!(record.timestamp, None);
}

#[test]
fn rejected_tx_keeps_code_and_raw_log() {
    let json = r#"{"height": "88", "txhash": "ABCD", "code": 13, "raw_log": "insufficient fees"}"#;
    let record = parse_tx_response(json).unwrap();
    assert!(!record.accepted());
    assert_eq!(record.code, 13);
    assert_eq!(record.raw_log, "insufficient fees");
}

#[test]
fn empty_txhash_is_not_found() {
    let json = r#"{"height": "", "txhash": "", "code": 0}"#;
    assert!(matches!(parse_tx_response(json), Err(Error::NotFound(_))));
}

#[test]
fn top_level_events_land_in_extra_events() {
    // versões mais novas do node expõem os eventos fora de logs
    let json = r#"{
        "height": "55",
        "txhash": "ABCD",
        "code": 0,
        "logs": [],
        "events": [
            {"type": "recv_packet", "attributes": [{"key": "packet_sequence", "value": "3"}]}
        ]
    }"#;
    let record = parse_tx_response(json).unwrap();
    assert!(record.events.is_empty());
    assert_eq!(record.extra_events.len(), 1);
    assert_eq!(record.extra_events[0].attr("packet_sequence"), Some("3"));
}

#[test]
fn garbage_json_is_a_decode_error() {
    assert!(matches!(
        parse_tx_response("mensagem de erro em texto livre"),
        Err(Error::DecodeError(_))
    ));
}

#[test]
fn search_result_preserves_order() {
    let json = r#"{"txs": [
        {"height": "10", "txhash": "AAAA", "code": 0},
        {"height": "11", "txhash": "BBBB", "code": 0}
    ]}"#;
    let records = parse_search_result(json).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].hash, "AAAA");
    assert_eq!(records[1].hash, "BBBB");
}

#[test]
fn empty_search_result_is_empty_vec() {
    assert!(parse_search_result(r#"{"txs": []}"#).unwrap().is_empty());
    assert!(parse_search_result("{}").unwrap().is_empty());
}

#[test]
fn block_txs_are_base64_decoded_in_order() {
    // "dHgtdW0=" = "tx-um", "dHgtZG9pcw==" = "tx-dois"
    let json = r#"{
        "block": {
            "header": {"height": "777"},
            "data": {"txs": ["dHgtdW0=", "dHgtZG9pcw=="]}
        }
    }"#;
    let block = parse_block_response(json).unwrap();
    assert_eq!(block.height, 777);
    assert_eq!(block.txs.len(), 2);
    assert_eq!(block.txs[0], b"tx-um");
    assert_eq!(block.txs[1], b"tx-dois");
}

#[test]
fn empty_block_is_valid() {
    let json = r#"{"block": {"header": {"height": "3"}, "data": {"txs": []}}}"#;
    let block = parse_block_response(json).unwrap();
    assert_eq!(block.height, 3);
    assert!(block.txs.is_empty());
}

#[test]
fn invalid_base64_in_block_is_a_decode_error() {
    let json = r#"{"block": {"header": {"height": "3"}, "data": {"txs": ["%%%"]}}}"#;
    assert!(matches!(
        parse_block_response(json),
        Err(Error::DecodeError(_))
    ));
}

#[test]
fn balance_of_present_denom() {
    let json = r#"{"balances": [
        {"denom": "stake", "amount": "250000"},
        {"denom": "token", "amount": "999"}
    ]}"#;
    assert_eq!(parse_balance(json, "token").unwrap(), 999);
    assert_eq!(parse_balance(json, "stake").unwrap(), 250_000);
}

#[test]
fn absent_denom_is_zero_not_error() {
    let json = r#"{"balances": [{"denom": "stake", "amount": "5"}]}"#;
    assert_eq!(parse_balance(json, "token").unwrap(), 0);
    assert_eq!(parse_balance(r#"{"balances": []}"#, "token").unwrap(), 0);
    assert_eq!(parse_balance("{}", "token").unwrap(), 0);
    assert_eq!(parse_balance("", "token").unwrap(), 0);
}

#[test]
fn empty_amount_is_zero() {
    let json = r#"{"balances": [{"denom": "token", "amount": ""}]}"#;
    assert_eq!(parse_balance(json, "token").unwrap(), 0);
}

#[test]
fn non_numeric_amount_is_a_decode_error() {
    let json = r#"{"balances": [{"denom": "token", "amount": "muito"}]}"#;
    assert!(matches!(
        parse_balance(json, "token"),
        Err(Error::DecodeError(_))
    ));
}
