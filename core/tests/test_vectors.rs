//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use quoter_core::{
    DisplayType, HttpMethod, HttpResponse, NewQuote, QuoterClient, QuoterConfig, QuoterError, SearchQuery,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> QuoterClient {
    QuoterClient::new(&QuoterConfig::new(BASE_URL).with_access_key("secret"))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let repo = input["repo"].as_str();

        let req = match case["operation"].as_str().unwrap() {
            "add" => {
                let mut quote = NewQuote::new(
                    input["adder"].as_str().unwrap(),
                    strings(&input["authors"]),
                    input["content"].as_str().unwrap(),
                );
                if input["dtype"] == "dialog" {
                    quote = quote.display_type(DisplayType::Dialog);
                }
                if !input["attachments"].is_null() {
                    quote = quote.attachments(strings(&input["attachments"]));
                }
                c.build_add(&quote, repo)
            }
            "by_id" => c.build_by_id(input["id"].as_i64().unwrap(), repo),
            "by_range" => c.build_by_range(
                input["from"].as_i64().unwrap(),
                input["to"].as_i64().unwrap(),
                repo,
            ),
            "search" => {
                let query = SearchQuery {
                    adder: input["adder"].as_str().map(str::to_string),
                    authors: (!input["authors"].is_null()).then(|| strings(&input["authors"])),
                    content: input["content"].as_str().map(str::to_string),
                };
                c.build_search(&query, repo)
            }
            "edit" => c.build_edit(
                input["id"].as_i64().unwrap(),
                input["edited_by"].as_str().unwrap(),
                input["new_content"].as_str().unwrap(),
                repo,
            ),
            "delete_attachment" => c.build_delete_attachment(input["id"].as_str().unwrap()),
            other => panic!("{name}: unknown operation {other}"),
        }
        .unwrap();

        let expected = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.query, pairs(&expected["query"]), "{name}: query");
        assert_eq!(req.headers, pairs(&expected["headers"]), "{name}: headers");

        if expected["body"].is_null() {
            assert!(req.body.is_none(), "{name}: body should be None");
        } else {
            let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, expected["body"], "{name}: body");
        }
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

fn assert_error_kind(name: &str, err: QuoterError, expected: &Value) {
    match expected["kind"].as_str().unwrap() {
        "remote_call" => {
            let want = expected["status"].as_u64().unwrap() as u16;
            assert!(
                matches!(err, QuoterError::RemoteCall { status, .. } if status == want),
                "{name}: expected RemoteCall {want}, got {err:?}"
            );
        }
        "malformed_response" => {
            assert!(
                matches!(err, QuoterError::MalformedResponse(_)),
                "{name}: expected MalformedResponse, got {err:?}"
            );
        }
        other => panic!("{name}: unknown error kind {other}"),
    }
}

#[test]
fn parse_test_vectors() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: pairs(&sim["headers"]),
            body: sim["body"].as_str().unwrap().as_bytes().to_vec(),
        };
        let expected = &case["expected_result"];
        let expected_error = &case["expected_error"];

        match case["operation"].as_str().unwrap() {
            "by_id" => match c.parse_by_id(response) {
                Ok(quote) => {
                    let ids: Vec<i64> = quote.map(|q| q.id).into_iter().collect();
                    assert_eq!(Value::from(ids), expected["ids"], "{name}: ids");
                }
                Err(err) => assert_error_kind(name, err, expected_error),
            },
            "quotes" => match c.parse_quotes(response) {
                Ok(quotes) => {
                    let ids: Vec<i64> = quotes.iter().map(|q| q.id).collect();
                    assert_eq!(Value::from(ids), expected["ids"], "{name}: ids");
                }
                Err(err) => assert_error_kind(name, err, expected_error),
            },
            "total" => match c.parse_total(response) {
                Ok(total) => assert_eq!(Value::from(total), expected["total"], "{name}: total"),
                Err(err) => assert_error_kind(name, err, expected_error),
            },
            "get_attachment" => match c.parse_get_attachment(response) {
                Ok(attachment) => {
                    let attachment = attachment.unwrap();
                    assert_eq!(attachment.content_type, expected["content_type"].as_str().unwrap(), "{name}");
                    assert_eq!(attachment.data, expected["data"].as_str().unwrap().as_bytes(), "{name}");
                }
                Err(err) => assert_error_kind(name, err, expected_error),
            },
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}
