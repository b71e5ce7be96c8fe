//! Validates contract fixtures and client-built bodies against frozen schemas.

use serde_json::{Map, Value, json};
use spimf_api_contract::{ResponseVerdict, evaluate_response};
use spimf_contract_tests::{compile_validator, load_json, validation_errors};
use spimf_transport::{ApiAction, request_body};

fn assert_valid(schema: &str, instance: &Value) {
    let validator = compile_validator(schema).expect("schema should compile");
    let errors = validation_errors(&validator, instance);
    assert!(errors.is_empty(), "{schema} rejected {instance}: {errors:?}");
}

#[test]
fn contract_validation_tests_request_fixtures_match_schema() {
    for fixture in ["fixtures/login-request.valid.json", "fixtures/update-request.valid.json"] {
        let instance = load_json(fixture).expect("fixture should load");
        assert_valid("api-request.schema.json", &instance);
    }
}

#[test]
fn contract_validation_tests_response_fixtures_match_schema() {
    for fixture in [
        "fixtures/login-response.valid.json",
        "fixtures/login-response.banned.json",
        "fixtures/probe-response.valid.json",
    ] {
        let instance = load_json(fixture).expect("fixture should load");
        assert_valid("api-response.schema.json", &instance);
    }
}

#[test]
fn contract_validation_tests_client_bodies_match_request_schema() {
    let mut login = Map::new();
    login.insert("phoneNumber".to_string(), json!("0123456789"));
    login.insert("idCard".to_string(), json!("900101-14-5678"));
    login.insert("kodeUser".to_string(), json!("SP-0042"));
    assert_valid("api-request.schema.json", &request_body(ApiAction::Login, &login));

    let mut update = Map::new();
    update.insert("row".to_string(), json!(7));
    update.insert("updates".to_string(), json!({"YOUR NAME": "Aina R."}));
    assert_valid(
        "api-request.schema.json",
        &request_body(ApiAction::UpdateProfile, &update),
    );

    let mut logs = Map::new();
    logs.insert("row".to_string(), json!(7));
    assert_valid("api-request.schema.json", &request_body(ApiAction::GetLogs, &logs));
}

#[test]
fn contract_validation_tests_schema_rejects_login_without_member_code() {
    let validator = compile_validator("api-request.schema.json").expect("schema should compile");
    let body = json!({"action": "login", "phoneNumber": "0123456789", "idCard": "900101"});
    assert!(!validator.is_valid(&body));
}

#[test]
fn contract_validation_tests_client_accepts_valid_fixtures() {
    let login = load_json("fixtures/login-response.valid.json").expect("fixture should load");
    assert!(matches!(
        evaluate_response(ApiAction::Login, login),
        Ok(ResponseVerdict::Accepted(_))
    ));

    let probe = load_json("fixtures/probe-response.valid.json").expect("fixture should load");
    assert!(matches!(
        evaluate_response(ApiAction::Probe, probe),
        Ok(ResponseVerdict::Accepted(_))
    ));

    let banned = load_json("fixtures/login-response.banned.json").expect("fixture should load");
    assert_eq!(
        evaluate_response(ApiAction::Login, banned).expect("verdict"),
        ResponseVerdict::Rejected {
            message: "Banned 7 days".to_string(),
            banned: true,
        }
    );
}
