use std::str::FromStr;

use colloquy_llm::{ChatTurn, GenerateOptions, GenerateRequest, Role};

#[test]
fn test_role_round_trips_through_serde() {
    for (role, text) in [
        (Role::System, "\"system\""),
        (Role::User, "\"user\""),
        (Role::Assistant, "\"assistant\""),
    ] {
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, text);
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, role);
    }
}

#[test]
fn test_role_rejects_unknown_values() {
    assert!(serde_json::from_str::<Role>("\"moderator\"").is_err());
    assert!(Role::from_str("moderator").is_err());
    assert!(Role::from_str("USER").is_err());
}

#[test]
fn test_role_from_str_accepts_closed_set() {
    assert_eq!(Role::from_str("system").unwrap(), Role::System);
    assert_eq!(Role::from_str("user").unwrap(), Role::User);
    assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
}

#[test]
fn test_chat_turn_constructors() {
    assert_eq!(ChatTurn::system("be terse").role, Role::System);
    assert_eq!(ChatTurn::user("hi").role, Role::User);
    assert_eq!(ChatTurn::assistant("hello").role, Role::Assistant);
}

#[test]
fn test_chat_turn_serialization() {
    let turn = ChatTurn::user("How are markets?");
    let json = serde_json::to_string(&turn).unwrap();
    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("How are markets?"));
}

#[test]
fn test_generate_request_defaults() {
    let request = GenerateRequest::new("gpt-4", vec![ChatTurn::user("hi")]);
    assert_eq!(request.options.max_tokens, 1000);
    assert_eq!(request.options.temperature, 0.7);
}

#[test]
fn test_generate_options_builder() {
    let options = GenerateOptions::new().max_tokens(256).temperature(0.2);
    let request = GenerateRequest::new("gpt-4", vec![]).with_options(options);
    assert_eq!(request.options.max_tokens, 256);
    assert_eq!(request.options.temperature, 0.2);
}
