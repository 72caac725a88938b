use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::config::Settings;
use crate::ec2::Ec2Api;
use crate::pipeline;

/// Invocation result in the shape the hosting platform expects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

/// Invocation entry point. The event and context are opaque to this agent;
/// a successful run always answers with the fixed payload, and any pipeline
/// error propagates to the caller's error path.
pub async fn handle(api: &dyn Ec2Api, settings: &Settings, _event: Value) -> Result<Response> {
    pipeline::run(api, settings).await?;
    Ok(Response {
        status_code: 200,
        body: "Looks good!".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEc2;
    use crate::types::{InstanceRecord, TagPair};

    #[tokio::test]
    async fn propagates_only_allow_listed_tags_end_to_end() {
        let api = MockEc2::new()
            .with_page(vec![(
                "i-1".to_string(),
                InstanceRecord::new(vec!["vol-1".to_string()], vec!["eni-1".to_string()]),
            )])
            .with_tag("i-1", "env", "prod")
            .with_tag("i-1", "owner", "alice");

        let settings = Settings::for_tests(&["env"]);
        let response = handle(&api, &settings, Value::Null).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "Looks good!");

        let calls = api.created();
        assert_eq!(calls.len(), 1);
        let (resources, tags) = &calls[0];
        assert_eq!(resources, &vec!["vol-1".to_string(), "eni-1".to_string()]);
        assert_eq!(tags, &vec![TagPair::new("env", "prod")]);
    }

    #[tokio::test]
    async fn fetch_failure_prevents_any_tag_write() {
        let api = MockEc2::new()
            .with_page(vec![(
                "i-1".to_string(),
                InstanceRecord::new(vec!["vol-1".to_string()], vec!["eni-1".to_string()]),
            )])
            .failing_tag_lookups();

        let settings = Settings::for_tests(&["env"]);
        assert!(handle(&api, &settings, Value::Null).await.is_err());
        assert!(api.created().is_empty(), "merge/apply must never run after a failed fetch");
    }

    #[tokio::test]
    async fn empty_fleet_still_answers_success() {
        let api = MockEc2::new();
        let settings = Settings::for_tests(&["env"]);
        let response = handle(&api, &settings, Value::Null).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert!(api.created().is_empty());
    }

    #[test]
    fn response_serializes_in_platform_shape() {
        let response = Response {
            status_code: 200,
            body: "Looks good!".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"statusCode": 200, "body": "Looks good!"})
        );
    }
}
