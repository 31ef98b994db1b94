//! Per-session response mutator

use std::sync::{Arc, Mutex};

use crate::common::Result;
use crate::scenario::ScenarioParameterSet;
use crate::upstream::{PageRequest, PageResponse, Upstream};

use super::{InterceptionRule, Located, Miss};

/// Why a matching rule left the response alone
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The path did not resolve to a multi-field object
    NotFound(Miss),
    /// The body was not valid JSON
    Unparseable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFound(miss) => write!(f, "{miss}"),
            SkipReason::Unparseable(e) => write!(f, "body is not JSON: {e}"),
        }
    }
}

/// What happened to one intercepted response
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// No rule matched
    PassedThrough,
    /// Scenario values were merged at the rule's path
    Mutated { rule: String },
    /// A rule matched but the real response was forwarded unchanged
    Skipped { rule: String, reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub url: String,
    pub disposition: Disposition,
}

/// Shared record of every response the mutator saw in one session
#[derive(Debug, Clone, Default)]
pub struct MutationLog {
    records: Arc<Mutex<Vec<MutationRecord>>>,
}

impl MutationLog {
    fn record(&self, url: &str, disposition: Disposition) {
        if let Ok(mut records) = self.records.lock() {
            records.push(MutationRecord {
                url: url.to_string(),
                disposition,
            });
        }
    }

    /// Copy of all records so far
    pub fn records(&self) -> Vec<MutationRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn count(&self, pred: impl Fn(&Disposition) -> bool) -> usize {
        self.records
            .lock()
            .map(|r| r.iter().filter(|rec| pred(&rec.disposition)).count())
            .unwrap_or(0)
    }

    pub fn mutated(&self) -> usize {
        self.count(|d| matches!(d, Disposition::Mutated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|d| matches!(d, Disposition::Skipped { .. }))
    }

    pub fn passed_through(&self) -> usize {
        self.count(|d| matches!(d, Disposition::PassedThrough))
    }
}

/// Rewrites matching responses with one scenario's values
///
/// Bound to exactly one session; the first matching rule is the only one
/// evaluated for a request.
#[derive(Debug)]
pub struct Mutator {
    rules: Vec<InterceptionRule>,
    scenario: ScenarioParameterSet,
    log: MutationLog,
}

impl Mutator {
    pub fn new(rules: Vec<InterceptionRule>, scenario: ScenarioParameterSet) -> Self {
        Self {
            rules,
            scenario,
            log: MutationLog::default(),
        }
    }

    pub fn scenario(&self) -> &ScenarioParameterSet {
        &self.scenario
    }

    /// Handle to this mutator's log, valid after the mutator moves into a session
    pub fn log(&self) -> MutationLog {
        self.log.clone()
    }

    /// First rule whose pattern matches `url`
    pub fn rule_for(&self, url: &str) -> Option<&InterceptionRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    /// Serve a page request
    ///
    /// Unmatched requests go straight to the upstream. Matched requests are
    /// fetched for real, then overlaid. Upstream errors propagate; overlay
    /// problems never do.
    pub async fn handle(&self, request: &PageRequest, upstream: &dyn Upstream) -> Result<PageResponse> {
        let Some(rule) = self.rule_for(&request.url) else {
            self.log.record(&request.url, Disposition::PassedThrough);
            return upstream.fetch(request).await;
        };

        let response = upstream.fetch(request).await?;
        let (response, disposition) = self.overlay(rule, response);

        match &disposition {
            Disposition::Mutated { rule } => {
                tracing::debug!(url = %request.url, rule = %rule, scenario = %self.scenario, "response mutated")
            }
            Disposition::Skipped {
                rule,
                reason: SkipReason::Unparseable(e),
            } => {
                tracing::warn!(url = %request.url, rule = %rule, error = %e, "response is not JSON, scenario not applied")
            }
            Disposition::Skipped { rule, reason } => {
                tracing::debug!(url = %request.url, rule = %rule, reason = %reason, "response forwarded unchanged")
            }
            Disposition::PassedThrough => {}
        }

        self.log.record(&request.url, disposition);
        Ok(response)
    }

    /// Apply `rule` to a real response
    ///
    /// Returns the response the page should see. The mutated body is built
    /// in full before it replaces the original.
    pub fn overlay(&self, rule: &InterceptionRule, response: PageResponse) -> (PageResponse, Disposition) {
        let mut document: serde_json::Value = match serde_json::from_slice(&response.body) {
            Ok(document) => document,
            Err(e) => {
                let disposition = Disposition::Skipped {
                    rule: rule.name.clone(),
                    reason: SkipReason::Unparseable(e.to_string()),
                };
                return (response, disposition);
            }
        };

        match rule.path.locate(&mut document) {
            Located::Found(target) => {
                rule.merge.apply(target, &self.scenario);
            }
            Located::NotFound(miss) => {
                let disposition = Disposition::Skipped {
                    rule: rule.name.clone(),
                    reason: SkipReason::NotFound(miss),
                };
                return (response, disposition);
            }
        }

        match serde_json::to_vec(&document) {
            Ok(body) => (
                response.with_body(body),
                Disposition::Mutated {
                    rule: rule.name.clone(),
                },
            ),
            Err(e) => (
                response,
                Disposition::Skipped {
                    rule: rule.name.clone(),
                    reason: SkipReason::Unparseable(e.to_string()),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Fixed(PageResponse);

    #[async_trait]
    impl Upstream for Fixed {
        async fn fetch(&self, _request: &PageRequest) -> Result<PageResponse> {
            Ok(self.0.clone())
        }
    }

    fn flags_rule() -> InterceptionRule {
        InterceptionRule::new("**/api/parameters*", "data[1]").unwrap()
    }

    fn mutator(flag: &str) -> Mutator {
        Mutator::new(
            vec![flags_rule()],
            ScenarioParameterSet::from_pairs([("FLAG", flag)]),
        )
    }

    fn body(response: &PageResponse) -> Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_matching_response_is_mutated() {
        let real = PageResponse::json(&json!({
            "total": 2,
            "data": [{"id": 1}, {"FLAG": "N", "code": "X", "order": 3}]
        }));
        let upstream = Fixed(real);
        let m = mutator("S");

        let response = m
            .handle(&PageRequest::get("http://h/api/parameters?x=1"), &upstream)
            .await
            .unwrap();

        assert_eq!(
            body(&response),
            json!({"total": 2, "data": [{"id": 1}, {"FLAG": "S", "code": "X", "order": 3}]})
        );
        assert_eq!(m.log().mutated(), 1);
    }

    #[tokio::test]
    async fn test_untouched_numbers_keep_their_text() {
        let real = PageResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: br#"{"data":[{"id":1},{"FLAG":"N","amount":1.10,"big":12345678901234567890123}]}"#
                .to_vec(),
        };
        let upstream = Fixed(real);
        let m = mutator("S");

        let response = m
            .handle(&PageRequest::get("http://h/api/parameters"), &upstream)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(response.body).unwrap(),
            r#"{"data":[{"id":1},{"FLAG":"S","amount":1.10,"big":12345678901234567890123}]}"#
        );
    }

    #[tokio::test]
    async fn test_empty_value_is_injected() {
        let upstream = Fixed(PageResponse::json(&json!({"data": [{}, {"FLAG": "N", "x": 1}]})));
        let m = mutator("");
        let response = m
            .handle(&PageRequest::get("http://h/api/parameters"), &upstream)
            .await
            .unwrap();
        assert_eq!(body(&response)["data"][1]["FLAG"], "");
    }

    #[tokio::test]
    async fn test_unmatched_request_passes_through() {
        let real = PageResponse {
            status: 200,
            headers: vec![("content-length".to_string(), "13".to_string())],
            body: b"{\"FLAG\":\"N\"}\n".to_vec(),
        };
        let upstream = Fixed(real.clone());
        let m = mutator("S");
        let response = m
            .handle(&PageRequest::get("http://h/api/people"), &upstream)
            .await
            .unwrap();
        assert_eq!(response, real);
        assert_eq!(m.log().passed_through(), 1);
    }

    #[tokio::test]
    async fn test_single_field_object_is_left_alone() {
        let real = PageResponse::json(&json!({"data": [{}, {"FLAG": "N"}]}));
        let upstream = Fixed(real.clone());
        let m = mutator("S");
        let response = m
            .handle(&PageRequest::get("http://h/api/parameters"), &upstream)
            .await
            .unwrap();
        assert_eq!(response, real);
        assert_eq!(m.log().skipped(), 1);
        assert!(matches!(
            &m.log().records()[0].disposition,
            Disposition::Skipped { reason: SkipReason::NotFound(Miss::TooFewFields(1)), .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_forwarded() {
        let real = PageResponse {
            status: 502,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: b"<html>bad gateway</html>".to_vec(),
        };
        let upstream = Fixed(real.clone());
        let m = mutator("S");
        let response = m
            .handle(&PageRequest::get("http://h/api/parameters"), &upstream)
            .await
            .unwrap();
        assert_eq!(response, real);
        assert!(matches!(
            &m.log().records()[0].disposition,
            Disposition::Skipped { reason: SkipReason::Unparseable(_), .. }
        ));
    }

    #[test]
    fn test_overlay_keeps_status_and_headers() {
        let real = PageResponse {
            status: 203,
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("content-length".to_string(), "40".to_string()),
                ("x-trace".to_string(), "t1".to_string()),
            ],
            body: br#"{"data":[{},{"FLAG":"N","b":true}]}"#.to_vec(),
        };
        let m = mutator("S");
        let (response, disposition) = m.overlay(&flags_rule(), real);
        assert!(matches!(disposition, Disposition::Mutated { .. }));
        assert_eq!(response.status, 203);
        assert_eq!(response.header("x-trace"), Some("t1"));
        assert_eq!(response.header("content-length"), None);
        assert_eq!(
            String::from_utf8(response.body).unwrap(),
            r#"{"data":[{},{"FLAG":"S","b":true}]}"#
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let m = Mutator::new(
            vec![
                InterceptionRule::new("**/api/**", "a").unwrap(),
                InterceptionRule::new("**/api/parameters", "b").unwrap(),
            ],
            ScenarioParameterSet::default(),
        );
        assert_eq!(m.rule_for("http://h/api/parameters").unwrap().name, "**/api/**");
        assert!(m.rule_for("http://h/other").is_none());
    }
}
