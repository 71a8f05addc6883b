// ABOUTME: Test support utilities.
// ABOUTME: In-memory cloud provider, resolver, publisher, and templates for orchestration tests.

use async_trait::async_trait;
use chrono::Utc;
use hoist::deploy::{Orchestration, PollingSettings, SiteSettings};
use hoist::provider::{
    AliasTarget, BucketOps, CdnOps, CertificateOps, CertificatePage, CertificateSummary,
    ChangeSetDescription, ChangeSetRequest, ChangeSetType, DistributionSummary, HostedZone,
    ProviderError, RecordSet, StackDescription, StackEvent, StackOps, TxtResolver, ZoneOps,
};
use hoist::publish::{AssetPublisher, PublishRequest};
use hoist::stack::{
    DeploymentOutputs, ParameterValue, PollSchedule, StackStatus, Template, TemplateError,
    TemplateSource,
};
use hoist::types::{
    ChangeSetId, DistributionId, HostedZoneId, ProjectIdentity, StackKind, StackName, StackNaming,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("hoist=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Stack naming for project `my-site` on branch `main`.
#[allow(dead_code)]
pub fn naming() -> StackNaming {
    StackNaming::new("hoist", ProjectIdentity::new("my-site", Some("main")).unwrap()).unwrap()
}

#[allow(dead_code)]
pub fn stack_name(kind: StackKind) -> String {
    naming().stack_name(kind).unwrap().to_string()
}

/// Fast polling so paused-clock tests stay short.
#[allow(dead_code)]
pub fn fast_polling() -> PollingSettings {
    PollingSettings {
        stack: PollSchedule::new(Duration::from_millis(10), Some(Duration::from_secs(60))),
        change_set: PollSchedule::new(Duration::from_millis(10), Some(Duration::from_secs(60))),
    }
}

#[allow(dead_code)]
pub fn outputs(pairs: &[(&str, &str)]) -> DeploymentOutputs {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[allow(dead_code)]
pub fn orchestration(cloud: &Arc<FakeCloud>, site: SiteSettings) -> Orchestration<FakeCloud> {
    Orchestration::new(
        Arc::clone(cloud),
        Arc::new(StaticTemplates::default()),
        naming(),
        site,
    )
    .with_polling(fast_polling())
}

const WEB_TEMPLATE: &str = r#"
Parameters:
  DomainName:
    Type: String
    Default: ""
  RedirectSubDomainNameWithDot:
    Type: String
    Default: ""
  DefaultRootObject:
    Type: String
    Default: index.html
  DefaultErrorObject:
    Type: String
    Default: 404.html
  DefaultErrorResponseCode:
    Type: String
    Default: "404"
  ExistingCertificate:
    Type: String
    Default: ""
  IncludeCloudFrontAlias:
    Type: String
    Default: "false"
  ContentSecurityPolicy:
    Type: String
    Default: ""
Resources: {}
"#;

const DOMAIN_TEMPLATE: &str = r#"
Parameters:
  Name:
    Type: String
  ExistingHostedZoneId:
    Type: String
    Default: ""
Resources: {}
"#;

const ALIAS_TEMPLATE: &str = r#"
Parameters:
  DomainStack:
    Type: String
  WebStack:
    Type: String
  RedirectSubDomainNameWithDot:
    Type: String
    Default: ""
Resources: {}
"#;

/// Templates held in memory. Kinds can be overridden per test.
#[derive(Default)]
pub struct StaticTemplates {
    overrides: Mutex<HashMap<StackKind, String>>,
}

#[allow(dead_code)]
impl StaticTemplates {
    pub fn with(self, kind: StackKind, body: &str) -> Self {
        self.overrides.lock().insert(kind, body.to_string());
        self
    }
}

impl TemplateSource for StaticTemplates {
    fn load(&self, kind: StackKind) -> Result<Arc<Template>, TemplateError> {
        let body = match self.overrides.lock().get(&kind) {
            Some(body) => body.clone(),
            None => match kind {
                StackKind::Web => WEB_TEMPLATE.to_string(),
                StackKind::Domain => DOMAIN_TEMPLATE.to_string(),
                StackKind::Alias => ALIAS_TEMPLATE.to_string(),
                StackKind::Support => "Resources: {}\n".to_string(),
            },
        };
        Template::parse(kind.as_str(), body).map(Arc::new)
    }
}

/// Scripted status marking a stack that vanishes instead of settling.
#[allow(dead_code)]
pub const VANISHED: &str = "VANISHED";

#[derive(Debug, Clone)]
struct FakeStack {
    status: String,
    outputs: DeploymentOutputs,
    /// Statuses reported on the following describes, one each.
    pending: VecDeque<String>,
}

#[derive(Debug, Clone)]
struct FakeChangeSet {
    stack: String,
    change_set_type: ChangeSetType,
    no_changes: bool,
    failure: Option<String>,
}

#[derive(Default)]
struct CloudState {
    stacks: HashMap<String, FakeStack>,
    planned_outputs: HashMap<String, DeploymentOutputs>,
    unchanged: HashSet<String>,
    deploy_failures: HashMap<String, String>,
    execution_scripts: HashMap<String, Vec<String>>,
    executions: HashMap<String, usize>,
    nth_deploy_failures: HashMap<(String, usize), String>,
    change_set_failures: HashMap<String, String>,
    injected_failures: HashMap<String, VecDeque<String>>,
    delete_outcomes: HashMap<String, VecDeque<String>>,
    events: HashMap<String, Vec<StackEvent>>,
    change_sets: HashMap<String, FakeChangeSet>,
    requests: Vec<ChangeSetRequest>,
    zones: Vec<HostedZone>,
    nameservers: Vec<String>,
    records: HashMap<String, Vec<RecordSet>>,
    certificates: Vec<CertificateSummary>,
    distributions: Vec<DistributionSummary>,
    bucket_error: Option<String>,
    calls: Vec<String>,
}

/// A stateful stand-in for the cloud provider.
///
/// Executed change sets and deletes report `*_IN_PROGRESS` on the next
/// describe and their final status on the one after. Probe operations can be
/// made to fail once with `fail_next`.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
}

#[allow(dead_code)]
impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing stack.
    pub fn seed_stack(&self, name: &str, status: &str, outputs: DeploymentOutputs) {
        self.state.lock().stacks.insert(
            name.to_string(),
            FakeStack {
                status: status.to_string(),
                outputs,
                pending: VecDeque::new(),
            },
        );
    }

    /// Outputs a stack reports after its next successful execution.
    pub fn plan_outputs(&self, name: &str, outputs: DeploymentOutputs) {
        self.state
            .lock()
            .planned_outputs
            .insert(name.to_string(), outputs);
    }

    /// Change sets for `name` report nothing to update.
    pub fn mark_unchanged(&self, name: &str) {
        self.state.lock().unchanged.insert(name.to_string());
    }

    /// Executions of `name` end in `status`.
    pub fn fail_deploys(&self, name: &str, status: &str) {
        self.state
            .lock()
            .deploy_failures
            .insert(name.to_string(), status.to_string());
    }

    /// The `nth` execution of `name` (counting from 1) ends in `status`.
    pub fn fail_nth_deploy(&self, name: &str, nth: usize, status: &str) {
        self.state
            .lock()
            .nth_deploy_failures
            .insert((name.to_string(), nth), status.to_string());
    }

    /// Executions of `name` report `statuses` in order, starting right after
    /// the execute call. The last one sticks; `VANISHED` removes the stack.
    pub fn script_execution(&self, name: &str, statuses: &[&str]) {
        self.state.lock().execution_scripts.insert(
            name.to_string(),
            statuses.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Change sets for `name` end FAILED with `reason`.
    pub fn fail_change_sets(&self, name: &str, reason: &str) {
        self.state
            .lock()
            .change_set_failures
            .insert(name.to_string(), reason.to_string());
    }

    /// The next call to the provider operation `op` fails with `message`.
    pub fn fail_next(&self, op: &str, message: &str) {
        self.state
            .lock()
            .injected_failures
            .entry(op.to_string())
            .or_default()
            .push_back(message.to_string());
    }

    /// The next delete of `name` ends in `status` instead of `DELETE_COMPLETE`.
    pub fn fail_next_delete(&self, name: &str, status: &str) {
        self.state
            .lock()
            .delete_outcomes
            .entry(name.to_string())
            .or_default()
            .push_back(status.to_string());
    }

    /// Stack events, newest first.
    pub fn seed_events(&self, name: &str, events: &[(&str, &str, Option<&str>)]) {
        let events = events
            .iter()
            .map(|(logical_id, status, reason)| StackEvent {
                logical_id: logical_id.to_string(),
                resource_status: status.to_string(),
                reason: reason.map(String::from),
                timestamp: Utc::now(),
            })
            .collect();
        self.state.lock().events.insert(name.to_string(), events);
    }

    pub fn add_zone(&self, id: &str, name: &str, comment: Option<&str>) {
        self.state.lock().zones.push(HostedZone {
            id: HostedZoneId::new(id),
            name: name.to_string(),
            comment: comment.map(String::from),
        });
    }

    pub fn set_nameservers(&self, nameservers: &[&str]) {
        self.state.lock().nameservers = nameservers.iter().map(|ns| ns.to_string()).collect();
    }

    pub fn add_alias_record(&self, zone: &str, name: &str, target: &str) {
        self.add_record(
            zone,
            RecordSet {
                name: name.to_string(),
                record_type: "A".to_string(),
                ttl: None,
                values: Vec::new(),
                alias_target: Some(AliasTarget {
                    dns_name: target.to_string(),
                    hosted_zone_id: "Z2FDTNDATAQYW2".to_string(),
                    evaluate_target_health: false,
                }),
            },
        );
    }

    pub fn add_record(&self, zone: &str, record: RecordSet) {
        self.state
            .lock()
            .records
            .entry(zone.to_string())
            .or_default()
            .push(record);
    }

    pub fn records(&self, zone: &str) -> Vec<RecordSet> {
        self.state
            .lock()
            .records
            .get(zone)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_certificate(&self, arn: &str, domain: &str) {
        self.state.lock().certificates.push(CertificateSummary {
            arn: arn.to_string(),
            domain_name: domain.to_string(),
        });
    }

    pub fn add_distribution(&self, id: &str, domain_name: &str, aliases: &[&str]) {
        self.state.lock().distributions.push(DistributionSummary {
            id: DistributionId::new(id),
            domain_name: domain_name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            comment: None,
        });
    }

    pub fn fail_bucket_empty(&self, message: &str) {
        self.state.lock().bucket_error = Some(message.to_string());
    }

    pub fn status_of(&self, name: &str) -> Option<String> {
        self.state.lock().stacks.get(name).map(|s| s.status.clone())
    }

    /// Every provider call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Calls whose operation name is `op`.
    pub fn calls_to(&self, op: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.split_whitespace().next() == Some(op))
            .collect()
    }

    /// Change set requests, in submission order.
    pub fn requests(&self) -> Vec<ChangeSetRequest> {
        self.state.lock().requests.clone()
    }

    /// Parameters of the change sets submitted for `stack`.
    pub fn parameters_for(&self, stack: &str) -> Vec<Vec<ParameterValue>> {
        self.requests()
            .into_iter()
            .filter(|request| request.stack_name.as_str() == stack)
            .map(|request| request.parameters)
            .collect()
    }

    fn log(&self, state: &mut CloudState, call: String) {
        state.calls.push(call);
    }

    /// Log a call and fail it if a failure was injected for `op`.
    fn enter(&self, state: &mut CloudState, op: &str, call: String) -> Result<(), ProviderError> {
        self.log(state, call);
        match state
            .injected_failures
            .get_mut(op)
            .and_then(|queue| queue.pop_front())
        {
            Some(message) => Err(ProviderError::request(op, message)),
            None => Ok(()),
        }
    }
}

#[allow(dead_code)]
pub fn parameter<'a>(parameters: &'a [ParameterValue], key: &str) -> Option<&'a str> {
    parameters
        .iter()
        .find(|p| p.key == key)
        .map(|p| p.value.as_str())
}

fn not_found(name: &str) -> ProviderError {
    ProviderError::NotFound(format!("Stack with id {} does not exist", name))
}

#[async_trait]
impl StackOps for FakeCloud {
    async fn describe_stack(&self, name: &StackName) -> Result<StackDescription, ProviderError> {
        let mut state = self.state.lock();
        self.log(&mut state, format!("describe_stack {}", name));

        let stack = state
            .stacks
            .get_mut(name.as_str())
            .ok_or_else(|| not_found(name.as_str()))?;
        let description = StackDescription {
            name: name.clone(),
            status: StackStatus::new(stack.status.clone(), None),
            outputs: stack.outputs.clone(),
        };
        match stack.pending.pop_front() {
            Some(next) if next == VANISHED => {
                state.stacks.remove(name.as_str());
            }
            Some(next) => stack.status = next,
            None => {}
        }
        Ok(description)
    }

    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<ChangeSetId, ProviderError> {
        let mut state = self.state.lock();
        let stack = request.stack_name.as_str().to_string();
        self.log(
            &mut state,
            format!("create_change_set {} {}", stack, request.change_set_type),
        );

        if request.change_set_type == ChangeSetType::Create {
            state.stacks.insert(
                stack.clone(),
                FakeStack {
                    status: "REVIEW_IN_PROGRESS".to_string(),
                    outputs: DeploymentOutputs::new(),
                    pending: VecDeque::new(),
                },
            );
        }

        let id = format!("arn:aws:cloudformation:changeSet/{}", request.change_set_name);
        let no_changes = state.unchanged.contains(&stack);
        let failure = state.change_set_failures.get(&stack).cloned();
        state.change_sets.insert(
            id.clone(),
            FakeChangeSet {
                stack,
                change_set_type: request.change_set_type,
                no_changes,
                failure,
            },
        );
        state.requests.push(request.clone());
        Ok(ChangeSetId::new(id))
    }

    async fn describe_change_set(
        &self,
        _stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<ChangeSetDescription, ProviderError> {
        let mut state = self.state.lock();
        self.log(&mut state, format!("describe_change_set {}", id));

        let change_set = state
            .change_sets
            .get(id.as_str())
            .ok_or_else(|| ProviderError::NotFound(format!("ChangeSet {} does not exist", id)))?;
        let description = if let Some(reason) = &change_set.failure {
            ChangeSetDescription {
                id: id.clone(),
                status: "FAILED".to_string(),
                status_reason: Some(reason.clone()),
            }
        } else if change_set.no_changes {
            ChangeSetDescription {
                id: id.clone(),
                status: "FAILED".to_string(),
                status_reason: Some(
                    "The submitted information didn't contain changes. Submit different information to create a change set.".to_string(),
                ),
            }
        } else {
            ChangeSetDescription {
                id: id.clone(),
                status: "CREATE_COMPLETE".to_string(),
                status_reason: None,
            }
        };
        Ok(description)
    }

    async fn execute_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        self.log(&mut state, format!("execute_change_set {}", stack));

        let change_set = state
            .change_sets
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("ChangeSet {} does not exist", id)))?;
        let operation = change_set.change_set_type.as_str();
        let execution = {
            let count = state.executions.entry(change_set.stack.clone()).or_default();
            *count += 1;
            *count
        };
        let failure = state
            .nth_deploy_failures
            .get(&(change_set.stack.clone(), execution))
            .or_else(|| state.deploy_failures.get(&change_set.stack))
            .cloned();
        let planned = state.planned_outputs.get(&change_set.stack).cloned();
        let script = state.execution_scripts.get(&change_set.stack).cloned();

        let entry = state
            .stacks
            .get_mut(&change_set.stack)
            .ok_or_else(|| not_found(&change_set.stack))?;
        let mut statuses: VecDeque<String> = match (script, failure) {
            (Some(script), _) => script.into(),
            (None, Some(status)) => [format!("{}_IN_PROGRESS", operation), status].into(),
            (None, None) => [
                format!("{}_IN_PROGRESS", operation),
                format!("{}_COMPLETE", operation),
            ]
            .into(),
        };
        if let Some(first) = statuses.pop_front() {
            entry.status = first;
        }
        entry.pending = statuses;
        if let Some(outputs) = planned {
            entry.outputs = outputs;
        }
        Ok(())
    }

    async fn delete_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        self.log(&mut state, format!("delete_change_set {}", stack));
        state.change_sets.remove(id.as_str());
        Ok(())
    }

    async fn delete_stack(&self, name: &StackName, retain: &[String]) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if retain.is_empty() {
            self.log(&mut state, format!("delete_stack {}", name));
        } else {
            self.log(
                &mut state,
                format!("delete_stack {} retain={}", name, retain.join(",")),
            );
        }

        let outcome = state
            .delete_outcomes
            .get_mut(name.as_str())
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| "DELETE_COMPLETE".to_string());
        let stack = state
            .stacks
            .get_mut(name.as_str())
            .ok_or_else(|| not_found(name.as_str()))?;
        stack.status = "DELETE_IN_PROGRESS".to_string();
        stack.pending = [outcome].into();
        Ok(())
    }

    async fn stack_events(&self, name: &StackName) -> Result<Vec<StackEvent>, ProviderError> {
        let mut state = self.state.lock();
        self.log(&mut state, format!("stack_events {}", name));
        if !state.stacks.contains_key(name.as_str()) {
            return Err(not_found(name.as_str()));
        }
        Ok(state.events.get(name.as_str()).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ZoneOps for FakeCloud {
    async fn hosted_zones_by_name(&self, domain: &str) -> Result<Vec<HostedZone>, ProviderError> {
        let mut state = self.state.lock();
        self.enter(&mut state, "hosted_zones_by_name", format!("hosted_zones_by_name {}", domain))?;
        Ok(state.zones.clone())
    }

    async fn hosted_zone_nameservers(
        &self,
        id: &HostedZoneId,
    ) -> Result<Vec<String>, ProviderError> {
        let mut state = self.state.lock();
        self.enter(&mut state, "hosted_zone_nameservers", format!("hosted_zone_nameservers {}", id))?;
        Ok(state.nameservers.clone())
    }

    async fn record_sets(&self, id: &HostedZoneId) -> Result<Vec<RecordSet>, ProviderError> {
        let mut state = self.state.lock();
        self.enter(&mut state, "record_sets", format!("record_sets {}", id))?;
        Ok(state.records.get(id.as_str()).cloned().unwrap_or_default())
    }

    async fn delete_record_sets(
        &self,
        id: &HostedZoneId,
        records: &[RecordSet],
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        let names: Vec<String> = records
            .iter()
            .map(|r| format!("{}:{}", r.record_type, r.name))
            .collect();
        self.log(
            &mut state,
            format!("delete_record_sets {} {}", id, names.join(",")),
        );
        if let Some(existing) = state.records.get_mut(id.as_str()) {
            existing.retain(|record| !records.contains(record));
        }
        Ok(())
    }
}

#[async_trait]
impl CertificateOps for FakeCloud {
    async fn issued_certificates(
        &self,
        next_token: Option<&str>,
    ) -> Result<CertificatePage, ProviderError> {
        let mut state = self.state.lock();
        self.enter(&mut state, "issued_certificates", "issued_certificates".to_string())?;
        // One certificate per page exercises pagination
        let index: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let certificates = state.certificates.get(index).cloned().into_iter().collect();
        let next_token = (index + 1 < state.certificates.len()).then(|| (index + 1).to_string());
        Ok(CertificatePage {
            certificates,
            next_token,
        })
    }
}

#[async_trait]
impl CdnOps for FakeCloud {
    async fn distributions(&self) -> Result<Vec<DistributionSummary>, ProviderError> {
        let mut state = self.state.lock();
        self.enter(&mut state, "distributions", "distributions".to_string())?;
        Ok(state.distributions.clone())
    }
}

#[async_trait]
impl BucketOps for FakeCloud {
    async fn empty_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        self.log(&mut state, format!("empty_bucket {}", bucket));
        match &state.bucket_error {
            Some(message) => Err(ProviderError::request("s3 rm", message.clone())),
            None => Ok(()),
        }
    }
}

/// Answers TXT lookups from a script, repeating the last answer when it
/// runs out.
#[derive(Default)]
pub struct FakeResolver {
    answers: Mutex<VecDeque<Vec<String>>>,
    lookups: Mutex<usize>,
    unavailable: bool,
}

#[allow(dead_code)]
impl FakeResolver {
    pub fn new(answers: &[&[&str]]) -> Self {
        Self {
            answers: Mutex::new(
                answers
                    .iter()
                    .map(|records| records.iter().map(|r| r.to_string()).collect())
                    .collect(),
            ),
            lookups: Mutex::new(0),
            unavailable: false,
        }
    }

    /// A resolver whose lookup program is not installed.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

#[async_trait]
impl TxtResolver for FakeResolver {
    async fn resolve_txt(&self, _domain: &str) -> Result<Vec<String>, ProviderError> {
        *self.lookups.lock() += 1;
        if self.unavailable {
            return Err(ProviderError::Spawn {
                program: "dig".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            });
        }
        let mut answers = self.answers.lock();
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().cloned()
        };
        Ok(answer.unwrap_or_default())
    }
}

/// Records publish requests.
#[derive(Default)]
pub struct FakePublisher {
    requests: Mutex<Vec<PublishRequest>>,
    error: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl FakePublisher {
    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            error: Mutex::new(Some(message.to_string())),
        }
    }

    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AssetPublisher for FakePublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<(), ProviderError> {
        self.requests.lock().push(request.clone());
        match self.error.lock().as_ref() {
            Some(message) => Err(ProviderError::request("s3 sync", message.clone())),
            None => Ok(()),
        }
    }
}
