// ABOUTME: CloudFormation stack and change set operations through the aws tool.
// ABOUTME: Change sets are submitted as an input document to carry the template body.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AwsCli, args, input_file};
use crate::provider::{
    CAPABILITIES, ChangeSetDescription, ChangeSetRequest, ProviderError, StackDescription,
    StackEvent, StackOps,
};
use crate::stack::{DeploymentOutputs, StackStatus};
use crate::types::{ChangeSetId, StackName};

const SERVICE: &str = "cloudformation";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacks {
    #[serde(default)]
    stacks: Vec<StackJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackJson {
    stack_name: String,
    stack_status: String,
    stack_status_reason: Option<String>,
    #[serde(default)]
    outputs: Vec<OutputJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OutputJson {
    output_key: String,
    output_value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateChangeSetInput<'a> {
    stack_name: &'a str,
    change_set_name: &'a str,
    change_set_type: &'a str,
    description: &'a str,
    template_body: &'a str,
    parameters: Vec<ParameterJson<'a>>,
    capabilities: &'a [&'a str],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterJson<'a> {
    parameter_key: &'a str,
    parameter_value: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateChangeSetOutput {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeChangeSet {
    change_set_id: String,
    status: String,
    status_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStackEvents {
    #[serde(default)]
    stack_events: Vec<StackEventJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackEventJson {
    #[serde(default)]
    logical_resource_id: String,
    #[serde(default)]
    resource_status: String,
    resource_status_reason: Option<String>,
    timestamp: DateTime<Utc>,
}

#[async_trait]
impl StackOps for AwsCli {
    async fn describe_stack(&self, name: &StackName) -> Result<StackDescription, ProviderError> {
        let response: DescribeStacks = self
            .call_json(
                SERVICE,
                "describe-stacks",
                &args(["--stack-name", name.as_str()]),
            )
            .await?;

        let stack = response
            .stacks
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("stack {}", name)))?;

        let outputs: DeploymentOutputs = stack
            .outputs
            .into_iter()
            .map(|o| (o.output_key, o.output_value))
            .collect();

        Ok(StackDescription {
            name: StackName::from_remote(stack.stack_name),
            status: StackStatus::new(stack.stack_status, stack.stack_status_reason),
            outputs,
        })
    }

    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<ChangeSetId, ProviderError> {
        let input = CreateChangeSetInput {
            stack_name: request.stack_name.as_str(),
            change_set_name: &request.change_set_name,
            change_set_type: request.change_set_type.as_str(),
            description: &request.description,
            template_body: &request.template_body,
            parameters: request
                .parameters
                .iter()
                .map(|p| ParameterJson {
                    parameter_key: &p.key,
                    parameter_value: &p.value,
                })
                .collect(),
            capabilities: &CAPABILITIES,
        };

        let (_file, input_arg) = input_file(&input)?;
        let response: CreateChangeSetOutput = self
            .call_json(
                SERVICE,
                "create-change-set",
                &["--cli-input-json".to_string(), input_arg],
            )
            .await?;

        Ok(ChangeSetId::new(response.id))
    }

    async fn describe_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<ChangeSetDescription, ProviderError> {
        let response: DescribeChangeSet = self
            .call_json(
                SERVICE,
                "describe-change-set",
                &args([
                    "--stack-name",
                    stack.as_str(),
                    "--change-set-name",
                    id.as_str(),
                ]),
            )
            .await?;

        Ok(ChangeSetDescription {
            id: ChangeSetId::new(response.change_set_id),
            status: response.status,
            status_reason: response.status_reason,
        })
    }

    async fn execute_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<(), ProviderError> {
        self.call(
            SERVICE,
            "execute-change-set",
            &args([
                "--stack-name",
                stack.as_str(),
                "--change-set-name",
                id.as_str(),
            ]),
        )
        .await?;
        Ok(())
    }

    async fn delete_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<(), ProviderError> {
        self.call(
            SERVICE,
            "delete-change-set",
            &args([
                "--stack-name",
                stack.as_str(),
                "--change-set-name",
                id.as_str(),
            ]),
        )
        .await?;
        Ok(())
    }

    async fn delete_stack(&self, name: &StackName, retain: &[String]) -> Result<(), ProviderError> {
        let mut arguments = args(["--stack-name", name.as_str()]);
        if !retain.is_empty() {
            arguments.push("--retain-resources".to_string());
            arguments.extend(retain.iter().cloned());
        }
        self.call(SERVICE, "delete-stack", &arguments).await?;
        Ok(())
    }

    async fn stack_events(&self, name: &StackName) -> Result<Vec<StackEvent>, ProviderError> {
        let response: DescribeStackEvents = self
            .call_json(
                SERVICE,
                "describe-stack-events",
                &args(["--stack-name", name.as_str()]),
            )
            .await?;

        Ok(response
            .stack_events
            .into_iter()
            .map(|e| StackEvent {
                logical_id: e.logical_resource_id,
                resource_status: e.resource_status,
                reason: e.resource_status_reason,
                timestamp: e.timestamp,
            })
            .collect())
    }
}
