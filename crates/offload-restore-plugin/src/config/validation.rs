//! Validation of the raw strings of the plugin config record into typed container settings.
use std::{collections::BTreeMap, num::ParseIntError, str::FromStr};

use k8s_openapi::{
    api::core::v1::{ResourceRequirements, SecurityContext},
    apimachinery::pkg::api::resource::Quantity as K8sQuantity,
};
use snafu::{OptionExt, ResultExt, Snafu, ensure};

use crate::{
    builder::security::SecurityContextBuilder,
    quantity::{ParseQuantityError, Quantity},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("couldn't parse {resource} {bound} {input:?}"))]
    ParseQuantity {
        source: ParseQuantityError,
        resource: ComputeResource,
        bound: ResourceBound,
        input: String,
    },

    #[snafu(display(
        "{resource} request {request:?} must be less than or equal to {resource} limit {limit:?}"
    ))]
    RequestExceedsLimit {
        resource: ComputeResource,
        request: String,
        limit: String,
    },

    #[snafu(display("security context runAsUser {input:?} is not a number"))]
    ParseRunAsUser { source: ParseIntError, input: String },

    #[snafu(display("security context runAsGroup {input:?} is not a number"))]
    ParseRunAsGroup { source: ParseIntError, input: String },

    #[snafu(display("security context allowPrivilegeEscalation {input:?} is not a boolean"))]
    ParseAllowPrivilegeEscalation { input: String },
}

/// The compute resources the injected container declares. The string form is the key used in
/// the requests and limits maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ComputeResource {
    #[strum(serialize = "cpu")]
    Cpu,

    #[strum(serialize = "memory")]
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceBound {
    Request,
    Limit,
}

struct ParsedQuantity<'a> {
    raw: &'a str,
    quantity: Quantity,
}

fn parse_quantity(
    resource: ComputeResource,
    bound: ResourceBound,
    input: &str,
) -> Result<ParsedQuantity<'_>> {
    let quantity = Quantity::from_str(input).context(ParseQuantitySnafu {
        resource,
        bound,
        input,
    })?;

    Ok(ParsedQuantity {
        raw: input,
        quantity,
    })
}

/// Takes the CPU and memory request and limit strings and returns the [`ResourceRequirements`]
/// of the injected container.
///
/// A quantity of `0` is treated as unbounded and left out of the result. A request bigger than
/// its bounded limit is rejected instead of being clamped.
pub fn parse_resource_requirements(
    cpu_request: &str,
    mem_request: &str,
    cpu_limit: &str,
    mem_limit: &str,
) -> Result<ResourceRequirements> {
    let cpu_request = parse_quantity(ComputeResource::Cpu, ResourceBound::Request, cpu_request)?;
    let mem_request =
        parse_quantity(ComputeResource::Memory, ResourceBound::Request, mem_request)?;
    let cpu_limit = parse_quantity(ComputeResource::Cpu, ResourceBound::Limit, cpu_limit)?;
    let mem_limit = parse_quantity(ComputeResource::Memory, ResourceBound::Limit, mem_limit)?;

    let bounds = [
        (ComputeResource::Cpu, cpu_request, cpu_limit),
        (ComputeResource::Memory, mem_request, mem_limit),
    ];

    for (resource, request, limit) in &bounds {
        ensure!(
            limit.quantity.is_zero() || request.quantity <= limit.quantity,
            RequestExceedsLimitSnafu {
                resource: *resource,
                request: request.raw,
                limit: limit.raw,
            }
        );
    }

    let mut requests = BTreeMap::new();
    let mut limits = BTreeMap::new();
    for (resource, request, limit) in bounds {
        if !request.quantity.is_zero() {
            requests.insert(resource.to_string(), K8sQuantity(request.raw.to_owned()));
        }
        if !limit.quantity.is_zero() {
            limits.insert(resource.to_string(), K8sQuantity(limit.raw.to_owned()));
        }
    }

    Ok(ResourceRequirements {
        requests: (!requests.is_empty()).then_some(requests),
        limits: (!limits.is_empty()).then_some(limits),
        ..ResourceRequirements::default()
    })
}

/// Parses the security context strings of the config record. Empty strings leave the
/// corresponding field unset.
pub fn parse_security_context(
    run_as_user: &str,
    run_as_group: &str,
    allow_privilege_escalation: &str,
) -> Result<SecurityContext> {
    let mut builder = SecurityContextBuilder::new();

    if !run_as_user.is_empty() {
        let user = run_as_user
            .parse::<i64>()
            .context(ParseRunAsUserSnafu { input: run_as_user })?;
        builder.run_as_user(user);
    }

    if !run_as_group.is_empty() {
        let group = run_as_group
            .parse::<i64>()
            .context(ParseRunAsGroupSnafu {
                input: run_as_group,
            })?;
        builder.run_as_group(group);
    }

    if !allow_privilege_escalation.is_empty() {
        let allow = parse_bool(allow_privilege_escalation).context(
            ParseAllowPrivilegeEscalationSnafu {
                input: allow_privilege_escalation,
            },
        )?;
        builder.allow_privilege_escalation(allow);
    }

    Ok(builder.build())
}

/// Accepts the same spellings as Go's `strconv.ParseBool`, which existing config records were
/// written against.
fn parse_bool(input: &str) -> Option<bool> {
    match input {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
