//! Turn targets into filters, resolve missing ids and run the checks.

use anyhow::Context;
use ga4gh_client::{
    Ga4ghClient, JsonSearch, OntologyTerm, ReadsFilter, ReadsSearch, Resolver,
    VariantAnnotationsFilter, VariantAnnotationsSearch, DEFAULT_TIMEOUT,
};
use paging_verify::{CheckerConfig, ConsistencyChecker, ConsistencyReport, SearchPage};
use tracing::{error, info};

use crate::build_client;
use crate::config::{JsonTarget, PlanConfig, ReadsTarget, TargetConfig, VariantAnnotationsTarget};

/// Check one target.
///
/// Fails only when the target cannot be set up (missing ids, bad range);
/// problems found while paging end up in the report.
pub async fn run_target(
    client: &Ga4ghClient,
    target: &TargetConfig,
    config: &CheckerConfig,
) -> anyhow::Result<ConsistencyReport> {
    match target {
        TargetConfig::Reads(t) => run_reads(client, t, config).await,
        TargetConfig::VariantAnnotations(t) => run_variant_annotations(client, t, config).await,
        TargetConfig::Json(t) => run_json(client, t, config).await,
    }
}

/// Check every target of a plan, one after another.
///
/// A target that cannot be set up gets a report with every scenario aborted,
/// so the remaining targets still run.
pub async fn run_plan(
    plan: &PlanConfig,
    bearer_token: Option<&str>,
) -> anyhow::Result<Vec<ConsistencyReport>> {
    let config = plan.check.to_config()?;
    let timeout = plan.timeout()?.unwrap_or(DEFAULT_TIMEOUT);
    let token = bearer_token.or(plan.bearer_token.as_deref());
    let client = build_client(&plan.endpoint, timeout, token)?;

    info!(
        "Running {} targets against {}",
        plan.targets.len(),
        client.base_url()
    );

    let mut reports = Vec::with_capacity(plan.targets.len());
    for (i, target) in plan.targets.iter().enumerate() {
        let label = target.label();
        info!("Target {}/{}: {}", i + 1, plan.targets.len(), label);
        match run_target(&client, target, &config).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("Target '{}' could not be checked: {:#}", label, e);
                reports.push(ConsistencyReport::aborted(label, format!("{e:#}")));
            }
        }
    }
    Ok(reports)
}

async fn run_reads(
    client: &Ga4ghClient,
    target: &ReadsTarget,
    config: &CheckerConfig,
) -> anyhow::Result<ConsistencyReport> {
    check_range(target.start, target.end)?;
    let resolver = Resolver::new(client.clone());

    let reference_id = match &target.reference_id {
        Some(id) => id.clone(),
        None => resolver
            .resolve_reference_id(
                target.reference_set.as_deref(),
                target.reference_name.as_deref(),
            )
            .await
            .context("Failed to resolve a reference to search reads on")?,
    };

    let read_group_ids = if target.read_group_ids.is_empty() {
        let id = resolver
            .resolve_read_group_id(target.dataset.as_deref(), target.read_group_name.as_deref())
            .await
            .context("Failed to resolve a read group to search")?;
        vec![id]
    } else {
        target.read_group_ids.clone()
    };

    let filter = ReadsFilter {
        reference_id: Some(reference_id),
        read_group_ids,
        start: target.start,
        end: target.end,
    };

    let search = ReadsSearch::new(client.clone());
    check(&search, &filter, config, target.name.as_deref()).await
}

async fn run_variant_annotations(
    client: &Ga4ghClient,
    target: &VariantAnnotationsTarget,
    config: &CheckerConfig,
) -> anyhow::Result<ConsistencyReport> {
    let (Some(start), Some(end)) = (target.start, target.end) else {
        anyhow::bail!("Variant annotation search needs both a start and an end");
    };
    check_range(Some(start), Some(end))?;
    if target.reference_name.is_none() && target.reference_id.is_none() {
        anyhow::bail!("Variant annotation search needs a reference name or a reference id");
    }

    let variant_annotation_set_id = match &target.variant_annotation_set_id {
        Some(id) => id.clone(),
        None => Resolver::new(client.clone())
            .resolve_variant_annotation_set_id(
                target.dataset.as_deref(),
                target.annotation_set_name.as_deref(),
            )
            .await
            .context("Failed to resolve a variant annotation set to search")?,
    };

    let filter = VariantAnnotationsFilter {
        variant_annotation_set_id,
        reference_name: target.reference_name.clone(),
        reference_id: target.reference_id.clone(),
        start,
        end,
        effects: target
            .effects
            .iter()
            .map(|id| OntologyTerm::with_id(id.as_str()))
            .collect(),
    };

    let search = VariantAnnotationsSearch::new(client.clone());
    check(&search, &filter, config, target.name.as_deref()).await
}

async fn run_json(
    client: &Ga4ghClient,
    target: &JsonTarget,
    config: &CheckerConfig,
) -> anyhow::Result<ConsistencyReport> {
    let mut search = JsonSearch::new(client.clone(), &target.path, &target.items_field);
    if let Some(id_field) = &target.id_field {
        search = search.with_id_field(id_field);
    }
    check(&search, &target.filter, config, target.name.as_deref()).await
}

async fn check<S: SearchPage>(
    search: &S,
    filter: &S::Filter,
    config: &CheckerConfig,
    name: Option<&str>,
) -> anyhow::Result<ConsistencyReport> {
    let checker = ConsistencyChecker::new(search, config.clone())?;
    let mut report = checker.run(filter).await;
    if let Some(name) = name {
        report.target = format!("{name} ({})", report.target);
    }
    Ok(report)
}

fn check_range(start: Option<i64>, end: Option<i64>) -> anyhow::Result<()> {
    if let Some(start) = start {
        if start < 0 {
            anyhow::bail!("Range start must not be negative, got {start}");
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            anyhow::bail!("Range end ({end}) must be greater than start ({start})");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert!(check_range(None, None).is_ok());
        assert!(check_range(Some(0), Some(150)).is_ok());
        assert!(check_range(Some(-1), None).is_err());
        assert!(check_range(Some(10), Some(10)).is_err());
    }

    #[tokio::test]
    async fn test_variant_annotations_need_a_range() {
        let client = Ga4ghClient::new("http://127.0.0.1:9", DEFAULT_TIMEOUT).unwrap();
        let target = TargetConfig::VariantAnnotations(VariantAnnotationsTarget {
            reference_name: Some("1".to_string()),
            start: Some(10177),
            ..Default::default()
        });
        let err = run_target(&client, &target, &CheckerConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("start and an end"));
    }
}
