use std::path::Path;

use anyhow::{bail, Result};
use chrono::Local;
use reqwest::Client;

use crate::{
    ai::{GroqClient, PromptTemplate, RateLimiter, ServiceClient},
    cli::ClassifyArgs,
    config::{AppConfig, ConfigError},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    moderation::{
        score, summarize, validate_records, validate_results, Normalizer, RunSummary,
        SchemaReport, ValidationReport,
    },
    storage::{dataset, results},
    tasks::pipeline::{LogProgress, Pipeline},
};

const SHOWN_SCHEMA_ISSUES: usize = 5;

pub struct ModeratorApp {
    config: AppConfig,
    paths: ResolvedPaths,
    shutdown: Shutdown,
}

impl ModeratorApp {
    pub fn new(config: AppConfig, paths: ResolvedPaths, shutdown: Shutdown) -> Self {
        Self {
            config,
            paths,
            shutdown,
        }
    }

    pub async fn classify(&self, args: ClassifyArgs) -> Result<()> {
        let config = &self.config;
        let api_key = config
            .groq
            .api_key
            .clone()
            .ok_or(ConfigError::Missing("GROQ_API_KEY"))?;

        let template = match args
            .prompt
            .as_deref()
            .or(config.moderation.prompt_template_path.as_deref())
        {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };

        let limit = args.effective_limit();
        let items = dataset::load_content_items(&args.csv, limit)?;
        let annotations = if args.validate {
            let annotations_path = args.annotations.as_deref().unwrap_or(&args.csv);
            Some(dataset::load_human_annotations(annotations_path, limit)?)
        } else {
            None
        };

        let http = Client::builder()
            .user_agent(format!("content-moderator/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let transport = GroqClient::new(http, config.groq.clone(), api_key);
        let client = ServiceClient::new(
            transport,
            RateLimiter::new(&config.rate_limit),
            config.retry.clone(),
            &config.groq,
        );
        let normalizer = Normalizer::new(config.moderation.confidence_score);
        let mut pipeline = Pipeline::new(client, template, normalizer);

        tracing::info!(
            target: "pipeline",
            model = %config.groq.model,
            max_requests_per_minute = config.rate_limit.max_requests_per_window,
            min_spacing_ms = config.rate_limit.min_spacing.as_millis() as u64,
            max_attempts = config.retry.max_attempts,
            "content moderation run starting"
        );

        let mut shutdown = self.shutdown.subscribe();
        let run = pipeline.run(&items, &LogProgress, &mut shutdown).await;
        if run.interrupted {
            tracing::warn!(
                target: "pipeline",
                processed = run.results.len(),
                total = items.len(),
                "run interrupted; saving partial results"
            );
        }

        let stamp = results::run_stamp(Local::now());
        let results_path = results::write_results(&self.paths.results_dir, &run.results, &stamp)?;

        log_summary(&summarize(&run.results), run.fallbacks);
        log_schema_report(&validate_results(&run.results));

        if let Some(annotations) = &annotations {
            let report = score(&run.results, annotations);
            log_validation_report(&report);
            results::write_report(&self.paths.results_dir, &report, run.results.len(), &stamp)?;
        }

        tracing::info!(
            results = %results_path.display(),
            folder = %self.paths.results_dir.display(),
            "moderation run complete"
        );
        Ok(())
    }

    pub fn check(&self, path: &Path) -> Result<()> {
        let records = results::read_records(path)?;
        let report = validate_records(&records);
        log_schema_report(&report);
        if !report.schema_valid {
            bail!(
                "{} of {} records in {} failed schema validation",
                report.schema_issues.len(),
                report.total_results,
                path.display()
            );
        }
        Ok(())
    }
}

fn log_summary(summary: &RunSummary, fallbacks: usize) {
    tracing::info!(
        target: "pipeline",
        total = summary.total,
        spam = summary.spam,
        spam_pct = %format!("{:.1}", summary.spam_rate() * 100.0),
        keyword_spam = summary.keyword_spam,
        malicious_links = summary.malicious_links,
        ads = summary.ads,
        wrong_language = summary.wrong_language,
        unreadable = summary.unreadable,
        fallbacks,
        "processing summary"
    );
    if let Some(average) = summary.average_confidence {
        tracing::info!(
            target: "pipeline",
            average = %format!("{average:.1}"),
            low_confidence = summary.low_confidence,
            "confidence analysis"
        );
    }
}

fn log_schema_report(report: &SchemaReport) {
    if report.schema_valid {
        tracing::info!(
            target: "schema",
            valid = report.valid_results,
            total = report.total_results,
            "all results match the expected schema"
        );
        return;
    }

    tracing::warn!(
        target: "schema",
        valid = report.valid_results,
        total = report.total_results,
        "results with schema issues: {}",
        report.schema_issues.len()
    );
    for issue in report.schema_issues.iter().take(SHOWN_SCHEMA_ISSUES) {
        tracing::warn!(
            target: "schema",
            index = issue.index,
            uid = %issue.uid,
            "{}",
            issue.issues.join(", ")
        );
    }
    if report.schema_issues.len() > SHOWN_SCHEMA_ISSUES {
        tracing::warn!(
            target: "schema",
            "... and {} more",
            report.schema_issues.len() - SHOWN_SCHEMA_ISSUES
        );
    }
}

fn log_validation_report(report: &ValidationReport) {
    tracing::info!(
        target: "metrics",
        accuracy = %format!("{:.1}%", report.overall_accuracy * 100.0),
        correct = report.correct_predictions,
        total = report.total_samples,
        "overall accuracy"
    );
    for (category, stat) in &report.category_stats {
        if stat.total == 0 {
            continue;
        }
        let metrics = stat.metrics();
        tracing::info!(
            target: "metrics",
            category = %category,
            acc = %format!("{:.1}%", metrics.accuracy * 100.0),
            prec = %format!("{:.1}%", metrics.precision * 100.0),
            rec = %format!("{:.1}%", metrics.recall * 100.0),
            f1 = %format!("{:.1}%", metrics.f1 * 100.0),
            ai_yes = stat.ai_yes,
            human_yes = stat.human_yes,
            "category metrics"
        );
    }
}
