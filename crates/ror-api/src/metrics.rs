//! Prometheus counters exposed on `/metrics`.
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use ror_core::MediaKind;
use ror_report::ImageSection;

pub struct ReportMetrics {
    registry: Registry,
    reports_generated: IntCounterVec,
    report_failures: IntCounterVec,
    image_sections_skipped: IntCounterVec,
    detection_calls: IntCounterVec,
}

impl ReportMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let reports_generated = IntCounterVec::new(
            Opts::new("ror_reports_generated_total", "PDF reports generated"),
            &["kind"],
        )?;
        let report_failures = IntCounterVec::new(
            Opts::new("ror_report_failures_total", "Report requests that failed"),
            &["reason"],
        )?;
        let image_sections_skipped = IntCounterVec::new(
            Opts::new(
                "ror_image_sections_skipped_total",
                "Reports rendered without their image pair",
            ),
            &["reason"],
        )?;
        let detection_calls = IntCounterVec::new(
            Opts::new("ror_detection_calls_total", "Calls to the detection service"),
            &["kind", "outcome"],
        )?;

        registry.register(Box::new(reports_generated.clone()))?;
        registry.register(Box::new(report_failures.clone()))?;
        registry.register(Box::new(image_sections_skipped.clone()))?;
        registry.register(Box::new(detection_calls.clone()))?;

        Ok(ReportMetrics {
            registry,
            reports_generated,
            report_failures,
            image_sections_skipped,
            detection_calls,
        })
    }

    pub fn report_generated(&self, kind: MediaKind, image_section: ImageSection) {
        self.reports_generated
            .with_label_values(&[kind.as_str()])
            .inc();
        if image_section != ImageSection::Drawn {
            self.image_sections_skipped
                .with_label_values(&[image_section.as_str()])
                .inc();
        }
    }

    pub fn report_failed(&self, reason: &str) {
        self.report_failures.with_label_values(&[reason]).inc();
    }

    pub fn detection_call(&self, kind: MediaKind, outcome: &str) {
        self.detection_calls
            .with_label_values(&[kind.as_str(), outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        encode(&self.registry)
    }
}

pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).to_string())
}
